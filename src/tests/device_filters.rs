use std::io::{self, Cursor};
use crate::{Context, DependentKind, DevContainer, DeviceType, ErrorKind, Filters, Platform};

fn names(devices: &[crate::Device]) -> Vec<String> {
    devices.iter().map(|d| d.name().unwrap()).collect()
}

#[test]
fn no_filters_select_everything() {
    let _guard = super::setup();
    let devices = Filters::new().select().unwrap();
    assert_eq!(names(&devices), vec!["Stub CPU A", "Stub GPU A", "Stub GPU B",
        "Stub Accelerator B"]);
}

#[test]
fn cpu_on_one_platform() {
    let _guard = super::setup();
    let mut filters = Filters::new();
    filters.type_cpu().same_platform();
    let devices = filters.select().unwrap();

    assert!(!devices.is_empty());
    let platform = devices[0].platform().unwrap();
    for dev in &devices {
        assert!(dev.device_type().unwrap().contains(DeviceType::CPU));
        assert_eq!(dev.platform().unwrap(), platform);
    }
}

#[test]
fn filters_apply_in_order() {
    let _guard = super::setup();
    let mut filters = Filters::new();
    filters.type_gpu().same_platform();
    assert_eq!(names(&filters.select().unwrap()), vec!["Stub GPU A"]);

    let mut filters = Filters::new();
    filters.substring("LEGACY");
    assert_eq!(names(&filters.select().unwrap()), vec!["Stub GPU B"]);

    let platforms = Platform::list().unwrap();
    let mut filters = Filters::new();
    filters.platform(&platforms[1]);
    assert_eq!(filters.select().unwrap().len(), 2);

    let mut filters = Filters::new();
    filters.type_accel().platform_name("platform a");
    assert!(filters.select().unwrap().is_empty());
}

#[test]
fn dependent_filters_see_survivors() {
    let _guard = super::setup();
    let mut seen = Vec::new();
    {
        let mut filters = Filters::new();
        filters.type_gpu().add_dependent(DependentKind::Other, |devices| {
            seen.push(devices.len());
            Ok(devices.into_iter().rev().collect())
        });
        assert!(!filters.has_same_platform());
        assert_eq!(filters.len(), 2);
        assert_eq!(names(&filters.select().unwrap()), vec!["Stub GPU B", "Stub GPU A"]);
    }
    assert_eq!(seen, vec![2]);
}

#[test]
fn index_filter() {
    let _guard = super::setup();
    let mut filters = Filters::new();
    filters.index(2);
    assert_eq!(names(&filters.select().unwrap()), vec!["Stub GPU B"]);

    let mut filters = Filters::new();
    filters.index(10);
    let err = filters.select().unwrap_err();
    assert!(err.is_kind(ErrorKind::DeviceNotFound));
}

#[test]
fn menu_retries_until_valid() {
    let _guard = super::setup();
    let mut output = Vec::new();
    {
        let mut filters = Filters::new();
        filters.menu_with(None, Cursor::new(&b"9\nabc\n1\n"[..]), &mut output);
        assert_eq!(names(&filters.select().unwrap()), vec!["Stub GPU A"]);
    }

    let text = String::from_utf8(output).unwrap();
    assert!(text.contains("\nList of available OpenCL devices:\n"));
    assert!(text.contains("   0. Platform #0 - Stub CPU A (Stub Processors Inc.)\n"));
    assert!(text.contains("   2. Platform #1 - Stub GPU B (Legacy Graphics Ltd.)\n"));
    assert!(text.contains("\n (?) Select device (0-3) > "));
    assert_eq!(text.matches(" (!) Invalid choice, please insert a value between 0 and 3.")
        .count(), 2);
}

#[test]
fn menu_preselection() {
    let _guard = super::setup();
    let ctx = Context::new_from_menu_full(Some(2), Cursor::new(&b""[..]), io::sink()).unwrap();
    assert_eq!(ctx.device(0).unwrap().name().unwrap(), "Stub GPU B");
    drop(ctx);

    let mut output = Vec::new();
    let ctx = Context::new_from_menu_full(Some(7), Cursor::new(&b"3\n"[..]), &mut output)
        .unwrap();
    assert_eq!(ctx.device(0).unwrap().name().unwrap(), "Stub Accelerator B");
    assert!(String::from_utf8_lossy(&output).contains("(!) No device at index 7!"));
}

#[test]
fn menu_without_answer() {
    let _guard = super::setup();
    let err = Context::new_from_menu_full(None, Cursor::new(&b""[..]), Vec::new()).unwrap_err();
    assert!(err.is_kind(ErrorKind::DeviceNotFound));
}

#[test]
fn context_constructors() {
    let _guard = super::setup();

    let ctx = Context::new_cpu().unwrap();
    assert_eq!(ctx.num_devices().unwrap(), 1);
    assert!(ctx.device(0).unwrap().device_type().unwrap().contains(DeviceType::CPU));
    drop(ctx);

    // Both GPUs are alone on their platform; the first platform wins the tie.
    let ctx = Context::new_gpu().unwrap();
    assert_eq!(names(&ctx.devices().unwrap()), vec!["Stub GPU A"]);
    drop(ctx);

    let ctx = Context::new_accel().unwrap();
    assert_eq!(ctx.opencl_version().unwrap().as_number(), 110);
    drop(ctx);

    let ctx = Context::new_from_device_index(0).unwrap();
    assert_eq!(names(&ctx.devices().unwrap()), vec!["Stub CPU A"]);
    assert_eq!(ctx.platform().unwrap().name().unwrap(), "cf4ocl stub platform A");
}

#[test]
fn context_needs_one_platform() {
    let _guard = super::setup();
    let all = Filters::new().select().unwrap();

    let err = Context::new_from_devices(&all).unwrap_err();
    assert!(err.is_kind(ErrorKind::InvalidData));

    let err = Context::new_from_devices(&[]).unwrap_err();
    assert!(err.is_kind(ErrorKind::DeviceNotFound));

    let ctx = Context::new_from_devices(&all[..2]).unwrap();
    assert_eq!(ctx.num_devices().unwrap(), 2);
}

#[test]
fn empty_selection_is_an_error() {
    let _guard = super::setup();
    let mut filters = Filters::new();
    filters.substring("no such device");
    let err = Context::new_from_filters(&mut filters).unwrap_err();
    assert!(err.is_kind(ErrorKind::DeviceNotFound));
}
