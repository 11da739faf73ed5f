//! Program construction, building, compiling, linking and binaries.

use std::fs;
use std::path::PathBuf;
use crate::enums::ProgramBuildStatus;
use crate::ffi;
use crate::{Context, DevContainer, ErrorKind, Program};

const GOOD_SRC: &str = "__kernel void twice(__global uint* data) {\n\
    data[get_global_id(0)] *= 2;\n\
}\n";

const BAD_SRC: &str = "__kernel void twice(__global uint* data) {}\n\
#error this kernel is broken\n";

fn scratch_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("cf4ocl_{}_{}", tag, std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn build_error_log() {
    let _guard = super::setup();
    let ctx = Context::new_from_device_index(0).unwrap();
    let dev = ctx.device(0).unwrap();
    let prg = Program::new_from_source(&ctx, BAD_SRC).unwrap();
    assert_eq!(prg.build_status(&dev).unwrap(), ProgramBuildStatus::None);

    let err = prg.build("-cl-fast-relaxed-math").unwrap_err();
    assert_eq!(err.api_status(), Some(ffi::CL_BUILD_PROGRAM_FAILURE));
    assert_eq!(prg.build_status(&dev).unwrap(), ProgramBuildStatus::Error);

    let log = prg.build_log().unwrap();
    assert_eq!(log, "*** Build log for device 'Stub CPU A' ***\n\
        <stub source>:2: error: this kernel is broken\n");
    assert_eq!(prg.source().unwrap(), BAD_SRC);

    let err = prg.get_kernel("twice").unwrap_err();
    assert_eq!(err.api_status(), Some(ffi::CL_INVALID_PROGRAM_EXECUTABLE));
}

#[test]
fn successful_build_has_no_log() {
    let _guard = super::setup();
    let ctx = Context::new_from_device_index(0).unwrap();
    let dev = ctx.device(0).unwrap();
    let prg = Program::new_from_source(&ctx, GOOD_SRC).unwrap();
    prg.build_full(&[&dev], "").unwrap();
    assert_eq!(prg.build_status(&dev).unwrap(), ProgramBuildStatus::Success);
    assert_eq!(prg.build_log().unwrap(), "");
    assert_eq!(prg.kernel_names().unwrap(), vec!["twice"]);
}

#[test]
fn source_files() {
    let _guard = super::setup();
    let dir = scratch_dir("sources");
    let path = dir.join("twice.cl");
    fs::write(&path, GOOD_SRC).unwrap();

    let ctx = Context::new_from_device_index(0).unwrap();
    let prg = Program::new_from_source_file(&ctx, &path).unwrap();
    assert_eq!(prg.source().unwrap(), GOOD_SRC);

    let err = Program::new_from_source_file(&ctx, dir.join("missing.cl")).unwrap_err();
    assert!(err.is_kind(ErrorKind::OpenFile));
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn compile_and_link() {
    let _guard = super::setup();
    let ctx = super::gpu_a_context();
    let header = Program::new_from_source(&ctx, "#define SCALE 3\n").unwrap();
    let first = Program::new_from_source(&ctx, "#include \"scale.h\"\n\
        __kernel void scale(__global float* v) { v[get_global_id(0)] *= SCALE; }\n").unwrap();
    let second = Program::new_from_source(&ctx,
        "__kernel void offset(__global float* v, float o) { v[get_global_id(0)] += o; }\n")
        .unwrap();

    let err = first.compile(&[], "", &[]).unwrap_err();
    assert_eq!(err.api_status(), Some(ffi::CL_COMPILE_PROGRAM_FAILURE));
    assert!(first.build_log().unwrap().contains("'scale.h' file not found"));

    first.compile(&[], "", &[(&header, "scale.h")]).unwrap();
    second.compile(&[], "", &[]).unwrap();

    // Only compiled objects can be linked.
    let err = Program::link(&ctx, &[], "", &[&first, &header]).unwrap_err();
    assert_eq!(err.api_status(), Some(ffi::CL_INVALID_PROGRAM));

    let linked = Program::link(&ctx, &[], "", &[&first, &second]).unwrap();
    let mut names = linked.kernel_names().unwrap();
    names.sort();
    assert_eq!(names, vec!["offset", "scale"]);
    assert_eq!(linked.get_kernel("offset").unwrap().num_args().unwrap(), 2);
}

#[test]
fn compile_needs_opencl_1_2() {
    let _guard = super::setup();
    let ctx = super::platform_b_context();
    let prg = Program::new_from_source(&ctx, GOOD_SRC).unwrap();

    let err = prg.compile(&[], "", &[]).unwrap_err();
    assert!(err.is_kind(ErrorKind::UnsupportedVersion));
    let err = Program::link(&ctx, &[], "", &[&prg]).unwrap_err();
    assert!(err.is_kind(ErrorKind::UnsupportedVersion));

    let dev = ctx.device(0).unwrap();
    let err = Program::new_from_built_in_kernels(&ctx, &[&dev], "stub_copy").unwrap_err();
    assert!(err.is_kind(ErrorKind::UnsupportedVersion));

    // Plain builds work everywhere.
    prg.build("").unwrap();
    assert_eq!(prg.num_devices().unwrap(), 2);
}

#[test]
fn binaries_round_trip() {
    let _guard = super::setup();
    let dir = scratch_dir("binaries");
    let ctx = super::gpu_a_context();
    let dev = ctx.device(0).unwrap();

    let prg = Program::new_from_source(&ctx, GOOD_SRC).unwrap();
    let err = prg.binary(&dev).unwrap_err();
    assert!(err.is_kind(ErrorKind::InvalidData));

    prg.build("").unwrap();
    let bin = prg.binary(&dev).unwrap();
    assert!(!bin.is_empty());

    let prefix = format!("{}/", dir.display());
    let paths = prg.save_all_binaries(&prefix, ".bin").unwrap();
    assert_eq!(paths, vec![format!("{}Stub_GPU_A_00.bin", prefix)]);
    assert_eq!(fs::read(&paths[0]).unwrap(), bin);

    let loaded = Program::new_from_binary_file(&ctx, &dev, &paths[0]).unwrap();
    assert_eq!(loaded.source().unwrap(), "");
    loaded.build("").unwrap();
    assert_eq!(loaded.kernel_names().unwrap(), vec!["twice"]);
    assert_eq!(loaded.get_kernel("twice").unwrap().num_args().unwrap(), 1);

    let err = Program::new_from_binaries(&ctx, &[(&dev, &[][..])]).unwrap_err();
    assert!(err.is_kind(ErrorKind::InvalidData));
    let err = Program::new_from_binaries(&ctx, &[(&dev, &b"not a binary"[..])]).unwrap_err();
    assert_eq!(err.api_status(), Some(ffi::CL_INVALID_BINARY));

    let _ = fs::remove_dir_all(&dir);
}
