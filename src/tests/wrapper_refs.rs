//! Wrapper identity, reference counting and info caching.

use std::sync::Arc;
use crate::driver::{InfoAux, StubDriver};
use crate::enums::{DeviceInfo, InfoKind};
use crate::error::{self, ERROR_DOMAIN, OCL_ERROR_DOMAIN};
use crate::ffi;
use crate::{memcheck, wrapper_count, Buffer, Context, DevContainer, Device, Error, ErrorDomain,
    ErrorKind, MemFlags, Platform, Platforms};

#[test]
fn buffer_ref_unref() {
    let _guard = super::setup();
    let ctx = Context::new_from_device_index(0).unwrap();
    let buf = Buffer::new::<u8>(&ctx, MemFlags::READ_WRITE, 64, None).unwrap();
    assert_eq!(buf.ref_count(), 1);

    let extra = buf.clone();
    assert_eq!(buf.ref_count(), 2);
    assert!(extra.ptr_eq(&buf));
    drop(extra);

    assert_eq!(buf.ref_count(), 1);
    assert!(!memcheck());

    let native = buf.as_raw();
    assert_eq!(StubDriver::global().native_ref_count(native), 1);
    drop(buf);
    assert_eq!(StubDriver::global().native_ref_count(native), 0);

    drop(ctx);
    assert!(memcheck());
}

#[test]
fn one_wrapper_per_handle() {
    let _guard = super::setup();
    let ctx = Context::new_from_device_index(0).unwrap();
    let buf = Buffer::new::<u8>(&ctx, MemFlags::READ_WRITE, 16, None).unwrap();

    let again = Buffer::from_raw(buf.as_raw()).unwrap();
    assert!(again.ptr_eq(&buf));
    assert_eq!(buf.ref_count(), 2);
    // The lookup hit must not leak a native retain.
    assert_eq!(StubDriver::global().native_ref_count(buf.as_raw()), 1);

    let dev_a = ctx.device(0).unwrap();
    let dev_b = Device::from_raw(dev_a.as_raw()).unwrap();
    assert!(dev_a.ptr_eq(&dev_b));

    let serial = buf.serial();
    drop(again);
    drop(buf);
    let fresh = Buffer::new::<u8>(&ctx, MemFlags::READ_WRITE, 16, None).unwrap();
    assert_ne!(fresh.serial(), serial);
}

#[test]
fn wrappers_are_counted() {
    let _guard = super::setup();
    assert_eq!(wrapper_count(), 0);
    let platforms = Platforms::new().unwrap();
    assert_eq!(platforms.count(), 2);
    assert_eq!(wrapper_count(), 2);

    let devices = platforms.get(0).unwrap().devices().unwrap();
    assert_eq!(devices.len(), 2);
    assert_eq!(wrapper_count(), 4);

    drop(devices);
    drop(platforms);
    assert!(memcheck());
}

#[test]
fn info_is_cached() {
    let _guard = super::setup();
    let platform = Platform::default().unwrap();
    let dev = platform.device(0).unwrap();

    let first = dev.info(DeviceInfo::Name).unwrap();
    let calls = StubDriver::global().info_call_count();
    let second = dev.get_info(InfoKind::Device, ffi::CL_DEVICE_NAME, InfoAux::None).unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(first.size(), second.size());
    assert_eq!(StubDriver::global().info_call_count(), calls);
    assert_eq!(dev.name().unwrap(), "Stub CPU A");

    // Uncached queries always reach the backend.
    let direct = dev.query(DeviceInfo::Name, InfoAux::None).unwrap();
    assert_eq!(direct.bytes(), first.bytes());
    assert!(StubDriver::global().info_call_count() > calls);
}

#[test]
fn platform_info() {
    let _guard = super::setup();
    let platforms = Platform::list().unwrap();
    let a = &platforms[0];
    let b = &platforms[1];

    assert_eq!(a.name().unwrap(), "cf4ocl stub platform A");
    assert_eq!(a.vendor().unwrap(), "cf4ocl");
    assert_eq!(a.opencl_version().unwrap().as_number(), 200);
    assert_eq!(b.opencl_version().unwrap().as_number(), 110);
    assert_eq!(b.num_devices().unwrap(), 2);

    let err = b.device(2).unwrap_err();
    assert!(err.is_kind(ErrorKind::DeviceNotFound));
}

#[test]
fn unavailable_info() {
    let _guard = super::setup();
    let platform = Platform::default().unwrap();
    let err = platform.get_info(InfoKind::Platform, 0xFFFF, InfoAux::None).unwrap_err();
    assert!(err.is_kind(ErrorKind::InfoUnavailable));
}

#[test]
fn error_domains() {
    let lib = Error::lib(ErrorKind::InvalidData, "bad");
    assert_eq!(lib.domain(), ErrorDomain::Library);
    assert_eq!(lib.domain().as_str(), ERROR_DOMAIN);
    assert_eq!(lib.code(), 3);
    assert!(lib.message().contains("bad"));
    assert_eq!(lib.api_status(), None);

    let api = Error::api(ffi::CL_INVALID_VALUE, "clGetDeviceInfo");
    assert_eq!(api.domain().as_str(), OCL_ERROR_DOMAIN);
    assert_eq!(api.code(), ffi::CL_INVALID_VALUE);
    assert_eq!(api.kind(), None);
    assert!(api.message().contains("clGetDeviceInfo"));

    assert_eq!(error::status_name(ffi::CL_INVALID_VALUE), "CL_INVALID_VALUE");
    assert_eq!(ErrorKind::Other as i32, 15);
    assert_eq!(ErrorKind::InfoUnavailable as i32, 7);
}
