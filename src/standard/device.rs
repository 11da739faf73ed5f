//! An OpenCL device.

use std::fmt;
use crate::enums::{ClassTag, DeviceInfo};
use crate::error::{Error, ErrorKind, Result};
use crate::ffi::RawObject;
use crate::flags::DeviceType;
use crate::standard::Platform;
use crate::types::OpenclVersion;
use crate::wrapper::Wrapper;

pub struct DeviceData {
    _priv: (),
}

/// A device wrapper.
///
/// Devices are owned by the platform (or context, or program) which listed
/// them. Cloning a `Device` only adds a reference to the shared wrapper.
#[derive(Clone)]
pub struct Device(pub(crate) Wrapper<DeviceData>);

impl_wrapper!(Device, DeviceData);

impl Device {
    /// Wraps a native device id.
    pub fn from_raw(native: RawObject) -> Result<Device> {
        Wrapper::new_wrap(ClassTag::Device, native, DeviceData { _priv: () }).map(Device)
    }

    pub fn name(&self) -> Result<String> {
        self.info(DeviceInfo::Name).map(|e| e.as_string())
    }

    pub fn vendor(&self) -> Result<String> {
        self.info(DeviceInfo::Vendor).map(|e| e.as_string())
    }

    pub fn device_type(&self) -> Result<DeviceType> {
        self.info(DeviceInfo::Type)?.as_scalar::<u64>().map(DeviceType::from_bits_truncate)
    }

    /// The raw id of the platform this device belongs to.
    pub(crate) fn platform_raw(&self) -> Result<RawObject> {
        self.info(DeviceInfo::Platform)?.as_object()
    }

    pub fn platform(&self) -> Result<Platform> {
        Platform::from_raw(self.platform_raw()?)
    }

    pub fn max_work_group_size(&self) -> Result<usize> {
        self.info(DeviceInfo::MaxWorkGroupSize)?.as_scalar()
    }

    pub fn max_work_item_dimensions(&self) -> Result<u32> {
        self.info(DeviceInfo::MaxWorkItemDimensions)?.as_scalar()
    }

    /// Maximum number of work-items along each dimension of a work-group.
    pub fn max_work_item_sizes(&self) -> Result<Vec<usize>> {
        self.info(DeviceInfo::MaxWorkItemSizes).map(|e| e.as_vec())
    }

    pub fn max_compute_units(&self) -> Result<u32> {
        self.info(DeviceInfo::MaxComputeUnits)?.as_scalar()
    }

    /// The OpenCL version supported by the device, parsed from
    /// `CL_DEVICE_VERSION`.
    pub fn opencl_version(&self) -> Result<OpenclVersion> {
        OpenclVersion::from_info_str(&self.info(DeviceInfo::Version)?.as_string())
    }

    /// The highest OpenCL C version supported by the compiler for this
    /// device.
    pub fn opencl_c_version(&self) -> Result<OpenclVersion> {
        OpenclVersion::from_info_str(&self.info(DeviceInfo::OpenclCVersion)?.as_string())
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.name() {
            Ok(name) => f.write_str(&name),
            Err(_) => write!(f, "{:?}", self.as_raw()),
        }
    }
}

/// Wrappers which keep a list of devices: contexts, platforms and programs.
///
/// The list is built on first access and held for the lifetime of the
/// container.
pub trait DevContainer {
    /// Returns the container's devices, building the list on first use.
    fn devices(&self) -> Result<Vec<Device>>;

    fn num_devices(&self) -> Result<usize> {
        self.devices().map(|d| d.len())
    }

    /// Returns the device at `index`, failing with `DeviceNotFound` when the
    /// index is out of range.
    fn device(&self, index: usize) -> Result<Device> {
        let devices = self.devices()?;
        let len = devices.len();
        devices.into_iter().nth(index).ok_or_else(|| Error::lib(ErrorKind::DeviceNotFound,
            format!("Device index {} is out of range (found {} device(s)).", index, len)))
    }
}

/// Wraps a list of native device ids.
pub(crate) fn wrap_devices(raw: &[RawObject]) -> Result<Vec<Device>> {
    raw.iter().map(|&d| Device::from_raw(d)).collect()
}
