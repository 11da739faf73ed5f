//! OpenCL platforms and platform enumeration.

use std::fmt;
use std::slice;
use crate::config::Defaults;
use crate::driver;
use crate::enums::{ClassTag, PlatformInfo};
use crate::error::{Error, ErrorKind, Result, ApiResultExt};
use crate::ffi::{self, RawObject};
use crate::flags::DeviceType;
use crate::standard::device::{self, DevContainer, Device};
use crate::types::OpenclVersion;
use crate::wrapper::{Lazy, Wrapper};

pub struct PlatformData {
    devices: Lazy<Vec<Device>>,
}

/// A platform wrapper.
#[derive(Clone)]
pub struct Platform(pub(crate) Wrapper<PlatformData>);

impl_wrapper!(Platform, PlatformData);

impl Platform {
    /// Wraps a native platform id.
    pub fn from_raw(native: RawObject) -> Result<Platform> {
        Wrapper::new_wrap_with(ClassTag::Platform, native, || PlatformData { devices: Lazy::new() })
            .map(Platform)
    }

    /// Returns every platform available on the host.
    pub fn list() -> Result<Vec<Platform>> {
        let ids = driver::get().platform_ids().or_api("clGetPlatformIDs")?;
        ids.into_iter().map(Platform::from_raw).collect()
    }

    /// Returns the platform selected by `CF4OCL_DEFAULT_PLATFORM_IDX`, or the
    /// first platform.
    pub fn default() -> Result<Platform> {
        let idx = Defaults::from_env()?.platform_idx.unwrap_or(0);
        let mut list = Platform::list()?;
        if idx >= list.len() {
            return Err(Error::lib(ErrorKind::BadArguments, format!("Default platform index {} \
                is out of range ({} platform(s) available).", idx, list.len())));
        }
        Ok(list.swap_remove(idx))
    }

    fn info_string(&self, param: PlatformInfo) -> Result<String> {
        self.info(param).map(|e| e.as_string())
    }

    /// Either `FULL_PROFILE` or `EMBEDDED_PROFILE`.
    pub fn profile(&self) -> Result<String> {
        self.info_string(PlatformInfo::Profile)
    }

    /// The version string, formatted as
    /// `OpenCL<space><major.minor><space><platform-specific information>`.
    pub fn version(&self) -> Result<String> {
        self.info_string(PlatformInfo::Version)
    }

    pub fn name(&self) -> Result<String> {
        self.info_string(PlatformInfo::Name)
    }

    pub fn vendor(&self) -> Result<String> {
        self.info_string(PlatformInfo::Vendor)
    }

    /// A space-separated list of extension names.
    pub fn extensions(&self) -> Result<String> {
        self.info_string(PlatformInfo::Extensions)
    }

    /// The OpenCL version supported by the platform.
    pub fn opencl_version(&self) -> Result<OpenclVersion> {
        OpenclVersion::from_info_str(&self.version()?)
    }
}

impl DevContainer for Platform {
    fn devices(&self) -> Result<Vec<Device>> {
        self.data().devices.get_or_try_init(|| {
            let ids = match driver::get().device_ids(self.as_raw(), DeviceType::ALL) {
                Ok(ids) => ids,
                Err(ffi::CL_DEVICE_NOT_FOUND) => Vec::new(),
                Err(status) => return Err(Error::api(status, "clGetDeviceIDs")),
            };
            debug!("Platform {:?} has {} device(s).", self.as_raw(), ids.len());
            device::wrap_devices(&ids)
        })
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.name() {
            Ok(name) => f.write_str(&name),
            Err(_) => write!(f, "{:?}", self.as_raw()),
        }
    }
}

/// The platforms available on the host, queried once at construction.
#[derive(Debug, Clone)]
pub struct Platforms {
    platforms: Vec<Platform>,
}

impl Platforms {
    pub fn new() -> Result<Platforms> {
        Ok(Platforms { platforms: Platform::list()? })
    }

    pub fn count(&self) -> usize {
        self.platforms.len()
    }

    pub fn get(&self, index: usize) -> Option<&Platform> {
        self.platforms.get(index)
    }

    pub fn iter(&self) -> slice::Iter<Platform> {
        self.platforms.iter()
    }
}

impl<'a> IntoIterator for &'a Platforms {
    type Item = &'a Platform;
    type IntoIter = slice::Iter<'a, Platform>;

    fn into_iter(self) -> slice::Iter<'a, Platform> {
        self.platforms.iter()
    }
}
