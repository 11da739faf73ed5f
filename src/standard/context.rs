//! An OpenCL context.

use std::io::{self, BufRead, Write};
use crate::config::Defaults;
use crate::driver;
use crate::enums::{ClassTag, ContextInfo, MemObjectType};
use crate::error::{Error, ErrorKind, Result, ApiResultExt};
use crate::ffi::{self, RawObject};
use crate::flags::{DeviceType, MemFlags};
use crate::standard::device::{self, DevContainer, Device};
use crate::standard::device_selector::Filters;
use crate::standard::Platform;
use crate::types::{ImageFormat, OpenclVersion};
use crate::wrapper::{Lazy, Wrapper};

pub struct ContextData {
    devices: Lazy<Vec<Device>>,
    version: Lazy<OpenclVersion>,
}

impl ContextData {
    fn new() -> ContextData {
        ContextData { devices: Lazy::new(), version: Lazy::new() }
    }
}

/// A context wrapper.
///
/// Every device of a context belongs to one platform. Queues, memory
/// objects, samplers and programs created within a context keep it alive.
#[derive(Clone)]
pub struct Context(pub(crate) Wrapper<ContextData>);

impl_wrapper!(Context, ContextData);

impl Context {
    /// Wraps an existing native context, taking a new native reference.
    pub fn from_raw(native: RawObject) -> Result<Context> {
        Wrapper::new_wrap_with(ClassTag::Context, native, ContextData::new).map(Context)
    }

    /// Creates a context containing `devices`.
    ///
    /// All devices must belong to the same platform, otherwise an
    /// `InvalidData` error is returned. An empty list is a `DeviceNotFound`
    /// error.
    pub fn new_from_devices(devices: &[Device]) -> Result<Context> {
        let first = devices.first().ok_or_else(|| Error::lib(ErrorKind::DeviceNotFound,
            "Unable to create a context without devices."))?;
        let platform = first.platform_raw()?;
        for dev in devices.iter().skip(1) {
            if dev.platform_raw()? != platform {
                return Err(Error::lib(ErrorKind::InvalidData, format!("Device '{}' does not \
                    belong to the platform of device '{}'.", dev, first)));
            }
        }

        let properties = [ffi::CL_CONTEXT_PLATFORM, platform.addr() as isize, 0];
        let raw_devices: Vec<RawObject> = devices.iter().map(|d| d.as_raw()).collect();
        let native = driver::get().create_context(&properties, &raw_devices)
            .or_api("clCreateContext")?;

        debug!("Created a context with {} device(s) on platform {:?}.", devices.len(), platform);
        let seeded = devices.to_vec();
        Wrapper::from_owned_with(ClassTag::Context, native, move || ContextData {
            devices: Lazy::with_value(seeded),
            version: Lazy::new(),
        }).map(Context)
    }

    /// Creates a context from the devices selected by `filters`.
    ///
    /// When `filters` contains no filter keeping the devices of a single
    /// platform, one retaining the devices of the platform with the most
    /// surviving devices is appended first.
    pub fn new_from_filters(filters: &mut Filters) -> Result<Context> {
        if !filters.has_same_platform() {
            filters.most_populated_platform();
        }
        let devices = filters.select()?;
        Context::new_from_devices(&devices)
    }

    /// Lets the user pick a device from a console menu on the standard
    /// streams.
    pub fn new_from_menu() -> Result<Context> {
        let stdin = io::stdin();
        let input = stdin.lock();
        let stdout = io::stdout();
        let output = stdout.lock();
        Context::new_from_menu_full(None, input, output)
    }

    /// Lets the user pick a device from a menu written to `output`, reading
    /// the choice from `input`. A valid `preselect` index skips the prompt.
    pub fn new_from_menu_full<R, W>(preselect: Option<usize>, input: R, output: W)
            -> Result<Context> where R: BufRead, W: Write {
        let mut filters = Filters::new();
        filters.menu_with(preselect, input, output);
        Context::new_from_filters(&mut filters)
    }

    /// Creates a context on the device at position `index` of the list of all
    /// devices on the host.
    pub fn new_from_device_index(index: usize) -> Result<Context> {
        let mut filters = Filters::new();
        filters.index(index);
        Context::new_from_filters(&mut filters)
    }

    /// Creates a context on any available device.
    ///
    /// `CF4OCL_DEFAULT_PLATFORM_IDX` and `CF4OCL_DEFAULT_DEVICE_TYPE` narrow
    /// the choice when set.
    pub fn new_any() -> Result<Context> {
        let defaults = Defaults::from_env()?;
        let mut filters = Filters::new();

        if let Some(device_type) = defaults.device_type {
            filters.device_type(device_type);
        }
        if let Some(idx) = defaults.platform_idx {
            let mut platforms = Platform::list()?;
            if idx >= platforms.len() {
                return Err(Error::lib(ErrorKind::BadArguments, format!("Default platform \
                    index {} is out of range ({} platform(s) available).", idx, platforms.len())));
            }
            filters.platform(&platforms.swap_remove(idx));
        }
        Context::new_from_filters(&mut filters)
    }

    /// Creates a context on the CPU devices of one platform.
    pub fn new_cpu() -> Result<Context> {
        Context::new_from_type(DeviceType::CPU)
    }

    /// Creates a context on the GPU devices of one platform.
    pub fn new_gpu() -> Result<Context> {
        Context::new_from_type(DeviceType::GPU)
    }

    /// Creates a context on the accelerators of one platform.
    pub fn new_accel() -> Result<Context> {
        Context::new_from_type(DeviceType::ACCELERATOR)
    }

    fn new_from_type(device_type: DeviceType) -> Result<Context> {
        let mut filters = Filters::new();
        filters.device_type(device_type);
        Context::new_from_filters(&mut filters)
    }

    /// The platform of the context, resolved from its first device.
    pub fn platform(&self) -> Result<Platform> {
        self.device(0)?.platform()
    }

    /// The OpenCL version of the context's platform.
    pub fn opencl_version(&self) -> Result<OpenclVersion> {
        self.data().version.get_or_try_init(|| self.platform()?.opencl_version())
    }

    /// Fails with `UnsupportedVersion` if the context's platform is older
    /// than `min`.
    pub(crate) fn require_version(&self, min: OpenclVersion, what: &str) -> Result<()> {
        let ver = self.opencl_version()?;
        if ver < min {
            return Err(Error::lib(ErrorKind::UnsupportedVersion, format!("{} requires OpenCL \
                {} or newer, but the platform only supports OpenCL {}.", what, min, ver)));
        }
        Ok(())
    }

    /// Image formats supported by the context for the given flags and image
    /// type. Formats unknown to this crate are skipped.
    pub fn image_formats(&self, flags: MemFlags, image_type: MemObjectType)
            -> Result<Vec<ImageFormat>> {
        let raw = driver::get().supported_image_formats(self.as_raw(), flags, image_type)
            .or_api("clGetSupportedImageFormats")?;
        Ok(raw.iter().filter_map(|f| ImageFormat::from_raw(f).ok()).collect())
    }
}

impl DevContainer for Context {
    fn devices(&self) -> Result<Vec<Device>> {
        self.data().devices.get_or_try_init(|| {
            device::wrap_devices(&self.info(ContextInfo::Devices)?.as_objects())
        })
    }
}
