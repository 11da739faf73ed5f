//! The backend seam between the wrappers and an OpenCL implementation.
//!
//! Every native call made by this crate goes through the [`Driver`] trait.
//! Two backends exist:
//!
//! * [`NativeDriver`] (feature `opencl`) calls into the system's OpenCL ICD
//!   loader through `cl-sys`.
//! * [`StubDriver`] is an in-process emulation of a small host with two
//!   platforms. It is always available and is what the test suite runs on.
//!
//! The process-wide backend is chosen lazily on first use. It may be picked
//! explicitly with [`install`] or through the `CF4OCL_DRIVER` environment
//! variable (`native` or `stub`).

use std::env;
use std::sync::{Arc, RwLock, PoisonError};
use crate::enums::{ClassTag, InfoKind, AddressingMode, FilterMode, MemObjectType};
use crate::error::{Error, ErrorKind, Result};
use crate::ffi::{c_void, cl_int, cl_image_format, RawObject};
use crate::flags::{DeviceType, CommandQueueProperties, MemFlags, MapFlags, MemMigrationFlags};
use crate::types::{ImageFormat, ImageDescriptor};

mod stub;
#[cfg(feature = "opencl")]
mod native;

pub use self::stub::{StubDriver, KernelInvocation, KernelFn};
#[cfg(feature = "opencl")]
pub use self::native::NativeDriver;

/// Environment variable used to pick the default backend.
pub const DRIVER_ENV_VAR: &str = "CF4OCL_DRIVER";

/// Raw backend result: the error is the OpenCL status code.
pub type DriverResult<T> = ::std::result::Result<T, cl_int>;

/// Secondary argument of an info query.
///
/// Program build and kernel work-group queries are made per device, kernel
/// argument queries per argument index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum InfoAux {
    None,
    Object(RawObject),
    Index(u32),
}

/// A host pointer to a mapped region of a memory object.
#[derive(Debug, Clone, Copy)]
pub struct MappedPtr {
    pub ptr: *mut c_void,
    pub row_pitch: usize,
    pub slice_pitch: usize,
}

/// The OpenCL entry points used by this crate.
///
/// Handles passed in are always live objects owned by a wrapper. Methods
/// returning a `RawObject` hand over one native reference to the caller.
/// Every `wait` slice holds events which must complete before the command
/// starts.
pub trait Driver: Send + Sync {
    /// A short backend name used in log output.
    fn name(&self) -> &'static str;

    /// Generic info query. With `value == None` returns the size of the
    /// requested parameter, otherwise fills `value` and returns the number of
    /// bytes written.
    fn get_info(&self, kind: InfoKind, obj: RawObject, aux: InfoAux, param: u32,
        value: Option<&mut [u8]>) -> DriverResult<usize>;

    fn retain(&self, class: ClassTag, obj: RawObject) -> DriverResult<()>;

    fn release(&self, class: ClassTag, obj: RawObject) -> DriverResult<()>;

    fn platform_ids(&self) -> DriverResult<Vec<RawObject>>;

    fn device_ids(&self, platform: RawObject, device_type: DeviceType)
        -> DriverResult<Vec<RawObject>>;

    /// `properties` is a zero-terminated `cl_context_properties` list.
    fn create_context(&self, properties: &[isize], devices: &[RawObject])
        -> DriverResult<RawObject>;

    fn create_command_queue(&self, context: RawObject, device: RawObject,
        properties: CommandQueueProperties) -> DriverResult<RawObject>;

    /// ## Safety
    ///
    /// `host_ptr`, when not null, must point to at least `size` bytes.
    unsafe fn create_buffer(&self, context: RawObject, flags: MemFlags, size: usize,
        host_ptr: *mut c_void) -> DriverResult<RawObject>;

    /// ## Safety
    ///
    /// `host_ptr`, when not null, must point to an image-sized allocation.
    unsafe fn create_image(&self, context: RawObject, flags: MemFlags, format: &ImageFormat,
        desc: &ImageDescriptor, host_ptr: *mut c_void) -> DriverResult<RawObject>;

    fn create_sampler(&self, context: RawObject, normalized_coords: bool,
        addressing_mode: AddressingMode, filter_mode: FilterMode) -> DriverResult<RawObject>;

    /// `properties` is a zero-terminated `cl_sampler_properties` list.
    fn create_sampler_with_properties(&self, context: RawObject, properties: &[u64])
        -> DriverResult<RawObject>;

    fn create_program_with_source(&self, context: RawObject, sources: &[&str])
        -> DriverResult<RawObject>;

    fn create_program_with_binary(&self, context: RawObject, devices: &[RawObject],
        binaries: &[&[u8]]) -> DriverResult<RawObject>;

    fn create_program_with_built_in_kernels(&self, context: RawObject, devices: &[RawObject],
        kernel_names: &str) -> DriverResult<RawObject>;

    fn build_program(&self, program: RawObject, devices: &[RawObject], options: &str)
        -> DriverResult<()>;

    fn compile_program(&self, program: RawObject, devices: &[RawObject], options: &str,
        headers: &[RawObject], header_names: &[&str]) -> DriverResult<()>;

    fn link_program(&self, context: RawObject, devices: &[RawObject], options: &str,
        programs: &[RawObject]) -> DriverResult<RawObject>;

    /// Program binaries, in the order of the program's device list.
    fn program_binaries(&self, program: RawObject) -> DriverResult<Vec<Vec<u8>>>;

    fn create_kernel(&self, program: RawObject, name: &str) -> DriverResult<RawObject>;

    /// ## Safety
    ///
    /// `value` must be null or point to `size` readable bytes.
    unsafe fn set_kernel_arg(&self, kernel: RawObject, index: u32, size: usize,
        value: *const c_void) -> DriverResult<()>;

    fn enqueue_ndrange_kernel(&self, queue: RawObject, kernel: RawObject, work_dim: u32,
        global_offset: Option<&[usize]>, global_size: &[usize], local_size: Option<&[usize]>,
        wait: &[RawObject]) -> DriverResult<RawObject>;

    /// ## Safety
    ///
    /// When `blocking` is false `data` must stay valid until the returned
    /// event completes.
    unsafe fn enqueue_read_buffer(&self, queue: RawObject, buffer: RawObject, blocking: bool,
        offset: usize, data: &mut [u8], wait: &[RawObject]) -> DriverResult<RawObject>;

    /// ## Safety
    ///
    /// When `blocking` is false `data` must stay valid until the returned
    /// event completes.
    unsafe fn enqueue_write_buffer(&self, queue: RawObject, buffer: RawObject, blocking: bool,
        offset: usize, data: &[u8], wait: &[RawObject]) -> DriverResult<RawObject>;

    fn enqueue_copy_buffer(&self, queue: RawObject, src: RawObject, dst: RawObject,
        src_offset: usize, dst_offset: usize, size: usize, wait: &[RawObject])
        -> DriverResult<RawObject>;

    fn enqueue_fill_buffer(&self, queue: RawObject, buffer: RawObject, pattern: &[u8],
        offset: usize, size: usize, wait: &[RawObject]) -> DriverResult<RawObject>;

    /// ## Safety
    ///
    /// The returned pointer is valid until the region is unmapped.
    unsafe fn enqueue_map_buffer(&self, queue: RawObject, buffer: RawObject, blocking: bool,
        flags: MapFlags, offset: usize, size: usize, wait: &[RawObject])
        -> DriverResult<(MappedPtr, RawObject)>;

    /// ## Safety
    ///
    /// See `enqueue_read_buffer`.
    unsafe fn enqueue_read_image(&self, queue: RawObject, image: RawObject, blocking: bool,
        origin: [usize; 3], region: [usize; 3], row_pitch: usize, slice_pitch: usize,
        data: &mut [u8], wait: &[RawObject]) -> DriverResult<RawObject>;

    /// ## Safety
    ///
    /// See `enqueue_write_buffer`.
    unsafe fn enqueue_write_image(&self, queue: RawObject, image: RawObject, blocking: bool,
        origin: [usize; 3], region: [usize; 3], row_pitch: usize, slice_pitch: usize,
        data: &[u8], wait: &[RawObject]) -> DriverResult<RawObject>;

    fn enqueue_copy_image(&self, queue: RawObject, src: RawObject, dst: RawObject,
        src_origin: [usize; 3], dst_origin: [usize; 3], region: [usize; 3],
        wait: &[RawObject]) -> DriverResult<RawObject>;

    /// `color` holds four 32-bit components (float, int or uint depending on
    /// the image channel type).
    fn enqueue_fill_image(&self, queue: RawObject, image: RawObject, color: &[u8; 16],
        origin: [usize; 3], region: [usize; 3], wait: &[RawObject]) -> DriverResult<RawObject>;

    /// ## Safety
    ///
    /// See `enqueue_map_buffer`.
    unsafe fn enqueue_map_image(&self, queue: RawObject, image: RawObject, blocking: bool,
        flags: MapFlags, origin: [usize; 3], region: [usize; 3], wait: &[RawObject])
        -> DriverResult<(MappedPtr, RawObject)>;

    /// ## Safety
    ///
    /// `mapped` must come from a map call on `mem`.
    unsafe fn enqueue_unmap_mem_object(&self, queue: RawObject, mem: RawObject,
        mapped: *mut c_void, wait: &[RawObject]) -> DriverResult<RawObject>;

    fn enqueue_migrate_mem_objects(&self, queue: RawObject, mems: &[RawObject],
        flags: MemMigrationFlags, wait: &[RawObject]) -> DriverResult<RawObject>;

    fn enqueue_marker(&self, queue: RawObject, wait: &[RawObject]) -> DriverResult<RawObject>;

    fn enqueue_barrier(&self, queue: RawObject, wait: &[RawObject]) -> DriverResult<RawObject>;

    fn finish(&self, queue: RawObject) -> DriverResult<()>;

    fn flush(&self, queue: RawObject) -> DriverResult<()>;

    fn wait_for_events(&self, events: &[RawObject]) -> DriverResult<()>;

    fn create_user_event(&self, context: RawObject) -> DriverResult<RawObject>;

    fn set_user_event_status(&self, event: RawObject, status: cl_int) -> DriverResult<()>;

    fn supported_image_formats(&self, context: RawObject, flags: MemFlags,
        image_type: MemObjectType) -> DriverResult<Vec<cl_image_format>>;
}

lazy_static! {
    static ref DRIVER: RwLock<Option<Arc<dyn Driver>>> = RwLock::new(None);
}

/// Returns the process-wide backend, selecting the default one on first use.
pub fn get() -> Arc<dyn Driver> {
    if let Some(ref driver) = *DRIVER.read().unwrap_or_else(PoisonError::into_inner) {
        return driver.clone();
    }

    let mut slot = DRIVER.write().unwrap_or_else(PoisonError::into_inner);
    if let Some(ref driver) = *slot {
        return driver.clone();
    }
    let driver = default_driver();
    debug!("Selected the '{}' OpenCL backend.", driver.name());
    *slot = Some(driver.clone());
    driver
}

/// Replaces the process-wide backend.
///
/// Wrapped objects must not outlive the backend which created them, so this
/// fails with `InvalidData` while any wrapper is alive.
pub fn install(driver: Arc<dyn Driver>) -> Result<()> {
    let mut slot = DRIVER.write().unwrap_or_else(PoisonError::into_inner);
    if !crate::wrapper::memcheck() {
        return Err(Error::lib(ErrorKind::InvalidData, format!("Unable to install the '{}' \
            backend: {} wrapper(s) still alive.", driver.name(), crate::wrapper::wrapper_count())));
    }
    debug!("Installing the '{}' OpenCL backend.", driver.name());
    *slot = Some(driver);
    Ok(())
}

fn default_driver() -> Arc<dyn Driver> {
    match env::var(DRIVER_ENV_VAR) {
        Ok(ref s) if s.eq_ignore_ascii_case("stub") => return StubDriver::shared(),
        Ok(ref s) if s.eq_ignore_ascii_case("native") => return native_or_stub(),
        Ok(ref s) => warn!("Ignoring unknown {} value '{}'.", DRIVER_ENV_VAR, s),
        Err(_) => (),
    }
    native_or_stub()
}

#[cfg(feature = "opencl")]
fn native_or_stub() -> Arc<dyn Driver> {
    Arc::new(NativeDriver::new())
}

#[cfg(not(feature = "opencl"))]
fn native_or_stub() -> Arc<dyn Driver> {
    if env::var(DRIVER_ENV_VAR).map(|s| s.eq_ignore_ascii_case("native")).unwrap_or(false) {
        warn!("The native OpenCL backend requires the 'opencl' feature; \
            falling back to the stub backend.");
    }
    StubDriver::shared()
}
