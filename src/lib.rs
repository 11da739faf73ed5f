//! Object-oriented wrappers over the OpenCL host API.
//!
//! Every OpenCL object is represented by a reference-counted wrapper which
//! is unique per native handle, caches the results of information queries
//! and releases the native object when the last clone is dropped. On top of
//! the wrappers sit a composable device-selection pipeline, a work-size
//! suggester for kernel launches and an event profiler able to compute
//! aggregate times and overlaps between commands.
//!
//! ## Backends
//!
//! Native calls go through the [`driver`] module. With the `opencl` feature
//! the system ICD loader is used. Without it, or when `CF4OCL_DRIVER=stub`
//! is set, an in-process emulated host serves every call.
//!
//! ## Example
//!
//! ```ignore
//! let ctx = cf4ocl::Context::new_gpu()?;
//! let dev = ctx.device(0)?;
//! let queue = cf4ocl::Queue::new(&ctx, Some(&dev), CommandQueueProperties::PROFILING_ENABLE)?;
//! let prg = cf4ocl::Program::new_from_source(&ctx, SRC)?;
//! prg.build("")?;
//! ```
//!
//! ## Logging
//!
//! The crate emits [`tracing`] events and never installs a subscriber.
//!
//! [`tracing`]: https://docs.rs/tracing

#![doc(html_root_url = "https://docs.rs/cf4ocl/0.1.0")]

#[macro_use] extern crate enum_primitive;
#[macro_use] extern crate bitflags;
#[macro_use] extern crate lazy_static;
#[macro_use] extern crate tracing;

pub mod ffi;
pub mod enums;
pub mod flags;
pub mod error;
pub mod prm;
pub mod types;
pub mod config;
pub mod driver;
#[macro_use] mod wrapper;
mod standard;
pub mod prof;
#[cfg(test)]
mod tests;

pub use self::standard::{Platform, Platforms, Device, DevContainer, Filters, DependentKind,
    Context, Queue, Event, UserEvent, EventWaitList, wait, MemObject, MappedRegion,
    enqueue_migrate_objects, Buffer, Image, ImageFillColor, Sampler, SamplerProperty, Program,
    Kernel, KernelArg, KernelArgKind, suggest_local_worksize, suggest_worksizes};
pub use self::wrapper::{memcheck, wrapper_count, Wrapper, WeakWrapper, InfoEntry, InfoKey,
    InfoCache};
pub use self::error::{Error, ErrorKind, ErrorDomain, Result};
pub use self::prof::{Prof, ProfAgg, ProfInfo, ProfInst, ProfInstKind, ProfOverlap, ProfAggSort,
    ProfInfoSort, ProfInstSort, ProfOverlapSort, SortOrder, ExportOptions};
pub use self::types::{OpenclVersion, ImageFormat, ImageDescriptor};
pub use self::flags::{DeviceType, CommandQueueProperties, MemFlags, MapFlags, MemMigrationFlags};
pub use self::prm::OclPrm;
