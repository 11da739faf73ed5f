//! The object wrappers.

mod platform;
mod device;
mod device_selector;
mod context;
mod queue;
mod event;
mod memobj;
mod buffer;
mod image;
mod sampler;
mod program;
mod kernel;

pub use self::platform::{Platform, Platforms};
pub use self::device::{Device, DevContainer};
pub use self::device_selector::{Filters, DependentKind};
pub use self::context::Context;
pub use self::queue::Queue;
pub use self::event::{Event, UserEvent, EventWaitList, wait};
pub use self::memobj::{MemObject, MappedRegion, enqueue_migrate_objects};
pub use self::buffer::Buffer;
pub use self::image::{Image, ImageFillColor};
pub use self::sampler::{Sampler, SamplerProperty};
pub use self::program::Program;
pub use self::kernel::{Kernel, KernelArg, KernelArgKind, suggest_local_worksize,
    suggest_worksizes};
