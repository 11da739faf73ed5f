//! Operations shared by buffers and images.

use std::fmt;
use std::mem;
use std::slice;
use crate::driver;
use crate::enums::{CommandType, MemInfo};
use crate::error::{Error, ErrorKind, Result, ApiResultExt};
use crate::ffi::{c_void, RawObject};
use crate::flags::{MemFlags, MemMigrationFlags};
use crate::prm::OclPrm;
use crate::standard::event::{self, Event, EventWaitList};
use crate::standard::{Context, Queue};
use crate::types::OpenclVersion;
use crate::wrapper::Wrapper;

/// A `cl_mem` wrapper: a buffer or an image.
pub trait MemObject: Send + Sync {
    fn as_mem_raw(&self) -> RawObject;

    /// The context the object was created in.
    fn mem_context(&self) -> &Context;

    /// Size of the object's data store in bytes.
    fn mem_size(&self) -> Result<usize>;

    fn mem_flags(&self) -> Result<MemFlags>;

    /// Enqueues the unmapping of a region previously mapped from this object.
    fn enqueue_unmap(&self, queue: &Queue, region: MappedRegion, wait: Option<&mut EventWaitList>)
            -> Result<Event> {
        if region.mem != self.as_mem_raw() {
            return Err(Error::lib(ErrorKind::BadArguments,
                "The mapped region does not belong to this memory object."));
        }
        let native = event::with_wait_list(wait, |w| unsafe {
            driver::get().enqueue_unmap_mem_object(queue.as_raw(), self.as_mem_raw(), region.ptr,
                w).or_api("clEnqueueUnmapMemObject")
        })?;
        queue.produce_event(native, Some(CommandType::UnmapMemObject))
    }

    /// Enqueues the migration of this object. Requires OpenCL 1.2.
    fn enqueue_migrate(&self, queue: &Queue, flags: MemMigrationFlags,
            wait: Option<&mut EventWaitList>) -> Result<Event> {
        enqueue_migrate(queue, &[self.as_mem_raw()], flags, wait, self.mem_context())
    }
}

/// Enqueues the migration of several memory objects at once. Requires
/// OpenCL 1.2.
pub fn enqueue_migrate_objects(queue: &Queue, objects: &[&dyn MemObject],
        flags: MemMigrationFlags, wait: Option<&mut EventWaitList>) -> Result<Event> {
    let raw: Vec<RawObject> = objects.iter().map(|m| m.as_mem_raw()).collect();
    if raw.is_empty() {
        return Err(Error::lib(ErrorKind::BadArguments, "No memory objects to migrate."));
    }
    enqueue_migrate(queue, &raw, flags, wait, queue.context())
}

fn enqueue_migrate(queue: &Queue, mems: &[RawObject], flags: MemMigrationFlags,
        wait: Option<&mut EventWaitList>, context: &Context) -> Result<Event> {
    context.require_version(OpenclVersion::V1_2, "Memory object migration")?;
    let native = event::with_wait_list(wait, |w| {
        driver::get().enqueue_migrate_mem_objects(queue.as_raw(), mems, flags, w)
            .or_api("clEnqueueMigrateMemObjects")
    })?;
    queue.produce_event(native, Some(CommandType::MigrateMemObjects))
}

pub(crate) fn mem_size<D>(mem: &Wrapper<D>) -> Result<usize> {
    mem.info(MemInfo::Size)?.as_scalar()
}

pub(crate) fn mem_flags<D>(mem: &Wrapper<D>) -> Result<MemFlags> {
    mem.info(MemInfo::Flags)?.as_scalar::<u64>().map(MemFlags::from_bits_truncate)
}

/// A host view of a mapped region of a buffer or image.
///
/// The region stays valid until it is passed to `MemObject::enqueue_unmap`.
/// It keeps the mapped object alive.
pub struct MappedRegion {
    ptr: *mut c_void,
    len: usize,
    row_pitch: usize,
    slice_pitch: usize,
    mem: RawObject,
    _owner: Box<dyn MemObject>,
}

unsafe impl Send for MappedRegion {}
unsafe impl Sync for MappedRegion {}

impl MappedRegion {
    pub(crate) fn new(ptr: *mut c_void, len: usize, row_pitch: usize, slice_pitch: usize,
            owner: Box<dyn MemObject>) -> MappedRegion {
        MappedRegion { ptr, len, row_pitch, slice_pitch, mem: owner.as_mem_raw(), _owner: owner }
    }

    /// Length of the mapped region in bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Row pitch in bytes. Zero for buffers.
    pub fn row_pitch(&self) -> usize {
        self.row_pitch
    }

    pub fn slice_pitch(&self) -> usize {
        self.slice_pitch
    }

    pub fn as_ptr(&self) -> *mut c_void {
        self.ptr
    }

    fn check_view<T: OclPrm>(&self) -> Result<usize> {
        let size = mem::size_of::<T>();
        if self.ptr as usize % mem::align_of::<T>() != 0 || self.len % size != 0 {
            return Err(Error::lib(ErrorKind::InvalidData, format!("A mapped region of {} bytes \
                at {:p} cannot be viewed as elements of {} bytes.", self.len, self.ptr, size)));
        }
        Ok(self.len / size)
    }

    pub fn as_slice<T: OclPrm>(&self) -> Result<&[T]> {
        let len = self.check_view::<T>()?;
        Ok(unsafe { slice::from_raw_parts(self.ptr as *const T, len) })
    }

    pub fn as_slice_mut<T: OclPrm>(&mut self) -> Result<&mut [T]> {
        let len = self.check_view::<T>()?;
        Ok(unsafe { slice::from_raw_parts_mut(self.ptr as *mut T, len) })
    }
}

impl fmt::Debug for MappedRegion {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("MappedRegion")
            .field("ptr", &self.ptr)
            .field("len", &self.len)
            .field("mem", &self.mem)
            .finish()
    }
}
