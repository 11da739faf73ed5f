//! OpenCL buffers.

use std::mem;
use std::ptr;
use crate::driver;
use crate::enums::{ClassTag, CommandType, MemInfo};
use crate::error::{Error, ErrorKind, Result, ApiResultExt};
use crate::ffi::{c_void, RawObject};
use crate::flags::{MapFlags, MemFlags};
use crate::prm::{self, OclPrm};
use crate::standard::event::{self, Event, EventWaitList};
use crate::standard::memobj::{self, MappedRegion, MemObject};
use crate::standard::{Context, Queue};
use crate::types::OpenclVersion;
use crate::wrapper::{self, Wrapper};

pub struct BufferData {
    context: Context,
}

/// A buffer wrapper.
#[derive(Clone)]
pub struct Buffer(pub(crate) Wrapper<BufferData>);

impl_wrapper!(Buffer, BufferData);

impl Buffer {
    /// Creates a buffer of `size` bytes.
    ///
    /// When `host_data` is given its first `size` bytes are copied into the
    /// new buffer (`COPY_HOST_PTR` is implied). `USE_HOST_PTR` is rejected:
    /// the buffer would outlive the borrow of the host data.
    pub fn new<T: OclPrm>(context: &Context, flags: MemFlags, size: usize,
            host_data: Option<&[T]>) -> Result<Buffer> {
        if flags.contains(MemFlags::USE_HOST_PTR) {
            return Err(Error::lib(ErrorKind::BadArguments,
                "USE_HOST_PTR is not supported with borrowed host data."));
        }
        let mut flags = flags;
        let host_ptr = match host_data {
            Some(data) => {
                let bytes = data.len() * mem::size_of::<T>();
                if bytes < size {
                    return Err(Error::lib(ErrorKind::BadArguments, format!("Host data holds {} \
                        bytes but the buffer size is {} bytes.", bytes, size)));
                }
                flags |= MemFlags::COPY_HOST_PTR;
                data.as_ptr() as *mut c_void
            },
            None => {
                if flags.contains(MemFlags::COPY_HOST_PTR) {
                    return Err(Error::lib(ErrorKind::BadArguments,
                        "COPY_HOST_PTR requires host data."));
                }
                ptr::null_mut()
            },
        };

        let native = unsafe {
            driver::get().create_buffer(context.as_raw(), flags, size, host_ptr)
                .or_api("clCreateBuffer")?
        };
        trace!("Created a buffer of {} bytes with flags {:?}.", size, flags);
        Wrapper::from_owned(ClassTag::Buffer, native, BufferData { context: context.clone() })
            .map(Buffer)
    }

    /// Creates a buffer holding a copy of `data`.
    pub fn from_slice<T: OclPrm>(context: &Context, flags: MemFlags, data: &[T])
            -> Result<Buffer> {
        Buffer::new(context, flags, data.len() * mem::size_of::<T>(), Some(data))
    }

    /// Wraps an existing native buffer, taking a new native reference.
    pub fn from_raw(native: RawObject) -> Result<Buffer> {
        if let Some(existing) = Wrapper::lookup(native) {
            return Ok(Buffer(existing));
        }
        let context = Context::from_raw(wrapper::query_param(native, MemInfo::Context)?
            .as_object()?)?;
        Wrapper::new_wrap(ClassTag::Buffer, native, BufferData { context }).map(Buffer)
    }

    pub fn context(&self) -> &Context {
        &self.data().context
    }

    /// Size in bytes.
    pub fn size(&self) -> Result<usize> {
        memobj::mem_size(&self.0)
    }

    pub fn flags(&self) -> Result<MemFlags> {
        memobj::mem_flags(&self.0)
    }

    /// Enqueues a read of `data.len()` elements starting `offset` bytes into
    /// the buffer.
    ///
    /// ## Safety
    ///
    /// With `blocking == false`, `data` must not be touched until the
    /// returned event completes.
    pub unsafe fn enqueue_read<T: OclPrm>(&self, queue: &Queue, blocking: bool, offset: usize,
            data: &mut [T], wait: Option<&mut EventWaitList>) -> Result<Event> {
        let bytes = prm::as_bytes_mut(data);
        let native = event::with_wait_list(wait, |w| {
            driver::get().enqueue_read_buffer(queue.as_raw(), self.as_raw(), blocking, offset,
                bytes, w).or_api("clEnqueueReadBuffer")
        })?;
        queue.produce_event(native, Some(CommandType::ReadBuffer))
    }

    /// Reads into `data`, blocking until the read completes.
    pub fn read<T: OclPrm>(&self, queue: &Queue, offset: usize, data: &mut [T],
            wait: Option<&mut EventWaitList>) -> Result<Event> {
        unsafe { self.enqueue_read(queue, true, offset, data, wait) }
    }

    /// Enqueues a write of `data` starting `offset` bytes into the buffer.
    ///
    /// ## Safety
    ///
    /// With `blocking == false`, `data` must stay valid and unchanged until
    /// the returned event completes.
    pub unsafe fn enqueue_write<T: OclPrm>(&self, queue: &Queue, blocking: bool, offset: usize,
            data: &[T], wait: Option<&mut EventWaitList>) -> Result<Event> {
        let bytes = prm::as_bytes(data);
        let native = event::with_wait_list(wait, |w| {
            driver::get().enqueue_write_buffer(queue.as_raw(), self.as_raw(), blocking, offset,
                bytes, w).or_api("clEnqueueWriteBuffer")
        })?;
        queue.produce_event(native, Some(CommandType::WriteBuffer))
    }

    /// Writes `data`, blocking until the write completes.
    pub fn write<T: OclPrm>(&self, queue: &Queue, offset: usize, data: &[T],
            wait: Option<&mut EventWaitList>) -> Result<Event> {
        unsafe { self.enqueue_write(queue, true, offset, data, wait) }
    }

    /// Copies `size` bytes from this buffer into `dst`.
    pub fn enqueue_copy(&self, queue: &Queue, dst: &Buffer, src_offset: usize,
            dst_offset: usize, size: usize, wait: Option<&mut EventWaitList>) -> Result<Event> {
        let native = event::with_wait_list(wait, |w| {
            driver::get().enqueue_copy_buffer(queue.as_raw(), self.as_raw(), dst.as_raw(),
                src_offset, dst_offset, size, w).or_api("clEnqueueCopyBuffer")
        })?;
        queue.produce_event(native, Some(CommandType::CopyBuffer))
    }

    /// Enqueues the mapping of `size` bytes at `offset` into host memory.
    ///
    /// ## Safety
    ///
    /// With `blocking == false` the region must not be accessed until the
    /// returned event completes.
    pub unsafe fn enqueue_map(&self, queue: &Queue, blocking: bool, flags: MapFlags,
            offset: usize, size: usize, wait: Option<&mut EventWaitList>)
            -> Result<(MappedRegion, Event)> {
        let (mapped, native) = event::with_wait_list(wait, |w| {
            driver::get().enqueue_map_buffer(queue.as_raw(), self.as_raw(), blocking, flags,
                offset, size, w).or_api("clEnqueueMapBuffer")
        })?;
        let event = queue.produce_event(native, Some(CommandType::MapBuffer))?;
        let region = MappedRegion::new(mapped.ptr, size, 0, 0, Box::new(self.clone()));
        Ok((region, event))
    }

    /// Maps a region, blocking until it is accessible.
    pub fn map(&self, queue: &Queue, flags: MapFlags, offset: usize, size: usize,
            wait: Option<&mut EventWaitList>) -> Result<(MappedRegion, Event)> {
        unsafe { self.enqueue_map(queue, true, flags, offset, size, wait) }
    }

    /// Fills `size` bytes at `offset` with repetitions of `pattern`. Requires
    /// OpenCL 1.2.
    pub fn enqueue_fill<T: OclPrm>(&self, queue: &Queue, pattern: &[T], offset: usize,
            size: usize, wait: Option<&mut EventWaitList>) -> Result<Event> {
        self.context().require_version(OpenclVersion::V1_2, "Buffer fill")?;
        let pattern = prm::as_bytes(pattern);
        let native = event::with_wait_list(wait, |w| {
            driver::get().enqueue_fill_buffer(queue.as_raw(), self.as_raw(), pattern, offset,
                size, w).or_api("clEnqueueFillBuffer")
        })?;
        queue.produce_event(native, Some(CommandType::FillBuffer))
    }
}

impl MemObject for Buffer {
    fn as_mem_raw(&self) -> RawObject {
        self.as_raw()
    }

    fn mem_context(&self) -> &Context {
        self.context()
    }

    fn mem_size(&self) -> Result<usize> {
        self.size()
    }

    fn mem_flags(&self) -> Result<MemFlags> {
        self.flags()
    }
}
