//! An OpenCL command queue.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::vec;
use crate::driver;
use crate::enums::{ClassTag, CommandType, QueueInfo};
use crate::error::{Result, ApiResultExt};
use crate::ffi::RawObject;
use crate::flags::CommandQueueProperties;
use crate::standard::device::DevContainer;
use crate::standard::event::{self, Event, EventData, EventWaitList};
use crate::standard::{Context, Device};
use crate::types::OpenclVersion;
use crate::wrapper::{self, Wrapper};

/// Events produced by a queue, in production order.
#[derive(Default)]
struct EventTable {
    by_handle: HashMap<RawObject, Event>,
    order: Vec<RawObject>,
}

pub struct QueueData {
    context: Context,
    device: Device,
    events: Mutex<EventTable>,
}

impl QueueData {
    fn events(&self) -> MutexGuard<EventTable> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A command queue wrapper.
///
/// A queue keeps its context and device alive and owns every event produced
/// by commands enqueued on it, until `gc` is called or the queue is dropped.
#[derive(Clone)]
pub struct Queue(pub(crate) Wrapper<QueueData>);

impl_wrapper!(Queue, QueueData);

impl Queue {
    /// Creates a queue on `device`, or on the first device of `context` when
    /// `device` is `None`.
    pub fn new(context: &Context, device: Option<&Device>, properties: CommandQueueProperties)
            -> Result<Queue> {
        let device = match device {
            Some(d) => d.clone(),
            None => context.device(0)?,
        };
        let native = driver::get().create_command_queue(context.as_raw(), device.as_raw(),
            properties).or_api("clCreateCommandQueue")?;
        let data = QueueData {
            context: context.clone(),
            device,
            events: Mutex::new(EventTable::default()),
        };
        Wrapper::from_owned(ClassTag::Queue, native, data).map(Queue)
    }

    /// Wraps an existing native queue, taking a new native reference.
    pub fn from_raw(native: RawObject) -> Result<Queue> {
        if let Some(existing) = Wrapper::lookup(native) {
            return Ok(Queue(existing));
        }
        let context = Context::from_raw(wrapper::query_param(native, QueueInfo::Context)?
            .as_object()?)?;
        let device = Device::from_raw(wrapper::query_param(native, QueueInfo::Device)?
            .as_object()?)?;
        let data = QueueData { context, device, events: Mutex::new(EventTable::default()) };
        Wrapper::new_wrap(ClassTag::Queue, native, data).map(Queue)
    }

    pub fn context(&self) -> &Context {
        &self.data().context
    }

    pub fn device(&self) -> &Device {
        &self.data().device
    }

    pub fn properties(&self) -> Result<CommandQueueProperties> {
        self.info(QueueInfo::Properties)?.as_scalar::<u64>()
            .map(CommandQueueProperties::from_bits_truncate)
    }

    /// Issues all previously queued commands to the device.
    pub fn flush(&self) -> Result<()> {
        driver::get().flush(self.as_raw()).or_api("clFlush")
    }

    /// Blocks until all commands in this queue have completed.
    pub fn finish(&self) -> Result<()> {
        driver::get().finish(self.as_raw()).or_api("clFinish")
    }

    /// Enqueues a marker which completes once the events in `wait` (or, when
    /// there are none, all previously enqueued commands) have completed.
    /// Requires OpenCL 1.2.
    pub fn enqueue_marker(&self, wait: Option<&mut EventWaitList>) -> Result<Event> {
        self.context().require_version(OpenclVersion::V1_2, "Marker with wait list")?;
        let native = event::with_wait_list(wait, |w| {
            driver::get().enqueue_marker(self.as_raw(), w).or_api("clEnqueueMarkerWithWaitList")
        })?;
        self.produce_event(native, Some(CommandType::Marker))
    }

    /// Enqueues a barrier. Requires OpenCL 1.2.
    pub fn enqueue_barrier(&self, wait: Option<&mut EventWaitList>) -> Result<Event> {
        self.context().require_version(OpenclVersion::V1_2, "Barrier with wait list")?;
        let native = event::with_wait_list(wait, |w| {
            driver::get().enqueue_barrier(self.as_raw(), w).or_api("clEnqueueBarrierWithWaitList")
        })?;
        self.produce_event(native, Some(CommandType::Barrier))
    }

    /// Wraps a freshly produced native event and records it on this queue.
    pub(crate) fn produce_event(&self, native: RawObject, command_type: Option<CommandType>)
            -> Result<Event> {
        let weak = self.0.downgrade();
        let event = Wrapper::from_owned_with(ClassTag::Event, native,
            move || EventData::new(command_type, Some(weak))).map(Event)?;

        let mut table = self.data().events();
        if !table.by_handle.contains_key(&native) {
            table.order.push(native);
            table.by_handle.insert(native, event.clone());
        }
        trace!("Queue {:?} now holds {} event(s).", self.as_raw(), table.order.len());
        Ok(event)
    }

    /// A snapshot of the events produced by this queue, oldest first.
    pub fn events(&self) -> vec::IntoIter<Event> {
        let table = self.data().events();
        let events: Vec<Event> = table.order.iter()
            .filter_map(|h| table.by_handle.get(h).cloned())
            .collect();
        events.into_iter()
    }

    pub fn num_events(&self) -> usize {
        self.data().events().order.len()
    }

    /// Releases every event held by this queue. Events still referenced
    /// elsewhere stay alive.
    pub fn gc(&self) {
        let dropped = {
            let mut table = self.data().events();
            table.order.clear();
            table.by_handle.drain().map(|(_, e)| e).collect::<Vec<_>>()
        };
        debug!("Queue {:?} released {} event(s).", self.as_raw(), dropped.len());
    }
}

impl fmt::Display for Queue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Queue")
            .field("context", &self.context().as_raw())
            .field("device", &self.device().as_raw())
            .field("events", &self.num_events())
            .finish()
    }
}
