//! Events, user events and event wait lists.

use std::fmt;
use std::ops::Deref;
use std::slice;
use std::sync::{Mutex, PoisonError};
use enum_primitive::FromPrimitive;
use crate::driver::{self, InfoAux};
use crate::enums::{ClassTag, CommandExecutionStatus, CommandType, EventInfo, ProfilingInfo};
use crate::error::{Error, ErrorKind, Result, ApiResultExt};
use crate::ffi::{self, RawObject};
use crate::standard::{Context, Queue};
use crate::standard::queue::QueueData;
use crate::types::OpenclVersion;
use crate::wrapper::{WeakWrapper, Wrapper};

pub struct EventData {
    name: Mutex<Option<String>>,
    command_type: Option<CommandType>,
    queue: Option<WeakWrapper<QueueData>>,
}

impl EventData {
    pub(crate) fn new(command_type: Option<CommandType>, queue: Option<WeakWrapper<QueueData>>)
            -> EventData {
        EventData { name: Mutex::new(None), command_type, queue }
    }
}

/// An event wrapper.
///
/// Events produced by an enqueue are owned by the queue which produced them
/// and hold only a weak reference back to it.
#[derive(Clone)]
pub struct Event(pub(crate) Wrapper<EventData>);

impl_wrapper!(Event, EventData);

impl Event {
    /// Wraps an existing native event, taking a new native reference.
    pub fn from_raw(native: RawObject) -> Result<Event> {
        Wrapper::new_wrap_with(ClassTag::Event, native, || EventData::new(None, None)).map(Event)
    }

    /// Tags the event with a name. The profiler groups events by name.
    pub fn set_name<S: Into<String>>(&self, name: S) {
        *self.data().name.lock().unwrap_or_else(PoisonError::into_inner) = Some(name.into());
    }

    /// The name given with `set_name`, if any.
    pub fn name(&self) -> Option<String> {
        self.data().name.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// The event name, or the name of its command type (e.g.
    /// `"WRITE_BUFFER"`) when none was set.
    pub fn final_name(&self) -> Result<String> {
        match self.name() {
            Some(name) => Ok(name),
            None => self.command_type().map(|ct| ct.name().to_string()),
        }
    }

    pub fn command_type(&self) -> Result<CommandType> {
        if let Some(ct) = self.data().command_type {
            return Ok(ct);
        }
        let raw = self.info(EventInfo::CommandType)?.as_scalar::<u32>()?;
        CommandType::from_u32(raw).ok_or_else(|| Error::lib(ErrorKind::InvalidData,
            format!("Unknown command type {:#x}.", raw)))
    }

    /// The current execution status. Not cached.
    pub fn execution_status(&self) -> Result<CommandExecutionStatus> {
        let raw = self.query(EventInfo::CommandExecutionStatus, InfoAux::None)?
            .as_scalar::<i32>()?;
        if raw < 0 {
            return Err(Error::api(raw, "clGetEventInfo"));
        }
        CommandExecutionStatus::from_i32(raw).ok_or_else(|| Error::lib(ErrorKind::InvalidData,
            format!("Unknown execution status {}.", raw)))
    }

    /// The queue which produced this event, if it is still alive.
    pub fn queue(&self) -> Option<Queue> {
        self.data().queue.as_ref().and_then(|q| q.upgrade()).map(Queue)
    }

    pub fn context(&self) -> Result<Context> {
        Context::from_raw(self.info(EventInfo::Context)?.as_object()?)
    }

    /// A profiling timestamp in nanoseconds. Requires a queue created with
    /// `PROFILING_ENABLE`, otherwise `InfoUnavailable` is returned.
    pub fn profiling_info(&self, param: ProfilingInfo) -> Result<u64> {
        self.info(param)?.as_scalar()
    }

    /// Blocks until the event completes.
    pub fn wait(&self) -> Result<()> {
        driver::get().wait_for_events(&[self.as_raw()]).or_api("clWaitForEvents")
    }

    /// Returns a wait list holding this event.
    pub fn wait_list(&self) -> EventWaitList {
        let mut list = EventWaitList::new();
        list.push(self);
        list
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.final_name() {
            Ok(name) => f.write_str(&name),
            Err(_) => write!(f, "{:?}", self.as_raw()),
        }
    }
}

/// An event whose status is set by the host.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserEvent(Event);

impl UserEvent {
    /// Creates a user event in `context`. Requires OpenCL 1.1.
    pub fn new(context: &Context) -> Result<UserEvent> {
        context.require_version(OpenclVersion::V1_1, "User events")?;
        let native = driver::get().create_user_event(context.as_raw())
            .or_api("clCreateUserEvent")?;
        Wrapper::from_owned_with(ClassTag::Event, native,
                || EventData::new(Some(CommandType::User), None))
            .map(|w| UserEvent(Event(w)))
    }

    /// Sets the execution status. `status` is `CL_COMPLETE` or a negative
    /// error code.
    pub fn set_status(&self, status: i32) -> Result<()> {
        driver::get().set_user_event_status(self.as_raw(), status)
            .or_api("clSetUserEventStatus")
    }

    pub fn set_complete(&self) -> Result<()> {
        self.set_status(ffi::CL_COMPLETE)
    }

    pub fn as_event(&self) -> &Event {
        &self.0
    }
}

impl Deref for UserEvent {
    type Target = Event;

    fn deref(&self) -> &Event {
        &self.0
    }
}

/// A list of events a command waits on.
///
/// Every enqueue operation which accepts a wait list clears it once the
/// command has been submitted, whether or not submission succeeded.
#[derive(Clone, Debug, Default)]
pub struct EventWaitList {
    events: Vec<Event>,
    raw: Vec<RawObject>,
}

impl EventWaitList {
    pub fn new() -> EventWaitList {
        EventWaitList::default()
    }

    /// Appends an event.
    pub fn push(&mut self, event: &Event) -> &mut EventWaitList {
        self.raw.push(event.as_raw());
        self.events.push(event.clone());
        self
    }

    pub fn extend<'e, I>(&mut self, events: I) -> &mut EventWaitList
            where I: IntoIterator<Item = &'e Event> {
        for event in events {
            self.push(event);
        }
        self
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn clear(&mut self) {
        self.events.clear();
        self.raw.clear();
    }

    /// The native handles of the listed events.
    pub fn as_raw(&self) -> &[RawObject] {
        &self.raw
    }

    pub fn iter(&self) -> slice::Iter<Event> {
        self.events.iter()
    }

    /// Blocks until every listed event completes, then clears the list.
    pub fn wait(&mut self) -> Result<()> {
        if self.is_empty() {
            return Ok(());
        }
        let res = driver::get().wait_for_events(&self.raw).or_api("clWaitForEvents");
        self.clear();
        res
    }
}

impl<'e> From<&'e [Event]> for EventWaitList {
    fn from(events: &'e [Event]) -> EventWaitList {
        let mut list = EventWaitList::new();
        list.extend(events);
        list
    }
}

impl From<Vec<Event>> for EventWaitList {
    fn from(events: Vec<Event>) -> EventWaitList {
        let raw = events.iter().map(|e| e.as_raw()).collect();
        EventWaitList { events, raw }
    }
}

/// Blocks until every event in `list` completes, then clears it.
pub fn wait(list: &mut EventWaitList) -> Result<()> {
    list.wait()
}

/// Runs `f` with the raw handles of `wait` and clears the list afterwards,
/// whatever the outcome.
pub(crate) fn with_wait_list<T, F>(wait: Option<&mut EventWaitList>, f: F) -> Result<T>
        where F: FnOnce(&[RawObject]) -> Result<T> {
    match wait {
        Some(list) => {
            let res = f(list.as_raw());
            list.clear();
            res
        },
        None => f(&[]),
    }
}
