use std::thread;
use std::time::Duration;
use crate::enums::{CommandExecutionStatus, CommandType, ProfilingInfo};
use crate::ffi;
use crate::{wait, Buffer, CommandQueueProperties, ErrorKind, EventWaitList, MemFlags, Queue,
    UserEvent};

#[test]
fn wait_list_is_cleared_after_enqueue() {
    let _guard = super::setup();
    let ctx = super::gpu_a_context();
    let queue = Queue::new(&ctx, None, CommandQueueProperties::empty()).unwrap();
    let buf = Buffer::new::<u32>(&ctx, MemFlags::READ_WRITE, 64, None).unwrap();

    let write = buf.write(&queue, 0, &[7u32; 16], None).unwrap();
    let mut list = write.wait_list();
    assert_eq!(list.len(), 1);

    let mut out = vec![0u32; 16];
    buf.read(&queue, 0, &mut out, Some(&mut list)).unwrap();
    assert!(list.is_empty());
    assert_eq!(out, vec![7u32; 16]);

    // Cleared even when the command is rejected.
    list.push(&write);
    let mut too_long = vec![0u32; 32];
    let err = buf.read(&queue, 0, &mut too_long, Some(&mut list)).unwrap_err();
    assert_eq!(err.api_status(), Some(ffi::CL_INVALID_VALUE));
    assert!(list.is_empty());
}

#[test]
fn wait_on_lists() {
    let _guard = super::setup();
    let ctx = super::gpu_a_context();
    let queue = Queue::new(&ctx, None, CommandQueueProperties::empty()).unwrap();
    let buf = Buffer::new::<u8>(&ctx, MemFlags::READ_WRITE, 32, None).unwrap();

    let events: Vec<_> = (0..3)
        .map(|i| unsafe { buf.enqueue_write(&queue, false, i * 8, &[i as u8; 8], None) }.unwrap())
        .collect();
    let mut list = EventWaitList::from(&events[..]);
    assert_eq!(list.as_raw().len(), 3);
    wait(&mut list).unwrap();
    assert!(list.is_empty());

    // Waiting on an empty list is a no-op.
    list.wait().unwrap();

    for ev in &events {
        assert_eq!(ev.execution_status().unwrap(), CommandExecutionStatus::Complete);
        assert_eq!(ev.command_type().unwrap(), CommandType::WriteBuffer);
        assert_eq!(ev.queue().unwrap(), queue);
    }
}

#[test]
fn queue_keeps_its_events() {
    let _guard = super::setup();
    let ctx = super::gpu_a_context();
    let queue = Queue::new(&ctx, None, CommandQueueProperties::empty()).unwrap();
    let buf = Buffer::new::<u8>(&ctx, MemFlags::READ_WRITE, 16, None).unwrap();

    buf.write(&queue, 0, &[1u8; 16], None).unwrap().set_name("upload");
    let marker = queue.enqueue_marker(None).unwrap();
    queue.enqueue_barrier(None).unwrap();
    queue.finish().unwrap();

    let names: Vec<String> = queue.events().map(|e| e.final_name().unwrap()).collect();
    assert_eq!(names, vec!["upload", "MARKER", "BARRIER"]);
    assert_eq!(marker.name(), None);

    queue.gc();
    assert_eq!(queue.num_events(), 0);
    // Still alive through `marker`.
    assert_eq!(marker.command_type().unwrap(), CommandType::Marker);
    assert!(marker.queue().is_some());
}

#[test]
fn profiling_needs_enabled_queue() {
    let _guard = super::setup();
    let ctx = super::gpu_a_context();
    let queue = Queue::new(&ctx, None, CommandQueueProperties::empty()).unwrap();
    let buf = Buffer::new::<u8>(&ctx, MemFlags::READ_WRITE, 16, None).unwrap();
    let ev = buf.write(&queue, 0, &[0u8; 16], None).unwrap();

    let err = ev.profiling_info(ProfilingInfo::Start).unwrap_err();
    assert!(err.is_kind(ErrorKind::InfoUnavailable));
}

#[test]
fn user_event_releases_waiter() {
    let _guard = super::setup();
    let ctx = super::gpu_a_context();
    let user = UserEvent::new(&ctx).unwrap();
    assert_eq!(user.command_type().unwrap(), CommandType::User);
    assert_eq!(user.execution_status().unwrap(), CommandExecutionStatus::Submitted);

    let setter = {
        let user = user.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            user.set_complete().unwrap();
        })
    };
    user.wait().unwrap();
    setter.join().unwrap();
    assert_eq!(user.execution_status().unwrap(), CommandExecutionStatus::Complete);

    let err = user.set_complete().unwrap_err();
    assert_eq!(err.api_status(), Some(ffi::CL_INVALID_OPERATION));
}

#[test]
fn markers_need_opencl_1_2() {
    let _guard = super::setup();
    let ctx = super::platform_b_context();
    let queue = Queue::new(&ctx, None, CommandQueueProperties::empty()).unwrap();

    let err = queue.enqueue_marker(None).unwrap_err();
    assert!(err.is_kind(ErrorKind::UnsupportedVersion));
    let err = queue.enqueue_barrier(None).unwrap_err();
    assert!(err.is_kind(ErrorKind::UnsupportedVersion));

    // User events only need 1.1.
    let user = UserEvent::new(&ctx).unwrap();
    user.set_status(-1).unwrap();
    assert_eq!(user.execution_status().unwrap_err().api_status(), Some(-1));
}
