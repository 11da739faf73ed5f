use crate::driver::StubDriver;
use crate::prof::{self, ExportOptions};
use crate::{Buffer, CommandQueueProperties, ErrorKind, EventWaitList, MemFlags, Prof,
    ProfAggSort, ProfInfoSort, ProfOverlapSort, Queue, SortOrder};

const LEN: usize = 4096;

fn is_write(name: &str) -> bool {
    name.starts_with('W')
}

#[test]
fn two_queues_write_then_read() {
    let _guard = super::setup();
    let ctx = super::gpu_a_context();
    let q1 = Queue::new(&ctx, None, CommandQueueProperties::PROFILING_ENABLE).unwrap();
    let q2 = Queue::new(&ctx, None, CommandQueueProperties::PROFILING_ENABLE).unwrap();
    let buf1 = Buffer::new::<u32>(&ctx, MemFlags::READ_WRITE, LEN * 4, None).unwrap();
    let buf2 = Buffer::new::<u32>(&ctx, MemFlags::READ_WRITE, LEN * 4, None).unwrap();
    let host1 = vec![1u32; LEN];
    let host2 = vec![2u32; LEN];
    let mut back1 = vec![0u32; LEN];
    let mut back2 = vec![0u32; LEN];

    let mut prof = Prof::new();
    prof.start();

    let w1 = unsafe { buf1.enqueue_write(&q1, false, 0, &host1, None) }.unwrap();
    w1.set_name("W1");
    let w2 = unsafe { buf2.enqueue_write(&q2, false, 0, &host2, None) }.unwrap();
    w2.set_name("W2");

    let mut writes = EventWaitList::new();
    writes.push(&w1).push(&w2);
    let mut writes_again = writes.clone();
    unsafe {
        buf1.enqueue_read(&q1, false, 0, &mut back1, Some(&mut writes)).unwrap().set_name("R1");
        buf2.enqueue_read(&q2, false, 0, &mut back2, Some(&mut writes_again)).unwrap()
            .set_name("R2");
    }
    q1.finish().unwrap();
    q2.finish().unwrap();

    prof.stop();
    prof.add_queue("queue1", &q1).unwrap();
    prof.add_queue("queue2", &q2).unwrap();
    prof.calc().unwrap();

    assert_eq!(back1, host1);
    assert_eq!(back2, host2);

    let w1_agg = prof.agg("W1").unwrap();
    assert!(w1_agg.absolute_time > 0);
    assert_eq!(prof.aggs(ProfAggSort::Name, SortOrder::Asc).len(), 4);
    let rel: f64 = prof.aggs(ProfAggSort::Time, SortOrder::Desc).iter()
        .map(|a| a.relative_time).sum();
    assert!((rel - 1.0).abs() < 1e-6);

    let overlaps = prof.overlaps(ProfOverlapSort::Duration, SortOrder::Desc);
    assert!(!overlaps.is_empty());
    for ovlp in overlaps {
        assert_eq!(is_write(&ovlp.event1_name), is_write(&ovlp.event2_name),
            "{} overlaps {}", ovlp.event1_name, ovlp.event2_name);
    }

    assert!(prof.total_events_eff_time() <= prof.total_events_time());
    assert_eq!(prof.total_events_time(), prof.t_end() - prof.t_start());
    assert!(prof.time_elapsed() >= 0.0);

    let infos = prof.infos(ProfInfoSort::TStart, SortOrder::Asc);
    assert_eq!(infos.len(), 4);
    assert!(is_write(&infos[0].event_name) && is_write(&infos[1].event_name));

    // Profiles are frozen once calculated.
    let err = prof.add_queue("queue3", &q1).unwrap_err();
    assert!(err.is_kind(ErrorKind::InvalidData));
}

/// Times of the reference profile: queue, name, start, end.
const REFERENCE: &[(&str, &str, u64, u64)] = &[
    ("q1", "Event1", 10, 15),
    ("q1", "Event2", 16, 20),
    ("q1", "Event3", 17, 30),
    ("q3", "Event4", 19, 25),
    ("q1", "Event5", 29, 40),
    ("q2", "Event1", 35, 45),
    ("q1", "Event1", 68, 69),
    ("q3", "Event1", 50, 70),
];

fn reference_prof() -> Prof {
    let ctx = super::gpu_a_context();
    let props = CommandQueueProperties::PROFILING_ENABLE;
    let queues = [
        ("q1", Queue::new(&ctx, None, props).unwrap()),
        ("q2", Queue::new(&ctx, None, props).unwrap()),
        ("q3", Queue::new(&ctx, None, props).unwrap()),
    ];

    let mut prof = Prof::new();
    prof.start();
    for &(q, name, start, end) in REFERENCE {
        let queue = &queues.iter().find(|(label, _)| *label == q).unwrap().1;
        let ev = queue.enqueue_marker(None).unwrap();
        ev.set_name(name);
        StubDriver::global().set_event_times(ev.as_raw(), start, start, start, end).unwrap();
    }
    prof.stop();
    for (label, queue) in queues.iter() {
        prof.add_queue(*label, queue).unwrap();
    }
    prof.calc().unwrap();
    prof
}

#[test]
fn reference_profile() {
    let _guard = super::setup();
    let prof = reference_prof();

    assert_eq!(prof.agg("Event1").unwrap().absolute_time, 36);
    assert_eq!(prof.agg("Event5").unwrap().absolute_time, 11);
    assert_eq!(prof.overlaps(ProfOverlapSort::Name1, SortOrder::Asc).len(), 6);
    assert_eq!(prof.total_events_time(), 60);
    assert_eq!(prof.total_events_eff_time(), 43);
    assert_eq!(prof.t_start(), 10);
    assert_eq!(prof.t_end(), 70);

    let top = prof.overlaps(ProfOverlapSort::Duration, SortOrder::Desc)[0];
    assert_eq!((top.event1_name.as_str(), top.event2_name.as_str(), top.duration),
        ("Event3", "Event4", 6));

    let summary = prof.summary((ProfAggSort::Time, SortOrder::Desc),
        (ProfOverlapSort::Duration, SortOrder::Desc)).unwrap();
    assert!(summary.contains(" Aggregate times by event  :"));
    assert!(summary.contains("| Event1 "));
    assert!(summary.contains(" Event overlaps            :\n"));
    let first_agg = summary.find("| Event1 ").unwrap();
    assert!(first_agg < summary.find("| Event3 ").unwrap());
}

#[test]
fn reference_export() {
    let _guard = super::setup();
    let prof = reference_prof();
    let saved = prof::export_options();

    let mut out = Vec::new();
    prof.export_info(&mut out).unwrap();
    let zeroed = String::from_utf8(out).unwrap();
    assert_eq!(zeroed.lines().next(), Some("q1\tEvent1\t0\t0\t0\t5"));

    prof::set_export_options(ExportOptions {
        separator: ",".to_string(),
        newline: "\n".to_string(),
        queue_delim: "'".to_string(),
        evname_delim: "\"".to_string(),
        zero_start: false,
    });
    let mut out = Vec::new();
    let res = prof.export_info(&mut out);
    prof::set_export_options(saved);
    res.unwrap();

    let text = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), REFERENCE.len());
    assert_eq!(lines[0], "'q1',\"Event1\",10,10,10,15");
    assert_eq!(lines[3], "'q3',\"Event4\",19,19,19,25");
    assert_eq!(lines[7], "'q1',\"Event1\",68,68,68,69");
}

#[test]
fn export_to_file() {
    let _guard = super::setup();
    let prof = reference_prof();
    let path = std::env::temp_dir().join(format!("cf4ocl_prof_{}.tsv", std::process::id()));

    prof.export_info_file(&path).unwrap();
    let text = std::fs::read_to_string(&path).unwrap();
    let _ = std::fs::remove_file(&path);
    assert_eq!(text.lines().count(), REFERENCE.len());

    let err = prof.export_info_file(std::env::temp_dir().join("no_such_dir/prof.tsv"))
        .unwrap_err();
    assert!(err.is_kind(ErrorKind::OpenFile));
}

#[test]
fn calc_needs_profiling_queues() {
    let _guard = super::setup();
    let ctx = super::gpu_a_context();
    let queue = Queue::new(&ctx, None, CommandQueueProperties::empty()).unwrap();
    let buf = Buffer::new::<u32>(&ctx, MemFlags::READ_WRITE, LEN * 4, None).unwrap();
    let host = vec![3u32; LEN];

    let mut prof = Prof::new();
    prof.start();
    buf.write(&queue, 0, &host, None).unwrap().set_name("W");
    queue.finish().unwrap();
    prof.stop();
    prof.add_queue("plain", &queue).unwrap();

    let err = prof.calc().unwrap_err();
    assert!(err.is_kind(ErrorKind::InfoUnavailable), "{}", err);
    // A failed calculation leaves nothing behind and fails the same way again.
    assert!(prof.infos(ProfInfoSort::TStart, SortOrder::Asc).is_empty());
    assert!(prof.summary((ProfAggSort::Name, SortOrder::Asc),
        (ProfOverlapSort::Name1, SortOrder::Asc)).is_err());
    let err = prof.calc().unwrap_err();
    assert!(err.is_kind(ErrorKind::InfoUnavailable), "{}", err);
}
