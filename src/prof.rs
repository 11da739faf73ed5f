//! Event profiling.
//!
//! A [`Prof`] collects the events of one or more queues created with
//! `PROFILING_ENABLE`, aggregates their execution times by event name and
//! finds the time spent by pairs of events running at once.
//!
//! ```ignore
//! let mut prof = Prof::new();
//! prof.start();
//! // ... enqueue work on `q1` and `q2` ...
//! prof.stop();
//! prof.add_queue("q1", &q1)?;
//! prof.add_queue("q2", &q2)?;
//! prof.calc()?;
//! prof.print_summary()?;
//! ```

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::{PoisonError, RwLock};
use std::time::{Duration, Instant};
use crate::enums::{CommandType, ProfilingInfo};
use crate::error::{Error, ErrorKind, Result};
use crate::standard::Queue;

lazy_static! {
    static ref EXPORT_OPTIONS: RwLock<ExportOptions> = RwLock::new(ExportOptions::default());
}

/// Formatting of `Prof::export_info`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOptions {
    /// Field separator.
    pub separator: String,
    /// Line terminator.
    pub newline: String,
    /// Wrapped around the queue name.
    pub queue_delim: String,
    /// Wrapped around the event name.
    pub evname_delim: String,
    /// Export timestamps as offsets from the earliest event start.
    pub zero_start: bool,
}

impl Default for ExportOptions {
    fn default() -> ExportOptions {
        ExportOptions {
            separator: "\t".to_string(),
            newline: "\n".to_string(),
            queue_delim: String::new(),
            evname_delim: String::new(),
            zero_start: true,
        }
    }
}

/// The process-wide export options.
pub fn export_options() -> ExportOptions {
    EXPORT_OPTIONS.read().unwrap_or_else(PoisonError::into_inner).clone()
}

/// Replaces the process-wide export options.
pub fn set_export_options(options: ExportOptions) {
    *EXPORT_OPTIONS.write().unwrap_or_else(PoisonError::into_inner) = options;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    fn apply(self, ord: Ordering) -> Ordering {
        match self {
            SortOrder::Asc => ord,
            SortOrder::Desc => ord.reverse(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfAggSort {
    Name,
    Time,
    RelTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfInfoSort {
    Queue,
    Event,
    Type,
    TQueued,
    TSubmit,
    TStart,
    TEnd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfInstSort {
    Instant,
    Name,
    Kind,
    Id,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfOverlapSort {
    Name1,
    Name2,
    Duration,
}

/// Timestamps of one event.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfInfo {
    pub queue_name: String,
    pub event_name: String,
    pub command_type: CommandType,
    pub t_queued: u64,
    pub t_submit: u64,
    pub t_start: u64,
    pub t_end: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ProfInstKind {
    Start,
    End,
}

/// The start or the end of an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfInst {
    pub event_name: String,
    pub queue_name: String,
    pub id: u32,
    pub instant: u64,
    pub kind: ProfInstKind,
}

/// Time spent by all events sharing a name.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfAgg {
    pub event_name: String,
    /// Nanoseconds.
    pub absolute_time: u64,
    /// Share of the time spent by all events, in `[0, 1]`.
    pub relative_time: f64,
}

/// Time during which events named `event1_name` and `event2_name` ran at
/// once. `event1_name <= event2_name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfOverlap {
    pub event1_name: String,
    pub event2_name: String,
    /// Nanoseconds.
    pub duration: u64,
}

/// Results of the analysis of a set of event timestamps.
#[derive(Debug, Default)]
struct Analysis {
    instants: Vec<ProfInst>,
    aggs: Vec<ProfAgg>,
    overlaps: Vec<ProfOverlap>,
    t_min: u64,
    t_max: u64,
    total_events_time: u64,
    total_events_eff_time: u64,
}

impl Analysis {
    fn run(infos: &[ProfInfo]) -> Analysis {
        let mut instants = Vec::with_capacity(infos.len() * 2);
        for (id, info) in infos.iter().enumerate() {
            for &(instant, kind) in &[(info.t_start, ProfInstKind::Start),
                    (info.t_end, ProfInstKind::End)] {
                instants.push(ProfInst {
                    event_name: info.event_name.clone(),
                    queue_name: info.queue_name.clone(),
                    id: id as u32,
                    instant,
                    kind,
                });
            }
        }

        let mut totals: Vec<(String, u64)> = Vec::new();
        for info in infos {
            let dur = info.t_end.saturating_sub(info.t_start);
            match totals.iter_mut().find(|(name, _)| *name == info.event_name) {
                Some(entry) => entry.1 += dur,
                None => totals.push((info.event_name.clone(), dur)),
            }
        }
        let sum: u64 = totals.iter().map(|&(_, t)| t).sum();
        let aggs = totals.into_iter().map(|(event_name, absolute_time)| ProfAgg {
            relative_time: if sum == 0 { 0.0 } else { absolute_time as f64 / sum as f64 },
            event_name,
            absolute_time,
        }).collect();

        instants.sort_by(|a, b| a.instant.cmp(&b.instant)
            .then(a.kind.cmp(&b.kind))
            .then_with(|| a.event_name.cmp(&b.event_name))
            .then(a.id.cmp(&b.id)));
        let overlaps = sweep(&instants);

        let t_min = infos.iter().map(|i| i.t_start).min().unwrap_or(0);
        let t_max = infos.iter().map(|i| i.t_end).max().unwrap_or(0);
        let total_events_time = t_max.saturating_sub(t_min);
        let overlapped: u64 = overlaps.iter().map(|o: &ProfOverlap| o.duration).sum();

        Analysis {
            instants,
            aggs,
            overlaps,
            t_min,
            t_max,
            total_events_time,
            total_events_eff_time: total_events_time.saturating_sub(overlapped),
        }
    }
}

/// Walks instants sorted by time and accumulates, per unordered name pair,
/// the time during which both events were running.
fn sweep(instants: &[ProfInst]) -> Vec<ProfOverlap> {
    // (id, name, start) of the events currently running.
    let mut running: Vec<(u32, &str, u64)> = Vec::new();
    let mut pairs: Vec<((String, String), u64)> = Vec::new();
    let mut index: HashMap<(String, String), usize> = HashMap::new();

    for inst in instants {
        match inst.kind {
            ProfInstKind::Start => {
                running.push((inst.id, inst.event_name.as_str(), inst.instant));
            },
            ProfInstKind::End => {
                let pos = match running.iter().position(|&(id, _, _)| id == inst.id) {
                    Some(pos) => pos,
                    None => continue,
                };
                let (_, name, start) = running.remove(pos);
                for &(_, other, other_start) in &running {
                    let dur = inst.instant.saturating_sub(start.max(other_start));
                    let key = if name <= other {
                        (name.to_string(), other.to_string())
                    } else {
                        (other.to_string(), name.to_string())
                    };
                    match index.get(&key) {
                        Some(&i) => pairs[i].1 += dur,
                        None => {
                            index.insert(key.clone(), pairs.len());
                            pairs.push((key, dur));
                        },
                    }
                }
            },
        }
    }

    pairs.into_iter()
        .filter(|&(_, d)| d > 0)
        .map(|((event1_name, event2_name), duration)| ProfOverlap {
            event1_name,
            event2_name,
            duration,
        })
        .collect()
}

fn sorted_by<'a, T, F>(items: &'a [T], order: SortOrder, cmp: F) -> Vec<&'a T>
        where F: Fn(&T, &T) -> Ordering {
    let mut out: Vec<&T> = items.iter().collect();
    out.sort_by(|a, b| order.apply(cmp(a, b)));
    out
}

/// An event profiler.
#[derive(Debug, Default)]
pub struct Prof {
    queues: Vec<(String, Queue)>,
    infos: Vec<ProfInfo>,
    analysis: Analysis,
    started: Option<Instant>,
    stopped: Option<Instant>,
    calculated: bool,
}

impl Prof {
    pub fn new() -> Prof {
        Prof::default()
    }

    /// Registers the events of `queue` under `label`.
    ///
    /// A queue already registered under `label` is replaced.
    pub fn add_queue<S: Into<String>>(&mut self, label: S, queue: &Queue) -> Result<()> {
        if self.calculated {
            return Err(Error::lib(ErrorKind::InvalidData,
                "Unable to add a queue to a profile which was already calculated."));
        }
        let label = label.into();
        match self.queues.iter_mut().find(|(l, _)| *l == label) {
            Some(entry) => {
                warn!("Profiling queue '{}' was replaced.", label);
                entry.1 = queue.clone();
            },
            None => self.queues.push((label, queue.clone())),
        }
        Ok(())
    }

    /// Starts the wall-clock timer.
    pub fn start(&mut self) {
        self.started = Some(Instant::now());
        self.stopped = None;
    }

    /// Stops the wall-clock timer.
    pub fn stop(&mut self) {
        self.stopped = Some(Instant::now());
    }

    /// Wall-clock seconds between `start` and `stop`, or until now if the
    /// timer is still running. Zero if it was never started.
    pub fn time_elapsed(&self) -> f64 {
        let elapsed = match (self.started, self.stopped) {
            (Some(s), Some(e)) => e.duration_since(s),
            (Some(s), None) => s.elapsed(),
            (None, _) => Duration::from_secs(0),
        };
        elapsed.as_secs() as f64 + f64::from(elapsed.subsec_nanos()) * 1e-9
    }

    /// Harvests the timestamps of every event of the registered queues and
    /// computes aggregates and overlaps.
    pub fn calc(&mut self) -> Result<()> {
        if self.stopped.is_none() {
            return Err(Error::lib(ErrorKind::InvalidData,
                "The profiler must be stopped before calculating."));
        }
        if self.calculated {
            return Err(Error::lib(ErrorKind::InvalidData,
                "The profile was already calculated."));
        }

        let mut infos = Vec::new();
        for (label, queue) in &self.queues {
            for event in queue.events() {
                infos.push(ProfInfo {
                    queue_name: label.clone(),
                    event_name: event.final_name()?,
                    command_type: event.command_type()?,
                    t_queued: event.profiling_info(ProfilingInfo::Queued)?,
                    t_submit: event.profiling_info(ProfilingInfo::Submit)?,
                    t_start: event.profiling_info(ProfilingInfo::Start)?,
                    t_end: event.profiling_info(ProfilingInfo::End)?,
                });
            }
        }
        debug!("Profiling {} event(s) from {} queue(s).", infos.len(), self.queues.len());

        self.analysis = Analysis::run(&infos);
        self.infos = infos;
        self.calculated = true;
        debug!("Found {} aggregate(s) and {} overlap(s).", self.analysis.aggs.len(),
            self.analysis.overlaps.len());
        Ok(())
    }

    fn require_calc(&self) -> Result<()> {
        if self.calculated {
            Ok(())
        } else {
            Err(Error::lib(ErrorKind::InvalidData, "The profile was not calculated yet."))
        }
    }

    pub fn aggs(&self, sort: ProfAggSort, order: SortOrder) -> Vec<&ProfAgg> {
        sorted_by(&self.analysis.aggs, order, |a, b| match sort {
            ProfAggSort::Name => a.event_name.cmp(&b.event_name),
            ProfAggSort::Time => a.absolute_time.cmp(&b.absolute_time),
            ProfAggSort::RelTime => a.relative_time.partial_cmp(&b.relative_time)
                .unwrap_or(Ordering::Equal),
        })
    }

    pub fn infos(&self, sort: ProfInfoSort, order: SortOrder) -> Vec<&ProfInfo> {
        sorted_by(&self.infos, order, |a, b| match sort {
            ProfInfoSort::Queue => a.queue_name.cmp(&b.queue_name),
            ProfInfoSort::Event => a.event_name.cmp(&b.event_name),
            ProfInfoSort::Type => (a.command_type as u32).cmp(&(b.command_type as u32)),
            ProfInfoSort::TQueued => a.t_queued.cmp(&b.t_queued),
            ProfInfoSort::TSubmit => a.t_submit.cmp(&b.t_submit),
            ProfInfoSort::TStart => a.t_start.cmp(&b.t_start),
            ProfInfoSort::TEnd => a.t_end.cmp(&b.t_end),
        })
    }

    pub fn instants(&self, sort: ProfInstSort, order: SortOrder) -> Vec<&ProfInst> {
        sorted_by(&self.analysis.instants, order, |a, b| match sort {
            ProfInstSort::Instant => a.instant.cmp(&b.instant),
            ProfInstSort::Name => a.event_name.cmp(&b.event_name),
            ProfInstSort::Kind => a.kind.cmp(&b.kind),
            ProfInstSort::Id => a.id.cmp(&b.id),
        })
    }

    pub fn overlaps(&self, sort: ProfOverlapSort, order: SortOrder) -> Vec<&ProfOverlap> {
        sorted_by(&self.analysis.overlaps, order, |a, b| match sort {
            ProfOverlapSort::Name1 => a.event1_name.cmp(&b.event1_name),
            ProfOverlapSort::Name2 => a.event2_name.cmp(&b.event2_name),
            ProfOverlapSort::Duration => a.duration.cmp(&b.duration),
        })
    }

    /// The aggregate for events named `event_name`.
    pub fn agg(&self, event_name: &str) -> Option<&ProfAgg> {
        self.analysis.aggs.iter().find(|a| a.event_name == event_name)
    }

    /// Nanoseconds between the earliest event start and the latest event end.
    pub fn total_events_time(&self) -> u64 {
        self.analysis.total_events_time
    }

    /// `total_events_time` minus the time during which events overlapped.
    pub fn total_events_eff_time(&self) -> u64 {
        self.analysis.total_events_eff_time
    }

    /// The earliest event start in device nanoseconds. Wall-clock time between
    /// `start` and `stop` is given by `time_elapsed`.
    pub fn t_start(&self) -> u64 {
        self.analysis.t_min
    }

    /// The latest event end in device nanoseconds.
    pub fn t_end(&self) -> u64 {
        self.analysis.t_max
    }

    /// Formats the aggregate and overlap tables.
    pub fn summary(&self, agg_sort: (ProfAggSort, SortOrder),
            overlap_sort: (ProfOverlapSort, SortOrder)) -> Result<String> {
        self.require_calc()?;
        let rule = format!("   {}\n", "-".repeat(66));
        let mut s = String::from("\n");

        s.push_str(" Aggregate times by event  :\n");
        s.push_str(&rule);
        s.push_str("   | Event name                     | Rel. time (%) | Abs. time (s) |\n");
        s.push_str(&rule);
        for agg in self.aggs(agg_sort.0, agg_sort.1) {
            s.push_str(&format!("   | {:<30.30} | {:>13.4} | {:>13.4e} |\n", agg.event_name,
                agg.relative_time * 100.0, agg.absolute_time as f64 * 1e-9));
        }
        s.push_str(&rule);
        if self.total_events_time() > 0 {
            s.push_str(&format!("{:36}|         Total | {:>13.4e} |\n", "",
                self.total_events_time() as f64 * 1e-9));
            s.push_str(&format!("{:36}{}\n", "", "-".repeat(33)));
        }

        if self.analysis.overlaps.is_empty() {
            s.push_str(" Event overlaps            : None\n");
        } else {
            s.push_str(" Event overlaps            :\n");
            s.push_str(&rule);
            s.push_str("   | Event 1                | Event 2                | Overlap (s)  |\n");
            s.push_str(&rule);
            for ovlp in self.overlaps(overlap_sort.0, overlap_sort.1) {
                s.push_str(&format!("   | {:<22.22} | {:<22.22} | {:>12.4e} |\n",
                    ovlp.event1_name, ovlp.event2_name, ovlp.duration as f64 * 1e-9));
            }
            s.push_str(&rule);
            let overlapped = self.total_events_time() - self.total_events_eff_time();
            s.push_str(&format!("{:28}|                  Total | {:>12.4e} |\n", "",
                overlapped as f64 * 1e-9));
            s.push_str(&format!("{:28}{}\n", "", "-".repeat(41)));
            s.push_str(&format!(" Tot. of all events (eff.) : {:e}s\n",
                self.total_events_eff_time() as f64 * 1e-9));
        }

        if self.started.is_some() {
            let elapsed = self.time_elapsed();
            let device = if elapsed > 0.0 {
                self.total_events_eff_time() as f64 * 1e-9 * 100.0 / elapsed
            } else {
                0.0
            };
            s.push_str(&format!(" Total elapsed time        : {:e}s\n", elapsed));
            s.push_str(&format!(" Time spent in device      : {:.2}%\n", device));
            s.push_str(&format!(" Time spent in host        : {:.2}%\n", 100.0 - device));
        }
        s.push('\n');
        Ok(s)
    }

    /// Prints the summary to stdout, aggregates and overlaps sorted by
    /// decreasing time.
    pub fn print_summary(&self) -> Result<()> {
        let summary = self.summary((ProfAggSort::Time, SortOrder::Desc),
            (ProfOverlapSort::Duration, SortOrder::Desc))?;
        let stdout = io::stdout();
        let mut out = stdout.lock();
        out.write_all(summary.as_bytes()).map_err(|err| Error::io(ErrorKind::StreamWrite,
            "Unable to print the profiling summary.", err))
    }

    /// Writes one line per event, ordered by start time, with the columns
    /// queue, event name, queued, submit, start and end.
    pub fn export_info<W: Write>(&self, out: &mut W) -> Result<()> {
        self.require_calc()?;
        let opts = export_options();
        let origin = if opts.zero_start { self.analysis.t_min } else { 0 };
        let sep = &opts.separator;

        for info in self.infos(ProfInfoSort::TStart, SortOrder::Asc) {
            write!(out, "{qd}{}{qd}{sep}{ed}{}{ed}{sep}{}{sep}{}{sep}{}{sep}{}{nl}",
                info.queue_name, info.event_name,
                info.t_queued.saturating_sub(origin), info.t_submit.saturating_sub(origin),
                info.t_start.saturating_sub(origin), info.t_end.saturating_sub(origin),
                qd = opts.queue_delim, ed = opts.evname_delim, sep = sep, nl = opts.newline)
                .map_err(|err| Error::io(ErrorKind::StreamWrite,
                    "Unable to export profiling information.", err))?;
        }
        Ok(())
    }

    /// Exports to a new file at `path`.
    pub fn export_info_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|err| Error::io(ErrorKind::OpenFile,
            format!("Unable to create '{}'.", path.display()), err))?;
        let mut out = BufWriter::new(file);
        self.export_info(&mut out)?;
        out.flush().map_err(|err| Error::io(ErrorKind::StreamWrite,
            format!("Unable to write '{}'.", path.display()), err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(queue: &str, name: &str, start: u64, end: u64) -> ProfInfo {
        ProfInfo {
            queue_name: queue.to_string(),
            event_name: name.to_string(),
            command_type: CommandType::NdrangeKernel,
            t_queued: start,
            t_submit: start,
            t_start: start,
            t_end: end,
        }
    }

    fn reference() -> Vec<ProfInfo> {
        vec![
            info("q1", "Event1", 10, 15),
            info("q1", "Event2", 16, 20),
            info("q1", "Event3", 17, 30),
            info("q3", "Event4", 19, 25),
            info("q1", "Event5", 29, 40),
            info("q2", "Event1", 35, 45),
            info("q1", "Event1", 68, 69),
            info("q3", "Event1", 50, 70),
        ]
    }

    fn overlap(a: &Analysis, n1: &str, n2: &str) -> Option<u64> {
        a.overlaps.iter().find(|o| o.event1_name == n1 && o.event2_name == n2)
            .map(|o| o.duration)
    }

    #[test]
    fn reference_aggregates() {
        let a = Analysis::run(&reference());
        let time = |n: &str| a.aggs.iter().find(|g| g.event_name == n).map(|g| g.absolute_time);
        assert_eq!(time("Event1"), Some(36));
        assert_eq!(time("Event2"), Some(4));
        assert_eq!(time("Event3"), Some(13));
        assert_eq!(time("Event4"), Some(6));
        assert_eq!(time("Event5"), Some(11));
        let rel: f64 = a.aggs.iter().map(|g| g.relative_time).sum();
        assert!((rel - 1.0).abs() < 1e-9);
    }

    #[test]
    fn reference_overlaps() {
        let a = Analysis::run(&reference());
        assert_eq!(a.overlaps.len(), 6);
        assert_eq!(overlap(&a, "Event3", "Event4"), Some(6));
        assert_eq!(overlap(&a, "Event1", "Event5"), Some(5));
        assert_eq!(overlap(&a, "Event2", "Event3"), Some(3));
        assert_eq!(overlap(&a, "Event3", "Event5"), Some(1));
        assert_eq!(overlap(&a, "Event2", "Event4"), Some(1));
        assert_eq!(overlap(&a, "Event1", "Event1"), Some(1));
        assert_eq!(a.total_events_time, 60);
        assert_eq!(a.total_events_eff_time, 43);
        assert_eq!(a.t_min, 10);
        assert_eq!(a.t_max, 70);
    }

    #[test]
    fn touching_events_do_not_overlap() {
        let a = Analysis::run(&[info("q1", "A", 0, 10), info("q2", "B", 10, 20)]);
        assert!(a.overlaps.is_empty());
        assert_eq!(a.total_events_eff_time, a.total_events_time);
    }

    #[test]
    fn zero_duration_events() {
        let a = Analysis::run(&[info("q1", "A", 5, 5), info("q1", "B", 7, 7)]);
        assert!(a.aggs.iter().all(|g| g.relative_time == 0.0));
        assert_eq!(a.instants.len(), 4);
    }

    #[test]
    fn overlap_bounded_by_shorter_event() {
        let infos = [
            info("q1", "A", 0, 10),
            info("q2", "B", 2, 12),
            info("q3", "C", 4, 14),
            info("q4", "D", 1, 3),
        ];
        let a = Analysis::run(&infos);
        let dur = |n: &str| infos.iter().find(|i| i.event_name == n)
            .map(|i| i.t_end - i.t_start).unwrap();
        for o in &a.overlaps {
            assert!(o.event1_name <= o.event2_name);
            assert!(o.duration <= dur(&o.event1_name).min(dur(&o.event2_name)), "{:?}", o);
        }
        assert_eq!(overlap(&a, "A", "B"), Some(8));
        assert_eq!(overlap(&a, "A", "C"), Some(6));
        assert_eq!(overlap(&a, "B", "C"), Some(8));
        assert_eq!(overlap(&a, "A", "D"), Some(2));
        assert_eq!(overlap(&a, "B", "D"), Some(1));
        assert_eq!(overlap(&a, "C", "D"), None);
        assert_eq!(a.overlaps.len(), 5);
        assert_eq!(a.total_events_time, 14);
        assert_eq!(a.total_events_eff_time, 0);
    }

    #[test]
    fn zero_length_and_touching_events_have_no_overlap_rows() {
        let a = Analysis::run(&[
            info("q1", "A", 0, 10),
            info("q2", "Z", 5, 5),
            info("q3", "B", 10, 20),
            info("q1", "C", 20, 20),
        ]);
        assert!(a.overlaps.is_empty(), "{:?}", a.overlaps);
        assert_eq!(a.total_events_eff_time, 20);
    }

    #[test]
    fn instants_sorted_by_time_then_kind() {
        let a = Analysis::run(&[info("q1", "A", 0, 10), info("q2", "B", 10, 20)]);
        let kinds: Vec<_> = a.instants.iter().map(|i| (i.instant, i.kind)).collect();
        assert_eq!(kinds, vec![(0, ProfInstKind::Start), (10, ProfInstKind::Start),
            (10, ProfInstKind::End), (20, ProfInstKind::End)]);
    }

    #[test]
    fn calc_requires_stop() {
        let mut prof = Prof::new();
        prof.start();
        assert!(prof.calc().unwrap_err().is_kind(ErrorKind::InvalidData));
        prof.stop();
        prof.calc().unwrap();
        assert!(prof.calc().unwrap_err().is_kind(ErrorKind::InvalidData));
        let summary = prof.summary((ProfAggSort::Name, SortOrder::Asc),
            (ProfOverlapSort::Name1, SortOrder::Asc)).unwrap();
        assert!(summary.contains("Event overlaps            : None"));
    }
}
