//! Fixed-cadence resource sampling for one process or the whole system.
//!
//! The sampling loop is time-budgeted: it stops once the requested
//! duration has elapsed regardless of how many ticks completed, and
//! interval drift from slow syscalls is tolerated rather than corrected.
//! A target process vanishing mid-run ends the loop early with the
//! partial series collected so far — that is a valid result, not an
//! error.

use crate::target::{MeasurementScope, Target, TargetKind};
use std::thread;
use std::time::{Duration, Instant};
use sysinfo::{
    CpuRefreshKind, MemoryRefreshKind, Pid, ProcessRefreshKind, ProcessesToUpdate, RefreshKind,
    System,
};

/// One point-in-time observation. Disk fields are deltas since the
/// previous tick, not cumulative totals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// Offset from the start of the run; strictly increasing per series.
    pub elapsed: Duration,
    pub cpu_percent: f64,
    pub memory_bytes: u64,
    pub disk_read_bytes: u64,
    pub disk_write_bytes: u64,
}

/// Ordered samples from one measurement run. The sampling thread is the
/// only writer; the series is handed over at join and never mutated
/// afterwards.
#[derive(Debug, Clone)]
pub struct SampleSeries {
    scope: MeasurementScope,
    samples: Vec<Sample>,
    interrupted: bool,
}

impl SampleSeries {
    pub(crate) fn new(scope: MeasurementScope) -> Self {
        Self {
            scope,
            samples: Vec::new(),
            interrupted: false,
        }
    }

    pub(crate) fn push(&mut self, sample: Sample) {
        debug_assert!(
            self.samples.last().map_or(true, |s| s.elapsed < sample.elapsed),
            "samples must be appended in increasing elapsed order"
        );
        self.samples.push(sample);
    }

    pub(crate) fn mark_interrupted(&mut self) {
        self.interrupted = true;
    }

    pub fn scope(&self) -> MeasurementScope {
        self.scope
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// True when the target vanished (or denied access) before the full
    /// duration elapsed.
    pub fn interrupted(&self) -> bool {
        self.interrupted
    }
}

/// Poll `target` every `interval` for up to `duration`.
///
/// CPU% for a tick is the busy fraction observed across the sleep
/// window itself (two refreshes bracket the sleep), not an
/// instantaneous snapshot.
pub fn sample(target: &Target, duration: Duration, interval: Duration) -> SampleSeries {
    // sysinfo cannot compute a meaningful CPU delta over a shorter gap.
    let interval = interval.max(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);

    match target.kind {
        TargetKind::Process => match target.pid {
            Some(pid) => sample_process(pid, duration, interval),
            None => {
                let mut series = SampleSeries::new(MeasurementScope::ProcessScoped);
                series.mark_interrupted();
                series
            }
        },
        TargetKind::System => sample_system(duration, interval),
        TargetKind::NotFound => {
            // Callers are expected to fall back to system scope first;
            // an unresolved target yields an empty interrupted series.
            let mut series = SampleSeries::new(MeasurementScope::ProcessScoped);
            series.mark_interrupted();
            series
        }
    }
}

fn process_refresh() -> ProcessRefreshKind {
    ProcessRefreshKind::nothing()
        .with_cpu()
        .with_memory()
        .with_disk_usage()
}

fn sample_process(pid: Pid, duration: Duration, interval: Duration) -> SampleSeries {
    let mut series = SampleSeries::new(MeasurementScope::ProcessScoped);
    let mut sys = System::new_with_specifics(
        RefreshKind::nothing().with_processes(process_refresh()),
    );

    // Prime the CPU counters; the first reading after a single refresh
    // is meaningless.
    sys.refresh_processes_specifics(ProcessesToUpdate::Some(&[pid]), true, process_refresh());
    if sys.process(pid).is_none() {
        series.mark_interrupted();
        return series;
    }

    let start = Instant::now();
    while start.elapsed() < duration {
        thread::sleep(interval);
        sys.refresh_processes_specifics(ProcessesToUpdate::Some(&[pid]), true, process_refresh());
        let Some(process) = sys.process(pid) else {
            series.mark_interrupted();
            break;
        };
        let disk = process.disk_usage();
        series.push(Sample {
            elapsed: start.elapsed(),
            cpu_percent: f64::from(process.cpu_usage()),
            memory_bytes: process.memory(),
            // sysinfo reports process disk usage relative to the
            // previous refresh, which is exactly our per-tick delta.
            disk_read_bytes: disk.read_bytes,
            disk_write_bytes: disk.written_bytes,
        });
    }

    series
}

fn sample_system(duration: Duration, interval: Duration) -> SampleSeries {
    let mut series = SampleSeries::new(MeasurementScope::SystemScoped);
    let mut sys = System::new_with_specifics(
        RefreshKind::nothing()
            .with_cpu(CpuRefreshKind::nothing().with_cpu_usage())
            .with_memory(MemoryRefreshKind::nothing().with_ram()),
    );

    sys.refresh_cpu_usage();
    sys.refresh_memory();
    let mut last_disk = read_system_disk_counters();

    let start = Instant::now();
    while start.elapsed() < duration {
        thread::sleep(interval);
        sys.refresh_cpu_usage();
        sys.refresh_memory();

        let current_disk = read_system_disk_counters();
        let (read_delta, write_delta) = match (last_disk, current_disk) {
            (Some(prev), Some(cur)) => (
                cur.0.saturating_sub(prev.0),
                cur.1.saturating_sub(prev.1),
            ),
            _ => (0, 0),
        };
        last_disk = current_disk;

        series.push(Sample {
            elapsed: start.elapsed(),
            cpu_percent: f64::from(sys.global_cpu_usage()),
            memory_bytes: sys.used_memory(),
            disk_read_bytes: read_delta,
            disk_write_bytes: write_delta,
        });
    }

    series
}

/// Cumulative machine-wide (read, written) byte counters.
///
/// Linux only: summed 512-byte sector counters from `/proc/diskstats`
/// for whole-disk devices. `None` elsewhere — system-scoped series then
/// carry zero disk deltas.
fn read_system_disk_counters() -> Option<(u64, u64)> {
    if !cfg!(target_os = "linux") {
        return None;
    }
    let content = std::fs::read_to_string("/proc/diskstats").ok()?;
    let mut read_bytes = 0u64;
    let mut written_bytes = 0u64;
    for line in content.lines() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 10 || !is_whole_disk(fields[2]) {
            continue;
        }
        let (Ok(sectors_read), Ok(sectors_written)) =
            (fields[5].parse::<u64>(), fields[9].parse::<u64>())
        else {
            continue;
        };
        read_bytes = read_bytes.saturating_add(sectors_read.saturating_mul(512));
        written_bytes = written_bytes.saturating_add(sectors_written.saturating_mul(512));
    }
    Some((read_bytes, written_bytes))
}

/// Whole physical disks only — counting partitions alongside their
/// parent device would double every byte.
fn is_whole_disk(name: &str) -> bool {
    for prefix in ["loop", "ram", "dm-", "zram", "md", "sr"] {
        if name.starts_with(prefix) {
            return false;
        }
    }
    if let Some(rest) = name.strip_prefix("nvme") {
        return !rest.contains('p');
    }
    if let Some(rest) = name.strip_prefix("mmcblk") {
        return !rest.contains('p');
    }
    if ["sd", "hd", "vd", "xvd"]
        .iter()
        .any(|p| name.starts_with(p))
    {
        return !name.ends_with(|c: char| c.is_ascii_digit());
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::Command;

    const TICK: Duration = Duration::from_millis(250);

    #[test]
    fn test_whole_disk_filter() {
        assert!(is_whole_disk("sda"));
        assert!(is_whole_disk("nvme0n1"));
        assert!(is_whole_disk("vdb"));
        assert!(is_whole_disk("mmcblk0"));

        assert!(!is_whole_disk("sda1"));
        assert!(!is_whole_disk("nvme0n1p2"));
        assert!(!is_whole_disk("mmcblk0p1"));
        assert!(!is_whole_disk("loop0"));
        assert!(!is_whole_disk("ram1"));
        assert!(!is_whole_disk("dm-0"));
    }

    #[test]
    fn test_system_sampling_yields_ordered_series() {
        let target = Target::system("whole-machine");
        let series = sample(&target, Duration::from_millis(900), TICK);

        assert!(!series.is_empty());
        assert!(!series.interrupted());
        assert_eq!(series.scope(), MeasurementScope::SystemScoped);

        let samples = series.samples();
        for pair in samples.windows(2) {
            assert!(pair[0].elapsed < pair[1].elapsed);
        }
        for s in samples {
            assert!(s.cpu_percent >= 0.0);
            assert!(s.memory_bytes > 0);
        }
    }

    #[test]
    fn test_process_sampling_of_self() {
        let pid = Pid::from_u32(std::process::id());
        let target = Target::process(pid, "self");
        let series = sample(&target, Duration::from_millis(800), TICK);

        assert!(!series.is_empty());
        assert!(!series.interrupted());
        assert_eq!(series.scope(), MeasurementScope::ProcessScoped);
        for s in series.samples() {
            assert!(s.memory_bytes > 0);
        }
    }

    #[test]
    fn test_missing_pid_is_partial_not_error() {
        // A pid that cannot exist: empty interrupted series, no panic.
        let target = Target::process(Pid::from_u32(u32::MAX - 7), "ghost");
        let series = sample(&target, Duration::from_millis(600), TICK);
        assert!(series.is_empty());
        assert!(series.interrupted());
    }

    #[test]
    fn test_not_found_target_yields_empty_series() {
        let target = Target::not_found("nothing");
        let series = sample(&target, Duration::from_millis(600), TICK);
        assert!(series.is_empty());
        assert!(series.interrupted());
    }

    #[cfg(unix)]
    #[test]
    fn test_target_exit_truncates_series() {
        // Child that would sleep far longer than the run; kill and reap
        // it partway through so the sampler sees it vanish.
        let mut child = Command::new("sleep")
            .arg("30")
            .spawn()
            .expect("spawn sleep");
        let pid = Pid::from_u32(child.id());

        let killer = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(900));
            let _ = child.kill();
            let _ = child.wait();
        });

        let target = Target::process(pid, "sleep");
        let series = sample(&target, Duration::from_secs(5), TICK);
        killer.join().unwrap();

        // Requested ~20 ticks; the process died after ~3.
        assert!(series.interrupted());
        assert!(series.len() < 20);
    }
}
