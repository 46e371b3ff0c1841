//! Concurrent orchestration of one measured run: the sampler polls on
//! its own thread while the workload executes on the calling thread;
//! a blocking join hands the finished series to the aggregator.

use crate::aggregate::{aggregate, AggregateStats, MeasurementContext};
use crate::sampler::{self, SampleSeries};
use crate::target::Target;
use crate::workload::{WorkloadOutcome, WorkloadRunner};
use crate::{BenchError, BenchResult};
use std::thread;
use std::time::Duration;

/// Run parameters. All of these arrive from configuration, never from
/// constants baked into the core.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub duration: Duration,
    pub interval: Duration,
    pub operation_count: u64,
    pub environment: String,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            duration: Duration::from_secs(30),
            interval: Duration::from_secs(1),
            operation_count: 10_000,
            environment: "native".to_string(),
        }
    }
}

/// Everything one side of a comparison produced.
#[derive(Debug, Clone)]
pub struct MeasuredRun {
    pub label: String,
    pub series: SampleSeries,
    pub outcome: WorkloadOutcome,
    pub stats: AggregateStats,
    pub context: MeasurementContext,
}

impl MeasuredRun {
    /// Degraded-measurement caveats for this run: a truncated sampling
    /// window or a fallback latency value. Empty for a clean run.
    /// Callers must carry these into the report and the persisted
    /// methodology note.
    pub fn caveats(&self) -> Vec<String> {
        let mut caveats = Vec::new();
        if self.series.interrupted() {
            caveats.push(format!(
                "'{}' sampling ended early; only {} samples collected of the requested window",
                self.label,
                self.series.len()
            ));
        }
        if self.outcome.latency.is_fallback() {
            caveats.push(format!(
                "'{}' latency is a fallback value: {}",
                self.label,
                self.outcome.latency.describe()
            ));
        }
        caveats
    }
}

/// Sample `target` while `workload` runs, then aggregate.
///
/// The sampler thread is the sole writer of the series; the join below
/// is the happens-before boundary that transfers ownership to the
/// aggregator, so no locking is needed.
pub fn run_side(
    target: &Target,
    workload: &mut dyn WorkloadRunner,
    cfg: &RunConfig,
) -> BenchResult<MeasuredRun> {
    let sampler_target = target.clone();
    let (duration, interval) = (cfg.duration, cfg.interval);
    let handle = thread::spawn(move || sampler::sample(&sampler_target, duration, interval));

    let outcome = workload.run(cfg.operation_count);

    // Join the sampler even when the workload failed, so its thread
    // never outlives the run.
    let series = handle
        .join()
        .map_err(|_| BenchError::Config("sampler thread panicked".into()))?;
    let outcome = outcome?;

    let stats = aggregate(&series, &outcome.result)?;
    let context = MeasurementContext::new(target.scope(), cfg.environment.clone());

    Ok(MeasuredRun {
        label: target.label.clone(),
        series,
        outcome,
        stats,
        context,
    })
}

/// Sample without a workload, e.g. for a baseline window before the
/// measured run.
pub fn sample_idle(target: &Target, duration: Duration, interval: Duration) -> SampleSeries {
    sampler::sample(target, duration, interval)
}
