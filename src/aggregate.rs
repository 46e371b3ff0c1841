//! Reduction of a sample series plus workload timing into summary
//! statistics. Values are kept in base units (bytes, seconds, percent);
//! display scaling is the reporter's concern.

use crate::sampler::SampleSeries;
use crate::target::MeasurementScope;
use crate::workload::WorkloadResult;
use crate::{BenchError, BenchResult};
use serde::{Deserialize, Serialize};

/// Tags an [`AggregateStats`] with how it was measured. Required so the
/// comparator can flag process-vs-system mismatches instead of treating
/// the numbers as equivalent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeasurementContext {
    pub scope: MeasurementScope,
    /// Free-form label: "docker", "native", a hostname, etc.
    pub environment: String,
}

impl MeasurementContext {
    pub fn new(scope: MeasurementScope, environment: impl Into<String>) -> Self {
        Self {
            scope,
            environment: environment.into(),
        }
    }
}

/// Read-only summary statistics for one measured run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateStats {
    pub cpu_avg: f64,
    pub cpu_min: f64,
    pub cpu_max: f64,
    pub memory_avg: f64,
    pub memory_min: u64,
    pub memory_max: u64,
    pub disk_read_total: u64,
    pub disk_write_total: u64,
    pub throughput_ops_per_sec: f64,
}

/// Reduce `series` and `workload` into an [`AggregateStats`].
///
/// An empty series is an error — returning zeros would misleadingly
/// read as "no usage" in a report.
pub fn aggregate(series: &SampleSeries, workload: &WorkloadResult) -> BenchResult<AggregateStats> {
    let samples = series.samples();
    if samples.is_empty() {
        return Err(BenchError::EmptySeries);
    }

    let n = samples.len() as f64;
    let mut cpu_sum = 0.0;
    let mut cpu_min = f64::INFINITY;
    let mut cpu_max = f64::NEG_INFINITY;
    let mut mem_sum = 0.0;
    let mut mem_min = u64::MAX;
    let mut mem_max = 0u64;
    let mut disk_read_total = 0u64;
    let mut disk_write_total = 0u64;

    for s in samples {
        cpu_sum += s.cpu_percent;
        cpu_min = cpu_min.min(s.cpu_percent);
        cpu_max = cpu_max.max(s.cpu_percent);
        mem_sum += s.memory_bytes as f64;
        mem_min = mem_min.min(s.memory_bytes);
        mem_max = mem_max.max(s.memory_bytes);
        disk_read_total = disk_read_total.saturating_add(s.disk_read_bytes);
        disk_write_total = disk_write_total.saturating_add(s.disk_write_bytes);
    }

    Ok(AggregateStats {
        cpu_avg: cpu_sum / n,
        cpu_min,
        cpu_max,
        memory_avg: mem_sum / n,
        memory_min: mem_min,
        memory_max: mem_max,
        disk_read_total,
        disk_write_total,
        throughput_ops_per_sec: workload.throughput(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampler::Sample;
    use std::time::Duration;

    fn series_of(points: &[(f64, u64, u64, u64)]) -> SampleSeries {
        let mut series = SampleSeries::new(MeasurementScope::ProcessScoped);
        for (i, &(cpu, mem, dr, dw)) in points.iter().enumerate() {
            series.push(Sample {
                elapsed: Duration::from_millis(1000 * (i as u64 + 1)),
                cpu_percent: cpu,
                memory_bytes: mem,
                disk_read_bytes: dr,
                disk_write_bytes: dw,
            });
        }
        series
    }

    fn workload(ops: u64, secs: f64) -> WorkloadResult {
        WorkloadResult::new(ops, secs).unwrap()
    }

    #[test]
    fn test_empty_series_fails_never_zero_fills() {
        let series = SampleSeries::new(MeasurementScope::SystemScoped);
        let err = aggregate(&series, &workload(100, 1.0)).unwrap_err();
        assert!(matches!(err, BenchError::EmptySeries));
    }

    #[test]
    fn test_min_avg_max_bounds() {
        let series = series_of(&[
            (10.0, 100, 5, 1),
            (50.0, 300, 5, 1),
            (30.0, 200, 5, 1),
        ]);
        let stats = aggregate(&series, &workload(300, 3.0)).unwrap();

        assert!(stats.cpu_min <= stats.cpu_avg && stats.cpu_avg <= stats.cpu_max);
        assert_eq!(stats.cpu_min, 10.0);
        assert_eq!(stats.cpu_max, 50.0);
        assert_eq!(stats.cpu_avg, 30.0);

        assert!(stats.memory_min as f64 <= stats.memory_avg);
        assert!(stats.memory_avg <= stats.memory_max as f64);
        assert_eq!(stats.memory_min, 100);
        assert_eq!(stats.memory_max, 300);
        assert_eq!(stats.memory_avg, 200.0);
    }

    #[test]
    fn test_disk_totals_are_sums_of_deltas() {
        let series = series_of(&[(1.0, 1, 100, 10), (1.0, 1, 200, 20), (1.0, 1, 0, 0)]);
        let stats = aggregate(&series, &workload(1, 1.0)).unwrap();
        assert_eq!(stats.disk_read_total, 300);
        assert_eq!(stats.disk_write_total, 30);
    }

    #[test]
    fn test_throughput_is_exact_ratio() {
        let series = series_of(&[(1.0, 1, 0, 0)]);
        let stats = aggregate(&series, &workload(1500, 2.0)).unwrap();
        assert_eq!(stats.throughput_ops_per_sec, 750.0);
    }

    #[test]
    fn test_throughput_sub_second_run() {
        let series = series_of(&[(1.0, 1, 0, 0)]);
        let stats = aggregate(&series, &workload(1000, 0.333)).unwrap();
        assert!((stats.throughput_ops_per_sec - 3003.0).abs() < 0.1);
    }

    #[test]
    fn test_single_sample_collapses_bounds() {
        let series = series_of(&[(42.0, 1024, 7, 9)]);
        let stats = aggregate(&series, &workload(10, 1.0)).unwrap();
        assert_eq!(stats.cpu_min, stats.cpu_avg);
        assert_eq!(stats.cpu_avg, stats.cpu_max);
        assert_eq!(stats.memory_min, stats.memory_max);
    }
}
