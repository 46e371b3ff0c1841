//! Side-by-side comparison of two aggregated runs: per-metric ratios,
//! a bounded composite score, and methodology caveats.

use crate::aggregate::{AggregateStats, MeasurementContext};
use serde::{Serialize, Serializer};
use std::fmt;

// ────────────────────────────────────────────────────────────────────────────────
// Metrics
// ────────────────────────────────────────────────────────────────────────────────

/// Comparable metric. Directionality is a fixed table, never inferred
/// from the data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    CpuAvg,
    CpuMax,
    MemoryAvg,
    MemoryMax,
    DiskReadTotal,
    DiskWriteTotal,
    Throughput,
}

impl Metric {
    pub const ALL: [Metric; 7] = [
        Metric::CpuAvg,
        Metric::CpuMax,
        Metric::MemoryAvg,
        Metric::MemoryMax,
        Metric::DiskReadTotal,
        Metric::DiskWriteTotal,
        Metric::Throughput,
    ];

    /// Default comparison set: disk totals are reported but too noisy
    /// to score.
    pub const DEFAULT: [Metric; 5] = [
        Metric::CpuAvg,
        Metric::CpuMax,
        Metric::MemoryAvg,
        Metric::MemoryMax,
        Metric::Throughput,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Metric::CpuAvg => "cpu_avg",
            Metric::CpuMax => "cpu_max",
            Metric::MemoryAvg => "memory_avg",
            Metric::MemoryMax => "memory_max",
            Metric::DiskReadTotal => "disk_read_total",
            Metric::DiskWriteTotal => "disk_write_total",
            Metric::Throughput => "throughput_ops_per_sec",
        }
    }

    pub fn lower_is_better(self) -> bool {
        !matches!(self, Metric::Throughput)
    }

    pub fn value(self, stats: &AggregateStats) -> f64 {
        match self {
            Metric::CpuAvg => stats.cpu_avg,
            Metric::CpuMax => stats.cpu_max,
            Metric::MemoryAvg => stats.memory_avg,
            Metric::MemoryMax => stats.memory_max as f64,
            Metric::DiskReadTotal => stats.disk_read_total as f64,
            Metric::DiskWriteTotal => stats.disk_write_total as f64,
            Metric::Throughput => stats.throughput_ops_per_sec,
        }
    }
}

impl Serialize for Metric {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

// ────────────────────────────────────────────────────────────────────────────────
// Ratios
// ────────────────────────────────────────────────────────────────────────────────

/// A normalized ratio, oriented so that values above 1.0 favor the left
/// side regardless of metric direction. A zero denominator yields an
/// explicit marker, never infinity or NaN.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Ratio {
    Defined(f64),
    Undefined,
}

impl Ratio {
    pub fn as_f64(self) -> Option<f64> {
        match self {
            Ratio::Defined(v) => Some(v),
            Ratio::Undefined => None,
        }
    }
}

impl fmt::Display for Ratio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ratio::Defined(v) => write!(f, "{:.2}x", v),
            Ratio::Undefined => write!(f, "undefined"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricRatio {
    pub metric: Metric,
    pub ratio: Ratio,
}

// ────────────────────────────────────────────────────────────────────────────────
// Comparison
// ────────────────────────────────────────────────────────────────────────────────

/// One side of a comparison: its aggregate plus how it was measured.
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonSide {
    pub label: String,
    pub stats: AggregateStats,
    pub context: MeasurementContext,
}

/// Boolean qualitative check credited into the composite score
/// (e.g. "consistent performance across repeated runs").
#[derive(Debug, Clone, Serialize)]
pub struct QualitativeFlag {
    pub name: String,
    pub left_wins: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComparisonResult {
    pub left: ComparisonSide,
    pub right: ComparisonSide,
    pub ratios: Vec<MetricRatio>,
    /// Count of metrics and flags where the left side wins strictly.
    pub composite_score: u32,
    pub composite_max: u32,
    /// Ordered methodology caveats; non-empty whenever the two sides
    /// were not measured the same way.
    pub caveats: Vec<String>,
}

/// Compare `left` against `right` over `metrics` plus optional
/// qualitative flags.
///
/// For lower-is-better metrics the ratio is `right/left`; for
/// higher-is-better it is `left/right` — either way, above 1.0 favors
/// the left side. Ratios are always computed; a scope mismatch adds a
/// caveat rather than withholding numbers. Ties credit nobody.
pub fn compare(
    left: &ComparisonSide,
    right: &ComparisonSide,
    metrics: &[Metric],
    qualitative: &[QualitativeFlag],
) -> ComparisonResult {
    let mut ratios = Vec::with_capacity(metrics.len());
    let mut composite_score = 0u32;

    for &metric in metrics {
        let left_value = metric.value(&left.stats);
        let right_value = metric.value(&right.stats);

        let (numerator, denominator, left_wins) = if metric.lower_is_better() {
            (right_value, left_value, left_value < right_value)
        } else {
            (left_value, right_value, left_value > right_value)
        };

        let ratio = if denominator == 0.0 {
            Ratio::Undefined
        } else {
            Ratio::Defined(numerator / denominator)
        };

        if left_wins {
            composite_score += 1;
        }
        ratios.push(MetricRatio { metric, ratio });
    }

    for flag in qualitative {
        if flag.left_wins {
            composite_score += 1;
        }
    }

    let mut caveats = Vec::new();
    if left.context.scope != right.context.scope {
        caveats.push(format!(
            "measurement scope mismatch: '{}' is {}-scoped but '{}' is {}-scoped; \
             resource numbers are not directly comparable",
            left.label, left.context.scope, right.label, right.context.scope
        ));
    }
    if left.context.environment != right.context.environment {
        caveats.push(format!(
            "environments differ: '{}' ran in {}, '{}' ran in {}",
            left.label, left.context.environment, right.label, right.context.environment
        ));
    }

    ComparisonResult {
        left: left.clone(),
        right: right.clone(),
        ratios,
        composite_score,
        composite_max: (metrics.len() + qualitative.len()) as u32,
        caveats,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::MeasurementScope;

    fn stats(cpu_avg: f64, memory_avg: f64, throughput: f64) -> AggregateStats {
        AggregateStats {
            cpu_avg,
            cpu_min: cpu_avg,
            cpu_max: cpu_avg,
            memory_avg,
            memory_min: memory_avg as u64,
            memory_max: memory_avg as u64,
            disk_read_total: 0,
            disk_write_total: 0,
            throughput_ops_per_sec: throughput,
        }
    }

    fn side(label: &str, scope: MeasurementScope, s: AggregateStats) -> ComparisonSide {
        ComparisonSide {
            label: label.to_string(),
            stats: s,
            context: MeasurementContext::new(scope, "native"),
        }
    }

    fn process_side(label: &str, s: AggregateStats) -> ComparisonSide {
        side(label, MeasurementScope::ProcessScoped, s)
    }

    #[test]
    fn test_lower_is_better_ratio_and_point() {
        let left = process_side("a", stats(10.0, 100.0, 1000.0));
        let right = process_side("b", stats(50.0, 100.0, 1000.0));

        let result = compare(&left, &right, &[Metric::CpuAvg], &[]);
        assert_eq!(result.ratios[0].ratio, Ratio::Defined(5.0));
        assert_eq!(result.composite_score, 1);
        assert_eq!(result.composite_max, 1);
    }

    #[test]
    fn test_ties_credit_nobody() {
        let left = process_side("a", stats(10.0, 100.0, 1000.0));
        let right = process_side("b", stats(10.0, 100.0, 1000.0));
        let result = compare(&left, &right, &Metric::DEFAULT, &[]);
        assert_eq!(result.composite_score, 0);
        assert_eq!(result.composite_max, Metric::DEFAULT.len() as u32);
    }

    #[test]
    fn test_throughput_antisymmetry() {
        let a = process_side("a", stats(1.0, 1.0, 3000.0));
        let b = process_side("b", stats(1.0, 1.0, 1200.0));

        let forward = compare(&a, &b, &[Metric::Throughput], &[]);
        let backward = compare(&b, &a, &[Metric::Throughput], &[]);

        let fwd = forward.ratios[0].ratio.as_f64().unwrap();
        let bwd = backward.ratios[0].ratio.as_f64().unwrap();
        assert!((fwd * bwd - 1.0).abs() < 1e-12);
        assert_eq!(forward.composite_score, 1);
        assert_eq!(backward.composite_score, 0);
    }

    #[test]
    fn test_zero_denominator_is_marked_undefined() {
        // Lower-is-better cpu with a zero left value: ratio would
        // divide by zero, but the left side still wins on raw values.
        let left = process_side("a", stats(0.0, 100.0, 1000.0));
        let right = process_side("b", stats(20.0, 100.0, 1000.0));

        let result = compare(&left, &right, &[Metric::CpuAvg], &[]);
        assert_eq!(result.ratios[0].ratio, Ratio::Undefined);
        assert_eq!(result.ratios[0].ratio.to_string(), "undefined");
        assert_eq!(result.composite_score, 1);
    }

    #[test]
    fn test_scope_mismatch_adds_caveat_but_keeps_ratios() {
        let left = side(
            "nendb",
            MeasurementScope::ProcessScoped,
            stats(10.0, 100.0, 1000.0),
        );
        let right = side(
            "memgraph",
            MeasurementScope::SystemScoped,
            stats(50.0, 100.0, 500.0),
        );

        let result = compare(&left, &right, &Metric::DEFAULT, &[]);
        assert!(!result.caveats.is_empty());
        assert!(result.caveats[0].contains("scope mismatch"));
        assert_eq!(result.ratios.len(), Metric::DEFAULT.len());
    }

    #[test]
    fn test_qualitative_flags_extend_composite_max() {
        let left = process_side("a", stats(10.0, 100.0, 1000.0));
        let right = process_side("b", stats(50.0, 200.0, 500.0));

        let flags = vec![
            QualitativeFlag {
                name: "memory per node".into(),
                left_wins: true,
            },
            QualitativeFlag {
                name: "consistent across runs".into(),
                left_wins: false,
            },
        ];
        let result = compare(&left, &right, &[Metric::CpuAvg], &flags);
        assert_eq!(result.composite_max, 3);
        assert_eq!(result.composite_score, 2);
    }

    #[test]
    fn test_metric_direction_table() {
        assert!(Metric::CpuAvg.lower_is_better());
        assert!(Metric::MemoryMax.lower_is_better());
        assert!(Metric::DiskWriteTotal.lower_is_better());
        assert!(!Metric::Throughput.lower_is_better());
    }
}
