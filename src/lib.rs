//! graphmark — comparative resource benchmark harness.
//!
//! Drives a workload against two database backends while sampling
//! process- or system-level resource usage at a fixed cadence on a
//! separate thread, then reduces the samples into summary statistics
//! and a normalized side-by-side comparison.

pub mod aggregate;
pub mod compare;
pub mod report;
pub mod runner;
pub mod sampler;
pub mod target;
pub mod workload;

pub use aggregate::{aggregate, AggregateStats, MeasurementContext};
pub use compare::{compare, ComparisonResult, ComparisonSide, Metric, QualitativeFlag, Ratio};
pub use runner::{run_side, MeasuredRun, RunConfig};
pub use sampler::{Sample, SampleSeries};
pub use target::{locate, MeasurementScope, Target, TargetKind};
pub use workload::{Measurement, WorkloadOutcome, WorkloadResult, WorkloadRunner};

// ────────────────────────────────────────────────────────────────────────────────
// Error type
// ────────────────────────────────────────────────────────────────────────────────

pub type BenchResult<T> = std::result::Result<T, BenchError>;

#[derive(Debug)]
pub enum BenchError {
    Io(std::io::Error),
    /// Aggregation was attempted on a run that produced no samples.
    /// Fatal for that run; never downgraded to a zero-filled result.
    EmptySeries,
    /// A workload reported a count or elapsed time that cannot produce a rate.
    InvalidWorkload(String),
    /// A workload driver failed outright (spawn error, non-zero exit).
    Workload(String),
    Config(String),
}

impl std::fmt::Display for BenchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BenchError::Io(e) => write!(f, "IO error: {}", e),
            BenchError::EmptySeries => {
                write!(f, "sample series is empty; nothing to aggregate")
            }
            BenchError::InvalidWorkload(s) => write!(f, "invalid workload result: {}", s),
            BenchError::Workload(s) => write!(f, "workload error: {}", s),
            BenchError::Config(s) => write!(f, "config error: {}", s),
        }
    }
}

impl std::error::Error for BenchError {}

impl From<std::io::Error> for BenchError {
    fn from(e: std::io::Error) -> Self {
        BenchError::Io(e)
    }
}
