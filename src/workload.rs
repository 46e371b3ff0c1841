//! Workload driver boundary.
//!
//! The core only needs a driver to report an honest operation count and
//! elapsed time. Drivers here: a subprocess wrapper that parses the
//! `Average: <float> ms per <label>` stdout protocol, and a built-in
//! synthetic graph workload (insert / lookup / create-edge against an
//! in-memory store) for runs without an external driver.

use crate::{BenchError, BenchResult};
use hdrhistogram::Histogram;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use std::collections::HashMap;
use std::process::Command;
use std::time::Instant;

// ────────────────────────────────────────────────────────────────────────────────
// Timing contract
// ────────────────────────────────────────────────────────────────────────────────

/// Validated workload timing. Construction rejects counts or durations
/// that would make the rate computation divide by zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WorkloadResult {
    operation_count: u64,
    elapsed_seconds: f64,
}

impl WorkloadResult {
    pub fn new(operation_count: u64, elapsed_seconds: f64) -> BenchResult<Self> {
        if operation_count == 0 {
            return Err(BenchError::InvalidWorkload(
                "operation_count must be > 0".into(),
            ));
        }
        if !(elapsed_seconds > 0.0) {
            return Err(BenchError::InvalidWorkload(format!(
                "elapsed_seconds must be > 0, got {}",
                elapsed_seconds
            )));
        }
        Ok(Self {
            operation_count,
            elapsed_seconds,
        })
    }

    pub fn operation_count(&self) -> u64 {
        self.operation_count
    }

    pub fn elapsed_seconds(&self) -> f64 {
        self.elapsed_seconds
    }

    pub fn throughput(&self) -> f64 {
        self.operation_count as f64 / self.elapsed_seconds
    }
}

/// Per-operation latency with its provenance. A fallback is never
/// blended indistinguishably with a real measurement.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum Measurement {
    Measured { value_ms: f64 },
    Fallback { value_ms: f64, reason: String },
}

impl Measurement {
    pub fn value_ms(&self) -> f64 {
        match self {
            Measurement::Measured { value_ms } => *value_ms,
            Measurement::Fallback { value_ms, .. } => *value_ms,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Measurement::Fallback { .. })
    }

    pub fn describe(&self) -> String {
        match self {
            Measurement::Measured { value_ms } => format!("{:.4} ms/op measured", value_ms),
            Measurement::Fallback { value_ms, reason } => {
                format!("{:.4} ms/op fallback=true ({})", value_ms, reason)
            }
        }
    }
}

/// What one driver invocation produced.
#[derive(Debug, Clone)]
pub struct WorkloadOutcome {
    pub result: WorkloadResult,
    pub latency: Measurement,
}

/// Driver contract. Invoked concurrently with the sampler; the core
/// does not care how operations are issued, only that the timing is
/// honest.
pub trait WorkloadRunner: Send {
    fn name(&self) -> &str;
    fn run(&mut self, operation_count: u64) -> BenchResult<WorkloadOutcome>;
}

// ────────────────────────────────────────────────────────────────────────────────
// Subprocess protocol
// ────────────────────────────────────────────────────────────────────────────────

/// Extract the per-op latency from a line of the form
/// `Average: <float> ms per <op_label>`.
pub fn parse_average_ms(output: &str, op_label: &str) -> Option<f64> {
    let needle = format!("ms per {}", op_label);
    for line in output.lines() {
        if !line.contains("Average:") || !line.contains(&needle) {
            continue;
        }
        let Some(after) = line.split("Average:").nth(1) else {
            continue;
        };
        let number = after.split("ms").next().unwrap_or("").trim();
        if let Ok(value) = number.parse::<f64>() {
            return Some(value);
        }
    }
    None
}

/// Parse driver output, falling back to `fallback_ms` (with recorded
/// provenance) when no matching line exists.
pub fn timing_from_output(output: &str, op_label: &str, fallback_ms: f64) -> Measurement {
    match parse_average_ms(output, op_label) {
        Some(value_ms) => Measurement::Measured { value_ms },
        None => Measurement::Fallback {
            value_ms: fallback_ms,
            reason: format!("no 'Average: ... ms per {}' line in driver output", op_label),
        },
    }
}

/// Runs an external workload binary and parses its stdout timing.
pub struct SubprocessWorkload {
    name: String,
    program: String,
    args: Vec<String>,
    op_label: String,
    fallback_ms: f64,
}

impl SubprocessWorkload {
    pub fn new(
        program: impl Into<String>,
        args: Vec<String>,
        op_label: impl Into<String>,
        fallback_ms: f64,
    ) -> Self {
        let program = program.into();
        Self {
            name: format!("subprocess:{}", program),
            program,
            args,
            op_label: op_label.into(),
            fallback_ms,
        }
    }
}

impl WorkloadRunner for SubprocessWorkload {
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&mut self, operation_count: u64) -> BenchResult<WorkloadOutcome> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .output()
            .map_err(|e| {
                BenchError::Workload(format!("failed to spawn '{}': {}", self.program, e))
            })?;

        if !output.status.success() {
            return Err(BenchError::Workload(format!(
                "'{}' exited with {}: {}",
                self.program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let latency = timing_from_output(&stdout, &self.op_label, self.fallback_ms);
        let elapsed_seconds = latency.value_ms() * operation_count as f64 / 1000.0;
        let result = WorkloadResult::new(operation_count, elapsed_seconds)?;

        Ok(WorkloadOutcome { result, latency })
    }
}

// ────────────────────────────────────────────────────────────────────────────────
// Built-in synthetic graph workload
// ────────────────────────────────────────────────────────────────────────────────

/// Deterministic in-memory graph driver: ~50% node inserts, ~30% node
/// lookups, ~20% edge creations. Useful as a load generator when no
/// external driver is configured.
pub struct SyntheticGraphWorkload {
    rng: ChaCha8Rng,
    nodes: HashMap<u64, Vec<u8>>,
    edges: HashMap<u64, Vec<u64>>,
    payload_size: usize,
    next_id: u64,
}

impl SyntheticGraphWorkload {
    pub fn new(seed: u64, payload_size: usize) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            nodes: HashMap::new(),
            edges: HashMap::new(),
            payload_size,
            next_id: 0,
        }
    }

    fn insert_node(&mut self) {
        let id = self.next_id;
        self.next_id += 1;
        let mut payload = vec![0u8; self.payload_size];
        self.rng.fill_bytes(&mut payload);
        self.nodes.insert(id, payload);
    }

    fn lookup_node(&mut self) {
        if self.next_id == 0 {
            return;
        }
        let id = self.rng.gen_range(0..self.next_id);
        let _ = std::hint::black_box(self.nodes.get(&id));
    }

    fn create_edge(&mut self) {
        if self.next_id < 2 {
            return;
        }
        let from = self.rng.gen_range(0..self.next_id);
        let to = self.rng.gen_range(0..self.next_id);
        self.edges.entry(from).or_default().push(to);
    }
}

impl WorkloadRunner for SyntheticGraphWorkload {
    fn name(&self) -> &str {
        "synthetic-graph"
    }

    fn run(&mut self, operation_count: u64) -> BenchResult<WorkloadOutcome> {
        let mut hist = Histogram::<u64>::new_with_bounds(1, 60_000_000_000, 3)
            .map_err(|e| BenchError::Config(format!("histogram: {}", e)))?;

        let start = Instant::now();
        for i in 0..operation_count {
            let op_start = Instant::now();
            match i % 10 {
                0..=4 => self.insert_node(),
                5..=7 => self.lookup_node(),
                _ => self.create_edge(),
            }
            let nanos = op_start.elapsed().as_nanos() as u64;
            let _ = hist.record(nanos.max(1));
        }
        let elapsed_seconds = start.elapsed().as_secs_f64();

        let result = WorkloadResult::new(operation_count, elapsed_seconds)?;
        let latency = Measurement::Measured {
            value_ms: hist.mean() / 1_000_000.0,
        };
        Ok(WorkloadOutcome { result, latency })
    }
}
