//! Pretty-print the comparison with tables, plus CSV and JSON export.

use crate::compare::{ComparisonResult, ComparisonSide, Metric, Ratio};
use crate::sampler::SampleSeries;
use colored::Colorize;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Cell, Color, Table};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

// ────────────────────────────────────────────────────────────────────────────────
// System info header
// ────────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct SystemInfo {
    pub os: String,
    pub arch: String,
    pub cpus: usize,
    pub timestamp: String,
}

impl SystemInfo {
    pub fn collect() -> Self {
        Self {
            os: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
            cpus: std::thread::available_parallelism()
                .map(|p| p.get())
                .unwrap_or(1),
            timestamp: timestamp_now(),
        }
    }
}

/// Unix timestamp in seconds, as a string.
fn timestamp_now() -> String {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
        .to_string()
}

// ────────────────────────────────────────────────────────────────────────────────
// Terminal output
// ────────────────────────────────────────────────────────────────────────────────

/// Print the full comparison: header, per-metric table, caveats, and a
/// composite verdict.
pub fn print_comparison(result: &ComparisonResult) {
    let info = SystemInfo::collect();

    println!(
        "\n{}",
        "╔══════════════════════════════════════════════════════════════╗"
            .bold()
            .blue()
    );
    println!(
        "{}",
        "║            graphmark Comparative Resource Report             ║"
            .bold()
            .blue()
    );
    println!(
        "{}",
        "╚══════════════════════════════════════════════════════════════╝"
            .bold()
            .blue()
    );
    println!(
        "  OS: {}  Arch: {}  CPUs: {}  Time: {}",
        info.os, info.arch, info.cpus, info.timestamp
    );
    println!(
        "  {}: {} ({}, {})   {}: {} ({}, {})",
        "left".bold(),
        result.left.label,
        result.left.context.scope,
        result.left.context.environment,
        "right".bold(),
        result.right.label,
        result.right.context.scope,
        result.right.context.environment,
    );
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS);
    table.set_header(vec![
        "Metric",
        result.left.label.as_str(),
        result.right.label.as_str(),
        "Ratio",
        "Winner",
    ]);

    for mr in &result.ratios {
        let left_value = mr.metric.value(&result.left.stats);
        let right_value = mr.metric.value(&result.right.stats);

        let left_wins = if mr.metric.lower_is_better() {
            left_value < right_value
        } else {
            left_value > right_value
        };
        let right_wins = if mr.metric.lower_is_better() {
            right_value < left_value
        } else {
            right_value > left_value
        };

        let winner = if left_wins {
            Cell::new(format!("★ {}", result.left.label)).fg(Color::Green)
        } else if right_wins {
            Cell::new(format!("★ {}", result.right.label)).fg(Color::Green)
        } else {
            Cell::new("tie")
        };

        table.add_row(vec![
            Cell::new(mr.metric.name()),
            Cell::new(format_metric(mr.metric, left_value)),
            Cell::new(format_metric(mr.metric, right_value)),
            Cell::new(mr.ratio.to_string()),
            winner,
        ]);
    }

    println!("{table}");

    if !result.caveats.is_empty() {
        println!("\n{}", "── Caveats ──".bold().yellow());
        for caveat in &result.caveats {
            println!("  {} {}", "⚠".yellow(), caveat);
        }
    }

    let pct = if result.composite_max > 0 {
        result.composite_score as f64 / result.composite_max as f64 * 100.0
    } else {
        0.0
    };
    println!(
        "\n{} {}/{} ({:.1}%) for {}",
        "Composite:".bold(),
        result.composite_score,
        result.composite_max,
        pct,
        result.left.label
    );
    let verdict = if pct >= 75.0 {
        format!("{} clearly outperforms {}", result.left.label, result.right.label).green()
    } else if pct >= 50.0 {
        format!("{} is competitive with {}", result.left.label, result.right.label).normal()
    } else {
        format!("{} trails {}", result.left.label, result.right.label).yellow()
    };
    println!("  {}", verdict.bold());
}

/// One-line summary of an idle baseline window.
pub fn baseline_summary(label: &str, series: &SampleSeries) -> String {
    let samples = series.samples();
    if samples.is_empty() {
        return format!("  baseline '{}': no samples", label);
    }
    let n = samples.len() as f64;
    let cpu = samples.iter().map(|s| s.cpu_percent).sum::<f64>() / n;
    let mem = samples.iter().map(|s| s.memory_bytes as f64).sum::<f64>() / n;
    format!(
        "  baseline '{}' ({}-scoped, {} samples): cpu {:.1}%, memory {}",
        label,
        series.scope(),
        samples.len(),
        cpu,
        format_bytes(mem as u64)
    )
}

fn format_metric(metric: Metric, value: f64) -> String {
    match metric {
        Metric::CpuAvg | Metric::CpuMax => format!("{:.1}%", value),
        Metric::MemoryAvg | Metric::MemoryMax | Metric::DiskReadTotal | Metric::DiskWriteTotal => {
            format_bytes(value as u64)
        }
        Metric::Throughput => format!("{} ops/s", format_throughput(value)),
    }
}

// ────────────────────────────────────────────────────────────────────────────────
// JSON persistence
// ────────────────────────────────────────────────────────────────────────────────

/// Persisted side: flat metric→number map plus scope and environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedSide {
    #[serde(flatten)]
    pub metrics: BTreeMap<String, f64>,
    pub scope: String,
    pub environment: String,
}

/// Persisted comparison document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedComparison {
    pub left: PersistedSide,
    pub right: PersistedSide,
    pub timestamp: String,
    pub methodology_note: String,
}

fn persist_side(side: &ComparisonSide) -> PersistedSide {
    let mut metrics = BTreeMap::new();
    for metric in Metric::ALL {
        metrics.insert(metric.name().to_string(), metric.value(&side.stats));
    }
    PersistedSide {
        metrics,
        scope: side.context.scope.to_string(),
        environment: side.context.environment.clone(),
    }
}

/// Build the persisted document. The methodology note always includes
/// the comparison's caveats so degraded measurements stay visible.
pub fn to_persisted(result: &ComparisonResult, methodology_note: &str) -> PersistedComparison {
    let mut note = methodology_note.to_string();
    for caveat in &result.caveats {
        if !note.is_empty() {
            note.push_str("; ");
        }
        note.push_str(caveat);
    }
    PersistedComparison {
        left: persist_side(&result.left),
        right: persist_side(&result.right),
        timestamp: timestamp_now(),
        methodology_note: note,
    }
}

pub fn export_json(
    result: &ComparisonResult,
    methodology_note: &str,
    path: &Path,
) -> std::io::Result<()> {
    let doc = to_persisted(result, methodology_note);
    let json = serde_json::to_string_pretty(&doc)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
    std::fs::write(path, json)?;
    println!("  JSON exported to {}", path.display());
    Ok(())
}

// ────────────────────────────────────────────────────────────────────────────────
// CSV export
// ────────────────────────────────────────────────────────────────────────────────

pub fn export_csv(result: &ComparisonResult, path: &Path) -> std::io::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record(["metric", "left", "right", "ratio"])?;
    for mr in &result.ratios {
        let ratio = match mr.ratio {
            Ratio::Defined(v) => format!("{:.6}", v),
            Ratio::Undefined => "undefined".to_string(),
        };
        wtr.write_record([
            mr.metric.name(),
            &format!("{:.6}", mr.metric.value(&result.left.stats)),
            &format!("{:.6}", mr.metric.value(&result.right.stats)),
            &ratio,
        ])?;
    }

    wtr.flush()?;
    println!("  CSV exported to {}", path.display());
    Ok(())
}

// ────────────────────────────────────────────────────────────────────────────────
// Formatting helpers
// ────────────────────────────────────────────────────────────────────────────────

fn format_throughput(t: f64) -> String {
    if t >= 1_000_000.0 {
        format!("{:.2}M", t / 1_000_000.0)
    } else if t >= 1_000.0 {
        format!("{:.1}K", t / 1_000.0)
    } else {
        format!("{:.0}", t)
    }
}

fn format_bytes(b: u64) -> String {
    if b >= 1_073_741_824 {
        format!("{:.1} GB", b as f64 / 1_073_741_824.0)
    } else if b >= 1_048_576 {
        format!("{:.1} MB", b as f64 / 1_048_576.0)
    } else if b >= 1_024 {
        format!("{:.1} KB", b as f64 / 1_024.0)
    } else {
        format!("{} B", b)
    }
}
