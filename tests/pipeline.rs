//! End-to-end pipeline: sample the whole system while a synthetic
//! workload runs, compare two runs, and export the result.

use graphmark::runner::{run_side, RunConfig};
use graphmark::target::Target;
use graphmark::workload::SyntheticGraphWorkload;
use graphmark::{compare, report, ComparisonSide, MeasuredRun, Metric};
use std::time::Duration;

fn quick_config() -> RunConfig {
    RunConfig {
        duration: Duration::from_millis(700),
        interval: Duration::from_millis(250),
        operation_count: 1_000,
        environment: "test".to_string(),
    }
}

fn side(run: &MeasuredRun) -> ComparisonSide {
    ComparisonSide {
        label: run.label.clone(),
        stats: run.stats.clone(),
        context: run.context.clone(),
    }
}

#[test]
fn full_pipeline_produces_persistable_comparison() {
    let cfg = quick_config();

    let mut left_workload = SyntheticGraphWorkload::new(1, 64);
    let left = run_side(&Target::system("left"), &mut left_workload, &cfg).unwrap();

    let mut right_workload = SyntheticGraphWorkload::new(2, 64);
    let right = run_side(&Target::system("right"), &mut right_workload, &cfg).unwrap();

    assert!(!left.series.is_empty());
    assert!(!right.series.is_empty());

    let result = compare(&side(&left), &side(&right), &Metric::DEFAULT, &[]);
    assert_eq!(result.ratios.len(), Metric::DEFAULT.len());
    assert!(result.composite_score <= result.composite_max);
    // Same scope and environment on both sides.
    assert!(result.caveats.is_empty());

    let dir = tempfile::tempdir().unwrap();
    let json_path = dir.path().join("comparison.json");
    report::export_json(&result, "both sides system-scoped in test", &json_path).unwrap();

    let content = std::fs::read_to_string(&json_path).unwrap();
    let value: serde_json::Value = serde_json::from_str(&content).unwrap();
    for key in ["left", "right", "timestamp", "methodology_note"] {
        assert!(value.get(key).is_some(), "missing top-level key {}", key);
    }
    assert!(value["left"]["throughput_ops_per_sec"].as_f64().unwrap() > 0.0);
    assert_eq!(value["left"]["scope"], "system");
    assert_eq!(value["left"]["environment"], "test");

    let csv_path = dir.path().join("comparison.csv");
    report::export_csv(&result, &csv_path).unwrap();
    let csv = std::fs::read_to_string(&csv_path).unwrap();
    assert_eq!(csv.lines().count(), 1 + Metric::DEFAULT.len());
}
