use clap::Parser;
use colored::Colorize;
use graphmark::runner::{run_side, sample_idle, RunConfig};
use graphmark::target::{locate, Target, TargetKind};
use graphmark::workload::{SubprocessWorkload, SyntheticGraphWorkload, WorkloadRunner};
use graphmark::{compare, report, BenchResult, ComparisonSide, MeasuredRun, Metric};
use std::path::Path;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "graphmark")]
#[command(about = "Comparative resource benchmark for two database backends")]
struct Cli {
    /// Process name hint for the left backend (e.g. "nendb")
    #[arg(long)]
    left: String,

    /// Process name hint for the right backend (e.g. "memgraph")
    #[arg(long)]
    right: String,

    /// Environment label for the left side (e.g. "native", "docker")
    #[arg(long, default_value = "native")]
    left_env: String,

    /// Environment label for the right side
    #[arg(long, default_value = "native")]
    right_env: String,

    /// External workload command for the left side; synthetic workload
    /// when omitted
    #[arg(long)]
    left_cmd: Option<String>,

    /// External workload command for the right side
    #[arg(long)]
    right_cmd: Option<String>,

    /// Operation label expected in driver output ("Average: X ms per <label>")
    #[arg(long, default_value = "insert")]
    op_label: String,

    /// Per-op latency assumed when driver output has no timing line.
    /// Results using it are flagged as fallback in report and caveats.
    #[arg(long, default_value_t = 1.0)]
    fallback_ms: f64,

    /// Sampling window in seconds
    #[arg(long, default_value_t = 30)]
    duration_secs: u64,

    /// Sampling interval in milliseconds
    #[arg(long, default_value_t = 1000)]
    interval_ms: u64,

    /// Operations per workload run
    #[arg(long, default_value_t = 10_000)]
    ops: u64,

    /// Idle baseline window in seconds, sampled per side before the
    /// measured run; 0 skips it
    #[arg(long, default_value_t = 0)]
    baseline_secs: u64,

    /// Directory to write comparison.json and comparison.csv into
    #[arg(long)]
    export: Option<String>,
}

fn resolve_target(hint: &str) -> Target {
    let target = locate(hint);
    match target.kind {
        TargetKind::Process => {
            println!(
                "  {} '{}' resolved to pid {}",
                "found".green(),
                hint,
                target.pid.map(|p| p.as_u32()).unwrap_or(0)
            );
            target
        }
        TargetKind::System => target,
        TargetKind::NotFound => {
            println!(
                "  {} no process matching '{}'; sampling the whole system instead",
                "FALLBACK".yellow().bold(),
                hint
            );
            Target::system(hint)
        }
    }
}

fn build_workload(cmd: &Option<String>, op_label: &str, fallback_ms: f64) -> Box<dyn WorkloadRunner> {
    match cmd {
        Some(cmd) => {
            let mut parts = cmd.split_whitespace().map(String::from);
            let program = parts.next().unwrap_or_default();
            Box::new(SubprocessWorkload::new(
                program,
                parts.collect(),
                op_label,
                fallback_ms,
            ))
        }
        None => Box::new(SyntheticGraphWorkload::new(42, 256)),
    }
}

fn to_side(run: &MeasuredRun) -> ComparisonSide {
    ComparisonSide {
        label: run.label.clone(),
        stats: run.stats.clone(),
        context: run.context.clone(),
    }
}

fn main() -> BenchResult<()> {
    let cli = Cli::parse();

    let cfg_left = RunConfig {
        duration: Duration::from_secs(cli.duration_secs),
        interval: Duration::from_millis(cli.interval_ms),
        operation_count: cli.ops,
        environment: cli.left_env.clone(),
    };
    let cfg_right = RunConfig {
        environment: cli.right_env.clone(),
        ..cfg_left.clone()
    };

    println!("{}", "Resolving targets...".bold());
    let left_target = resolve_target(&cli.left);
    let right_target = resolve_target(&cli.right);

    if cli.baseline_secs > 0 {
        println!("\n{}", "Sampling idle baseline...".bold());
        let window = Duration::from_secs(cli.baseline_secs);
        let left_idle = sample_idle(&left_target, window, cfg_left.interval);
        println!("{}", report::baseline_summary(&cli.left, &left_idle));
        let right_idle = sample_idle(&right_target, window, cfg_right.interval);
        println!("{}", report::baseline_summary(&cli.right, &right_idle));
    }

    println!("\n{} {}...", "Measuring".bold(), cli.left);
    let mut left_workload = build_workload(&cli.left_cmd, &cli.op_label, cli.fallback_ms);
    let left_run = run_side(&left_target, left_workload.as_mut(), &cfg_left)?;

    println!("{} {}...", "Measuring".bold(), cli.right);
    let mut right_workload = build_workload(&cli.right_cmd, &cli.op_label, cli.fallback_ms);
    let right_run = run_side(&right_target, right_workload.as_mut(), &cfg_right)?;

    let mut result = compare(
        &to_side(&left_run),
        &to_side(&right_run),
        &Metric::DEFAULT,
        &[],
    );

    result.caveats.extend(left_run.caveats());
    result.caveats.extend(right_run.caveats());

    let note = format!(
        "left '{}' measured {}-scoped in {}; right '{}' measured {}-scoped in {}; \
         sampled every {} ms over {} s",
        cli.left,
        left_run.context.scope,
        left_run.context.environment,
        cli.right,
        right_run.context.scope,
        right_run.context.environment,
        cli.interval_ms,
        cli.duration_secs,
    );

    report::print_comparison(&result);

    if let Some(dir) = &cli.export {
        let dir = Path::new(dir);
        std::fs::create_dir_all(dir)?;
        println!("\n{}", "Exporting...".bold());
        report::export_json(&result, &note, &dir.join("comparison.json"))?;
        report::export_csv(&result, &dir.join("comparison.csv"))?;
    }

    Ok(())
}
