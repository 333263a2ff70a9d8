//! Experiment runner for the worker-count scaling analysis.
//!
//! Solves the same problem once per requested worker count and records the number of
//! iterations, the outcome and the wall time of each run. Worker counts that do not
//! divide the grid size are skipped with a warning. Every record is written to the
//! output CSV as soon as its run finishes, so a failing run does not lose the earlier
//! results.

use anyhow::{anyhow, Context, Result};
use clap::{Parser, ValueEnum};
use redblack_sor::{
    config::{default_difflimit, DEFAULT_MAX_ITERATIONS, DEFAULT_MAX_VALUE, DEFAULT_RELAXATION},
    solve, InitPolicy, Outcome, SorConfig,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum InitArg {
    Count,
    Rand,
    Fast,
}

impl From<InitArg> for InitPolicy {
    fn from(arg: InitArg) -> Self {
        match arg {
            InitArg::Count => InitPolicy::Count,
            InitArg::Rand => InitPolicy::Random,
            InitArg::Fast => InitPolicy::Fast,
        }
    }
}

/// Command-line arguments for the scaling experiment.
#[derive(Parser, Debug)]
#[clap(
    name = "scaling-runner",
    about = "Runs the red-black SOR solver for a range of worker counts."
)]
struct ScalingArgs {
    /// Number of interior rows and columns (N).
    #[clap(short = 'n', long, default_value_t = 512)]
    size: usize,
    /// Comma-separated list of worker counts to run.
    #[clap(long, value_delimiter = ',', default_values_t = vec![1, 2, 4, 8])]
    workers: Vec<usize>,
    /// Interior fill policy shared by every run.
    #[clap(short = 'I', long, value_enum, default_value_t = InitArg::Rand)]
    init: InitArg,
    /// Upper bound for randomly filled cells.
    #[clap(short = 'm', long, default_value_t = DEFAULT_MAX_VALUE)]
    max_value: u32,
    /// Relaxation factor w, in (0, 2].
    #[clap(short = 'w', long, default_value_t = DEFAULT_RELAXATION)]
    relaxation: f64,
    /// Convergence tolerance. Defaults to 0.00001 * N.
    #[clap(short = 'd', long)]
    difflimit: Option<f64>,
    /// Iteration cap for every run.
    #[clap(long, default_value_t = DEFAULT_MAX_ITERATIONS)]
    max_iterations: usize,
    /// Seed for the random fill policy.
    #[clap(long, default_value_t = 0)]
    seed: u64,
    /// Path to the output CSV file.
    #[clap(long, value_name = "PATH")]
    output: PathBuf,
}

/// One row of the output CSV.
#[derive(Debug, Serialize, Deserialize)]
struct ScalingResult {
    workers: usize,
    iterations: usize,
    outcome: Outcome,
    time_s: f64,
}

fn main() -> Result<()> {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .try_init()
        .map_err(|e| anyhow!("Failed to initialize logger: {}", e))?;

    let args = ScalingArgs::parse();
    log::info!(
        "Starting scaling experiment on a {0}x{0} grid for worker counts {1:?}.",
        args.size,
        args.workers
    );

    let mut writer = csv::Writer::from_path(&args.output)
        .with_context(|| format!("Failed to create CSV writer for {:?}", &args.output))?;

    for &workers in &args.workers {
        if workers == 0 || args.size % workers != 0 {
            log::warn!(
                "Skipping {} workers: they do not divide the grid size {}.",
                workers,
                args.size
            );
            continue;
        }

        let config = SorConfig {
            size: args.size,
            workers,
            max_value: args.max_value,
            init: args.init.into(),
            relaxation: args.relaxation,
            difflimit: args.difflimit.unwrap_or_else(|| default_difflimit(args.size)),
            print: false,
            max_iterations: args.max_iterations,
            seed: args.seed,
        };
        let report = solve(&config).with_context(|| format!("Run with {workers} workers failed"))?;

        let record = ScalingResult {
            workers,
            iterations: report.iterations,
            outcome: report.outcome,
            time_s: report.elapsed.as_secs_f64(),
        };
        log::info!(
            "Run finished: workers={}, iterations={}, outcome={:?}, time={:.3}s",
            record.workers,
            record.iterations,
            record.outcome,
            record.time_s
        );
        writer.serialize(&record)?;
        writer.flush()?;
    }

    log::info!(
        "Scaling experiment complete. Results saved to {:?}.",
        &args.output
    );
    Ok(())
}
