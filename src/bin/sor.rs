//! Command-line front end for the distributed red-black SOR solver.
//!
//! Builds a grid from the chosen fill policy, relaxes it with the requested number of
//! worker ranks and reports the number of iterations. With `--print` the assembled grid,
//! halo border included, is written to standard output one row per line.

use anyhow::{anyhow, Context, Result};
use clap::{Parser, ValueEnum};
use redblack_sor::{
    config::{
        default_difflimit, DEFAULT_MAX_ITERATIONS, DEFAULT_MAX_VALUE, DEFAULT_RELAXATION,
        DEFAULT_SIZE,
    },
    solve, InitPolicy, SorConfig,
};
use std::io::{self, BufWriter, Write};

/// Interior fill policies as named on the command line.
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

#[derive(Parser, Debug)]
#[clap(
    name = "sor",
    about = "Solves the 2D Laplace equation with distributed red-black SOR."
)]
struct Args {
    /// Number of interior rows and columns (N).
    #[clap(short = 'n', long, default_value_t = DEFAULT_SIZE)]
    size: usize,
    /// Number of worker ranks. Must divide the grid size.
    #[clap(short = 'p', long, default_value_t = 1)]
    workers: usize,
    /// Convergence tolerance. Defaults to 0.00001 * N.
    #[clap(short = 'd', long)]
    difflimit: Option<f64>,
    /// Interior fill policy.
    #[clap(short = 'I', long, value_enum, default_value_t = InitArg::Rand)]
    init: InitArg,
    /// Upper bound for randomly filled cells.
    #[clap(short = 'm', long, default_value_t = DEFAULT_MAX_VALUE)]
    max_value: u32,
    /// Relaxation factor w, in (0, 2].
    #[clap(short = 'w', long, default_value_t = DEFAULT_RELAXATION)]
    relaxation: f64,
    /// Print the final grid.
    #[clap(short = 'P', long)]
    print: bool,
    /// Stop after this many iterations if the run has not converged.
    #[clap(long, default_value_t = DEFAULT_MAX_ITERATIONS)]
    max_iterations: usize,
    /// Seed for the random fill policy.
    #[clap(long, default_value_t = 0)]
    seed: u64,
    /// Digits after the decimal point in the printed grid.
    #[clap(long, default_value_t = 6)]
    precision: usize,
}

impl Args {
    fn to_config(&self) -> SorConfig {
        SorConfig {
            size: self.size,
            workers: self.workers,
            max_value: self.max_value,
            init: self.init.into(),
            relaxation: self.relaxation,
            difflimit: self.difflimit.unwrap_or_else(|| default_difflimit(self.size)),
            print: self.print,
            max_iterations: self.max_iterations,
            seed: self.seed,
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .try_init()
        .map_err(|e| anyhow!("Failed to initialize logger: {}", e))?;

    let args = Args::parse();
    let config = args.to_config();

    let report = solve(&config).context("Solver run failed")?;

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    if config.print {
        report
            .grid
            .write_to(&mut out, args.precision)
            .context("Failed to write the grid")?;
    }
    writeln!(out, "Number of iterations = {}", report.iterations)?;
    if !report.outcome.is_converged() {
        writeln!(
            out,
            "Stopped at the iteration cap without convergence ({} iterations).",
            config.max_iterations
        )?;
    }
    out.flush().context("Failed to flush standard output")?;
    Ok(())
}
