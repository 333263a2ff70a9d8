//! Run configuration for the distributed solver.
//!
//! [`SorConfig`] gathers every input the core consumes: the interior size, the
//! number of row bands, the fill policy and its bound, the relaxation factor, the
//! convergence tolerance and the iteration cap. Defaults follow the classic
//! laboratory setup (a 2048x2048 random grid, `w = 0.5`).

use crate::error::{SorError, SorErrorKind};
use serde::{Deserialize, Serialize};

/// Default interior size.
pub const DEFAULT_SIZE: usize = 2048;

/// Default upper bound for randomly filled cells.
pub const DEFAULT_MAX_VALUE: u32 = 15;

/// Default relaxation factor.
pub const DEFAULT_RELAXATION: f64 = 0.5;

/// Iteration cap after which a run is reported as not converged.
pub const DEFAULT_MAX_ITERATIONS: usize = 100_000;

/// The default tolerance scales with the interior size.
const DIFFLIMIT_PER_ROW: f64 = 0.00001;

/// How the interior cells are filled before the first sweep.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InitPolicy {
    /// Every cell of row `i` holds `i / 2`.
    Count,
    /// Uniform integers in `1..=max_value` from a seeded generator.
    Random,
    /// Alternating `1.0` / `5.0` checkerboard.
    Fast,
}

/// All tunable inputs of a solve.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SorConfig {
    /// Number of interior rows (and columns).
    pub size: usize,
    /// Number of row bands, one per worker rank.
    pub workers: usize,
    /// Upper bound for the random fill policy.
    pub max_value: u32,
    /// Interior fill policy.
    pub init: InitPolicy,
    /// SOR weight `w`, expected in `(0, 2]`.
    pub relaxation: f64,
    /// Convergence tolerance on the change of the maximum row sum.
    pub difflimit: f64,
    /// Whether the caller wants the assembled grid dumped at the end.
    pub print: bool,
    /// Hard cap on the number of iterations.
    pub max_iterations: usize,
    /// Seed of the random fill policy.
    pub seed: u64,
}

impl Default for SorConfig {
    fn default() -> Self {
        SorConfig {
            size: DEFAULT_SIZE,
            workers: 1,
            max_value: DEFAULT_MAX_VALUE,
            init: InitPolicy::Random,
            relaxation: DEFAULT_RELAXATION,
            difflimit: default_difflimit(DEFAULT_SIZE),
            print: false,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            seed: 0,
        }
    }
}

/// The tolerance used when none is given explicitly.
pub fn default_difflimit(size: usize) -> f64 {
    DIFFLIMIT_PER_ROW * size as f64
}

impl SorConfig {
    /// Default configuration for an `size x size` interior, with the tolerance
    /// rescaled to the new size.
    pub fn with_size(size: usize) -> Self {
        SorConfig {
            size,
            difflimit: default_difflimit(size),
            ..SorConfig::default()
        }
    }

    /// Checks every parameter, returning the first violation found.
    pub fn validate(&self) -> Result<(), SorError> {
        if self.size == 0 {
            return Err(invalid("grid size must be positive".to_string()));
        }
        if self.workers == 0 {
            return Err(invalid("worker count must be positive".to_string()));
        }
        if self.size % self.workers != 0 {
            return Err(SorErrorKind::IndivisibleGrid {
                size: self.size,
                workers: self.workers,
            }
            .into());
        }
        if self.init == InitPolicy::Random && self.max_value == 0 {
            return Err(invalid(
                "max value must be positive for the random fill policy".to_string(),
            ));
        }
        if !(self.relaxation > 0.0 && self.relaxation <= 2.0) {
            return Err(invalid(format!(
                "relaxation factor must lie in (0, 2], got {}",
                self.relaxation
            )));
        }
        if !self.difflimit.is_finite() || self.difflimit < 0.0 {
            return Err(invalid(format!(
                "difflimit must be a finite non-negative number, got {}",
                self.difflimit
            )));
        }
        if self.max_iterations == 0 {
            return Err(invalid("max iterations must be positive".to_string()));
        }
        Ok(())
    }
}

fn invalid(message: String) -> SorError {
    SorErrorKind::InvalidParameter(message).into()
}
