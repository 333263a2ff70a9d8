//! Low-level numerical kernels of the red-black SOR method.
//!
//! ** NOTE: We recommend using the high-level method [`crate::solvers::solve`] instead. These
//! modules are intended for callers who drive the ranks themselves, for instance to observe
//! the grid between phases.
//!
//! - [`relax`]: applies one color phase of the weighted Gauss-Seidel update to a band.
//! - [`convergence`]: tracks the maximum row sum per color and produces the local vote.

pub mod convergence;
pub mod relax;

pub use convergence::{ConvergenceTracker, max_row_sum};
pub use relax::relax_phase;

/// The color of a red-black sweep.
///
/// Cell `(m, n)` belongs to [`Phase::Even`] iff `(m + n) % 2 == 0`, with `m` and
/// `n` taken in global grid coordinates. Phases alternate strictly, starting
/// with `Even`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    Even,
    Odd,
}

impl Phase {
    /// The value of `(m + n) % 2` for cells of this color.
    pub fn parity(self) -> usize {
        match self {
            Phase::Even => 0,
            Phase::Odd => 1,
        }
    }

    /// The phase that follows this one.
    pub fn flip(self) -> Phase {
        match self {
            Phase::Even => Phase::Odd,
            Phase::Odd => Phase::Even,
        }
    }

    /// Whether global cell `(row, col)` is updated during this phase.
    pub fn owns(self, row: usize, col: usize) -> bool {
        (row + col) % 2 == self.parity()
    }
}
