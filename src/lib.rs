//! Distributed red-black SOR solver for the two-dimensional Laplace equation.
//!
//! This crate relaxes an `(N+2) x (N+2)` grid with fixed borders towards the discrete
//! harmonic function that matches them. The interior rows are split into `P` contiguous
//! bands of `N / P` rows, and each band is owned by one worker rank. Ranks share no
//! memory: they only talk through point-to-point messages, and every rank runs on its
//! own thread.
//!
//! ## Algorithm
//!
//! Cells are colored like a checkerboard by the parity of `row + col`. One iteration
//! relaxes a single color:
//!
//! ```text
//! x[m][n] <- (1 - w) * x[m][n] + w * (x[m-1][n] + x[m+1][n] + x[m][n-1] + x[m][n+1]) / 4
//! ```
//!
//! Because every neighbour of a cell has the opposite color, all cells of one color can
//! be updated in any order. Before each relaxation the ranks refresh their ghost rows
//! with their neighbours' edge rows (the halo exchange). After it, each rank compares
//! the largest row sum of its band with the value it saw two iterations earlier, for the
//! same color, and votes to stop when the change is within `difflimit`. The coordinator
//! (rank 0) ORs every vote and broadcasts the decision, so all ranks stop together.
//! Finally the coordinator gathers every band back into the full grid.
//!
//! ## Modules
//!
//! - [`config`]: run parameters and their validation.
//! - [`grid`]: the full [`Grid`] and the per-rank [`Band`].
//! - [`partition`]: the row band layout.
//! - [`algorithms`]: the relaxation sweep and the local convergence test.
//! - [`comm`]: the message transport and the halo, termination and transfer protocols.
//! - [`worker`]: the per-rank iteration loop.
//! - [`solvers`]: the high-level entry points.
//!
//! ## Example Usage
//!
//! ```rust
//! use redblack_sor::{solve, InitPolicy, Outcome, SorConfig};
//!
//! let config = SorConfig {
//!     workers: 2,
//!     init: InitPolicy::Fast,
//!     relaxation: 1.0,
//!     difflimit: 1e-3,
//!     ..SorConfig::with_size(8)
//! };
//! let report = solve(&config).unwrap();
//!
//! assert_eq!(report.outcome, Outcome::Converged);
//! assert!(report.iterations < config.max_iterations);
//! assert_eq!(report.grid.size(), 8);
//! ```

pub mod algorithms;
pub mod comm;
pub mod config;
pub mod error;
pub mod grid;
pub mod partition;
pub mod solvers;
pub mod worker;

pub use config::{InitPolicy, SorConfig};
pub use error::{SorError, SorErrorKind};
pub use grid::{Band, Grid};
pub use partition::Partition;
pub use solvers::{solve, solve_grid, Outcome, SolveReport};
