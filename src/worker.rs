//! The iteration loop executed by every rank.
//!
//! One iteration of a [`Worker`] performs, in this order:
//!
//! 1. a halo exchange with both row neighbours,
//! 2. a relaxation of the current color over the owned rows,
//! 3. the local convergence test for that color,
//! 4. the color flip,
//! 5. one round of the termination protocol.
//!
//! Every rank runs the same sequence in lock step, so all ranks agree on the
//! decision and on the iteration count at which the loop stops.

use crate::algorithms::{max_row_sum, relax_phase, ConvergenceTracker, Phase};
use crate::comm::{exchange_halo, CommError, Communicator, TerminationCoordinator};
use crate::config::SorConfig;
use crate::grid::Band;

/// Iterations between two progress messages.
const PROGRESS_INTERVAL: usize = 100;

/// How a run ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Outcome {
    /// At least one rank's local test succeeded and every rank stopped.
    Converged,
    /// The iteration cap was reached without a positive decision.
    IterationCapReached,
}

impl Outcome {
    pub fn is_converged(self) -> bool {
        self == Outcome::Converged
    }
}

/// What a rank hands back once its loop has stopped.
#[derive(Clone, Debug, PartialEq)]
pub struct WorkerResult {
    pub band: Band,
    pub iterations: usize,
    pub outcome: Outcome,
}

/// State of one rank between iterations.
pub struct Worker<'a> {
    comm: &'a Communicator,
    band: Band,
    phase: Phase,
    tracker: ConvergenceTracker,
    termination: TerminationCoordinator,
    relaxation: f64,
    max_iterations: usize,
    iteration: usize,
}

impl<'a> Worker<'a> {
    /// Prepares a worker that relaxes `band` with the parameters of `config`.
    pub fn new(comm: &'a Communicator, band: Band, config: &SorConfig) -> Self {
        Worker {
            comm,
            band,
            phase: Phase::Even,
            tracker: ConvergenceTracker::new(config.difflimit),
            termination: TerminationCoordinator::new(),
            relaxation: config.relaxation,
            max_iterations: config.max_iterations,
            iteration: 0,
        }
    }

    pub fn band(&self) -> &Band {
        &self.band
    }

    /// The color the next iteration will relax.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Number of completed iterations.
    pub fn iteration(&self) -> usize {
        self.iteration
    }

    /// Runs one iteration and returns the global stop decision.
    pub fn iterate(&mut self) -> Result<bool, CommError> {
        self.iteration += 1;

        exchange_halo(self.comm, &mut self.band)?;
        relax_phase(&mut self.band, self.phase, self.relaxation);

        let local_max = max_row_sum(&self.band);
        let previous = self.tracker.previous_max(self.phase);
        let vote = self.tracker.observe(self.phase, local_max);
        if self.iteration % PROGRESS_INTERVAL == 0 {
            log::debug!(
                "Rank {}: iteration {}, max = {:.6}, previous {:?} max = {:.6}",
                self.comm.rank(),
                self.iteration,
                local_max,
                self.phase,
                previous
            );
        }
        self.phase = self.phase.flip();

        self.termination.resolve(self.comm, vote)
    }

    /// Iterates until the ranks decide to stop or the cap is reached.
    pub fn run(mut self) -> Result<WorkerResult, CommError> {
        let outcome = loop {
            if self.iterate()? {
                break Outcome::Converged;
            }
            if self.iteration >= self.max_iterations {
                if self.comm.is_coordinator() {
                    log::warn!(
                        "Maximum number of iterations ({}) reached without convergence.",
                        self.max_iterations
                    );
                }
                break Outcome::IterationCapReached;
            }
        };
        Ok(WorkerResult {
            band: self.band,
            iterations: self.iteration,
            outcome,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comm::World;
    use crate::config::InitPolicy;
    use crate::grid::Grid;
    use crate::partition::Partition;

    fn single_rank_config() -> SorConfig {
        SorConfig {
            init: InitPolicy::Fast,
            relaxation: 1.0,
            difflimit: 1e-3,
            ..SorConfig::with_size(4)
        }
    }

    #[test]
    fn test_phase_alternates_every_iteration() {
        let config = single_rank_config();
        let grid = Grid::from_config(&config);
        let partition = Partition::new(4, 1).unwrap();
        let world = World::create(1);
        let mut worker = Worker::new(&world[0], grid.band(&partition, 0), &config);
        assert_eq!(worker.phase(), Phase::Even);
        worker.iterate().unwrap();
        assert_eq!(worker.phase(), Phase::Odd);
        worker.iterate().unwrap();
        assert_eq!(worker.phase(), Phase::Even);
        assert_eq!(worker.iteration(), 2);
    }

    #[test]
    fn test_first_iteration_relaxes_even_cells_only() {
        let config = single_rank_config();
        let grid = Grid::from_config(&config);
        let partition = Partition::new(4, 1).unwrap();
        let world = World::create(1);
        let mut worker = Worker::new(&world[0], grid.band(&partition, 0), &config);
        worker.iterate().unwrap();
        for m in 1..=4 {
            for n in 1..=4 {
                if Phase::Odd.owns(m, n) {
                    assert_eq!(worker.band().get(m, n), grid.get(m, n));
                }
            }
        }
    }

    #[test]
    fn test_cap_is_reported_distinctly() {
        let config = SorConfig {
            difflimit: 0.0,
            max_iterations: 5,
            init: InitPolicy::Random,
            ..SorConfig::with_size(6)
        };
        let grid = Grid::from_config(&config);
        let partition = Partition::new(6, 1).unwrap();
        let world = World::create(1);
        let result = Worker::new(&world[0], grid.band(&partition, 0), &config)
            .run()
            .unwrap();
        assert_eq!(result.outcome, Outcome::IterationCapReached);
        assert_eq!(result.iterations, 5);
    }

    #[test]
    fn test_converges_before_the_cap() {
        let config = single_rank_config();
        let grid = Grid::from_config(&config);
        let partition = Partition::new(4, 1).unwrap();
        let world = World::create(1);
        let result = Worker::new(&world[0], grid.band(&partition, 0), &config)
            .run()
            .unwrap();
        assert!(result.outcome.is_converged());
        assert!(result.iterations < config.max_iterations);
    }
}
