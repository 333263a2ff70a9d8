//! This module provides a high-level, user-friendly API for running the distributed
//! red-black SOR solver on a full grid.

use crate::{
    comm::{gather_bands, receive_band, scatter_bands, send_band, CommError, Communicator, World},
    config::SorConfig,
    error::{SorError, SorErrorKind},
    grid::Grid,
    partition::Partition,
    worker::Worker,
};
use std::{
    thread,
    time::{Duration, Instant},
};

pub use crate::worker::Outcome;

/// Everything the coordinator reports once a run has stopped.
#[derive(Clone, Debug)]
pub struct SolveReport {
    /// The assembled grid, border included.
    pub grid: Grid,
    /// Number of iterations executed by every rank.
    pub iterations: usize,
    /// Whether the run converged or ran into the iteration cap.
    pub outcome: Outcome,
    /// Wall time from band distribution to the end of result gathering.
    pub elapsed: Duration,
    /// The row bands the run used.
    pub partition: Partition,
}

/// Builds the initial grid described by `config` and solves it.
///
/// # Arguments
/// * `config`: Problem size, worker count, fill policy and solver parameters.
///
/// # Returns
/// A `Result` containing the [`SolveReport`], or a `SorError` if the configuration is
/// invalid or a rank failed.
pub fn solve(config: &SorConfig) -> Result<SolveReport, SorError> {
    config.validate()?;
    log::info!(
        "size = {0}x{0}, maxnum = {1}, difflimit = {2:.7}, init = {3:?}, w = {4}",
        config.size,
        config.max_value,
        config.difflimit,
        config.init,
        config.relaxation
    );
    let grid = Grid::from_config(config);
    solve_grid(grid, config)
}

/// Solves an already initialised grid with `config.workers` ranks.
///
/// The grid's border is used as is. Every rank runs on its own thread and owns
/// its band exclusively; the only data crossing rank boundaries are the
/// messages of the halo, termination and transfer protocols.
///
/// # Arguments
/// * `grid`: The initial grid. Its size must match `config.size`.
/// * `config`: Worker count and solver parameters. The fill policy is ignored.
///
/// # Returns
/// A `Result` containing the [`SolveReport`], or a `SorError`. When several ranks fail,
/// the error that caused the failure is returned rather than the disconnects it triggered
/// on the other ranks.
pub fn solve_grid(grid: Grid, config: &SorConfig) -> Result<SolveReport, SorError> {
    config.validate()?;
    if grid.size() != config.size {
        return Err(SorErrorKind::InvalidParameter(format!(
            "grid has {} interior rows but the configuration expects {}",
            grid.size(),
            config.size
        ))
        .into());
    }
    if config.relaxation >= 2.0 {
        log::warn!(
            "Relaxation factor {} is at the edge of the stable range; the grid may not converge.",
            config.relaxation
        );
    }

    let partition = Partition::new(config.size, config.workers)?;
    log::info!(
        "Splitting {} rows into {} bands of {} rows.",
        partition.size(),
        partition.workers(),
        partition.rows_per_worker()
    );

    let start = Instant::now();
    let mut endpoints = World::create(config.workers).into_iter();
    let coordinator = endpoints.next().ok_or_else(|| {
        SorError::from(SorErrorKind::InvalidParameter(
            "a run needs at least one rank".to_string(),
        ))
    })?;

    let (coordinator_result, participant_results) = thread::scope(|scope| {
        let coordinator_handle =
            scope.spawn(move || run_coordinator(coordinator, grid, &partition, config));
        let participant_handles: Vec<_> = endpoints
            .map(|comm| {
                let rank = comm.rank();
                (
                    rank,
                    scope.spawn(move || run_participant(comm, &partition, config)),
                )
            })
            .collect();

        let participant_results: Vec<_> = participant_handles
            .into_iter()
            .map(|(rank, handle)| (rank, handle.join()))
            .collect();
        (coordinator_handle.join(), participant_results)
    });
    let elapsed = start.elapsed();

    let mut failures = Vec::new();
    let coordinator_output = match coordinator_result {
        Ok(Ok(output)) => Some(output),
        Ok(Err(err)) => {
            failures.push(SorErrorKind::Communication(err));
            None
        }
        Err(_) => {
            failures.push(SorErrorKind::WorkerPanicked { rank: 0 });
            None
        }
    };
    for (rank, result) in participant_results {
        match result {
            Ok(Ok(())) => {}
            Ok(Err(err)) => failures.push(SorErrorKind::Communication(err)),
            Err(_) => failures.push(SorErrorKind::WorkerPanicked { rank }),
        }
    }

    let (grid, iterations, outcome) = match (coordinator_output, root_cause(failures)) {
        (_, Some(kind)) => return Err(kind.into()),
        (Some(output), None) => output,
        (None, None) => {
            return Err(SorErrorKind::InvalidParameter(
                "the coordinator produced no result".to_string(),
            )
            .into())
        }
    };

    match outcome {
        Outcome::Converged => log::info!(
            "Converged after {iterations} iterations in {:.3} s.",
            elapsed.as_secs_f64()
        ),
        Outcome::IterationCapReached => log::info!(
            "Stopped at the iteration cap ({iterations}) after {:.3} s.",
            elapsed.as_secs_f64()
        ),
    }
    if !grid.is_finite() {
        log::warn!("The final grid contains non-finite values; the relaxation diverged.");
    }

    Ok(SolveReport {
        grid,
        iterations,
        outcome,
        elapsed,
        partition,
    })
}

/// Picks the failure that started a cascade: a lost connection is usually the
/// echo of another rank's error.
fn root_cause(failures: Vec<SorErrorKind>) -> Option<SorErrorKind> {
    let is_echo = |kind: &SorErrorKind| {
        matches!(
            kind,
            SorErrorKind::Communication(CommError::Disconnected { .. })
        )
    };
    let mut echoes = Vec::new();
    for kind in failures {
        if is_echo(&kind) {
            echoes.push(kind);
        } else {
            return Some(kind);
        }
    }
    echoes.into_iter().next()
}

fn run_coordinator(
    comm: Communicator,
    mut grid: Grid,
    partition: &Partition,
    config: &SorConfig,
) -> Result<(Grid, usize, Outcome), CommError> {
    let band = scatter_bands(&comm, &grid, partition)?;
    let result = Worker::new(&comm, band, config).run()?;
    gather_bands(&comm, &mut grid, &result.band, partition)?;
    Ok((grid, result.iterations, result.outcome))
}

fn run_participant(
    comm: Communicator,
    partition: &Partition,
    config: &SorConfig,
) -> Result<(), CommError> {
    let band = receive_band(&comm, partition)?;
    let result = Worker::new(&comm, band, config).run()?;
    send_band(&comm, &result.band)
}
