//! Integration tests for the message protocols between worker ranks.
//!
//! Each test builds a [`World`] of endpoints and drives the ranks on scoped threads,
//! the same way the solver does, but stops at the protocol level so that ghost rows,
//! votes and gathered bands can be inspected directly.

use anyhow::{anyhow, ensure, Result};
use redblack_sor::comm::{
    exchange_halo, gather_bands, receive_band, scatter_bands, send_band, CommError, Message,
    TerminationCoordinator, World,
};
use redblack_sor::worker::Worker;
use redblack_sor::{Grid, InitPolicy, Partition, SorConfig};
use std::thread;

fn random_config(size: usize, workers: usize) -> SorConfig {
    SorConfig {
        workers,
        init: InitPolicy::Random,
        difflimit: 0.0,
        seed: 3,
        ..SorConfig::with_size(size)
    }
}

/// Joins every handle, turning a panicked rank into an error.
fn join_all<T>(handles: Vec<thread::ScopedJoinHandle<'_, T>>) -> Result<Vec<T>> {
    handles
        .into_iter()
        .map(|handle| handle.join().map_err(|_| anyhow!("a rank panicked")))
        .collect()
}

#[test]
fn test_ghost_rows_hold_the_neighbour_edge_from_before_the_sweep() -> Result<()> {
    let config = random_config(8, 2);
    let grid = Grid::from_config(&config);
    let partition = Partition::new(8, 2)?;
    ensure!(partition.rows_of(0) == (1..=4));
    ensure!(partition.rows_of(1) == (5..=8));

    // Each rank reports (ghost rows after iteration 1, edge rows after iteration 1,
    // ghost rows after iteration 2).
    let results = thread::scope(|scope| {
        let handles = World::create(2)
            .into_iter()
            .map(|comm| {
                let band = grid.band(&partition, comm.rank());
                let config = &config;
                scope.spawn(move || -> Result<_, CommError> {
                    let mut worker = Worker::new(&comm, band, config);
                    worker.iterate()?;
                    let first_ghosts = (
                        worker.band().ghost_above().to_vec(),
                        worker.band().ghost_below().to_vec(),
                    );
                    let band = worker.band();
                    let edges = (
                        band.row(band.offset()).to_vec(),
                        band.row(band.last_row()).to_vec(),
                    );
                    worker.iterate()?;
                    let second_ghosts = (
                        worker.band().ghost_above().to_vec(),
                        worker.band().ghost_below().to_vec(),
                    );
                    Ok((first_ghosts, edges, second_ghosts))
                })
            })
            .collect();
        join_all(handles)
    })?;

    let (first0, edges0, second0) = results[0].clone()?;
    let (first1, edges1, second1) = results[1].clone()?;

    // Iteration 1 exchanges the initial edges.
    ensure!(first0.1 == grid.row(5), "rank 0 ghost below is not the initial row 5");
    ensure!(first1.0 == grid.row(4), "rank 1 ghost above is not the initial row 4");
    // Iteration 2 exchanges the edges as they stood after iteration 1.
    ensure!(second0.1 == edges1.0, "rank 0 ghost below is stale");
    ensure!(second1.0 == edges0.1, "rank 1 ghost above is stale");
    // The outer ghosts are the fixed border.
    ensure!(first0.0 == grid.row(0) && second0.0 == grid.row(0));
    ensure!(first1.1 == grid.row(9) && second1.1 == grid.row(9));
    Ok(())
}

#[test]
fn test_repeated_halo_exchange_is_idempotent() -> Result<()> {
    let config = SorConfig {
        max_iterations: 3,
        ..random_config(12, 3)
    };
    let grid = Grid::from_config(&config);
    let partition = Partition::new(12, 3)?;

    let results = thread::scope(|scope| {
        let handles = World::create(3)
            .into_iter()
            .map(|comm| {
                let band = grid.band(&partition, comm.rank());
                let config = &config;
                scope.spawn(move || -> Result<_, CommError> {
                    let mut band = Worker::new(&comm, band, config).run()?.band;
                    exchange_halo(&comm, &mut band)?;
                    let once = band.clone();
                    exchange_halo(&comm, &mut band)?;
                    Ok((once, band))
                })
            })
            .collect();
        join_all(handles)
    })?;

    for (rank, result) in results.into_iter().enumerate() {
        let (once, twice) = result?;
        ensure!(once == twice, "second exchange changed rank {rank}");
    }
    Ok(())
}

#[test]
fn test_scatter_and_gather_round_trip_the_count_grid() -> Result<()> {
    let config = SorConfig {
        workers: 4,
        init: InitPolicy::Count,
        ..SorConfig::with_size(8)
    };
    let grid = Grid::from_config(&config);
    let partition = Partition::new(8, 4)?;
    let covered: usize = (0..4).map(|rank| partition.rows_of(rank).count()).sum();
    ensure!(covered == 8);

    let mut world = World::create(4).into_iter();
    let coordinator = world.next().ok_or_else(|| anyhow!("empty world"))?;
    let source = &grid;
    let gathered = thread::scope(|scope| -> Result<Grid> {
        let handles: Vec<_> = world
            .map(|comm| {
                scope.spawn(move || -> Result<_, CommError> {
                    let band = receive_band(&comm, &partition)?;
                    send_band(&comm, &band)
                })
            })
            .collect();
        let own = scatter_bands(&coordinator, source, &partition)?;
        let mut target = Grid::zeros(8);
        gather_bands(&coordinator, &mut target, &own, &partition)?;
        for result in join_all(handles)? {
            result?;
        }
        Ok(target)
    })?;

    for row in 1..=8 {
        ensure!(gathered.row(row) == grid.row(row), "row {row} was not restored");
    }
    for rank in 0..4 {
        ensure!(gathered.band(&partition, rank).owned() == grid.band(&partition, rank).owned());
    }
    Ok(())
}

#[test]
fn test_positive_decision_is_never_withdrawn() -> Result<()> {
    // votes[round][rank]
    let votes = [
        [false, false, false],
        [false, false, true],
        [false, false, false],
        [false, false, false],
    ];
    let decisions = thread::scope(|scope| {
        let handles = World::create(3)
            .into_iter()
            .map(|comm| {
                let votes = &votes;
                scope.spawn(move || -> Result<Vec<bool>, CommError> {
                    let mut termination = TerminationCoordinator::new();
                    votes
                        .iter()
                        .map(|round| termination.resolve(&comm, round[comm.rank()]))
                        .collect()
                })
            })
            .collect();
        join_all(handles)
    })?;

    for (rank, result) in decisions.into_iter().enumerate() {
        let decisions = result?;
        ensure!(
            decisions == [false, true, true, true],
            "rank {rank} saw decisions {decisions:?}"
        );
    }
    Ok(())
}

#[test]
fn test_dead_rank_aborts_its_neighbours() -> Result<()> {
    let config = random_config(6, 3);
    let grid = Grid::from_config(&config);
    let partition = Partition::new(6, 3)?;
    let mut world = World::create(3);
    drop(world.pop());

    let results = thread::scope(|scope| {
        let handles = world
            .into_iter()
            .map(|comm| {
                let band = grid.band(&partition, comm.rank());
                let config = &config;
                scope.spawn(move || Worker::new(&comm, band, config).run().map(|_| ()))
            })
            .collect();
        join_all(handles)
    })?;

    ensure!(
        results[1] == Err(CommError::Disconnected { rank: 1, peer: 2 }),
        "rank 1 reported {:?}",
        results[1]
    );
    ensure!(
        results[0] == Err(CommError::Disconnected { rank: 0, peer: 1 }),
        "rank 0 reported {:?}",
        results[0]
    );
    Ok(())
}

#[test]
fn test_gather_rejects_a_protocol_violation() -> Result<()> {
    let grid = Grid::zeros(4);
    let partition = Partition::new(4, 2)?;
    let world = World::create(2);
    world[1].send(0, Message::Vote(true))?;

    let own = grid.band(&partition, 0);
    let mut target = grid.clone();
    let err = gather_bands(&world[0], &mut target, &own, &partition)
        .err()
        .ok_or_else(|| anyhow!("a vote was accepted as a band"))?;
    ensure!(
        err.to_string() == "rank 0 expected band transfer from rank 1 but received vote",
        "unexpected error: {err}"
    );
    Ok(())
}
