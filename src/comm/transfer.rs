//! Band distribution at setup and result gathering at the end of a run.
//!
//! At setup the coordinator cuts every participant's band, ghost rows
//! included, out of the full grid and sends it as a single
//! [`Message::BandTransfer`] carrying the band's offset and height. At the end
//! every participant sends back its owned rows only, and the coordinator writes
//! each band into its grid. Every rank is collected exactly once, in rank
//! order, and every band is checked against the partition before it is stored.

use super::{CommError, Communicator, Message, COORDINATOR};
use crate::grid::{Band, Grid};
use crate::partition::Partition;

/// Sends each participant its band and returns the coordinator's own band.
pub fn scatter_bands(
    comm: &Communicator,
    grid: &Grid,
    partition: &Partition,
) -> Result<Band, CommError> {
    debug_assert!(comm.is_coordinator());
    for rank in 1..comm.size() {
        let band = grid.band(partition, rank);
        comm.send(
            rank,
            Message::BandTransfer {
                offset: band.offset(),
                rows: band.rows(),
                values: band.as_slice().to_vec(),
            },
        )?;
    }
    Ok(grid.band(partition, COORDINATOR))
}

fn check_band(
    comm: &Communicator,
    peer: usize,
    owner: usize,
    partition: &Partition,
    offset: usize,
    rows: usize,
) -> Result<(), CommError> {
    let expected_offset = partition.offset(owner);
    let expected_rows = partition.rows_per_worker();
    if offset != expected_offset || rows != expected_rows {
        return Err(CommError::BandMismatch {
            rank: comm.rank(),
            peer,
            offset,
            rows,
            expected_offset,
            expected_rows,
        });
    }
    Ok(())
}

/// Receives this participant's band from the coordinator.
pub fn receive_band(comm: &Communicator, partition: &Partition) -> Result<Band, CommError> {
    let (offset, rows, values) = comm.recv_band(COORDINATOR)?;
    check_band(comm, COORDINATOR, comm.rank(), partition, offset, rows)?;
    let width = partition.size() + 2;
    let expected = (rows + 2) * width;
    if values.len() != expected {
        return Err(CommError::LengthMismatch {
            rank: comm.rank(),
            peer: COORDINATOR,
            expected,
            actual: values.len(),
        });
    }
    log::debug!(
        "Rank {} received {} rows at offset {}.",
        comm.rank(),
        rows,
        offset
    );
    Ok(Band::from_parts(offset, rows, width, values))
}

/// Sends this participant's owned rows back to the coordinator.
pub fn send_band(comm: &Communicator, band: &Band) -> Result<(), CommError> {
    comm.send(
        COORDINATOR,
        Message::BandTransfer {
            offset: band.offset(),
            rows: band.rows(),
            values: band.owned().to_vec(),
        },
    )
}

/// Writes the coordinator's band and every participant's band into `grid`.
pub fn gather_bands(
    comm: &Communicator,
    grid: &mut Grid,
    own: &Band,
    partition: &Partition,
) -> Result<(), CommError> {
    debug_assert!(comm.is_coordinator());
    grid.store_rows(own.offset(), own.owned());
    for source in 1..comm.size() {
        let (offset, rows, values) = comm.recv_band(source)?;
        check_band(comm, source, source, partition, offset, rows)?;
        let expected = rows * grid.width();
        if values.len() != expected {
            return Err(CommError::LengthMismatch {
                rank: comm.rank(),
                peer: source,
                expected,
                actual: values.len(),
            });
        }
        log::debug!("Coordinator stores {rows} rows at offset {offset} from rank {source}.");
        grid.store_rows(offset, &values);
    }
    Ok(())
}
