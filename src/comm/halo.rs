//! Ghost row refresh between row neighbours.
//!
//! Rank `r` sends its first owned row to rank `r - 1` and its last owned row
//! to rank `r + 1`, and overwrites its ghost rows with the matching edges
//! received from them. Only the interior columns travel; the halo columns of a
//! ghost row never change. The top ghost row of the first rank and the bottom
//! ghost row of the last rank are the fixed grid border and are never touched.
//!
//! Both directions complete before [`exchange_halo`] returns, so a relaxation
//! phase started afterwards always reads the neighbours' current edges.

use super::{CommError, Communicator, Message};
use crate::grid::Band;

/// Swaps edge rows with both row neighbours of `comm.rank()`.
pub fn exchange_halo(comm: &Communicator, band: &mut Band) -> Result<(), CommError> {
    let rank = comm.rank();
    let columns = band.columns();
    let first = band.offset();
    let last = band.last_row();

    // Sends never block, so both edges can leave before either ghost arrives.
    if rank > 0 {
        comm.send(rank - 1, Message::HaloRow(band.row(first)[1..=columns].to_vec()))?;
    }
    if rank + 1 < comm.size() {
        comm.send(rank + 1, Message::HaloRow(band.row(last)[1..=columns].to_vec()))?;
    }

    if rank > 0 {
        let above = comm.recv_halo_row(rank - 1, columns)?;
        band.row_mut(first - 1)[1..=columns].copy_from_slice(&above);
    }
    if rank + 1 < comm.size() {
        let below = comm.recv_halo_row(rank + 1, columns)?;
        band.row_mut(last + 1)[1..=columns].copy_from_slice(&below);
    }
    Ok(())
}
