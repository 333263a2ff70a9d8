//! One color phase of the red-black successive over-relaxation sweep.
//!
//! For every owned cell `(m, n)` of the current color:
//!
//! ```text
//! A[m][n] = (1 - w) * A[m][n] + w * (A[m-1][n] + A[m+1][n] + A[m][n-1] + A[m][n+1]) / 4
//! ```
//!
//! Every neighbour of a cell has the opposite color, so the updates within a
//! phase are independent of each other and of the order in which they run. The
//! first and last owned rows read the ghost rows, which must hold the
//! neighbours' current edges before the phase starts.

use super::Phase;
use crate::grid::Band;

/// Relaxes every owned cell of color `phase` in place with weight `w`.
///
/// Ghost rows and halo columns are read but never written.
pub fn relax_phase(band: &mut Band, phase: Phase, w: f64) {
    let width = band.width();
    let columns = band.columns();
    let offset = band.offset();
    let rows = band.rows();
    let data = band.as_mut_slice();

    for local in 1..=rows {
        let m = offset + local - 1;
        // First interior column of this color on row m.
        let first = if phase.owns(m, 1) { 1 } else { 2 };
        for n in (first..=columns).step_by(2) {
            let idx = local * width + n;
            let neighbours = data[idx - width] + data[idx + width] + data[idx - 1] + data[idx + 1];
            data[idx] = (1.0 - w) * data[idx] + w * neighbours / 4.0;
        }
    }
}
