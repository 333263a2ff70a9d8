//! Local convergence test of a worker's band.
//!
//! After each phase a worker computes the largest row sum over its owned rows
//! and compares it with the value it computed the previous time the *same*
//! color was relaxed, i.e. two iterations earlier. A change within `difflimit`
//! is this worker's vote to stop. The vote says nothing about other bands; the
//! votes are combined by the termination protocol.

use super::Phase;
use crate::grid::Band;

/// Largest sum of interior values over the owned rows of `band`.
pub fn max_row_sum(band: &Band) -> f64 {
    let columns = band.columns();
    band.owned()
        .chunks(band.width())
        .map(|row| row[1..=columns].iter().sum::<f64>())
        .fold(f64::NEG_INFINITY, f64::max)
}

/// Per-color history of the maximum row sum.
#[derive(Clone, Debug, PartialEq)]
pub struct ConvergenceTracker {
    difflimit: f64,
    previous: [f64; 2],
}

impl ConvergenceTracker {
    /// Both colors start from a previous maximum of zero.
    pub fn new(difflimit: f64) -> Self {
        ConvergenceTracker {
            difflimit,
            previous: [0.0; 2],
        }
    }

    /// Records `local_max` for `phase` and returns the local vote.
    pub fn observe(&mut self, phase: Phase, local_max: f64) -> bool {
        let slot = &mut self.previous[phase.parity()];
        let converged = (local_max - *slot).abs() <= self.difflimit;
        *slot = local_max;
        converged
    }

    /// The last maximum recorded for `phase`.
    pub fn previous_max(&self, phase: Phase) -> f64 {
        self.previous[phase.parity()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Grid;
    use crate::partition::Partition;

    #[test]
    fn test_max_row_sum_ignores_border_and_ghosts() {
        let grid = Grid::initialize(4, |i, _| i as f64);
        let partition = Partition::new(4, 2).unwrap();
        // Rows 1 and 2; the ghost row 3 would sum to 12.
        let band = grid.band(&partition, 0);
        assert_eq!(max_row_sum(&band), 8.0);
        let band = grid.band(&partition, 1);
        assert_eq!(max_row_sum(&band), 16.0);
    }

    #[test]
    fn test_max_row_sum_handles_negative_rows() {
        let grid = Grid::initialize(2, |i, _| -(i as f64));
        let partition = Partition::new(2, 1).unwrap();
        assert_eq!(max_row_sum(&grid.band(&partition, 0)), -2.0);
    }

    #[test]
    fn test_each_color_compares_with_its_own_history() {
        let mut tracker = ConvergenceTracker::new(0.1);
        assert!(!tracker.observe(Phase::Even, 10.0));
        assert!(!tracker.observe(Phase::Odd, 20.0));
        // Even is compared with 10.0, not with the odd value in between.
        assert!(tracker.observe(Phase::Even, 10.05));
        assert!(!tracker.observe(Phase::Odd, 19.0));
        assert_eq!(tracker.previous_max(Phase::Even), 10.05);
        assert_eq!(tracker.previous_max(Phase::Odd), 19.0);
    }

    #[test]
    fn test_tolerance_is_inclusive() {
        let mut tracker = ConvergenceTracker::new(0.5);
        assert!(tracker.observe(Phase::Even, 0.5));
        let mut strict = ConvergenceTracker::new(0.0);
        assert!(!strict.observe(Phase::Odd, 1e-12));
        assert!(strict.observe(Phase::Odd, 1e-12));
    }
}
