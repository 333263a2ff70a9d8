//! Row-band decomposition of the interior grid.
//!
//! The `N` interior rows are split into `P` contiguous bands of equal height.
//! Rows are numbered from 1 (row 0 is the fixed top boundary), so rank `r`
//! owns rows `offset(r) ..= offset(r) + rows_per_worker - 1` with
//! `offset(r) = 1 + r * rows_per_worker`.

use crate::error::{SorError, SorErrorKind};
use std::ops::RangeInclusive;

/// An equal split of `size` interior rows across `workers` ranks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Partition {
    size: usize,
    workers: usize,
    rows_per_worker: usize,
}

impl Partition {
    /// Computes the partition, failing when the rows cannot be shared equally.
    pub fn new(size: usize, workers: usize) -> Result<Self, SorError> {
        if workers == 0 || size == 0 {
            return Err(SorErrorKind::InvalidParameter(format!(
                "cannot partition {size} rows across {workers} workers"
            ))
            .into());
        }
        if size % workers != 0 {
            return Err(SorErrorKind::IndivisibleGrid { size, workers }.into());
        }
        Ok(Partition {
            size,
            workers,
            rows_per_worker: size / workers,
        })
    }

    /// Number of interior rows.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn rows_per_worker(&self) -> usize {
        self.rows_per_worker
    }

    /// First interior row owned by `rank`.
    ///
    /// # Panics
    /// Panics if `rank` is not a valid rank of this partition.
    pub fn offset(&self, rank: usize) -> usize {
        assert!(
            rank < self.workers,
            "rank {rank} out of range for {} workers",
            self.workers
        );
        1 + rank * self.rows_per_worker
    }

    /// The interior rows owned by `rank`.
    pub fn rows_of(&self, rank: usize) -> RangeInclusive<usize> {
        let offset = self.offset(rank);
        offset..=offset + self.rows_per_worker - 1
    }

    /// Iterates over `(rank, offset)` for every rank in ascending order.
    pub fn bands(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (0..self.workers).map(move |rank| (rank, self.offset(rank)))
    }
}
