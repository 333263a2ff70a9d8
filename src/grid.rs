//! Dense grid storage for the Laplace problem.
//!
//! The full problem lives in a [`Grid`]: `(N+2) x (N+2)` values in contiguous
//! row-major order, where rows and columns `0` and `N+1` form a halo border that
//! is set once at initialisation and never relaxed. Each worker rank operates on
//! a [`Band`], a copy of its owned rows plus one ghost row above and below.
//!
//! Row indices used by both types are *global*: row `m` of a band is row `m` of
//! the grid it was cut from.

use crate::config::{InitPolicy, SorConfig};
use crate::partition::Partition;
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::io::{self, Write};

/// The full `(N+2) x (N+2)` grid including its halo border.
#[derive(Clone, Debug, PartialEq)]
pub struct Grid {
    size: usize,
    data: Vec<f64>,
}

impl Grid {
    /// An all-zero grid with `size` interior rows and columns.
    pub fn zeros(size: usize) -> Self {
        let width = size + 2;
        Grid {
            size,
            data: vec![0.0; width * width],
        }
    }

    /// Builds a grid whose interior cell `(i, j)` holds `fill(i, j)`.
    ///
    /// `fill` is invoked exactly once per interior cell, in row-major order.
    /// The border is then copied from the nearest interior row or column, and
    /// each corner takes the value of its diagonal interior neighbour.
    pub fn initialize<F>(size: usize, mut fill: F) -> Self
    where
        F: FnMut(usize, usize) -> f64,
    {
        let mut grid = Grid::zeros(size);
        let width = grid.width();
        for i in 1..=size {
            for j in 1..=size {
                grid.data[i * width + j] = fill(i, j);
            }
        }
        grid.apply_boundary();
        grid
    }

    /// Builds the initial grid described by `config`.
    pub fn from_config(config: &SorConfig) -> Self {
        match config.init {
            InitPolicy::Count => Grid::initialize(config.size, count_fill),
            InitPolicy::Fast => Grid::initialize(config.size, fast_fill(config.size)),
            InitPolicy::Random => {
                let mut rng = StdRng::seed_from_u64(config.seed);
                let max_value = config.max_value;
                Grid::initialize(config.size, move |_, _| {
                    f64::from(rng.random_range(1..=max_value))
                })
            }
        }
    }

    fn apply_boundary(&mut self) {
        let n = self.size;
        if n == 0 {
            return;
        }
        let width = self.width();

        let top = self.data[width..2 * width].to_vec();
        self.data[..width].copy_from_slice(&top);
        let bottom = self.data[n * width..(n + 1) * width].to_vec();
        self.data[(n + 1) * width..].copy_from_slice(&bottom);

        for i in 1..=n {
            self.data[i * width] = self.data[i * width + 1];
            self.data[i * width + n + 1] = self.data[i * width + n];
        }

        self.data[0] = self.data[width + 1];
        self.data[n + 1] = self.data[width + n];
        self.data[(n + 1) * width] = self.data[n * width + 1];
        self.data[(n + 1) * width + n + 1] = self.data[n * width + n];
    }

    /// Number of interior rows (and columns).
    pub fn size(&self) -> usize {
        self.size
    }

    /// Length of a full row, halo columns included.
    pub fn width(&self) -> usize {
        self.size + 2
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.width() + col]
    }

    pub fn row(&self, row: usize) -> &[f64] {
        let width = self.width();
        &self.data[row * width..(row + 1) * width]
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Copies the rows owned by `rank` together with both ghost rows.
    pub fn band(&self, partition: &Partition, rank: usize) -> Band {
        let offset = partition.offset(rank);
        let rows = partition.rows_per_worker();
        let width = self.width();
        let values = self.data[(offset - 1) * width..(offset + rows + 1) * width].to_vec();
        Band::from_parts(offset, rows, width, values)
    }

    /// Overwrites whole rows starting at row `offset` with `values`.
    ///
    /// # Panics
    /// Panics if `values` is not a whole number of rows or runs past the grid.
    pub fn store_rows(&mut self, offset: usize, values: &[f64]) {
        let width = self.width();
        assert!(
            values.len() % width == 0,
            "row data of length {} is not a multiple of the row width {width}",
            values.len()
        );
        let start = offset * width;
        self.data[start..start + values.len()].copy_from_slice(values);
    }

    /// Largest deviation of an interior cell from the average of its four
    /// neighbours. Zero at an exact fixed point of the relaxation.
    pub fn max_residual(&self) -> f64 {
        let width = self.width();
        let mut worst = 0.0_f64;
        for i in 1..=self.size {
            for j in 1..=self.size {
                let idx = i * width + j;
                let average = (self.data[idx - width]
                    + self.data[idx + width]
                    + self.data[idx - 1]
                    + self.data[idx + 1])
                    / 4.0;
                worst = worst.max((self.data[idx] - average).abs());
            }
        }
        worst
    }

    /// Returns `true` when every value, border included, is finite.
    pub fn is_finite(&self) -> bool {
        self.data.iter().all(|v| v.is_finite())
    }

    /// Writes every row, border included, as space-separated values with
    /// `precision` digits after the decimal point.
    pub fn write_to<W: Write>(&self, mut out: W, precision: usize) -> io::Result<()> {
        for row in self.data.chunks(self.width()) {
            let mut first = true;
            for value in row {
                if !first {
                    out.write_all(b" ")?;
                }
                write!(out, "{value:.precision$}")?;
                first = false;
            }
            writeln!(out)?;
        }
        Ok(())
    }
}

fn count_fill(row: usize, _col: usize) -> f64 {
    row as f64 / 2.0
}

/// The checkerboard fill drives a counter that advances once per row and once
/// per cell; even counter values give `1.0`, odd ones `5.0`.
fn fast_fill(size: usize) -> impl FnMut(usize, usize) -> f64 {
    move |row, col| {
        let counter = (row - 1) * (size + 1) + 1 + col;
        if counter % 2 == 0 {
            1.0
        } else {
            5.0
        }
    }
}

/// A worker's rows plus the two ghost rows that cache its neighbours' edges.
///
/// Local storage holds `rows + 2` full-width rows: global row `offset - 1`
/// (ghost above), the owned rows `offset ..= offset + rows - 1`, and global row
/// `offset + rows` (ghost below).
#[derive(Clone, Debug, PartialEq)]
pub struct Band {
    offset: usize,
    rows: usize,
    width: usize,
    data: Vec<f64>,
}

impl Band {
    /// Assembles a band from raw storage.
    ///
    /// # Panics
    /// Panics if `values` does not hold exactly `rows + 2` rows of `width` values.
    pub fn from_parts(offset: usize, rows: usize, width: usize, values: Vec<f64>) -> Self {
        assert!(offset >= 1, "band offset must be an interior row");
        assert_eq!(
            values.len(),
            (rows + 2) * width,
            "band storage does not match {rows} rows of width {width} plus ghosts"
        );
        Band {
            offset,
            rows,
            width,
            data: values,
        }
    }

    /// First owned row.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Number of owned rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of interior columns.
    pub fn columns(&self) -> usize {
        self.width - 2
    }

    /// Last owned row.
    pub fn last_row(&self) -> usize {
        self.offset + self.rows - 1
    }

    fn local(&self, row: usize) -> usize {
        assert!(
            row + 1 >= self.offset && row <= self.offset + self.rows,
            "row {row} is outside band {}..={} and its ghosts",
            self.offset,
            self.last_row()
        );
        row + 1 - self.offset
    }

    /// Global row `row`, which may be one of the two ghost rows.
    pub fn row(&self, row: usize) -> &[f64] {
        let local = self.local(row);
        &self.data[local * self.width..(local + 1) * self.width]
    }

    pub(crate) fn row_mut(&mut self, row: usize) -> &mut [f64] {
        let local = self.local(row);
        &mut self.data[local * self.width..(local + 1) * self.width]
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.row(row)[col]
    }

    /// Cached copy of the row directly above the band.
    pub fn ghost_above(&self) -> &[f64] {
        self.row(self.offset - 1)
    }

    /// Cached copy of the row directly below the band.
    pub fn ghost_below(&self) -> &[f64] {
        self.row(self.offset + self.rows)
    }

    /// The owned rows only, contiguous.
    pub fn owned(&self) -> &[f64] {
        &self.data[self.width..(self.rows + 1) * self.width]
    }

    /// Every stored value, ghost rows included.
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }
}
