//! Read/write access to grid cells
//!
//! The allocation engine only talks to grids through these traits, so any
//! storage that can hand out rows and single cells can take part in a run.

use crate::error::Result;

/// Read-only view over a grid of `f64` cells with a no-data sentinel.
pub trait GridRead {
    fn rows(&self) -> usize;

    fn cols(&self) -> usize;

    /// The sentinel meaning "no value here"
    fn nodata(&self) -> f64;

    /// Bulk read of a whole row, `O(cols)`.
    fn get_row(&self, row: usize) -> Result<&[f64]>;

    /// Single-cell read, `O(1)`.
    ///
    /// Reads outside the grid answer `nodata()` instead of failing; callers
    /// walking flow paths rely on this to treat the edge as terminal.
    fn get_value(&self, row: usize, col: usize) -> f64;

    fn shape(&self) -> (usize, usize) {
        (self.rows(), self.cols())
    }

    /// Whether signed coordinates fall inside the grid
    fn contains(&self, row: isize, col: isize) -> bool {
        row >= 0 && col >= 0 && (row as usize) < self.rows() && (col as usize) < self.cols()
    }

    /// Cell value at signed coordinates, `None` outside the grid
    fn value_at(&self, row: isize, col: isize) -> Option<f64> {
        if self.contains(row, col) {
            Some(self.get_value(row as usize, col as usize))
        } else {
            None
        }
    }

    /// NaN always counts as no-data, whatever the sentinel is.
    fn is_nodata(&self, value: f64) -> bool {
        value.is_nan() || value == self.nodata()
    }
}

/// Mutable access to a grid.
pub trait GridWrite: GridRead {
    /// Overwrite the cell at (row, col). Writes outside the grid are dropped.
    fn set_value(&mut self, row: usize, col: usize, value: f64);
}
