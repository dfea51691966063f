//! Flow-direction grid viewed as a graph with one outgoing edge per cell

use super::d8::{decode, Decoded};
use flowalloc_core::GridRead;

/// Grid cell as (row, col)
pub type Cell = (usize, usize);

/// Result of following one cell's outgoing edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FlowStep {
    /// Flow continues into this cell.
    Next(Cell),
    /// Pit, outlet or no-data: the path ends here.
    Terminal,
    /// The direction points outside the grid.
    OffGrid,
    /// The stored value is not a D8 code.
    Malformed(f64),
}

/// Implicit downstream graph over a D8 flow-direction grid.
pub struct FlowGraph<'a, F: GridRead + ?Sized> {
    flow_dir: &'a F,
}

impl<'a, F: GridRead + ?Sized> FlowGraph<'a, F> {
    pub fn new(flow_dir: &'a F) -> Self {
        Self { flow_dir }
    }

    pub fn shape(&self) -> (usize, usize) {
        self.flow_dir.shape()
    }

    /// Whether the cell carries a flow direction at all (it is inside the study area).
    pub fn has_direction(&self, (row, col): Cell) -> bool {
        !self.flow_dir.is_nodata(self.flow_dir.get_value(row, col))
    }

    /// Follow the outgoing edge of `cell`.
    pub fn step(&self, (row, col): Cell) -> FlowStep {
        let value = self.flow_dir.get_value(row, col);
        match decode(value, self.flow_dir.nodata()) {
            Decoded::Terminal => FlowStep::Terminal,
            Decoded::Malformed(code) => FlowStep::Malformed(code),
            Decoded::Step(dir) => {
                let (dr, dc) = dir.offset();
                let nr = row as isize + dr;
                let nc = col as isize + dc;
                if self.flow_dir.contains(nr, nc) {
                    FlowStep::Next((nr as usize, nc as usize))
                } else {
                    FlowStep::OffGrid
                }
            }
        }
    }

    /// Downstream neighbour of `cell`, `None` wherever the path ends.
    pub fn outgoing(&self, cell: Cell) -> Option<Cell> {
        match self.step(cell) {
            FlowStep::Next(next) => Some(next),
            _ => None,
        }
    }

    /// Cells visited from `start` (inclusive) until the path ends, a cell
    /// repeats, or `max_len` cells have been collected.
    pub fn downstream_path(&self, start: Cell, max_len: usize) -> Vec<Cell> {
        let mut path = vec![start];
        let mut cur = start;
        while path.len() < max_len {
            match self.outgoing(cur) {
                Some(next) if !path.contains(&next) => {
                    path.push(next);
                    cur = next;
                }
                _ => break,
            }
        }
        path
    }
}
