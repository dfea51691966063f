//! Cost allocation along D8 flow paths
//!
//! Assigns every cell the value of the source region its flow path drains
//! into. Typically the flow grid is the back-link raster produced by a
//! cost-distance run, so the result partitions the study area by the
//! cheapest source.
//!
//! Two passes over the grid, row-major:
//!
//! 1. **Seed**: cells with a positive source value copy it to the output.
//! 2. **Resolve**: every cell with a flow direction and no value yet walks
//!    downstream until it meets a cell whose value is already known, then
//!    back-fills the whole walked path with that value. Paths that end at a
//!    pit, the grid edge or a malformed code resolve to no-data.
//!
//! Each cell is walked at most once, so the resolve pass is linear in the
//! number of cells. A walk that revisits one of its own cells (a cycle in a
//! malformed flow grid) is broken and its cells resolve to no-data.

use super::flow_graph::{Cell, FlowGraph, FlowStep};
use flowalloc_core::raster::DataType;
use flowalloc_core::run::row_percent;
use flowalloc_core::{Algorithm, Error, Grid, GridRead, GridWrite, Result, RunContext};
use tracing::{debug, warn};

const SEED_LABEL: &str = "Loop 1 of 2:";
const RESOLVE_LABEL: &str = "Loop 2 of 2:";

/// Parameters for cost allocation
#[derive(Debug, Clone)]
pub struct AllocationParams {
    /// Longest flow path a single walk may follow. `None` bounds walks by the
    /// number of cells, which no acyclic path can exceed. Walks that hit a
    /// smaller bound are abandoned and their cells left unresolved.
    pub max_path_len: Option<usize>,
    /// Source values strictly greater than this seed the output.
    pub seed_threshold: f64,
}

impl Default for AllocationParams {
    fn default() -> Self {
        Self {
            max_path_len: None,
            seed_threshold: 0.0,
        }
    }
}

/// Counters collected over one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllocationStats {
    /// Cells seeded from the source grid
    pub seeded: usize,
    /// Cells that received a source value in the resolve pass
    pub resolved: usize,
    /// Cells with a flow direction whose path never reached a source. A
    /// no-data flow cell that merely ends a walk is not counted.
    pub unresolved: usize,
    /// Flow cells holding a value that is not a D8 code
    pub malformed_codes: usize,
    /// Walks that ran into their own path
    pub cycles_broken: usize,
    /// Walks abandoned at `max_path_len`
    pub paths_truncated: usize,
}

/// Allocation result: the output grid plus run counters
#[derive(Debug, Clone)]
pub struct AllocationOutput {
    pub grid: Grid,
    pub stats: AllocationStats,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CellState {
    /// Value not known yet
    Open,
    /// On the walk in progress
    OnPath,
    /// Final value (a source value or no-data) is in the output grid
    Settled,
}

/// Two-pass allocation state for one run.
///
/// The passes can be driven row by row in any order through [`seed_row`] and
/// [`resolve_row`]; the final grid does not depend on the order rows are
/// resolved in, as long as every row is seeded first.
///
/// [`seed_row`]: AllocationEngine::seed_row
/// [`resolve_row`]: AllocationEngine::resolve_row
pub struct AllocationEngine<'a, S: GridRead + ?Sized, F: GridRead + ?Sized> {
    source: &'a S,
    graph: FlowGraph<'a, F>,
    output: Grid,
    state: Vec<CellState>,
    path: Vec<Cell>,
    max_path_len: usize,
    seed_threshold: f64,
    stats: AllocationStats,
}

impl<'a, S: GridRead + ?Sized, F: GridRead + ?Sized> AllocationEngine<'a, S, F> {
    /// Set up a run writing into `output`.
    ///
    /// Cells of `output` that already hold a value count as resolved, so an
    /// engine built over a finished output has nothing left to do.
    pub fn new(source: &'a S, flow_dir: &'a F, output: Grid, params: &AllocationParams) -> Result<Self> {
        let (rows, cols) = source.shape();
        let (fr, fc) = flow_dir.shape();
        if (rows, cols) != (fr, fc) {
            return Err(Error::SizeMismatch { er: rows, ec: cols, ar: fr, ac: fc });
        }
        let (or, oc) = output.shape();
        if (rows, cols) != (or, oc) {
            return Err(Error::SizeMismatch { er: rows, ec: cols, ar: or, ac: oc });
        }
        let cells = rows * cols;
        let max_path_len = match params.max_path_len {
            Some(0) => {
                return Err(Error::InvalidParameter {
                    name: "max_path_len",
                    value: "0".into(),
                    reason: "a walk needs at least one cell".into(),
                })
            }
            Some(n) => n,
            None => cells.max(1),
        };

        let mut state = Vec::new();
        state
            .try_reserve_exact(cells)
            .map_err(|_| Error::OutOfMemory { cells })?;
        state.extend(output.data().iter().map(|&v| {
            if output.is_nodata(v) {
                CellState::Open
            } else {
                CellState::Settled
            }
        }));

        Ok(Self {
            source,
            graph: FlowGraph::new(flow_dir),
            output,
            state,
            path: Vec::new(),
            max_path_len,
            seed_threshold: params.seed_threshold,
            stats: AllocationStats::default(),
        })
    }

    pub fn rows(&self) -> usize {
        self.output.rows()
    }

    pub fn cols(&self) -> usize {
        self.output.cols()
    }

    pub fn stats(&self) -> &AllocationStats {
        &self.stats
    }

    pub fn output(&self) -> &Grid {
        &self.output
    }

    #[inline]
    fn index(&self, (row, col): Cell) -> usize {
        row * self.output.cols() + col
    }

    /// Seed pass for one row: copy positive source values to the output.
    pub fn seed_row(&mut self, row: usize) -> Result<()> {
        let source = self.source;
        let values = source.get_row(row)?;
        for (col, &value) in values.iter().enumerate() {
            if source.is_nodata(value) || value <= self.seed_threshold {
                continue;
            }
            let idx = self.index((row, col));
            if self.state[idx] != CellState::Settled {
                self.stats.seeded += 1;
            }
            self.output.set_value(row, col, value);
            self.state[idx] = CellState::Settled;
        }
        Ok(())
    }

    /// Resolve pass for one row.
    pub fn resolve_row(&mut self, row: usize) {
        for col in 0..self.cols() {
            let cell = (row, col);
            if self.state[self.index(cell)] == CellState::Open && self.graph.has_direction(cell) {
                self.resolve_from(cell);
            }
        }
    }

    /// Walk downstream from `start` until a settled cell or the end of the
    /// path, then write the value found into every walked cell.
    fn resolve_from(&mut self, start: Cell) -> f64 {
        let nodata = self.output.nodata();
        let mut path = std::mem::take(&mut self.path);
        path.clear();

        let mut cur = start;
        let mut truncated = false;
        let z = loop {
            let idx = self.index(cur);
            match self.state[idx] {
                CellState::Settled => break self.output.get_value(cur.0, cur.1),
                CellState::OnPath => {
                    self.stats.cycles_broken += 1;
                    warn!(row = cur.0, col = cur.1, "flow path revisits a cell, breaking cycle");
                    break nodata;
                }
                CellState::Open => {}
            }
            if path.len() >= self.max_path_len {
                truncated = true;
                break nodata;
            }
            self.state[idx] = CellState::OnPath;
            path.push(cur);

            match self.graph.step(cur) {
                FlowStep::Next(next) => cur = next,
                FlowStep::Terminal | FlowStep::OffGrid => break nodata,
                FlowStep::Malformed(code) => {
                    self.stats.malformed_codes += 1;
                    warn!(row = cur.0, col = cur.1, code, "not a D8 flow direction, treating as terminal");
                    break nodata;
                }
            }
        };

        if truncated {
            // Leave the cells open: a walk starting further down may still
            // reach a source within the bound.
            self.stats.paths_truncated += 1;
            debug!(row = start.0, col = start.1, len = path.len(), "flow path exceeds max_path_len");
            for &cell in &path {
                let idx = self.index(cell);
                self.state[idx] = CellState::Open;
            }
        } else {
            let resolved = !self.output.is_nodata(z);
            for &(row, col) in &path {
                self.output.set_value(row, col, z);
                let idx = self.index((row, col));
                self.state[idx] = CellState::Settled;
            }
            if resolved {
                self.stats.resolved += path.len();
            } else {
                let graph = &self.graph;
                self.stats.unresolved +=
                    path.iter().filter(|&&cell| graph.has_direction(cell)).count();
            }
        }

        self.path = path;
        z
    }

    /// Run both passes in row-major order, reporting progress and polling
    /// for cancellation once per row.
    pub fn run(mut self, ctx: &mut RunContext<'_>) -> Result<AllocationOutput> {
        let rows = self.rows();

        ctx.report_progress(SEED_LABEL, 0);
        for row in 0..rows {
            self.seed_row(row)?;
            if ctx.is_cancelled() {
                ctx.cancel_operation();
                return Err(Error::Cancelled);
            }
            ctx.report_progress(SEED_LABEL, row_percent(row, rows));
        }
        debug!(seeded = self.stats.seeded, "seed pass complete");

        ctx.report_progress(RESOLVE_LABEL, 0);
        for row in 0..rows {
            self.resolve_row(row);
            if ctx.is_cancelled() {
                ctx.cancel_operation();
                return Err(Error::Cancelled);
            }
            ctx.report_progress(RESOLVE_LABEL, row_percent(row, rows));
        }
        debug!(stats = ?self.stats, "resolve pass complete");

        Ok(self.finish())
    }

    /// Hand back the output grid and counters.
    pub fn finish(self) -> AllocationOutput {
        if self.stats.malformed_codes > 0 {
            warn!(count = self.stats.malformed_codes, "flow grid contains malformed direction codes");
        }
        if self.stats.cycles_broken > 0 {
            warn!(count = self.stats.cycles_broken, "flow grid contains cycles");
        }
        AllocationOutput {
            grid: self.output,
            stats: self.stats,
        }
    }
}

/// Input pair for [`CostAllocation`]
#[derive(Debug, Clone)]
pub struct AllocationInput {
    pub source: Grid,
    pub flow_dir: Grid,
}

/// Cost allocation algorithm
#[derive(Debug, Clone, Default)]
pub struct CostAllocation;

impl Algorithm for CostAllocation {
    type Input = AllocationInput;
    type Output = AllocationOutput;
    type Params = AllocationParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "Cost Allocation"
    }

    fn description(&self) -> &'static str {
        "Performs cost-distance source allocation."
    }

    fn execute(
        &self,
        input: Self::Input,
        params: Self::Params,
        ctx: &mut RunContext<'_>,
    ) -> Result<Self::Output> {
        cost_allocation(&input.source, &input.flow_dir, &params, ctx)
    }
}

/// Allocate every cell to the source its flow path drains into.
///
/// # Arguments
/// * `source` - Source grid; values > `params.seed_threshold` mark sources
/// * `flow_dir` - D8 flow-direction (or cost back-link) grid, same shape
/// * `params` - Path bound and seed threshold
/// * `ctx` - Progress and cancellation
///
/// # Returns
/// A `Float` grid georeferenced like `source`, using its no-data value. Cells
/// whose path never reaches a source keep no-data.
pub fn cost_allocation(
    source: &Grid,
    flow_dir: &Grid,
    params: &AllocationParams,
    ctx: &mut RunContext<'_>,
) -> Result<AllocationOutput> {
    let (rows, cols) = source.shape();
    let (fr, fc) = flow_dir.shape();
    if rows != fr || cols != fc {
        return Err(Error::SizeMismatch { er: rows, ec: cols, ar: fr, ac: fc });
    }

    let mut output = Grid::like_template(source, DataType::Float, source.nodata())?;
    output.set_preferred_palette(source.preferred_palette().map(str::to_string));

    AllocationEngine::new(source, flow_dir, output, params)?.run(ctx)
}
