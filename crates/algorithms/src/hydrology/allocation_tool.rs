//! File-to-file cost allocation run
//!
//! Opens the source and flow-direction grids, checks them, runs both passes
//! and persists the output. Failures are reported once through the run
//! context and then returned; progress is always reset and the host always
//! told the run is over.

use super::cost_allocation::{cost_allocation, AllocationParams, AllocationStats};
use flowalloc_core::io::{read_grid, write_grid};
use flowalloc_core::{Error, ErrorKind, Result, RunContext};
use std::path::PathBuf;
use tracing::info;

const TOOL_NAME: &str = "Cost Allocation";

/// Input and output locations for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocationPaths {
    pub source: PathBuf,
    pub flow_dir: PathBuf,
    pub output: PathBuf,
}

impl AllocationPaths {
    /// Positional arguments: source, flow direction, output.
    pub fn from_args<S: AsRef<str>>(args: &[S]) -> Result<Self> {
        let arg = |i: usize, name: &'static str| -> Result<PathBuf> {
            args.get(i)
                .map(|s| s.as_ref().trim())
                .filter(|s| !s.is_empty())
                .map(PathBuf::from)
                .ok_or_else(|| Error::InvalidParameter {
                    name,
                    value: String::new(),
                    reason: "parameter has not been set".into(),
                })
        };
        Ok(Self {
            source: arg(0, "source")?,
            flow_dir: arg(1, "flow_dir")?,
            output: arg(2, "output")?,
        })
    }
}

/// Run cost allocation from files.
///
/// The output file is only written after both passes complete; a failed or
/// cancelled run leaves nothing behind at `paths.output`.
pub fn run_cost_allocation(
    paths: &AllocationPaths,
    params: &AllocationParams,
    ctx: &mut RunContext<'_>,
) -> Result<AllocationStats> {
    let result = allocate_files(paths, params, ctx);
    if let Err(e) = &result {
        report_failure(ctx, e);
    }
    ctx.finish();
    result
}

/// Tell the host about a failed run, once, in the form its kind calls for.
fn report_failure(ctx: &mut RunContext<'_>, error: &Error) {
    match error.kind() {
        ErrorKind::Precondition => ctx.show_feedback(&error.to_string()),
        ErrorKind::ResourceExhaustion => {
            ctx.show_feedback("An out-of-memory error has occurred during operation.")
        }
        // Already reported by the pass that noticed it.
        ErrorKind::Cancelled => {}
        ErrorKind::Runtime => {
            ctx.show_feedback("An error has occurred during operation. See log file for details.");
            ctx.log_exception(&format!("Error in {}", TOOL_NAME), error);
        }
    }
}

fn allocate_files(
    paths: &AllocationPaths,
    params: &AllocationParams,
    ctx: &mut RunContext<'_>,
) -> Result<AllocationStats> {
    let source = read_grid(&paths.source)?;
    let flow_dir = read_grid(&paths.flow_dir)?;
    info!(
        rows = source.rows(),
        cols = source.cols(),
        resolution = source.resolution(),
        "inputs opened"
    );

    let mut out = cost_allocation(&source, &flow_dir, params, ctx)?;

    out.grid
        .add_metadata_entry(format!("Created by the {} tool.", TOOL_NAME));
    out.grid
        .add_metadata_entry(format!("Created on {}", chrono::Local::now().to_rfc2822()));
    write_grid(&out.grid, &paths.output)?;
    info!(output = %paths.output.display(), "output written");

    Ok(out.stats)
}
