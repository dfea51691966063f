//! # flowalloc algorithms
//!
//! Flow-path analysis over D8 flow-direction grids.
//!
//! - **hydrology**: D8 direction codec, flow graph, cost allocation along
//!   flow paths, and the D8 pointer that produces direction grids

pub mod hydrology;
mod maybe_rayon;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::hydrology::{
        cost_allocation, d8_pointer, run_cost_allocation, AllocationParams, AllocationPaths,
        AllocationStats, CostAllocation, D8Direction, D8Pointer, D8PointerParams, FlowGraph,
    };
    pub use flowalloc_core::prelude::*;
}
