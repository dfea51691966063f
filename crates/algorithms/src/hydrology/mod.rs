//! Flow-path algorithms over D8 flow-direction grids
//!
//! - D8 codec: decode power-of-two direction codes into neighbour offsets
//! - Flow graph: the direction grid as a one-edge-per-cell downstream graph
//! - Cost allocation: propagate source values along flow paths
//! - D8 pointer: produce direction grids from a DEM in the same encoding

mod allocation_tool;
mod cost_allocation;
pub mod d8;
mod d8_pointer;
mod flow_graph;

pub use allocation_tool::{run_cost_allocation, AllocationPaths};
pub use cost_allocation::{
    cost_allocation, AllocationEngine, AllocationInput, AllocationOutput, AllocationParams,
    AllocationStats, CostAllocation,
};
pub use d8::{decode, D8Direction, Decoded};
pub use d8_pointer::{d8_pointer, D8Pointer, D8PointerParams};
pub use flow_graph::{Cell, FlowGraph, FlowStep};
