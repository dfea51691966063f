//! Reading and writing grids

mod geotiff;

pub use geotiff::{read_grid, read_grid_from_buffer, write_grid, write_grid_to_buffer};
