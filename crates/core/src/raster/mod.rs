//! Grid data structures and cell accessors

mod accessor;
mod data_type;
mod geotransform;
mod grid;

pub use accessor::{GridRead, GridWrite};
pub use data_type::DataType;
pub use geotransform::{Extent, GeoTransform};
pub use grid::{Grid, GridStatistics, DEFAULT_NODATA};
