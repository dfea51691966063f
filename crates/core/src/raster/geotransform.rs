//! North-up georeferencing for grids

use serde::{Deserialize, Serialize};

/// Spatial extent of a grid, in map units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    pub west: f64,
    pub east: f64,
    pub north: f64,
    pub south: f64,
}

impl Extent {
    pub fn width(&self) -> f64 {
        (self.east - self.west).abs()
    }

    pub fn height(&self) -> f64 {
        (self.north - self.south).abs()
    }
}

/// Maps grid coordinates (col, row) to map coordinates (x, y):
/// ```text
/// x = origin_x + col * pixel_width
/// y = origin_y + row * pixel_height
/// ```
///
/// Grids are stored north-up, so `pixel_height` is negative and row 0 is the
/// northern edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    /// X coordinate of the upper-left corner
    pub origin_x: f64,
    /// Y coordinate of the upper-left corner
    pub origin_y: f64,
    /// Cell size in X
    pub pixel_width: f64,
    /// Cell size in Y, negative for north-up grids
    pub pixel_height: f64,
}

impl GeoTransform {
    pub fn new(origin_x: f64, origin_y: f64, pixel_width: f64, pixel_height: f64) -> Self {
        Self {
            origin_x,
            origin_y,
            pixel_width,
            pixel_height,
        }
    }

    /// Build a transform from an extent and the grid dimensions it covers.
    pub fn from_extent(extent: Extent, rows: usize, cols: usize) -> Self {
        let pixel_width = if cols > 0 { extent.width() / cols as f64 } else { 1.0 };
        let pixel_height = if rows > 0 { extent.height() / rows as f64 } else { 1.0 };
        Self::new(
            extent.west.min(extent.east),
            extent.north.max(extent.south),
            pixel_width,
            -pixel_height,
        )
    }

    /// Map coordinates of the centre of cell (col, row)
    pub fn pixel_to_geo(&self, col: usize, row: usize) -> (f64, f64) {
        let x = self.origin_x + (col as f64 + 0.5) * self.pixel_width;
        let y = self.origin_y + (row as f64 + 0.5) * self.pixel_height;
        (x, y)
    }

    /// Fractional (col, row) of a map coordinate; `.floor()` gives the cell index.
    pub fn geo_to_pixel(&self, x: f64, y: f64) -> (f64, f64) {
        if self.pixel_width.abs() < 1e-12 || self.pixel_height.abs() < 1e-12 {
            return (f64::NAN, f64::NAN);
        }
        (
            (x - self.origin_x) / self.pixel_width,
            (y - self.origin_y) / self.pixel_height,
        )
    }

    pub fn cell_size_x(&self) -> f64 {
        self.pixel_width.abs()
    }

    pub fn cell_size_y(&self) -> f64 {
        self.pixel_height.abs()
    }

    /// Mean of the X and Y cell sizes
    pub fn resolution(&self) -> f64 {
        (self.cell_size_x() + self.cell_size_y()) / 2.0
    }

    /// Extent covered by a grid of `rows` x `cols` cells
    pub fn extent(&self, rows: usize, cols: usize) -> Extent {
        let far_x = self.origin_x + cols as f64 * self.pixel_width;
        let far_y = self.origin_y + rows as f64 * self.pixel_height;
        Extent {
            west: self.origin_x.min(far_x),
            east: self.origin_x.max(far_x),
            north: self.origin_y.max(far_y),
            south: self.origin_y.min(far_y),
        }
    }
}

impl Default for GeoTransform {
    fn default() -> Self {
        Self::new(0.0, 0.0, 1.0, -1.0)
    }
}
