//! Main Grid type

use crate::error::{Error, Result};
use crate::raster::{DataType, Extent, GeoTransform, GridRead, GridWrite};
use ndarray::{Array2, ArrayView2};

/// Default no-data sentinel for grids read without one.
pub const DEFAULT_NODATA: f64 = -32768.0;

/// A georeferenced 2D grid of `f64` cells.
///
/// Cells are stored row-major, row 0 at the northern edge. Every grid carries
/// a no-data sentinel; there is no "unset" state.
///
/// # Example
///
/// ```ignore
/// use flowalloc_core::Grid;
///
/// let mut grid = Grid::new(100, 100, -32768.0);
/// grid.set(10, 20, 42.0)?;
/// assert_eq!(grid.get(10, 20)?, 42.0);
/// ```
#[derive(Debug, Clone)]
pub struct Grid {
    data: Array2<f64>,
    transform: GeoTransform,
    nodata: f64,
    data_type: DataType,
    palette: Option<String>,
    metadata: Vec<String>,
}

impl Grid {
    /// Create a new grid filled with `nodata`
    pub fn new(rows: usize, cols: usize, nodata: f64) -> Self {
        Self::from_array(Array2::from_elem((rows, cols), nodata), nodata)
    }

    /// Create a grid filled with `value`, reporting allocation failure as
    /// [`Error::OutOfMemory`] instead of aborting.
    pub fn try_filled(rows: usize, cols: usize, value: f64, nodata: f64) -> Result<Self> {
        let cells = rows
            .checked_mul(cols)
            .ok_or(Error::InvalidDimensions { width: cols, height: rows })?;
        let mut buf: Vec<f64> = Vec::new();
        buf.try_reserve_exact(cells)
            .map_err(|_| Error::OutOfMemory { cells })?;
        buf.resize(cells, value);
        Self::from_vec(buf, rows, cols, nodata)
    }

    /// Create a grid from row-major data
    pub fn from_vec(data: Vec<f64>, rows: usize, cols: usize, nodata: f64) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(Error::InvalidDimensions {
                width: cols,
                height: rows,
            });
        }

        let array = Array2::from_shape_vec((rows, cols), data)
            .map_err(|e| Error::Other(e.to_string()))?;

        Ok(Self::from_array(array, nodata))
    }

    /// Create a grid from an ndarray
    pub fn from_array(data: Array2<f64>, nodata: f64) -> Self {
        // Row slices are handed out directly, so keep the buffer in standard layout.
        let data = if data.is_standard_layout() {
            data
        } else {
            data.as_standard_layout().into_owned()
        };
        Self {
            data,
            transform: GeoTransform::default(),
            nodata,
            data_type: DataType::Float,
            palette: None,
            metadata: Vec::new(),
        }
    }

    /// Create a fresh grid that inherits dimensions and georeferencing from
    /// `template`, filled with `nodata`.
    pub fn like_template(template: &Grid, data_type: DataType, nodata: f64) -> Result<Self> {
        let (rows, cols) = template.shape();
        let mut grid = Self::try_filled(rows, cols, nodata, nodata)?;
        grid.transform = template.transform;
        grid.data_type = data_type;
        Ok(grid)
    }

    // Dimensions

    pub fn rows(&self) -> usize {
        self.data.nrows()
    }

    pub fn cols(&self) -> usize {
        self.data.ncols()
    }

    /// Dimensions as (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        self.data.dim()
    }

    /// Total number of cells
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    // Data access

    /// Checked read at (row, col)
    pub fn get(&self, row: usize, col: usize) -> Result<f64> {
        self.data
            .get((row, col))
            .copied()
            .ok_or(Error::IndexOutOfBounds {
                row,
                col,
                rows: self.rows(),
                cols: self.cols(),
            })
    }

    /// Checked write at (row, col)
    pub fn set(&mut self, row: usize, col: usize, value: f64) -> Result<()> {
        let (rows, cols) = self.shape();
        match self.data.get_mut((row, col)) {
            Some(cell) => {
                *cell = value;
                Ok(())
            }
            None => Err(Error::IndexOutOfBounds { row, col, rows, cols }),
        }
    }

    /// Row slice
    pub fn row(&self, row: usize) -> Result<&[f64]> {
        if row >= self.rows() {
            return Err(Error::IndexOutOfBounds {
                row,
                col: 0,
                rows: self.rows(),
                cols: self.cols(),
            });
        }
        let cols = self.cols();
        let start = row * cols;
        self.data
            .as_slice()
            .map(|cells| &cells[start..start + cols])
            .ok_or_else(|| Error::Other("grid buffer is not contiguous".into()))
    }

    pub fn view(&self) -> ArrayView2<'_, f64> {
        self.data.view()
    }

    pub fn data(&self) -> &Array2<f64> {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut Array2<f64> {
        &mut self.data
    }

    // Metadata

    pub fn transform(&self) -> &GeoTransform {
        &self.transform
    }

    pub fn set_transform(&mut self, transform: GeoTransform) {
        self.transform = transform;
    }

    pub fn nodata(&self) -> f64 {
        self.nodata
    }

    /// Storage type the grid is persisted with
    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn set_data_type(&mut self, data_type: DataType) {
        self.data_type = data_type;
    }

    /// Display palette hint; carried along, never interpreted.
    pub fn preferred_palette(&self) -> Option<&str> {
        self.palette.as_deref()
    }

    pub fn set_preferred_palette(&mut self, palette: Option<String>) {
        self.palette = palette;
    }

    /// Free-text metadata lines
    pub fn metadata(&self) -> &[String] {
        &self.metadata
    }

    pub fn add_metadata_entry(&mut self, entry: impl Into<String>) {
        self.metadata.push(entry.into());
    }

    pub fn cell_size_x(&self) -> f64 {
        self.transform.cell_size_x()
    }

    pub fn cell_size_y(&self) -> f64 {
        self.transform.cell_size_y()
    }

    /// Mean cell size, `(cell_size_x + cell_size_y) / 2`
    pub fn resolution(&self) -> f64 {
        self.transform.resolution()
    }

    pub fn extent(&self) -> Extent {
        self.transform.extent(self.rows(), self.cols())
    }

    /// Check if a value is no-data
    pub fn is_nodata(&self, value: f64) -> bool {
        value.is_nan() || value == self.nodata
    }

    /// Basic statistics over valid cells
    pub fn statistics(&self) -> GridStatistics {
        let mut min: Option<f64> = None;
        let mut max: Option<f64> = None;
        let mut sum = 0.0;
        let mut count: usize = 0;

        for &value in self.data.iter().filter(|&&v| !self.is_nodata(v)) {
            min = Some(min.map_or(value, |m| m.min(value)));
            max = Some(max.map_or(value, |m| m.max(value)));
            sum += value;
            count += 1;
        }

        GridStatistics {
            min,
            max,
            mean: (count > 0).then(|| sum / count as f64),
            valid_count: count,
            nodata_count: self.len() - count,
        }
    }
}

impl GridRead for Grid {
    fn rows(&self) -> usize {
        self.data.nrows()
    }

    fn cols(&self) -> usize {
        self.data.ncols()
    }

    fn nodata(&self) -> f64 {
        self.nodata
    }

    fn get_row(&self, row: usize) -> Result<&[f64]> {
        self.row(row)
    }

    fn get_value(&self, row: usize, col: usize) -> f64 {
        self.data.get((row, col)).copied().unwrap_or(self.nodata)
    }
}

impl GridWrite for Grid {
    fn set_value(&mut self, row: usize, col: usize, value: f64) {
        if let Some(cell) = self.data.get_mut((row, col)) {
            *cell = value;
        }
    }
}

/// Basic statistics for a grid
#[derive(Debug, Clone)]
pub struct GridStatistics {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
    pub valid_count: usize,
    pub nodata_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_creation() {
        let grid = Grid::new(100, 200, -9999.0);
        assert_eq!(grid.rows(), 100);
        assert_eq!(grid.cols(), 200);
        assert_eq!(grid.get(3, 7).unwrap(), -9999.0);
    }

    #[test]
    fn test_grid_access() {
        let mut grid = Grid::new(10, 10, -9999.0);
        grid.set(5, 5, 42.0).unwrap();
        assert_eq!(grid.get(5, 5).unwrap(), 42.0);
        assert!(grid.set(10, 0, 1.0).is_err());
        assert!(grid.get(0, 10).is_err());
    }

    #[test]
    fn test_accessors_out_of_range_answer_nodata() {
        let mut grid = Grid::new(3, 3, -1.0);
        grid.set_value(1, 1, 8.0);
        grid.set_value(7, 7, 8.0);

        assert_eq!(grid.get_value(1, 1), 8.0);
        assert_eq!(grid.get_value(3, 0), -1.0);
        assert_eq!(grid.value_at(-1, 0), None);
        assert_eq!(grid.value_at(1, 1), Some(8.0));
    }

    #[test]
    fn test_get_row() {
        let grid = Grid::from_vec((0..6).map(f64::from).collect(), 2, 3, -1.0).unwrap();
        assert_eq!(grid.get_row(1).unwrap(), &[3.0, 4.0, 5.0]);
        assert!(grid.get_row(2).is_err());
    }

    #[test]
    fn test_try_filled_reports_out_of_memory() {
        let err = Grid::try_filled(usize::MAX / 16, 2, 0.0, -1.0).unwrap_err();
        assert!(matches!(err, Error::OutOfMemory { .. }));

        let overflow = Grid::try_filled(usize::MAX, 2, 0.0, -1.0).unwrap_err();
        assert!(matches!(overflow, Error::InvalidDimensions { .. }));
    }

    #[test]
    fn test_from_vec_rejects_wrong_length() {
        assert!(matches!(
            Grid::from_vec(vec![0.0; 5], 2, 3, -1.0),
            Err(Error::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn test_like_template_inherits_georeferencing() {
        let mut template = Grid::new(4, 5, 0.0);
        template.set_transform(GeoTransform::new(10.0, 50.0, 2.0, -2.0));

        let out = Grid::like_template(&template, DataType::Float, -32768.0).unwrap();
        assert_eq!(out.shape(), (4, 5));
        assert_eq!(out.transform(), template.transform());
        assert_eq!(out.nodata(), -32768.0);
        assert_eq!(out.statistics().valid_count, 0);
    }

    #[test]
    fn test_grid_statistics() {
        let mut grid = Grid::new(10, 10, -9999.0);
        for i in 0..10 {
            for j in 0..9 {
                grid.set(i, j, (i * 10 + j) as f64).unwrap();
            }
        }

        let stats = grid.statistics();
        assert_eq!(stats.min, Some(0.0));
        assert_eq!(stats.max, Some(98.0));
        assert_eq!(stats.valid_count, 90);
        assert_eq!(stats.nodata_count, 10);
    }
}
