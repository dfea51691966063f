//! D8 flow pointer
//!
//! Points each cell at its steepest downslope neighbour, using the same
//! power-of-two encoding the allocation engine decodes:
//! ```text
//!   64  128   1
//!   32   0    2
//!   16   8    4
//! ```
//! `0` = pit or flat (no downslope neighbour). No-data DEM cells stay no-data.

use super::d8::D8Direction;
use crate::maybe_rayon::*;
use flowalloc_core::raster::DataType;
use flowalloc_core::{Algorithm, Error, Grid, Result, RunContext};
use ndarray::Array2;

/// Parameters for the D8 pointer
#[derive(Debug, Clone)]
pub struct D8PointerParams {
    /// Vertical exaggeration applied to elevation differences
    pub z_factor: f64,
}

impl Default for D8PointerParams {
    fn default() -> Self {
        Self { z_factor: 1.0 }
    }
}

/// D8 flow pointer algorithm
#[derive(Debug, Clone, Default)]
pub struct D8Pointer;

impl Algorithm for D8Pointer {
    type Input = Grid;
    type Output = Grid;
    type Params = D8PointerParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "D8 Flow Pointer"
    }

    fn description(&self) -> &'static str {
        "Calculate D8 flow directions from a DEM"
    }

    fn execute(
        &self,
        input: Self::Input,
        params: Self::Params,
        ctx: &mut RunContext<'_>,
    ) -> Result<Self::Output> {
        ctx.report_progress("D8 pointer:", 0);
        let output = d8_pointer(&input, &params)?;
        ctx.report_progress("D8 pointer:", 100);
        Ok(output)
    }
}

/// Calculate D8 flow directions from a DEM.
///
/// The DEM should be hydrologically conditioned (depressions filled or
/// breached) or most of it will drain into pits.
///
/// # Returns
/// An `Integer` grid with the DEM's georeferencing and no-data value.
pub fn d8_pointer(dem: &Grid, params: &D8PointerParams) -> Result<Grid> {
    if !(params.z_factor.is_finite() && params.z_factor > 0.0) {
        return Err(Error::InvalidParameter {
            name: "z_factor",
            value: params.z_factor.to_string(),
            reason: "must be a positive number".into(),
        });
    }

    let (rows, cols) = dem.shape();
    let nodata = dem.nodata();
    let dx = dem.cell_size_x();
    let dy = dem.cell_size_y();
    let diagonal = (dx * dx + dy * dy).sqrt();
    let distances: [f64; 8] = D8Direction::ALL.map(|dir| {
        if dir.is_diagonal() {
            diagonal
        } else if dir.offset().0 == 0 {
            dx
        } else {
            dy
        }
    });

    let elevation = dem.view();
    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![nodata; cols];

            for (col, out) in row_data.iter_mut().enumerate() {
                let center = elevation[[row, col]];
                if dem.is_nodata(center) {
                    continue;
                }

                let mut max_slope = 0.0_f64;
                let mut code = 0.0;

                for (k, dir) in D8Direction::ALL.iter().enumerate() {
                    let (dr, dc) = dir.offset();
                    let nr = row as isize + dr;
                    let nc = col as isize + dc;
                    if nr < 0 || nc < 0 || nr >= rows as isize || nc >= cols as isize {
                        continue;
                    }

                    let neighbor = elevation[[nr as usize, nc as usize]];
                    if dem.is_nodata(neighbor) {
                        continue;
                    }

                    let slope = (center - neighbor) * params.z_factor / distances[k];
                    if slope > max_slope {
                        max_slope = slope;
                        code = dir.code();
                    }
                }

                *out = code;
            }

            row_data
        })
        .collect();

    let array = Array2::from_shape_vec((rows, cols), data)
        .map_err(|e| Error::Algorithm(format!("D8 pointer output shape: {}", e)))?;
    let mut output = Grid::from_array(array, nodata);
    output.set_transform(*dem.transform());
    output.set_data_type(DataType::Integer);
    Ok(output)
}
