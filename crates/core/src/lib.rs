//! # flowalloc core
//!
//! Core types, traits and I/O shared by the flowalloc tools.
//!
//! This crate provides:
//! - [`Grid`]: georeferenced `f64` grid with a no-data sentinel
//! - [`GridRead`] / [`GridWrite`]: the row and cell accessors algorithms run against
//! - [`RunContext`] and [`Host`]: progress, cancellation and feedback for a tool run
//! - GeoTIFF I/O

pub mod error;
pub mod io;
pub mod raster;
pub mod run;

pub use error::{Error, ErrorKind, Result};
pub use raster::{DataType, Extent, GeoTransform, Grid, GridRead, GridWrite};
pub use run::{CancelFlag, Host, RunContext, SilentHost};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::error::{Error, ErrorKind, Result};
    pub use crate::raster::{DataType, Extent, GeoTransform, Grid, GridRead, GridWrite};
    pub use crate::run::{CancelFlag, Host, RunContext, SilentHost};
    pub use crate::Algorithm;
}

/// Core trait for the tools in flowalloc.
///
/// A tool transforms its input according to parameters, reporting progress
/// and polling for cancellation through the run context.
pub trait Algorithm {
    /// Input type for the algorithm
    type Input;
    /// Output type for the algorithm
    type Output;
    /// Parameters controlling algorithm behavior
    type Params: Default;
    /// Error type for algorithm execution
    type Error: std::error::Error;

    /// Returns the algorithm name
    fn name(&self) -> &'static str;

    /// Returns a description of what the algorithm does
    fn description(&self) -> &'static str;

    /// Execute the algorithm
    fn execute(
        &self,
        input: Self::Input,
        params: Self::Params,
        ctx: &mut RunContext<'_>,
    ) -> std::result::Result<Self::Output, Self::Error>;

    /// Execute with default parameters
    fn execute_default(
        &self,
        input: Self::Input,
        ctx: &mut RunContext<'_>,
    ) -> std::result::Result<Self::Output, Self::Error> {
        self.execute(input, Self::Params::default(), ctx)
    }
}
