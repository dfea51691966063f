//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use flowalloc_algorithms::hydrology::{d8_pointer, AllocationPaths, D8PointerParams};
use flowalloc_core::{GeoTransform, Grid, Host};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::path::Path;

pub const ND: f64 = -32768.0;

/// Grid filled with `fill`, then the listed cells overwritten.
pub fn grid(rows: usize, cols: usize, fill: f64, cells: &[((usize, usize), f64)]) -> Grid {
    let mut g = Grid::new(rows, cols, ND);
    g.data_mut().fill(fill);
    for &((r, c), v) in cells {
        g.set(r, c, v).unwrap();
    }
    g
}

/// Rolling terrain: a tilted plane with bumps and a few closed pits.
pub fn rolling_dem(rows: usize, cols: usize, seed: u64) -> Grid {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut dem = Grid::new(rows, cols, ND);
    dem.set_transform(GeoTransform::new(0.0, rows as f64 * 10.0, 10.0, -10.0));
    for row in 0..rows {
        for col in 0..cols {
            let bump = ((row as f64 * 0.7).sin() + (col as f64 * 0.45).cos()) * 3.0;
            let noise = rng.gen_range(0..100) as f64 * 0.01;
            dem.set(row, col, 100.0 - row as f64 * 0.5 - col as f64 * 0.3 + bump + noise)
                .unwrap();
        }
    }
    dem
}

/// D8 flow directions for [`rolling_dem`], with some cells blanked to no-data.
pub fn rolling_flow_dir(rows: usize, cols: usize, seed: u64) -> Grid {
    let dem = rolling_dem(rows, cols, seed);
    let mut fdir = d8_pointer(&dem, &D8PointerParams::default()).unwrap();
    let mut rng = ChaCha8Rng::seed_from_u64(seed ^ 0xdead_beef);
    for _ in 0..(rows * cols / 50) {
        let r = rng.gen_range(0..rows);
        let c = rng.gen_range(0..cols);
        fdir.set(r, c, ND).unwrap();
    }
    fdir
}

/// Sparse positive sources with distinct ids.
pub fn scattered_sources(rows: usize, cols: usize, count: usize, seed: u64) -> Grid {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut source = grid(rows, cols, 0.0, &[]);
    source.set_transform(GeoTransform::new(0.0, rows as f64 * 10.0, 10.0, -10.0));
    for id in 1..=count {
        let r = rng.gen_range(0..rows);
        let c = rng.gen_range(0..cols);
        source.set(r, c, id as f64).unwrap();
    }
    source
}

/// Host that records every call.
#[derive(Debug, Default)]
pub struct RecordingHost {
    pub progress: Vec<(String, u8)>,
    pub percents: Vec<u8>,
    pub feedback: Vec<String>,
    pub exceptions: Vec<String>,
    pub completed: usize,
}

impl Host for RecordingHost {
    fn update_progress(&mut self, label: &str, percent: u8) {
        self.progress.push((label.to_string(), percent));
    }

    fn update_percent(&mut self, percent: u8) {
        self.percents.push(percent);
    }

    fn show_feedback(&mut self, message: &str) {
        self.feedback.push(message.to_string());
    }

    fn log_exception(&mut self, context: &str, error: &flowalloc_core::Error) {
        self.exceptions.push(format!("{context}: {error}"));
    }

    fn run_complete(&mut self) {
        self.completed += 1;
    }
}

/// `source.tif`, `fdir.tif` and `alloc.tif` inside `dir`.
pub fn tool_paths(dir: &Path) -> AllocationPaths {
    AllocationPaths {
        source: dir.join("source.tif"),
        flow_dir: dir.join("fdir.tif"),
        output: dir.join("alloc.tif"),
    }
}
