//! File-to-file runs through `run_cost_allocation`.

mod common;

use common::{grid, rolling_dem, tool_paths, RecordingHost, ND};
use flowalloc_algorithms::hydrology::{
    d8_pointer, run_cost_allocation, AllocationParams, AllocationPaths, AllocationStats,
    D8PointerParams,
};
use flowalloc_core::io::{read_grid, write_grid};
use flowalloc_core::{CancelFlag, DataType, ErrorKind, Result, RunContext};
use tempfile::TempDir;

fn run(paths: &AllocationPaths, host: &mut RecordingHost) -> Result<AllocationStats> {
    let mut ctx = RunContext::new(host);
    run_cost_allocation(paths, &AllocationParams::default(), &mut ctx)
}

#[test]
fn writes_output_with_metadata() {
    let dir = TempDir::new().unwrap();
    let paths = tool_paths(dir.path());
    write_grid(&grid(3, 3, 0.0, &[((0, 0), 5.0)]), &paths.source).unwrap();
    write_grid(&grid(3, 3, ND, &[((1, 1), 64.0), ((2, 2), 64.0)]), &paths.flow_dir).unwrap();

    let mut host = RecordingHost::default();
    let stats = run(&paths, &mut host).unwrap();

    assert_eq!(stats.seeded, 1);
    assert_eq!(stats.resolved, 2);
    assert_eq!(host.completed, 1);
    assert!(host.feedback.is_empty());

    let out = read_grid(&paths.output).unwrap();
    assert_eq!(out.data_type(), DataType::Float);
    assert_eq!(out.nodata(), ND);
    assert_eq!(out.get(2, 2).unwrap(), 5.0);
    assert_eq!(out.get(0, 1).unwrap(), ND);
    assert_eq!(out.metadata()[0], "Created by the Cost Allocation tool.");
    assert!(out.metadata()[1].starts_with("Created on "));
}

#[test]
fn dimension_mismatch_aborts_before_output_exists() {
    let dir = TempDir::new().unwrap();
    let paths = tool_paths(dir.path());
    write_grid(&grid(10, 10, 0.0, &[]), &paths.source).unwrap();
    write_grid(&grid(10, 11, 0.0, &[]), &paths.flow_dir).unwrap();

    let mut host = RecordingHost::default();
    let err = run(&paths, &mut host).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Precondition);
    assert!(!paths.output.exists());
    assert_eq!(host.feedback.len(), 1);
    assert!(host.feedback[0].contains("same dimensions"));
    assert!(host.exceptions.is_empty());
    assert_eq!(host.completed, 1);
    assert_eq!(host.progress.last(), Some(&("Progress: ".to_string(), 0)));
}

#[test]
fn missing_input_is_reported() {
    let dir = TempDir::new().unwrap();
    let paths = AllocationPaths {
        source: dir.path().join("nope.tif"),
        flow_dir: dir.path().join("also_nope.tif"),
        output: dir.path().join("alloc.tif"),
    };

    let mut host = RecordingHost::default();
    let err = run(&paths, &mut host).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Precondition);
    assert!(host.feedback[0].contains("nope.tif"));
    assert!(!paths.output.exists());
    assert_eq!(host.completed, 1);
}

#[test]
fn corrupt_input_is_a_logged_runtime_error() {
    let dir = TempDir::new().unwrap();
    let paths = tool_paths(dir.path());
    std::fs::write(&paths.source, b"definitely not a tiff").unwrap();
    write_grid(&grid(2, 2, 0.0, &[]), &paths.flow_dir).unwrap();

    let mut host = RecordingHost::default();
    let err = run(&paths, &mut host).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Runtime);
    assert_eq!(
        host.feedback,
        vec!["An error has occurred during operation. See log file for details.".to_string()]
    );
    assert_eq!(host.exceptions.len(), 1);
    assert!(host.exceptions[0].starts_with("Error in Cost Allocation"));
    assert_eq!(host.completed, 1);
}

#[test]
fn cancelled_run_reports_once_and_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let paths = tool_paths(dir.path());
    write_grid(&grid(6, 6, 0.0, &[((5, 5), 1.0)]), &paths.source).unwrap();
    write_grid(&grid(6, 6, 2.0, &[]), &paths.flow_dir).unwrap();

    let flag = CancelFlag::new();
    flag.cancel();
    let mut host = RecordingHost::default();
    let err = {
        let mut ctx = RunContext::with_cancel(&mut host, flag);
        run_cost_allocation(&paths, &AllocationParams::default(), &mut ctx).unwrap_err()
    };

    assert_eq!(err.kind(), ErrorKind::Cancelled);
    assert_eq!(host.feedback, vec!["Operation cancelled.".to_string()]);
    assert!(host.exceptions.is_empty());
    assert_eq!(host.completed, 1);
    assert!(!paths.output.exists());
}

#[test]
fn pointer_output_stays_integer_on_disk() {
    let dir = TempDir::new().unwrap();
    let dem = rolling_dem(8, 8, 4);
    let fdir = d8_pointer(&dem, &D8PointerParams::default()).unwrap();
    let path = dir.path().join("fdir.tif");
    write_grid(&fdir, &path).unwrap();

    let back = read_grid(&path).unwrap();
    assert_eq!(back.data_type(), DataType::Integer);
    assert_eq!(back.data(), fdir.data());
}

#[test]
fn pointer_then_allocation_partitions_by_outlet() {
    // Two valleys draining to opposite sides; one source at each outlet.
    let dir = TempDir::new().unwrap();
    let mut dem = rolling_dem(12, 12, 9);
    for row in 0..12 {
        for col in 0..12 {
            let ridge = (col as f64 - 5.5).abs();
            dem.set(row, col, 50.0 - ridge * 4.0 + row as f64 * 0.1).unwrap();
        }
    }
    let fdir = d8_pointer(&dem, &D8PointerParams::default()).unwrap();
    let mut source = grid(12, 12, 0.0, &[]);
    source.set_transform(*dem.transform());
    for row in 0..12 {
        source.set(row, 0, 1.0).unwrap();
        source.set(row, 11, 2.0).unwrap();
    }

    let paths = tool_paths(dir.path());
    write_grid(&source, &paths.source).unwrap();
    write_grid(&fdir, &paths.flow_dir).unwrap();

    let mut host = RecordingHost::default();
    run(&paths, &mut host).unwrap();
    let out = read_grid(&paths.output).unwrap();

    for row in 0..12 {
        for col in 0..6 {
            assert_eq!(out.get(row, col).unwrap(), 1.0, "({}, {})", row, col);
        }
        for col in 6..12 {
            assert_eq!(out.get(row, col).unwrap(), 2.0, "({}, {})", row, col);
        }
    }
}
