//! flowalloc CLI - flow-path source allocation on D8 grids

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;
use tracing::{debug, info, Level};
use tracing_subscriber::FmtSubscriber;

use flowalloc_algorithms::hydrology::{
    d8_pointer, run_cost_allocation, AllocationParams, AllocationPaths, D8PointerParams,
};
use flowalloc_core::io::{read_grid, write_grid};
use flowalloc_core::{Error, Grid, Host, RunContext};

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "flowalloc")]
#[command(author, version, about = "Flow-path source allocation on D8 grids", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show information about a grid file
    Info {
        /// Input grid file
        input: PathBuf,
    },
    /// Allocate every cell to the source its flow path drains into
    Allocate {
        /// Source grid (values > 0 are sources)
        source: PathBuf,
        /// D8 flow-direction or cost back-link grid
        flow_dir: PathBuf,
        /// Output file
        output: PathBuf,
        /// Abandon walks longer than this many cells
        #[arg(long)]
        max_path_len: Option<usize>,
        /// Source values must exceed this to seed the output
        #[arg(long, default_value = "0.0")]
        seed_threshold: f64,
    },
    /// Derive D8 flow directions from a DEM
    D8Pointer {
        /// Input DEM file
        input: PathBuf,
        /// Output file
        output: PathBuf,
        /// Z-factor for vertical exaggeration
        #[arg(short, long, default_value = "1.0")]
        z_factor: f64,
    },
}

// ─── Host ───────────────────────────────────────────────────────────────

/// Shows tool progress on a terminal progress bar.
struct ProgressBarHost {
    bar: ProgressBar,
}

impl ProgressBarHost {
    fn new() -> Self {
        let bar = ProgressBar::new(100);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{msg:14} [{bar:40.cyan/blue}] {pos:>3}%")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
        );
        Self { bar }
    }
}

impl Host for ProgressBarHost {
    fn update_progress(&mut self, label: &str, percent: u8) {
        self.bar.set_message(label.to_string());
        self.bar.set_position(percent as u64);
    }

    fn update_percent(&mut self, percent: u8) {
        self.bar.set_position(percent as u64);
    }

    fn show_feedback(&mut self, message: &str) {
        self.bar.suspend(|| eprintln!("{}", message));
    }

    fn log_exception(&mut self, context: &str, error: &Error) {
        self.bar
            .suspend(|| tracing::error!(context = %context, error = %error, "run failed"));
    }

    fn run_complete(&mut self) {
        self.bar.finish_and_clear();
    }
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("cannot install log subscriber: {}", e);
    }
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

fn read_input(path: &Path) -> Result<Grid> {
    let pb = spinner("Reading input...");
    let grid = read_grid(path).with_context(|| format!("Failed to read: {}", path.display()))?;
    pb.finish_and_clear();
    Ok(grid)
}

fn write_output(grid: &Grid, path: &Path) -> Result<()> {
    let pb = spinner("Writing output...");
    write_grid(grid, path).with_context(|| format!("Failed to write: {}", path.display()))?;
    pb.finish_and_clear();
    Ok(())
}

/// Exit status for a run whose failure the host has already shown.
fn failure_code(error: &Error) -> u8 {
    debug!(error = %error, "run failed");
    if error.is_cancellation() {
        130
    } else {
        1
    }
}

fn done(name: &str, path: &Path, elapsed: std::time::Duration) {
    println!("{} saved to: {}", name, path.display());
    println!("  Processing time: {:.2?}", elapsed);
}

fn print_info(input: &Path, grid: &Grid) {
    let (rows, cols) = grid.shape();
    let extent = grid.extent();
    let stats = grid.statistics();

    println!("File: {}", input.display());
    println!("Dimensions: {} x {} ({} cells)", cols, rows, grid.len());
    println!("Data type: {}", grid.data_type());
    println!("Cell size: {} x {}", grid.cell_size_x(), grid.cell_size_y());
    println!(
        "Extent: W {:.6}  E {:.6}  N {:.6}  S {:.6}",
        extent.west, extent.east, extent.north, extent.south
    );
    println!("NoData: {}", grid.nodata());
    if let Some(palette) = grid.preferred_palette() {
        println!("Palette: {}", palette);
    }
    for entry in grid.metadata() {
        println!("Metadata: {}", entry);
    }
    println!("\nStatistics:");
    if let Some(min) = stats.min {
        println!("  Min: {:.4}", min);
    }
    if let Some(max) = stats.max {
        println!("  Max: {:.4}", max);
    }
    if let Some(mean) = stats.mean {
        println!("  Mean: {:.4}", mean);
    }
    println!(
        "  Valid cells: {} ({:.1}%)",
        stats.valid_count,
        100.0 * stats.valid_count as f64 / grid.len().max(1) as f64
    );
}

// ─── Main ───────────────────────────────────────────────────────────────

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match cli.command {
        Commands::Info { input } => {
            let grid = read_input(&input)?;
            print_info(&input, &grid);
        }

        Commands::Allocate {
            source,
            flow_dir,
            output,
            max_path_len,
            seed_threshold,
        } => {
            let paths = AllocationPaths {
                source,
                flow_dir,
                output,
            };
            let params = AllocationParams {
                max_path_len,
                seed_threshold,
            };
            let mut host = ProgressBarHost::new();
            let start = Instant::now();
            let result = {
                let mut ctx = RunContext::new(&mut host);
                run_cost_allocation(&paths, &params, &mut ctx)
            };
            let stats = match result {
                Ok(stats) => stats,
                Err(e) => return Ok(ExitCode::from(failure_code(&e))),
            };
            let elapsed = start.elapsed();

            info!(
                seeded = stats.seeded,
                resolved = stats.resolved,
                unresolved = stats.unresolved,
                "allocation finished"
            );
            if stats.malformed_codes > 0 || stats.cycles_broken > 0 {
                println!(
                    "  Flow grid problems: {} malformed codes, {} cycles",
                    stats.malformed_codes, stats.cycles_broken
                );
            }
            if stats.paths_truncated > 0 {
                println!("  Walks abandoned at max path length: {}", stats.paths_truncated);
            }
            done("Allocation", &paths.output, elapsed);
        }

        Commands::D8Pointer {
            input,
            output,
            z_factor,
        } => {
            let dem = read_input(&input)?;
            info!("Input: {} x {}", dem.cols(), dem.rows());

            let pb = spinner("Computing D8 pointer...");
            let start = Instant::now();
            let fdir = d8_pointer(&dem, &D8PointerParams { z_factor })
                .context("Failed to compute D8 pointer")?;
            let elapsed = start.elapsed();
            pb.finish_and_clear();

            write_output(&fdir, &output)?;
            done("D8 pointer", &output, elapsed);
        }
    }

    Ok(ExitCode::SUCCESS)
}
