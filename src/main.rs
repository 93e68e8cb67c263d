//! stickerslicer CLI - Slice an image into a chat-sticker pack.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stickerslicer::{Config, Slicer};

/// Slice an image into a grid of sticker PNGs packaged as a ZIP archive.
#[derive(Parser, Debug)]
#[command(name = "stickerslicer")]
#[command(version, about, long_about = None)]
struct Args {
    /// Input image path.
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output ZIP path. Defaults to `<input stem>_stickers.zip` next to the input.
    #[arg(value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// Number of grid rows.
    #[arg(short, long, default_value = "4", value_name = "INT")]
    rows: u32,

    /// Number of grid columns.
    #[arg(short, long, default_value = "4", value_name = "INT")]
    cols: u32,

    /// Horizontal crop offset in source pixels.
    #[arg(long, default_value = "0", value_name = "FLOAT", allow_negative_numbers = true)]
    offset_x: f64,

    /// Vertical crop offset in source pixels.
    #[arg(long, default_value = "0", value_name = "FLOAT", allow_negative_numbers = true)]
    offset_y: f64,

    /// Remove the background before slicing. Downloads the U²-Net model on first use.
    #[arg(long)]
    remove_bg: bool,

    /// Also write each sticker PNG into this directory.
    #[arg(short, long, value_name = "DIR")]
    extract_dir: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("stickerslicer={log_level}").into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    if let Err(err) = run(&args) {
        tracing::error!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn run(args: &Args) -> Result<()> {
    // Validate input file exists
    if !args.input.exists() {
        anyhow::bail!("Input file does not exist: {}", args.input.display());
    }

    // Build configuration
    let config = Config {
        rows: args.rows,
        cols: args.cols,
        offset_x: args.offset_x,
        offset_y: args.offset_y,
        remove_background: args.remove_bg,
    };

    // Create and run the slicing pipeline
    let mut slicer = Slicer::new(config).context("Failed to initialize slicer")?;

    let output = slicer
        .process(&args.input)
        .context("Failed to process image")?;

    let zip_path = args
        .output
        .clone()
        .unwrap_or_else(|| default_zip_path(&args.input));
    std::fs::write(&zip_path, &output.archive)
        .with_context(|| format!("Failed to write {}", zip_path.display()))?;

    if let Some(dir) = &args.extract_dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
        for slice in &output.slices {
            std::fs::write(dir.join(&slice.name), &slice.png)
                .with_context(|| format!("Failed to write {}", slice.name))?;
        }
    }

    println!(
        "Packaged {} stickers into {}",
        output.slices.len(),
        zip_path.display()
    );

    Ok(())
}

/// `<input stem>_stickers.zip` next to the input file.
fn default_zip_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("stickers");
    input.with_file_name(format!("{stem}_stickers.zip"))
}
