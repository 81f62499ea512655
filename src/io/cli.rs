//! Command-line interface for building a photomosaic from a target and a pool directory

use crate::algorithm::assembly::AssemblyOptions;
use crate::algorithm::matcher::MatchSettings;
use crate::algorithm::mosaic::{PartitionSettings, Photomosaic};
use crate::algorithm::partition::Layout;
use crate::io::configuration::{
    DEFAULT_BLANK_FRACTION, DEFAULT_DEPTH, DEFAULT_HDR_THRESHOLD, DEFAULT_SEED, DEFAULT_TOLERANCE,
    DEFAULT_UNTUNE_BLEND, DEFAULT_USAGE_IMPUNITY, DEFAULT_USAGE_PENALTY, GIF_FRAME_DELAY_MS,
    OUTPUT_SUFFIX, VISUALIZATION_SUFFIX,
};
use crate::io::error::{MosaicError, Result};
use crate::io::pool::{ImagePool, MemoryPool};
use crate::io::visualization::VisualizationCapture;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;
use tracing::level_filters::LevelFilter;

#[derive(Parser, Debug, Clone)]
#[command(name = "photomosaic")]
#[command(
    author,
    version,
    about = "Rebuild a target image from a pool of smaller images"
)]
/// Command-line arguments for the mosaic builder
// CLI tools commonly need multiple boolean flags for various features and user preferences
#[allow(clippy::struct_excessive_bools)]
pub struct Cli {
    /// Target image to reproduce
    #[arg(value_name = "TARGET")]
    pub target: PathBuf,

    /// Directory of candidate images, searched recursively
    #[arg(short, long, value_name = "DIR")]
    pub pool: PathBuf,

    /// Output file (defaults to <target>_mosaic.<ext>)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Mask image; white marks the region to fill
    #[arg(short, long)]
    pub mask: Option<PathBuf>,

    /// Top-level grid as WxH, or N for a square grid
    #[arg(short, long, default_value = "10x10", value_parser = parse_dimensions)]
    pub dimensions: [u32; 2],

    /// Generations of quadrant subdivision
    #[arg(long, default_value_t = DEFAULT_DEPTH)]
    pub depth: u32,

    /// Luma spread above which a tile is subdivided
    #[arg(long, default_value_t = DEFAULT_HDR_THRESHOLD)]
    pub hdr: u8,

    /// Use a running-bond layout instead of a plain grid
    #[arg(long)]
    pub brick: bool,

    /// Keep gray mask levels, leaving scattered tiles near mask edges
    #[arg(long)]
    pub debris: bool,

    /// Ambiguous mask tiles at least this fraction of the width are dropped
    #[arg(long, default_value_t = DEFAULT_BLANK_FRACTION)]
    pub blank_fraction: f64,

    /// Rescale so each top-level cell is this many pixels wide
    #[arg(long)]
    pub base_width: Option<u32>,

    /// Raw-distance slack before a usage-penalized choice is reported
    #[arg(long, default_value_t = DEFAULT_TOLERANCE)]
    pub tolerance: f64,

    /// Distance added per repeated use of a pool image
    #[arg(long, default_value_t = DEFAULT_USAGE_PENALTY)]
    pub usage_penalty: f64,

    /// Uses of a pool image before the penalty applies
    #[arg(long, default_value_t = DEFAULT_USAGE_IMPUNITY)]
    pub usage_impunity: u32,

    /// Skip palette tuning toward the pool
    #[arg(long)]
    pub no_tune: bool,

    /// How far to restore the original palette after assembly (0 to 1)
    #[arg(long, default_value_t = DEFAULT_UNTUNE_BLEND)]
    pub blend: f64,

    /// Shrink tiles in proportion to their lightness mismatch
    #[arg(long)]
    pub pad: Option<f64>,

    /// Jitter tile positions within the margin
    #[arg(long)]
    pub scatter: bool,

    /// Margin around padded or scattered tiles, in pixels
    #[arg(long, default_value_t = 0)]
    pub margin: u32,

    /// Shrink the margin for deeper tiles
    #[arg(long)]
    pub scaled_margin: bool,

    /// Canvas color as R,G,B
    #[arg(long, default_value = "255,255,255", value_parser = parse_color)]
    pub background: [u8; 3],

    /// Random seed for reproducible generation
    #[arg(short, long, default_value_t = DEFAULT_SEED)]
    pub seed: u64,

    /// Enable visualization output as animated GIF
    #[arg(short, long)]
    pub visualize: bool,

    /// Suppress progress output
    #[arg(short, long)]
    pub quiet: bool,
}

impl Cli {
    /// Check if progress should be displayed
    pub const fn should_show_progress(&self) -> bool {
        !self.quiet
    }

    /// Partitioning parameters
    pub const fn partition_settings(&self) -> PartitionSettings {
        PartitionSettings {
            dimensions: self.dimensions,
            depth: self.depth,
            hdr_threshold: self.hdr,
            layout: if self.brick {
                Layout::Brick
            } else {
                Layout::Simple
            },
            debris: self.debris,
            max_blank_fraction: self.blank_fraction,
            base_width: self.base_width,
        }
    }

    /// Matching parameters
    pub const fn match_settings(&self) -> MatchSettings {
        MatchSettings {
            tolerance: self.tolerance,
            usage_penalty: self.usage_penalty,
            usage_impunity: self.usage_impunity,
        }
    }

    /// Assembly parameters
    pub const fn assembly_options(&self) -> AssemblyOptions {
        AssemblyOptions {
            pad: self.pad,
            scatter: self.scatter,
            margin: self.margin,
            scaled_margin: self.scaled_margin,
            background: self.background,
        }
    }

    /// Where the mosaic is written
    pub fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| sibling_path(&self.target, OUTPUT_SUFFIX, None))
    }

    /// Where the visualization GIF is written
    pub fn visualization_path(&self) -> PathBuf {
        sibling_path(&self.output_path(), VISUALIZATION_SUFFIX, Some("gif"))
    }
}

/// Parse `WxH` or `N` into grid dimensions
///
/// # Errors
///
/// Returns a message if the text is not one or two positive integers
pub fn parse_dimensions(text: &str) -> std::result::Result<[u32; 2], String> {
    let parse = |part: &str| -> std::result::Result<u32, String> {
        match part.trim().parse::<u32>() {
            Ok(0) => Err("dimensions must be positive".to_string()),
            Ok(value) => Ok(value),
            Err(e) => Err(format!("invalid dimension '{part}': {e}")),
        }
    };
    match text.split_once(['x', 'X']) {
        Some((cols, rows)) => Ok([parse(cols)?, parse(rows)?]),
        None => {
            let n = parse(text)?;
            Ok([n, n])
        }
    }
}

/// Parse `R,G,B` into a color
///
/// # Errors
///
/// Returns a message if the text is not three comma-separated bytes
pub fn parse_color(text: &str) -> std::result::Result<[u8; 3], String> {
    let channels = text
        .split(',')
        .map(|part| {
            part.trim()
                .parse::<u8>()
                .map_err(|e| format!("invalid channel '{part}': {e}"))
        })
        .collect::<std::result::Result<Vec<u8>, String>>()?;
    match channels.as_slice() {
        &[r, g, b] => Ok([r, g, b]),
        _ => Err(format!("expected R,G,B, got '{text}'")),
    }
}

/// Install the stderr log subscriber: INFO by default, WARN when quiet
pub fn init_logging(quiet: bool) {
    let level = if quiet {
        LevelFilter::WARN
    } else {
        LevelFilter::INFO
    };
    // A subscriber installed earlier (e.g. by a test harness) wins
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Runs the whole pipeline for one set of CLI arguments
pub struct MosaicCommand {
    cli: Cli,
}

impl MosaicCommand {
    /// Create a runner for the given CLI arguments
    pub const fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Build the pool, make the mosaic and write it; returns the output path
    ///
    /// # Errors
    ///
    /// Returns an error if the target cannot be loaded, the pool is empty,
    /// any parameter is invalid or an output cannot be written
    pub fn run(&self) -> Result<PathBuf> {
        let start_time = Instant::now();
        let cli = &self.cli;

        if !cli.target.is_file() {
            return Err(MosaicError::InvalidParameter {
                parameter: "target",
                value: cli.target.display().to_string(),
                reason: "must be an image file".to_string(),
            });
        }

        let mut pool = MemoryPool::default();
        pool.add_directory(&cli.pool)?;
        if pool.count() == 0 {
            return Err(MosaicError::EmptyPool);
        }

        let mut capture = VisualizationCapture::new(cli.background);
        let mut mosaic = Photomosaic::open(
            &cli.target,
            cli.mask.as_deref(),
            &pool,
            !cli.no_tune,
            cli.seed,
        )?;
        mosaic.enable_progress(cli.should_show_progress());
        if cli.visualize {
            mosaic.set_observer(&mut capture);
        }

        mosaic.partition_tiles(&cli.partition_settings())?;
        mosaic.analyze()?;
        mosaic.match_tiles(&mut pool, cli.match_settings())?;
        mosaic.assemble(cli.assembly_options())?;

        let output_path = cli.output_path();
        mosaic.save(&output_path, cli.blend)?;
        drop(mosaic);

        if cli.visualize {
            let viz_path = cli.visualization_path();
            capture.export_gif(&viz_path, GIF_FRAME_DELAY_MS)?;
            info!(path = %viz_path.display(), "Saved visualization");
        }

        info!(
            elapsed_ms = start_time.elapsed().as_millis() as u64,
            "Mosaic complete"
        );
        Ok(output_path)
    }
}

fn sibling_path(input_path: &Path, suffix: &str, extension: Option<&str>) -> PathBuf {
    let stem = input_path.file_stem().unwrap_or_default();
    let extension = extension.map_or_else(
        || input_path.extension().unwrap_or_default().to_string_lossy(),
        std::borrow::Cow::Borrowed,
    );
    let name = if extension.is_empty() {
        format!("{}{suffix}", stem.to_string_lossy())
    } else {
        format!("{}{suffix}.{extension}", stem.to_string_lossy())
    };

    match input_path.parent() {
        Some(parent) => parent.join(name),
        None => PathBuf::from(name),
    }
}
