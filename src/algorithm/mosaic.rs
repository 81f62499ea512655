//! End-to-end photomosaic pipeline
//!
//! Stages run strictly in order, each consuming the previous stage's output:
//! tune, partition, analyze, match, assemble, untune. Calling a stage early
//! fails with a stage-order error rather than running on stale state.

use crate::algorithm::assembly::{Assembler, AssemblyOptions};
use crate::algorithm::matcher::{MatchSettings, Matcher};
use crate::algorithm::partition::{Layout, Partition};
use crate::algorithm::tuning::PaletteTuner;
use crate::analysis::colors::ColorAnalyzer;
use crate::io::configuration::{
    DEFAULT_BLANK_FRACTION, DEFAULT_DEPTH, DEFAULT_DIMENSIONS, DEFAULT_HDR_THRESHOLD,
    MASK_BINARIZE_THRESHOLD,
};
use crate::io::error::{MosaicError, Result};
use crate::io::image::{fit_mask, open_mask, open_rgb, save_rgb};
use crate::io::pool::ImagePool;
use crate::io::progress::ProgressManager;
use crate::io::visualization::MosaicObserver;
use crate::spatial::tiles::Tile;
use image::{GrayImage, RgbImage};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::Path;
use tracing::info;

/// How the target is divided into tiles
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PartitionSettings {
    /// Top-level grid cells `[columns, rows]`
    pub dimensions: [u32; 2],
    /// Generations of quadrant subdivision
    pub depth: u32,
    /// Luma spread above which a tile splits
    pub hdr_threshold: u8,
    /// Grid arrangement
    pub layout: Layout,
    /// Keep gray mask levels instead of binarizing
    pub debris: bool,
    /// Ambiguous mask tiles at least this fraction of the image width are dropped
    pub max_blank_fraction: f64,
    /// Rescale so each top-level cell is this many pixels wide
    pub base_width: Option<u32>,
}

impl Default for PartitionSettings {
    fn default() -> Self {
        Self {
            dimensions: [DEFAULT_DIMENSIONS; 2],
            depth: DEFAULT_DEPTH,
            hdr_threshold: DEFAULT_HDR_THRESHOLD,
            layout: Layout::Simple,
            debris: false,
            max_blank_fraction: DEFAULT_BLANK_FRACTION,
            base_width: None,
        }
    }
}

/// A photomosaic under construction
pub struct Photomosaic<'o> {
    original: RgbImage,
    target: RgbImage,
    mask: Option<GrayImage>,
    tuner: Option<PaletteTuner>,
    analyzer: ColorAnalyzer,
    partition: Option<Partition>,
    tiles: Vec<Tile>,
    analyzed: bool,
    mosaic: Option<RgbImage>,
    rng: StdRng,
    observer: Option<&'o mut dyn MosaicObserver>,
    progress: ProgressManager,
}

impl<'o> Photomosaic<'o> {
    /// Start a mosaic of `original`, tuned toward `pool` when `tuning` is set
    ///
    /// The mask is fitted to the target's geometry.
    ///
    /// # Errors
    ///
    /// Returns an error if palette tuning fails
    pub fn new<P: ImagePool + ?Sized>(
        original: RgbImage,
        mask: Option<GrayImage>,
        pool: &P,
        tuning: bool,
        rng: StdRng,
    ) -> Result<Self> {
        let mask = mask.map(|m| fit_mask(&m, [original.width(), original.height()]));
        let (target, tuner) = if tuning {
            let tuner = PaletteTuner::new(&original, mask.as_ref());
            (tuner.tune(&original, pool)?, Some(tuner))
        } else {
            (original.clone(), None)
        };

        Ok(Self {
            original,
            target,
            mask,
            tuner,
            analyzer: ColorAnalyzer::default(),
            partition: None,
            tiles: Vec::new(),
            analyzed: false,
            mosaic: None,
            rng,
            observer: None,
            progress: ProgressManager::new(false),
        })
    }

    /// Load target and optional mask from disk and seed the random source
    ///
    /// # Errors
    ///
    /// Returns an error if either image cannot be opened or tuning fails
    pub fn open<P: ImagePool + ?Sized>(
        target: &Path,
        mask: Option<&Path>,
        pool: &P,
        tuning: bool,
        seed: u64,
    ) -> Result<Self> {
        let original = open_rgb(target)?;
        let mask = mask.map(open_mask).transpose()?;
        info!(path = %target.display(), width = original.width(), height = original.height(), "Loaded target");
        Self::new(original, mask, pool, tuning, StdRng::seed_from_u64(seed))
    }

    /// Replace the color analyzer used for tiles
    pub const fn set_analyzer(&mut self, analyzer: ColorAnalyzer) {
        self.analyzer = analyzer;
    }

    /// Attach an observer notified of partition, analysis and match events
    pub fn set_observer(&mut self, observer: &'o mut dyn MosaicObserver) {
        self.observer = Some(observer);
    }

    /// Show or hide per-stage progress bars
    pub fn enable_progress(&mut self, enabled: bool) {
        self.progress = ProgressManager::new(enabled);
    }

    /// Original target as loaded
    pub const fn original(&self) -> &RgbImage {
        &self.original
    }

    /// Target after tuning (the original when tuning is off)
    pub const fn target(&self) -> &RgbImage {
        &self.target
    }

    /// Current tiles
    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    /// Partition built by the last `partition_tiles` call
    pub const fn partition(&self) -> Option<&Partition> {
        self.partition.as_ref()
    }

    /// Assembled mosaic before untuning
    pub const fn mosaic(&self) -> Option<&RgbImage> {
        self.mosaic.as_ref()
    }

    /// Divide the target into its final tile list; returns the tile count
    ///
    /// Runs size normalization, optional mask binarization, the grid layout,
    /// recursive split and blank removal, then fixes the tile list.
    ///
    /// # Errors
    ///
    /// Returns an error if any partition parameter is invalid
    pub fn partition_tiles(&mut self, settings: &PartitionSettings) -> Result<usize> {
        let rng = StdRng::seed_from_u64(self.rng.random());
        let mut partition = Partition::new(self.target.clone(), self.mask.clone(), rng);
        partition.normalize_size(settings.dimensions, settings.depth, settings.base_width)?;
        if !settings.debris {
            partition.binarize_mask(MASK_BINARIZE_THRESHOLD)?;
        }
        partition.partition(settings.dimensions, settings.layout)?;
        partition.recursive_split(settings.depth, settings.hdr_threshold)?;
        partition.remove_blanks(settings.max_blank_fraction)?;

        self.tiles = partition.final_tiles().to_vec();
        self.partition = Some(partition);
        self.analyzed = false;
        self.mosaic = None;

        if let Some(observer) = self.observer.as_deref_mut() {
            observer.tiles_partitioned(&self.tiles);
        }
        Ok(self.tiles.len())
    }

    /// Compute the color profile of every tile
    ///
    /// # Errors
    ///
    /// Returns an error if the target has not been partitioned
    pub fn analyze(&mut self) -> Result<()> {
        let Some(partition) = self.partition.as_mut() else {
            return Err(MosaicError::StageOrder {
                stage: "analyze",
                requires: "partition",
            });
        };

        self.progress.start_stage("Analyzing", self.tiles.len());
        for tile in &mut self.tiles {
            let region = partition.crop(tile.key());
            tile.colors = Some(self.analyzer.analyze(&region));
            if let Some(observer) = self.observer.as_deref_mut() {
                observer.tile_analyzed(tile);
            }
            self.progress.advance();
        }
        self.progress.finish_stage();
        self.analyzed = true;
        info!(tiles = self.tiles.len(), "Analyzed tiles");
        Ok(())
    }

    /// Assign every tile a pool image
    ///
    /// # Errors
    ///
    /// Returns an error if tiles are not analyzed, the settings are invalid
    /// or the pool is empty
    pub fn match_tiles<P: ImagePool + ?Sized>(
        &mut self,
        pool: &mut P,
        settings: MatchSettings,
    ) -> Result<()> {
        if !self.analyzed {
            return Err(MosaicError::StageOrder {
                stage: "match",
                requires: "analyze",
            });
        }
        let matcher = Matcher::new(settings)?;

        self.progress.start_stage("Matching", self.tiles.len());
        let observer = &mut self.observer;
        let progress = &self.progress;
        matcher.match_all(&mut self.tiles, pool, |tile| {
            if let Some(observer) = observer.as_deref_mut() {
                observer.tile_matched(tile);
            }
            progress.advance();
        })?;
        self.progress.finish_stage();
        self.mosaic = None;
        Ok(())
    }

    /// Composite the matched images into the mosaic canvas
    ///
    /// # Errors
    ///
    /// Returns an error if the target has not been partitioned, tiles are
    /// unmatched or the options are invalid
    pub fn assemble(&mut self, options: AssemblyOptions) -> Result<&RgbImage> {
        let Some(partition) = self.partition.as_ref() else {
            return Err(MosaicError::StageOrder {
                stage: "assemble",
                requires: "partition",
            });
        };
        let size = [partition.image().width(), partition.image().height()];
        let mut assembler = Assembler::new(options)?;

        self.progress.start_stage("Placing", self.tiles.len());
        let progress = &self.progress;
        let canvas = assembler.assemble(size, &self.tiles, &mut self.rng, |_| progress.advance())?;
        self.progress.finish();
        Ok(self.mosaic.insert(canvas))
    }

    /// The final image: the mosaic untuned by `blend` when tuning is on
    ///
    /// # Errors
    ///
    /// Returns an error if nothing has been assembled or untuning fails
    pub fn finish(&self, blend: f64) -> Result<RgbImage> {
        let Some(mosaic) = self.mosaic.as_ref() else {
            return Err(MosaicError::StageOrder {
                stage: "finish",
                requires: "assemble",
            });
        };
        match self.tuner.as_ref() {
            Some(tuner) => tuner.untune(mosaic, blend),
            None => Ok(mosaic.clone()),
        }
    }

    /// Write the finished mosaic to `path`
    ///
    /// # Errors
    ///
    /// Returns an error if finishing or saving fails
    pub fn save(&self, path: &Path, blend: f64) -> Result<()> {
        let output = self.finish(blend)?;
        info!(path = %path.display(), "Saving mosaic");
        save_rgb(&output, path)
    }
}
