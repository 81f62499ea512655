//! Candidate image pool: the matching contract and an in-memory implementation

use crate::algorithm::matcher::MatchSettings;
use crate::analysis::colors::{ColorAnalyzer, ColorProfile};
use crate::analysis::levels::ChannelHistogram;
use crate::io::configuration::ANALYSIS_THUMBNAIL_SIZE;
use crate::io::error::{MosaicError, Result};
use image::RgbImage;
use image::imageops::{self, FilterType};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Pool image chosen for one tile
#[derive(Debug, Clone, PartialEq)]
pub struct MatchRecord {
    /// Index of the image within its pool
    pub id: usize,
    /// Location of the full-size image
    pub path: PathBuf,
    /// Raw color distance between tile and image, before usage penalty
    pub distance: f64,
    /// Full-size image width
    pub width: u32,
    /// Full-size image height
    pub height: u32,
    /// Mean absolute Lab lightness difference across quadrants
    pub lightness_delta: f64,
}

/// Store of candidate images with color summaries and usage counters
pub trait ImagePool {
    /// Number of candidates
    fn count(&self) -> usize;

    /// Zero every usage counter
    fn reset_usage(&mut self);

    /// Pick the candidate closest to `profile` under the usage penalty
    ///
    /// The chosen candidate's usage counter is incremented.
    ///
    /// # Errors
    ///
    /// Returns `MosaicError::EmptyPool` if there are no candidates
    fn choose_match(
        &mut self,
        profile: &ColorProfile,
        settings: &MatchSettings,
    ) -> Result<MatchRecord>;

    /// Aggregate channel histogram of all candidates
    fn histogram(&self) -> ChannelHistogram;
}

#[derive(Debug, Clone)]
struct PoolEntry {
    path: PathBuf,
    width: u32,
    height: u32,
    profile: ColorProfile,
    histogram: ChannelHistogram,
    uses: u32,
}

/// Pool held entirely in memory, analyzed on ingestion
#[derive(Debug, Clone, Default)]
pub struct MemoryPool {
    entries: Vec<PoolEntry>,
    known: HashSet<PathBuf>,
    analyzer: ColorAnalyzer,
}

impl MemoryPool {
    /// Create an empty pool using the given analyzer for candidates
    pub fn new(analyzer: ColorAnalyzer) -> Self {
        Self {
            entries: Vec::new(),
            known: HashSet::new(),
            analyzer,
        }
    }

    /// Add an already decoded image under `path`
    ///
    /// Returns `false` if the path is already present.
    pub fn insert(&mut self, path: impl Into<PathBuf>, image: &RgbImage) -> bool {
        let path = path.into();
        if !self.known.insert(path.clone()) {
            warn!(path = %path.display(), "Image already in pool, skipping");
            return false;
        }

        let thumbnail = analysis_thumbnail(image);
        self.entries.push(PoolEntry {
            path,
            width: image.width(),
            height: image.height(),
            profile: self.analyzer.analyze(&thumbnail),
            histogram: ChannelHistogram::from_image(&thumbnail, None).normalized(),
            uses: 0,
        });
        true
    }

    /// Load, analyze and add one image file
    ///
    /// Duplicates, unreadable files and images that are not plain RGB are
    /// logged and skipped. Returns whether the image was added.
    pub fn add_image(&mut self, path: &Path) -> bool {
        if self.known.contains(path) {
            warn!(path = %path.display(), "Image already in pool, skipping");
            return false;
        }

        let decoded = match image::open(path) {
            Ok(decoded) => decoded,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Cannot open image, skipping");
                return false;
            }
        };
        let color = decoded.color();
        if color.has_alpha() || !color.has_color() {
            warn!(path = %path.display(), ?color, "RGB images only, skipping");
            return false;
        }

        self.insert(path, &decoded.to_rgb8())
    }

    /// Add every image found below `dir`, recursively
    ///
    /// Returns the number of images added.
    ///
    /// # Errors
    ///
    /// Returns an error if `dir` itself cannot be read
    pub fn add_directory(&mut self, dir: &Path) -> Result<usize> {
        let mut files = Vec::new();
        collect_files(dir, &mut files)?;
        files.sort();

        let added = files.iter().filter(|file| self.add_image(file)).count();
        info!(dir = %dir.display(), added, total = self.entries.len(), "Pool built");
        Ok(added)
    }

    /// Times the candidate `id` has been chosen since the last reset
    pub fn usage(&self, id: usize) -> Option<u32> {
        self.entries.get(id).map(|entry| entry.uses)
    }

    /// Color profile of candidate `id`
    pub fn profile(&self, id: usize) -> Option<&ColorProfile> {
        self.entries.get(id).map(|entry| &entry.profile)
    }

    /// Paths of all candidates in pool order
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.entries.iter().map(|entry| entry.path.as_path())
    }
}

impl ImagePool for MemoryPool {
    fn count(&self) -> usize {
        self.entries.len()
    }

    fn reset_usage(&mut self) {
        for entry in &mut self.entries {
            entry.uses = 0;
        }
    }

    fn choose_match(
        &mut self,
        profile: &ColorProfile,
        settings: &MatchSettings,
    ) -> Result<MatchRecord> {
        let scored: Vec<(usize, f64, f64)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(id, entry)| {
                let raw = profile.distance(&entry.profile);
                (id, raw, settings.effective_distance(raw, entry.uses))
            })
            .collect();

        // Lowest effective distance, first in pool order on ties
        let (id, raw, _) = scored
            .iter()
            .copied()
            .min_by(|a, b| a.2.total_cmp(&b.2))
            .ok_or(MosaicError::EmptyPool)?;
        let best_raw = scored
            .iter()
            .map(|&(_, distance, _)| distance)
            .min_by(f64::total_cmp)
            .unwrap_or(raw);
        if raw > best_raw + settings.tolerance {
            debug!(
                id,
                distance = raw,
                best = best_raw,
                "Usage penalty chose a match beyond tolerance"
            );
        }

        let entry = self.entries.get_mut(id).ok_or(MosaicError::EmptyPool)?;
        entry.uses += 1;
        debug!(id, distance = raw, uses = entry.uses, "Chose pool image");
        Ok(MatchRecord {
            id,
            path: entry.path.clone(),
            distance: raw,
            width: entry.width,
            height: entry.height,
            lightness_delta: profile.lightness_delta(&entry.profile),
        })
    }

    fn histogram(&self) -> ChannelHistogram {
        let mut total = ChannelHistogram::new();
        for entry in &self.entries {
            total.accumulate(&entry.histogram, 1.0);
        }
        total
    }
}

fn analysis_thumbnail(image: &RgbImage) -> RgbImage {
    let (width, height) = image.dimensions();
    let longest = width.max(height);
    if longest <= ANALYSIS_THUMBNAIL_SIZE || width == 0 || height == 0 {
        return image.clone();
    }
    let scale = f64::from(ANALYSIS_THUMBNAIL_SIZE) / f64::from(longest);
    let thumb_w = ((f64::from(width) * scale).round() as u32).max(1);
    let thumb_h = ((f64::from(height) * scale).round() as u32).max(1);
    imageops::resize(image, thumb_w, thumb_h, FilterType::Triangle)
}

fn collect_files(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    let entries = std::fs::read_dir(dir).map_err(|e| MosaicError::FileSystem {
        path: dir.to_path_buf(),
        operation: "read directory",
        source: e,
    })?;

    for entry in entries {
        let path = match entry {
            Ok(entry) => entry.path(),
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "Unreadable directory entry");
                continue;
            }
        };
        if path.is_dir() {
            if let Err(e) = collect_files(&path, files) {
                warn!(error = %e, "Skipping subdirectory");
            }
        } else {
            files.push(path);
        }
    }
    Ok(())
}
