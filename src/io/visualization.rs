//! Pipeline observation and animated GIF capture of mosaic construction

use crate::analysis::colors::quadrant_boxes;
use crate::io::configuration::{
    MAX_FRAMES_PER_STAGE, OUTLINE_COLOR, VIEWER_MIN_FRAME_DELAY_MS, VISUALIZATION_MAX_SIDE,
};
use crate::io::error::{MosaicError, Result};
use crate::io::image::{crop_to_fit, open_thumbnail};
use crate::spatial::grid::TileKey;
use crate::spatial::tiles::Tile;
use image::imageops::{self, FilterType};
use image::{DynamicImage, Frame, Rgb, RgbImage};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Receives per-tile progress from the pipeline
///
/// Observers are read-only; nothing they do feeds back into the mosaic.
pub trait MosaicObserver {
    /// The final tile list has been fixed
    fn tiles_partitioned(&mut self, _tiles: &[Tile]) {}

    /// A tile's color profile has been computed
    fn tile_analyzed(&mut self, _tile: &Tile) {}

    /// A tile has been assigned a pool image
    fn tile_matched(&mut self, _tile: &Tile) {}
}

/// One recorded pipeline event
#[derive(Debug, Clone, PartialEq)]
pub enum MosaicEvent {
    /// Tile outline became known
    Partitioned {
        /// Tile rectangle
        rect: TileKey,
    },
    /// Tile colors became known
    Analyzed {
        /// Tile rectangle
        rect: TileKey,
        /// Dominant color per quadrant
        rgb: [[u8; 3]; 4],
    },
    /// Tile match became known
    Matched {
        /// Tile rectangle
        rect: TileKey,
        /// Chosen pool image
        path: PathBuf,
    },
}

impl MosaicEvent {
    const fn stage(&self) -> usize {
        match self {
            Self::Partitioned { .. } => 0,
            Self::Analyzed { .. } => 1,
            Self::Matched { .. } => 2,
        }
    }
}

/// Records pipeline events for later rendering
///
/// Frames show tile outlines first, then quadrant colors, then the matched
/// images, drawn progressively over the background.
pub struct VisualizationCapture {
    events: Vec<MosaicEvent>,
    canvas_size: [u32; 2],
    background: [u8; 3],
}

impl VisualizationCapture {
    /// Create an empty capture drawing over `background`
    pub const fn new(background: [u8; 3]) -> Self {
        Self {
            events: Vec::new(),
            canvas_size: [0, 0],
            background,
        }
    }

    /// All recorded events in order
    pub fn events(&self) -> &[MosaicEvent] {
        &self.events
    }

    /// Returns the total number of recorded events
    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    /// Export the recorded events as an animated GIF
    ///
    /// Each stage is condensed to at most `MAX_FRAMES_PER_STAGE` frames, and
    /// frames are skipped further if `frame_delay_ms` is faster than viewers
    /// reliably play back.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - No events were captured
    /// - File system operations fail
    /// - GIF encoding fails
    pub fn export_gif(&self, output_path: &Path, frame_delay_ms: u32) -> Result<()> {
        if self.events.is_empty() || self.canvas_size.contains(&0) {
            return Err(MosaicError::InvalidSourceData {
                reason: "No mosaic events captured for visualization".to_string(),
            });
        }

        let frame_delay_ms = frame_delay_ms.max(1);
        let effective_delay_ms = frame_delay_ms.max(VIEWER_MIN_FRAME_DELAY_MS);
        let skip_factor = if frame_delay_ms < VIEWER_MIN_FRAME_DELAY_MS {
            VIEWER_MIN_FRAME_DELAY_MS.div_ceil(frame_delay_ms) as usize
        } else {
            1
        };

        let frames = self.generate_frames(effective_delay_ms, skip_factor);

        if let Some(parent) = output_path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
        {
            std::fs::create_dir_all(parent).map_err(|e| MosaicError::FileSystem {
                path: parent.to_path_buf(),
                operation: "create directory",
                source: e,
            })?;
        }

        let file = std::fs::File::create(output_path).map_err(|e| MosaicError::FileSystem {
            path: output_path.to_path_buf(),
            operation: "create file",
            source: e,
        })?;

        let mut encoder = image::codecs::gif::GifEncoder::new(file);
        encoder
            .encode_frames(frames)
            .map_err(|e| MosaicError::ImageExport {
                path: output_path.to_path_buf(),
                source: e,
            })?;

        Ok(())
    }

    fn generate_frames(&self, delay_ms: u32, skip_factor: usize) -> Vec<Frame> {
        let [width, height] = self.canvas_size;
        let mut canvas = RgbImage::from_pixel(width, height, Rgb(self.background));
        let mut thumbnails: HashMap<&Path, Option<RgbImage>> = HashMap::new();
        let mut frames = vec![render_frame(&canvas, delay_ms)];

        let mut stage_sizes = [0usize; 3];
        for event in &self.events {
            if let Some(size) = stage_sizes.get_mut(event.stage()) {
                *size += 1;
            }
        }

        let mut drawn_in_stage = 0usize;
        let mut current_stage = 0usize;
        for event in &self.events {
            if event.stage() != current_stage {
                if drawn_in_stage > 0 {
                    frames.push(render_frame(&canvas, delay_ms));
                }
                current_stage = event.stage();
                drawn_in_stage = 0;
            }

            draw_event(&mut canvas, event, &mut thumbnails);
            drawn_in_stage += 1;

            let stage_size = stage_sizes.get(current_stage).copied().unwrap_or(1);
            let step = stage_size.div_ceil(MAX_FRAMES_PER_STAGE).max(1) * skip_factor;
            if drawn_in_stage % step == 0 {
                frames.push(render_frame(&canvas, delay_ms));
            }
        }
        frames.push(render_frame(&canvas, delay_ms));

        // Final frame displays longer for better visibility
        if let Some(last_frame_img) = frames.last().map(|f| f.buffer().clone()) {
            frames.push(Frame::from_parts(
                last_frame_img,
                0,
                0,
                image::Delay::from_numer_denom_ms(delay_ms * 25, 1),
            ));
        }

        frames
    }

    fn extend_canvas(&mut self, rect: TileKey) {
        self.canvas_size = [
            self.canvas_size[0].max(rect.right()),
            self.canvas_size[1].max(rect.bottom()),
        ];
    }
}

impl MosaicObserver for VisualizationCapture {
    fn tiles_partitioned(&mut self, tiles: &[Tile]) {
        for tile in tiles {
            let rect = tile.key();
            self.extend_canvas(rect);
            self.events.push(MosaicEvent::Partitioned { rect });
        }
    }

    fn tile_analyzed(&mut self, tile: &Tile) {
        if let Some(profile) = tile.colors.as_ref() {
            self.events.push(MosaicEvent::Analyzed {
                rect: tile.key(),
                rgb: profile.rgb,
            });
        }
    }

    fn tile_matched(&mut self, tile: &Tile) {
        if let Some(record) = tile.matched.as_ref() {
            self.events.push(MosaicEvent::Matched {
                rect: tile.key(),
                path: record.path.clone(),
            });
        }
    }
}

fn draw_event<'a>(
    canvas: &mut RgbImage,
    event: &'a MosaicEvent,
    thumbnails: &mut HashMap<&'a Path, Option<RgbImage>>,
) {
    match event {
        MosaicEvent::Partitioned { rect } => draw_outline(canvas, *rect),
        MosaicEvent::Analyzed { rect, rgb } => {
            let boxes = quadrant_boxes(rect.width, rect.height);
            for ((x, y, w, h), color) in boxes.into_iter().zip(rgb.iter()) {
                fill(canvas, rect.x + x, rect.y + y, w, h, *color);
            }
        }
        MosaicEvent::Matched { rect, path } => {
            let bounds = [rect.width.max(1) * 2, rect.height.max(1) * 2];
            let source = thumbnails
                .entry(path.as_path())
                .or_insert_with(|| open_thumbnail(path, bounds).ok());
            if let Some(source) = source.as_ref() {
                let fitted = crop_to_fit(source, [rect.width, rect.height]);
                imageops::overlay(canvas, &fitted, i64::from(rect.x), i64::from(rect.y));
            }
        }
    }
}

fn draw_outline(canvas: &mut RgbImage, rect: TileKey) {
    if rect.width == 0 || rect.height == 0 {
        return;
    }
    fill(canvas, rect.x, rect.y, rect.width, 1, OUTLINE_COLOR);
    fill(canvas, rect.x, rect.bottom() - 1, rect.width, 1, OUTLINE_COLOR);
    fill(canvas, rect.x, rect.y, 1, rect.height, OUTLINE_COLOR);
    fill(canvas, rect.right() - 1, rect.y, 1, rect.height, OUTLINE_COLOR);
}

fn fill(canvas: &mut RgbImage, x: u32, y: u32, width: u32, height: u32, color: [u8; 3]) {
    for py in y..y.saturating_add(height).min(canvas.height()) {
        for px in x..x.saturating_add(width).min(canvas.width()) {
            canvas.put_pixel(px, py, Rgb(color));
        }
    }
}

fn render_frame(canvas: &RgbImage, delay_ms: u32) -> Frame {
    let frame = DynamicImage::ImageRgb8(canvas.clone());
    let longest = canvas.width().max(canvas.height());
    let frame = if longest > VISUALIZATION_MAX_SIDE {
        frame.resize(
            VISUALIZATION_MAX_SIDE,
            VISUALIZATION_MAX_SIDE,
            FilterType::Triangle,
        )
    } else {
        frame
    };
    Frame::from_parts(
        frame.to_rgba8(),
        0,
        0,
        image::Delay::from_numer_denom_ms(delay_ms, 1),
    )
}
