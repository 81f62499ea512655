//! Per-stage progress bars for the mosaic pipeline

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::sync::LazyLock;

static STAGE_STYLE: LazyLock<ProgressStyle> = LazyLock::new(|| {
    ProgressStyle::default_bar()
        .template("{prefix:>12} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏ ")
});

/// Coordinates one progress bar per pipeline stage
///
/// Bars stay hidden when the manager is disabled, so callers never branch on
/// whether progress is shown.
pub struct ProgressManager {
    multi_progress: MultiProgress,
    current: Option<ProgressBar>,
    enabled: bool,
}

impl Default for ProgressManager {
    fn default() -> Self {
        Self::new(true)
    }
}

impl ProgressManager {
    /// Create a progress manager; a disabled one draws nothing
    pub fn new(enabled: bool) -> Self {
        Self {
            multi_progress: MultiProgress::new(),
            current: None,
            enabled,
        }
    }

    /// Whether bars are drawn
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Begin a stage with `total` steps, finishing any previous stage
    pub fn start_stage(&mut self, name: &str, total: usize) {
        self.finish_stage();
        let bar = if self.enabled {
            self.multi_progress.add(ProgressBar::new(total as u64))
        } else {
            ProgressBar::hidden()
        };
        bar.set_style(STAGE_STYLE.clone());
        bar.set_prefix(name.to_string());
        self.current = Some(bar);
    }

    /// Advance the current stage by one step
    pub fn advance(&self) {
        if let Some(ref bar) = self.current {
            bar.inc(1);
        }
    }

    /// Steps completed in the current stage
    pub fn position(&self) -> u64 {
        self.current.as_ref().map_or(0, ProgressBar::position)
    }

    /// Mark the current stage complete
    pub fn finish_stage(&mut self) {
        if let Some(bar) = self.current.take() {
            bar.finish_with_message("✓");
        }
    }

    /// Clean up all progress displays
    pub fn finish(&mut self) {
        self.finish_stage();
        let _ = self.multi_progress.clear();
    }
}
