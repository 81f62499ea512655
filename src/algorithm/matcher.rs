//! Tile to pool-image assignment under a usage penalty

use crate::io::configuration::{DEFAULT_TOLERANCE, DEFAULT_USAGE_IMPUNITY, DEFAULT_USAGE_PENALTY};
use crate::io::error::{MosaicError, Result, invalid_parameter};
use crate::io::pool::ImagePool;
use crate::spatial::tiles::Tile;
use tracing::info;

/// Selection parameters passed through to the pool
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchSettings {
    /// Raw distance a penalized choice may exceed the closest candidate by
    /// before the pool reports it; never changes which candidate wins
    pub tolerance: f64,
    /// Distance added per use beyond `usage_impunity`
    pub usage_penalty: f64,
    /// Uses that carry no penalty
    pub usage_impunity: u32,
}

impl Default for MatchSettings {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            usage_penalty: DEFAULT_USAGE_PENALTY,
            usage_impunity: DEFAULT_USAGE_IMPUNITY,
        }
    }
}

impl MatchSettings {
    /// Raw distance plus the penalty for uses beyond the free allowance
    pub fn effective_distance(&self, raw: f64, uses: u32) -> f64 {
        let excess = uses.saturating_sub(self.usage_impunity);
        self.usage_penalty.mul_add(f64::from(excess), raw)
    }

    /// Check that every field is usable
    ///
    /// # Errors
    ///
    /// Returns an error if tolerance or penalty is negative or not finite
    pub fn validate(&self) -> Result<()> {
        if !(self.tolerance.is_finite() && self.tolerance >= 0.0) {
            return Err(invalid_parameter(
                "tolerance",
                &self.tolerance,
                &"must be a non-negative number",
            ));
        }
        if !(self.usage_penalty.is_finite() && self.usage_penalty >= 0.0) {
            return Err(invalid_parameter(
                "usage penalty",
                &self.usage_penalty,
                &"must be a non-negative number",
            ));
        }
        Ok(())
    }
}

/// Assigns each analyzed tile a pool image
#[derive(Debug, Clone, Copy, Default)]
pub struct Matcher {
    settings: MatchSettings,
}

impl Matcher {
    /// Create a matcher
    ///
    /// # Errors
    ///
    /// Returns an error if the settings are invalid
    pub fn new(settings: MatchSettings) -> Result<Self> {
        settings.validate()?;
        Ok(Self { settings })
    }

    /// Settings in use
    pub const fn settings(&self) -> &MatchSettings {
        &self.settings
    }

    /// Match one tile and record the choice on it
    ///
    /// # Errors
    ///
    /// Returns an error if the tile has not been analyzed or the pool is empty
    pub fn match_tile<P: ImagePool + ?Sized>(&self, tile: &mut Tile, pool: &mut P) -> Result<()> {
        let Some(profile) = tile.colors.as_ref() else {
            return Err(MosaicError::StageOrder {
                stage: "match",
                requires: "analyze",
            });
        };
        tile.matched = Some(pool.choose_match(profile, &self.settings)?);
        Ok(())
    }

    /// Match every tile against a freshly reset pool
    ///
    /// `on_match` sees each tile after its match is recorded.
    ///
    /// # Errors
    ///
    /// Returns `MosaicError::EmptyPool` before touching any tile if the pool
    /// is empty, or a stage-order error for an unanalyzed tile
    pub fn match_all<P, F>(&self, tiles: &mut [Tile], pool: &mut P, mut on_match: F) -> Result<()>
    where
        P: ImagePool + ?Sized,
        F: FnMut(&Tile),
    {
        if pool.count() == 0 {
            return Err(MosaicError::EmptyPool);
        }
        pool.reset_usage();

        for tile in tiles.iter_mut() {
            self.match_tile(tile, pool)?;
            on_match(tile);
        }
        info!(tiles = tiles.len(), candidates = pool.count(), "Matched tiles");
        Ok(())
    }
}
