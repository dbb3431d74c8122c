// this_file: src/config.rs
//! Run configuration and validation limits

use crate::charset::CharRange;
use crate::engine::Engine;
use crate::error::{Error, Result};
use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

/// Maximum entries kept in the block-to-character cache
pub const DEFAULT_CACHE_CAPACITY: usize = 1_000_000;

/// Default pixel size for outline extraction
pub const DEFAULT_GLYPH_PX: f32 = 20.0;

/// Default height-to-width ratio of a terminal cell
pub const DEFAULT_CHAR_ASPECT: f64 = 2.0;

/// Upper bound for glyph pixel size
pub const MAX_GLYPH_PX: f32 = 512.0;

/// Upper bound for worker count
pub const MAX_WORKERS: usize = 1024;

/// Settings for one conversion run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Height-to-width ratio of one character cell.
    pub char_aspect: f64,
    /// Fraction of the terminal width to use, in (0, 1].
    pub scale: f64,
    pub engine: Engine,
    pub char_range: CharRange,
    pub single_threaded: bool,
    /// Worker count; `None` uses the available parallelism.
    pub workers: Option<usize>,
    pub save_chars: bool,
    pub save_blocks: bool,
    pub artifacts_dir: Utf8PathBuf,
    /// Emit a per-cell mean colour alongside each character.
    pub color: bool,
    pub invert: bool,
    pub stretch_contrast: bool,
    pub glyph_px: f32,
    pub cache_capacity: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            char_aspect: DEFAULT_CHAR_ASPECT,
            scale: 1.0,
            engine: Engine::default(),
            char_range: CharRange::default(),
            single_threaded: false,
            workers: None,
            save_chars: false,
            save_blocks: false,
            artifacts_dir: Utf8PathBuf::from("."),
            color: false,
            invert: false,
            stretch_contrast: false,
            glyph_px: DEFAULT_GLYPH_PX,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

impl RunConfig {
    /// Check ranges before any bulk work starts.
    ///
    /// A `scale` above 1 is accepted here and capped when the grid is built.
    pub fn validate(&self) -> Result<()> {
        if !(self.char_aspect.is_finite() && self.char_aspect > 0.0) {
            return Err(invalid(format!(
                "char_aspect must be a positive number, got {}",
                self.char_aspect
            )));
        }
        if !(self.scale.is_finite() && self.scale > 0.0) {
            return Err(invalid(format!(
                "scale must be greater than 0, got {}",
                self.scale
            )));
        }
        if !(self.glyph_px.is_finite() && self.glyph_px >= 1.0 && self.glyph_px <= MAX_GLYPH_PX) {
            return Err(invalid(format!(
                "glyph size must be between 1 and {} px, got {}",
                MAX_GLYPH_PX, self.glyph_px
            )));
        }
        if self.cache_capacity == 0 {
            return Err(invalid("cache capacity must be at least 1".to_string()));
        }
        if let Some(workers) = self.workers {
            if workers == 0 || workers > MAX_WORKERS {
                return Err(invalid(format!(
                    "worker count must be between 1 and {}, got {}",
                    MAX_WORKERS, workers
                )));
            }
        }
        Ok(())
    }

    /// Scale actually applied to the terminal width.
    pub fn effective_scale(&self) -> f64 {
        self.scale.min(1.0)
    }

    /// Worker count after applying `single_threaded` and the default.
    pub fn worker_count(&self) -> usize {
        if self.single_threaded {
            return 1;
        }
        self.workers.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
    }

    pub fn chars_dir(&self) -> Utf8PathBuf {
        self.artifacts_dir.join("chars")
    }

    pub fn blocks_dir(&self) -> Utf8PathBuf {
        self.artifacts_dir.join("blocks")
    }
}

fn invalid(reason: String) -> Error {
    Error::InvalidConfig { reason }
}
