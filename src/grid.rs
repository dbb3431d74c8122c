// this_file: src/grid.rs

//! Partitioning of an image into variable-size character cells.
//!
//! The grid is sized so each cell is at least ~10 pixels tall and
//! `10 / char_aspect` pixels wide, limited by the terminal width. Leftover
//! pixels are spread one at a time over the leading cells, so the blocks tile
//! the image exactly.

use crate::engine::{Engine, SSIM_MIN_BLOCK};
use crate::error::{Error, Result};
use std::collections::BTreeSet;

/// Nominal block height in pixels before aspect correction.
pub const MIN_BLOCK_HEIGHT: f64 = 10.0;

/// Cell layout for one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    pub width: u32,
    pub height: u32,
    pub block_widths: Vec<u32>,
    pub block_heights: Vec<u32>,
}

/// Pixel rectangle of one cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Grid {
    /// Lay out a `width`×`height` image for a terminal of `columns` columns.
    ///
    /// `scale` above 1 is treated as 1.
    pub fn compute(
        width: u32,
        height: u32,
        char_aspect: f64,
        scale: f64,
        columns: u32,
    ) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidDimensions {
                width,
                height,
                reason: "image must have non-zero width and height".to_string(),
            });
        }
        if !(char_aspect.is_finite() && char_aspect > 0.0) {
            return Err(Error::InvalidConfig {
                reason: format!("char_aspect must be positive, got {char_aspect}"),
            });
        }
        if !(scale.is_finite() && scale > 0.0) {
            return Err(Error::InvalidConfig {
                reason: format!("scale must be greater than 0, got {scale}"),
            });
        }
        let scale = scale.min(1.0);

        let min_block_width = MIN_BLOCK_HEIGHT / char_aspect;
        let max_by_width = (width as f64 / min_block_width).floor();
        let max_by_height = ((height as f64 / MIN_BLOCK_HEIGHT).floor() * char_aspect).trunc();
        let max_chars_width = max_by_width.min(max_by_height);

        let by_terminal = (columns as f64 * scale).trunc();
        let chars_width = by_terminal
            .min(columns as f64)
            .min(max_chars_width)
            .max(1.0)
            .min(width as f64) as u32;

        let chars_height = ((height as f64 * chars_width as f64 / width as f64) / char_aspect)
            .ceil()
            .clamp(1.0, height as f64) as u32;

        Ok(Self {
            width,
            height,
            block_widths: split_evenly(width, chars_width),
            block_heights: split_evenly(height, chars_height),
        })
    }

    pub fn chars_width(&self) -> usize {
        self.block_widths.len()
    }

    pub fn chars_height(&self) -> usize {
        self.block_heights.len()
    }

    pub fn cell_count(&self) -> usize {
        self.chars_width() * self.chars_height()
    }

    /// Smallest block dimension in either direction.
    pub fn min_block_dim(&self) -> u32 {
        self.block_widths
            .iter()
            .chain(self.block_heights.iter())
            .copied()
            .min()
            .unwrap_or(0)
    }

    /// Fail early when the engine cannot score blocks this small.
    pub fn check_engine(&self, engine: Engine) -> Result<()> {
        let min_dim = self.min_block_dim();
        if engine == Engine::Ssim && min_dim <= SSIM_MIN_BLOCK {
            return Err(Error::BlockTooSmall { min_dim });
        }
        Ok(())
    }

    /// Distinct (width, height) cell shapes.
    pub fn shapes(&self) -> BTreeSet<(u32, u32)> {
        let widths: BTreeSet<u32> = self.block_widths.iter().copied().collect();
        let heights: BTreeSet<u32> = self.block_heights.iter().copied().collect();
        widths
            .iter()
            .flat_map(|&w| heights.iter().map(move |&h| (w, h)))
            .collect()
    }

    /// Cell rectangles in row-major order.
    pub fn rects(&self) -> impl Iterator<Item = CellRect> + '_ {
        offsets(&self.block_heights).flat_map(move |(y, height)| {
            offsets(&self.block_widths).map(move |(x, width)| CellRect {
                x,
                y,
                width,
                height,
            })
        })
    }
}

/// `total` split into `parts` sizes; the first `total % parts` get one extra.
fn split_evenly(total: u32, parts: u32) -> Vec<u32> {
    let base = total / parts;
    let extra = total % parts;
    (0..parts)
        .map(|i| if i < extra { base + 1 } else { base })
        .collect()
}

fn offsets(sizes: &[u32]) -> impl Iterator<Item = (u32, u32)> + '_ {
    sizes.iter().scan(0u32, |pos, &size| {
        let start = *pos;
        *pos += size;
        Some((start, size))
    })
}
