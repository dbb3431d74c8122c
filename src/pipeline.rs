// this_file: src/pipeline.rs

//! Frame-to-character-grid conversion for single images and sequences.
//!
//! A [`Unifier`] owns everything one run needs: the validated
//! configuration, the character set, the [`Dispatcher`] with its worker
//! contexts and the block cache. Frames of a sequence share that cache, so
//! regions that do not change between frames are matched only once.

use crate::artifacts;
use crate::bitmap::{Bitmap, PixelBlock};
use crate::cache::DedupCache;
use crate::charset::CharacterSet;
use crate::config::RunConfig;
use crate::dispatcher::{Dispatcher, DispatcherOptions, FrameStats};
use crate::error::Result;
use crate::glyph::GlyphRenderer;
use crate::grid::Grid;
use crate::image_ops;
use crate::logging::Timer;
use crate::rasterize::GlyphSource;
use crate::source::Frame;
use log::{debug, info};
use serde::Serialize;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Characters for one frame, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharGrid {
    pub columns: usize,
    pub rows: usize,
    pub chars: Vec<char>,
    /// Mean RGB per cell, present in colour mode.
    pub colors: Option<Vec<[u8; 3]>>,
    pub delay: Duration,
}

impl CharGrid {
    pub fn row(&self, index: usize) -> &[char] {
        let start = index * self.columns;
        &self.chars[start..start + self.columns]
    }

    /// Rows as strings, top to bottom.
    pub fn lines(&self) -> impl Iterator<Item = String> + '_ {
        self.chars
            .chunks(self.columns.max(1))
            .map(|row| row.iter().collect())
    }
}

impl fmt::Display for CharGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, line) in self.lines().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            f.write_str(&line)?;
        }
        Ok(())
    }
}

/// Totals accumulated over a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunStats {
    pub frames: usize,
    pub blocks: usize,
    pub unique: usize,
    pub cache_hits: usize,
    pub computed: usize,
    pub parallel_frames: usize,
    pub cache_entries: usize,
    pub cache_evictions: u64,
    pub glyphs_rendered: usize,
    pub workers: usize,
}

/// Converts frames into character grids under one configuration.
pub struct Unifier {
    config: RunConfig,
    charset: Arc<CharacterSet>,
    source: Arc<dyn GlyphSource>,
    dispatcher: Dispatcher,
    cache: DedupCache,
    stats: RunStats,
    prerendered: usize,
    frame_index: usize,
}

impl Unifier {
    /// Validate `config` and build the run with the character set of its range.
    pub fn new(config: RunConfig, source: Arc<dyn GlyphSource>) -> Result<Self> {
        config.validate()?;
        let charset = CharacterSet::from_range(config.char_range)?;
        Self::with_charset(config, charset, source)
    }

    /// Like [`Unifier::new`] with an explicit character set.
    pub fn with_charset(
        config: RunConfig,
        charset: CharacterSet,
        source: Arc<dyn GlyphSource>,
    ) -> Result<Self> {
        config.validate()?;
        let charset = Arc::new(charset);
        let chars_dir = config.save_chars.then(|| config.chars_dir());
        let dispatcher = Dispatcher::new(
            Arc::clone(&charset),
            config.engine,
            Arc::clone(&source),
            DispatcherOptions {
                workers: config.worker_count(),
                single_threaded: config.single_threaded,
                chars_dir,
            },
        )?;
        let cache = DedupCache::new(config.cache_capacity);

        debug!(
            "Unifier: engine {}, {} characters, {} worker(s), cache capacity {}",
            config.engine,
            charset.len(),
            dispatcher.workers(),
            cache.capacity()
        );

        Ok(Self {
            config,
            charset,
            source,
            dispatcher,
            cache,
            stats: RunStats::default(),
            prerendered: 0,
            frame_index: 0,
        })
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn charset(&self) -> &CharacterSet {
        &self.charset
    }

    pub fn cache(&self) -> &DedupCache {
        &self.cache
    }

    /// Grid for `frame` at `columns`, checked against the engine.
    pub fn grid_for(&self, frame: &Frame, columns: u32) -> Result<Grid> {
        let grid = Grid::compute(
            frame.width(),
            frame.height(),
            self.config.char_aspect,
            self.config.effective_scale(),
            columns,
        )?;
        grid.check_engine(self.config.engine)?;
        Ok(grid)
    }

    /// Convert one frame; the block cache persists across calls.
    pub fn convert_frame(&mut self, frame: &Frame, columns: u32) -> Result<CharGrid> {
        let grid = self.grid_for(frame, columns)?;
        self.convert_with_grid(frame, &grid)
    }

    /// Convert every frame of a sequence.
    ///
    /// For more than one frame all glyphs for the first frame's cell shapes
    /// are rendered up front and handed to every worker.
    pub fn convert_sequence(&mut self, frames: &[Frame], columns: u32) -> Result<Vec<CharGrid>> {
        let _timer = Timer::new(format!("Converting {} frame(s)", frames.len()));
        let Some(first) = frames.first() else {
            return Ok(Vec::new());
        };

        let grid = self.grid_for(first, columns)?;
        if frames.len() > 1 && self.charset.single().is_none() {
            self.prewarm(&grid)?;
        }

        let mut grids = Vec::with_capacity(frames.len());
        for frame in frames {
            let out = if (frame.width(), frame.height()) == (grid.width, grid.height) {
                self.convert_with_grid(frame, &grid)?
            } else {
                self.convert_frame(frame, columns)?
            };
            grids.push(out);
        }

        info!(
            "Converted {} frame(s): {} blocks, {} computed, {} from cache",
            self.stats.frames, self.stats.blocks, self.stats.computed, self.stats.cache_hits
        );
        Ok(grids)
    }

    fn prewarm(&mut self, grid: &Grid) -> Result<()> {
        let shapes = grid.shapes();
        let _timer = Timer::new(format!(
            "Pre-rendering {} characters at {} shape(s)",
            self.charset.len(),
            shapes.len()
        ));
        let chars_dir = self.config.save_chars.then(|| self.config.chars_dir());
        let mut warm = GlyphRenderer::new(Arc::clone(&self.source)).with_chars_dir(chars_dir);
        warm.prerender(&self.charset, shapes)?;
        self.dispatcher.seed_workers(&warm);
        self.prerendered += warm.rendered();
        Ok(())
    }

    fn convert_with_grid(&mut self, frame: &Frame, grid: &Grid) -> Result<CharGrid> {
        let index = self.frame_index;
        self.frame_index += 1;

        let plane = preprocess(
            frame.luma(),
            self.config.invert,
            self.config.stretch_contrast,
        );
        let blocks = slice_blocks(&plane, grid)?;
        debug!(
            "Frame {}: {}x{} px -> {}x{} cells, {} shape(s)",
            index,
            frame.width(),
            frame.height(),
            grid.chars_width(),
            grid.chars_height(),
            grid.shapes().len()
        );

        if self.config.save_blocks {
            let dir = self.config.blocks_dir();
            for (i, block) in blocks.iter().enumerate() {
                artifacts::save_png(&dir, &artifacts::block_file_name(index, i), block)?;
            }
        }

        let (chars, frame_stats) = match self.charset.single() {
            Some(only) => (
                vec![only; blocks.len()],
                FrameStats {
                    blocks: blocks.len(),
                    ..FrameStats::default()
                },
            ),
            None => self.dispatcher.resolve(&blocks, &mut self.cache)?,
        };
        self.record(&frame_stats);

        let colors = self.config.color.then(|| cell_colors(frame, grid));

        Ok(CharGrid {
            columns: grid.chars_width(),
            rows: grid.chars_height(),
            chars,
            colors,
            delay: frame.delay(),
        })
    }

    fn record(&mut self, frame: &FrameStats) {
        self.stats.frames += 1;
        self.stats.blocks += frame.blocks;
        self.stats.unique += frame.unique;
        self.stats.cache_hits += frame.cache_hits;
        self.stats.computed += frame.computed;
        self.stats.parallel_frames += usize::from(frame.parallel);
    }

    /// Totals so far, including cache occupancy and glyph counts.
    pub fn stats(&self) -> RunStats {
        let cache = self.cache.stats();
        RunStats {
            cache_entries: cache.entries,
            cache_evictions: cache.evictions,
            glyphs_rendered: self.prerendered + self.dispatcher.glyphs_rendered(),
            workers: self.dispatcher.workers(),
            ..self.stats.clone()
        }
    }
}

/// Cut `plane` into the grid's blocks, row-major.
pub fn slice_blocks(plane: &[u8], grid: &Grid) -> Result<Vec<PixelBlock>> {
    grid.rects()
        .map(|r| Bitmap::from_region(plane, grid.width, r.x, r.y, r.width, r.height))
        .collect()
}

/// Invert first, then stretch contrast; borrows when neither applies.
fn preprocess(luma: &[u8], invert: bool, stretch_contrast: bool) -> Cow<'_, [u8]> {
    if !invert && !stretch_contrast {
        return Cow::Borrowed(luma);
    }
    let mut plane = luma.to_vec();
    if invert {
        image_ops::invert(&mut plane);
    }
    if stretch_contrast {
        image_ops::autocontrast(&mut plane);
    }
    Cow::Owned(plane)
}

fn cell_colors(frame: &Frame, grid: &Grid) -> Vec<[u8; 3]> {
    match frame.rgb() {
        Some(rgb) => grid
            .rects()
            .map(|rect| image_ops::mean_rgb(rgb, frame.width(), rect))
            .collect(),
        None => {
            let width = frame.width();
            grid.rects()
                .map(|rect| {
                    let mut sum = 0u64;
                    for y in rect.y..rect.y + rect.height {
                        let start = (y * width + rect.x) as usize;
                        sum += frame.luma()[start..start + rect.width as usize]
                            .iter()
                            .map(|&v| v as u64)
                            .sum::<u64>();
                    }
                    let mean = (sum / (rect.width as u64 * rect.height as u64)) as u8;
                    [mean; 3]
                })
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn char_grid_lines_and_display() {
        let grid = CharGrid {
            columns: 3,
            rows: 2,
            chars: "abcdef".chars().collect(),
            colors: None,
            delay: Duration::ZERO,
        };
        assert_eq!(grid.lines().collect::<Vec<_>>(), vec!["abc", "def"]);
        assert_eq!(grid.row(1), &['d', 'e', 'f']);
        assert_eq!(grid.to_string(), "abc\ndef");
    }

    #[test]
    fn slices_blocks_in_row_major_order() {
        let plane: Vec<u8> = (0..20).collect();
        let grid = Grid {
            width: 5,
            height: 4,
            block_widths: vec![3, 2],
            block_heights: vec![2, 2],
        };
        let blocks = slice_blocks(&plane, &grid).unwrap();
        assert_eq!(blocks.len(), 4);
        assert_eq!(blocks[0].pixels(), &[0, 1, 2, 5, 6, 7]);
        assert_eq!(blocks[1].pixels(), &[3, 4, 8, 9]);
        assert_eq!(blocks[3].pixels(), &[13, 14, 18, 19]);
    }

    #[test]
    fn preprocess_inverts_before_stretching() {
        let luma = [10, 20, 200];
        assert!(matches!(preprocess(&luma, false, false), Cow::Borrowed(_)));
        assert_eq!(&*preprocess(&luma, true, false), &[245, 235, 55]);
        // Stretched after inversion, 20 lands on 241; the reverse order gives 242.
        assert_eq!(&*preprocess(&luma, true, true), &[255, 241, 0]);
    }

    #[test]
    fn gray_frames_get_gray_colors() {
        let frame = Frame::from_luma(4, 2, vec![10, 20, 200, 200, 30, 40, 100, 100]).unwrap();
        let grid = Grid {
            width: 4,
            height: 2,
            block_widths: vec![2, 2],
            block_heights: vec![2],
        };
        assert_eq!(cell_colors(&frame, &grid), vec![[25; 3], [150; 3]]);
    }
}
