// this_file: src/matcher.rs
//! Best-match search of one block against the character set

use crate::bitmap::PixelBlock;
use crate::charset::CharacterSet;
use crate::engine::Engine;
use crate::error::Result;
use crate::glyph::GlyphRenderer;
use std::sync::Arc;

/// Character emitted when no glyph in the set is usable.
pub const FALLBACK_CHAR: char = ' ';

/// Matching state owned by a single worker.
pub struct WorkerContext {
    charset: Arc<CharacterSet>,
    engine: Engine,
    renderer: GlyphRenderer,
}

impl WorkerContext {
    pub fn new(charset: Arc<CharacterSet>, engine: Engine, renderer: GlyphRenderer) -> Self {
        Self {
            charset,
            engine,
            renderer,
        }
    }

    pub fn engine(&self) -> Engine {
        self.engine
    }

    pub fn charset(&self) -> &CharacterSet {
        &self.charset
    }

    pub fn renderer(&self) -> &GlyphRenderer {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut GlyphRenderer {
        &mut self.renderer
    }

    /// Character whose glyph scores highest against `block`.
    ///
    /// Scans the whole set; on equal scores the earlier character wins.
    /// Characters without a glyph are skipped, and [`FALLBACK_CHAR`] is
    /// returned when none has one.
    pub fn best_match(&mut self, block: &PixelBlock) -> Result<char> {
        if let Some(only) = self.charset.single() {
            return Ok(only);
        }

        let (width, height) = block.shape();
        let mut best: Option<(char, f64)> = None;
        for ch in self.charset.iter() {
            let Some(glyph) = self.renderer.glyph(ch, width, height)? else {
                continue;
            };
            let score = self.engine.similarity(block, &glyph);
            match best {
                Some((_, best_score)) if score <= best_score => {}
                _ => best = Some((ch, score)),
            }
        }
        Ok(best.map_or(FALLBACK_CHAR, |(ch, _)| ch))
    }
}
