// this_file: src/glyph.rs

//! Cell-sized glyph bitmaps with a per-renderer memo.
//!
//! A renderer asks its [`GlyphSource`] for the natural-size bitmap of a
//! character once, crops it to ink and then resizes it to every cell shape
//! requested. Results, including "no glyph", are cached for the lifetime of
//! the renderer. Renderers are not shared between threads: each worker owns
//! one and may be seeded from a pre-rendered one.

use crate::artifacts;
use crate::bitmap::Bitmap;
use crate::charset::CharacterSet;
use crate::error::Result;
use crate::rasterize::GlyphSource;
use camino::Utf8PathBuf;
use log::{debug, warn};
use std::collections::HashMap;
use std::sync::Arc;

/// Immutable, shareable glyph bitmap.
pub type Glyph = Arc<Bitmap>;

type GlyphKey = (char, u32, u32);

/// Renders characters to exact cell shapes and memoizes the result.
pub struct GlyphRenderer {
    source: Arc<dyn GlyphSource>,
    /// Ink-cropped natural bitmaps per character
    natural: HashMap<char, Option<Glyph>>,
    sized: HashMap<GlyphKey, Option<Glyph>>,
    chars_dir: Option<Utf8PathBuf>,
    rendered: usize,
}

impl GlyphRenderer {
    pub fn new(source: Arc<dyn GlyphSource>) -> Self {
        Self {
            source,
            natural: HashMap::new(),
            sized: HashMap::new(),
            chars_dir: None,
            rendered: 0,
        }
    }

    /// Save each freshly rendered glyph as a PNG under `dir`.
    pub fn with_chars_dir(mut self, dir: Option<Utf8PathBuf>) -> Self {
        self.chars_dir = dir;
        self
    }

    /// Glyph for `ch` sized to exactly `width`×`height`.
    ///
    /// `Ok(None)` when the character has no ink.
    pub fn glyph(&mut self, ch: char, width: u32, height: u32) -> Result<Option<Glyph>> {
        let key = (ch, width, height);
        if let Some(cached) = self.sized.get(&key) {
            return Ok(cached.clone());
        }

        let glyph = match self.natural(ch)? {
            Some(natural) => Some(Arc::new(natural.resize_bilinear(width, height)?)),
            None => None,
        };
        self.rendered += 1;

        if let (Some(dir), Some(bitmap)) = (&self.chars_dir, &glyph) {
            artifacts::save_png(dir, &artifacts::char_file_name(ch, width, height), bitmap)?;
        }

        self.sized.insert(key, glyph.clone());
        Ok(glyph)
    }

    fn natural(&mut self, ch: char) -> Result<Option<Glyph>> {
        if let Some(cached) = self.natural.get(&ch) {
            return Ok(cached.clone());
        }
        let cropped = match self.source.rasterize(ch)? {
            Some(bitmap) => {
                let cropped = bitmap.crop_to_ink();
                if cropped.is_none() {
                    warn!("{:?} rendered without ink; it will never be chosen", ch);
                }
                cropped.map(Arc::new)
            }
            None => {
                debug!("{:?} has an empty outline", ch);
                None
            }
        };
        self.natural.insert(ch, cropped.clone());
        Ok(cropped)
    }

    /// Render every character of `charset` at every shape in `shapes`.
    ///
    /// Returns the number of (character, shape) pairs now cached.
    pub fn prerender<I>(&mut self, charset: &CharacterSet, shapes: I) -> Result<usize>
    where
        I: IntoIterator<Item = (u32, u32)>,
    {
        let shapes: Vec<(u32, u32)> = shapes.into_iter().collect();
        let total = charset.len() * shapes.len();
        let step = (total / 10).max(1);
        let mut done = 0usize;

        for &(width, height) in &shapes {
            for ch in charset.iter() {
                self.glyph(ch, width, height)?;
                done += 1;
                if done % step == 0 || done == total {
                    debug!("Pre-rendered {}/{} glyphs", done, total);
                }
            }
        }
        Ok(done)
    }

    /// Copy every glyph already rendered by `other`.
    pub fn seed_from(&mut self, other: &GlyphRenderer) {
        for (ch, glyph) in &other.natural {
            self.natural.entry(*ch).or_insert_with(|| glyph.clone());
        }
        for (key, glyph) in &other.sized {
            self.sized.entry(*key).or_insert_with(|| glyph.clone());
        }
    }

    /// Number of sized entries in the memo (including "no glyph").
    pub fn len(&self) -> usize {
        self.sized.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sized.is_empty()
    }

    /// Sized glyphs produced by this renderer itself, not seeded.
    pub fn rendered(&self) -> usize {
        self.rendered
    }
}
