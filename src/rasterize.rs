// this_file: src/rasterize.rs
//! Character rasterization using skrifa and zeno

use crate::bitmap::Bitmap;
use crate::config::DEFAULT_GLYPH_PX;
use crate::error::{Error, Result};
use crate::fonts::FontFace;
use camino::Utf8PathBuf;
use dashmap::DashMap;
use log::{debug, warn};
use skrifa::instance::{LocationRef, Size};
use skrifa::outline::{DrawSettings, OutlinePen};
use skrifa::MetadataProvider;
use zeno::{Command, Mask, Transform};

/// Produces natural-size bitmaps of single characters.
///
/// `Ok(None)` means the character is covered but has no visible ink at this
/// size (empty or zero-area outline). `Err(UnsupportedCharacter)` means no
/// source can render it at all.
pub trait GlyphSource: Send + Sync {
    fn rasterize(&self, ch: char) -> Result<Option<Bitmap>>;
}

/// Glyph source backed by a fallback chain of font files.
#[derive(Debug)]
pub struct FontGlyphSource {
    faces: Vec<FontFace>,
    /// char -> index of the first face covering it
    coverage: DashMap<char, Option<usize>>,
    px: f32,
}

impl FontGlyphSource {
    /// Open every font in `paths`; the first is primary, the rest are fallbacks.
    pub fn open(paths: &[Utf8PathBuf], px: f32) -> Result<Self> {
        if paths.is_empty() {
            return Err(Error::InvalidConfig {
                reason: "at least one font is required".to_string(),
            });
        }
        let faces = paths
            .iter()
            .map(|path| FontFace::open(path))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::from_faces(faces, px))
    }

    pub fn from_faces(faces: Vec<FontFace>, px: f32) -> Self {
        let px = if px.is_finite() && px > 0.0 {
            px
        } else {
            DEFAULT_GLYPH_PX
        };
        Self {
            faces,
            coverage: DashMap::new(),
            px,
        }
    }

    pub fn px(&self) -> f32 {
        self.px
    }

    /// Index of the first face whose charmap covers `ch`.
    pub fn face_for(&self, ch: char) -> Option<usize> {
        if let Some(hit) = self.coverage.get(&ch) {
            return *hit.value();
        }
        let found = self.faces.iter().position(|face| face.covers(ch));
        if found.is_none() {
            debug!("No font covers {:?} (U+{:04X})", ch, ch as u32);
        }
        self.coverage.insert(ch, found);
        found
    }
}

impl GlyphSource for FontGlyphSource {
    fn rasterize(&self, ch: char) -> Result<Option<Bitmap>> {
        let face_idx = self
            .face_for(ch)
            .ok_or(Error::UnsupportedCharacter { ch })?;
        let face = &self.faces[face_idx];
        let glyph_id = face
            .glyph_id(ch)
            .ok_or(Error::UnsupportedCharacter { ch })?;

        let Some(glyph) = face.font_ref().outline_glyphs().get(glyph_id) else {
            warn!(
                "{:?} maps to glyph {} in {} but has no outline",
                ch,
                glyph_id.to_u32(),
                face.path()
            );
            return Ok(None);
        };

        let size = Size::new(self.px);

        let mut bounds_pen = BoundsPen::new();
        glyph
            .draw(
                DrawSettings::unhinted(size, LocationRef::default()),
                &mut bounds_pen,
            )
            .map_err(|e| Error::RasterizationFailed {
                ch,
                reason: format!("Failed to measure outline: {}", e),
            })?;
        let Some(bounds) = bounds_pen.bounds() else {
            return Ok(None);
        };

        let mut pen = ZenoPen::new();
        glyph
            .draw(DrawSettings::unhinted(size, LocationRef::default()), &mut pen)
            .map_err(|e| Error::RasterizationFailed {
                ch,
                reason: format!("Failed to extract outline: {}", e),
            })?;

        // Pixel box around the outline; y grows downwards after the flip.
        let left = bounds.x_min.floor();
        let top = bounds.y_max.ceil();
        let width = (bounds.x_max.ceil() - left).max(1.0) as u32;
        let height = (top - bounds.y_min.floor()).max(1.0) as u32;

        let commands = pen.build();
        let mut mask = Mask::new(&commands[..]);
        mask.size(width, height)
            .transform(Some(Transform::translation(-left, top)));
        let (alpha, placement) = mask.render();

        let mut canvas = vec![0u8; width as usize * height as usize];
        let row_start = placement.top.max(0) as u32;
        let col_start = placement.left.max(0) as u32;
        let row_end = (placement.top + placement.height as i32).clamp(0, height as i32) as u32;
        let col_end = (placement.left + placement.width as i32).clamp(0, width as i32) as u32;
        for py in row_start..row_end {
            for px in col_start..col_end {
                let mask_y = (py as i32 - placement.top) as u32;
                let mask_x = (px as i32 - placement.left) as u32;
                let mask_idx = (mask_y * placement.width + mask_x) as usize;
                if let Some(&a) = alpha.get(mask_idx) {
                    canvas[(py * width + px) as usize] = a;
                }
            }
        }

        Bitmap::new(width, height, canvas).map(Some)
    }
}

/// Outline extents in pixel units (y up).
#[derive(Debug, Clone, Copy, PartialEq)]
struct BoundingBox {
    x_min: f32,
    y_min: f32,
    x_max: f32,
    y_max: f32,
}

/// Pen for calculating bounding box
struct BoundsPen {
    min_x: f32,
    max_x: f32,
    min_y: f32,
    max_y: f32,
    has_points: bool,
}

impl BoundsPen {
    fn new() -> Self {
        Self {
            min_x: f32::INFINITY,
            max_x: f32::NEG_INFINITY,
            min_y: f32::INFINITY,
            max_y: f32::NEG_INFINITY,
            has_points: false,
        }
    }

    /// `None` for an empty outline or a box with zero area.
    fn bounds(&self) -> Option<BoundingBox> {
        if !self.has_points || self.min_x >= self.max_x || self.min_y >= self.max_y {
            return None;
        }
        Some(BoundingBox {
            x_min: self.min_x,
            y_min: self.min_y,
            x_max: self.max_x,
            y_max: self.max_y,
        })
    }

    fn update_bounds(&mut self, x: f32, y: f32) {
        self.min_x = self.min_x.min(x);
        self.max_x = self.max_x.max(x);
        self.min_y = self.min_y.min(y);
        self.max_y = self.max_y.max(y);
        self.has_points = true;
    }
}

impl OutlinePen for BoundsPen {
    fn move_to(&mut self, x: f32, y: f32) {
        self.update_bounds(x, y);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.update_bounds(x, y);
    }

    fn quad_to(&mut self, cx: f32, cy: f32, x: f32, y: f32) {
        self.update_bounds(cx, cy);
        self.update_bounds(x, y);
    }

    fn curve_to(&mut self, cx0: f32, cy0: f32, cx1: f32, cy1: f32, x: f32, y: f32) {
        self.update_bounds(cx0, cy0);
        self.update_bounds(cx1, cy1);
        self.update_bounds(x, y);
    }

    fn close(&mut self) {}
}

/// Adapter implementing skrifa's OutlinePen to build zeno paths
struct ZenoPen {
    commands: Vec<Command>,
}

impl ZenoPen {
    fn new() -> Self {
        Self {
            commands: Vec::new(),
        }
    }

    fn build(self) -> Vec<Command> {
        self.commands
    }
}

impl OutlinePen for ZenoPen {
    fn move_to(&mut self, x: f32, y: f32) {
        self.commands.push(Command::MoveTo([x, -y].into())); // Flip Y for graphics coordinates
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.commands.push(Command::LineTo([x, -y].into()));
    }

    fn quad_to(&mut self, cx: f32, cy: f32, x: f32, y: f32) {
        self.commands
            .push(Command::QuadTo([cx, -cy].into(), [x, -y].into()));
    }

    fn curve_to(&mut self, cx0: f32, cy0: f32, cx1: f32, cy1: f32, x: f32, y: f32) {
        self.commands.push(Command::CurveTo(
            [cx0, -cy0].into(),
            [cx1, -cy1].into(),
            [x, -y].into(),
        ));
    }

    fn close(&mut self) {
        self.commands.push(Command::Close);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_pen_tracks_extents() {
        let mut pen = BoundsPen::new();
        assert_eq!(pen.bounds(), None);

        pen.move_to(1.0, 2.0);
        pen.line_to(5.0, -3.0);
        pen.curve_to(0.5, 0.0, 2.0, 7.0, 3.0, 1.0);
        pen.close();
        assert_eq!(
            pen.bounds(),
            Some(BoundingBox {
                x_min: 0.5,
                y_min: -3.0,
                x_max: 5.0,
                y_max: 7.0
            })
        );
    }

    #[test]
    fn degenerate_outline_has_no_bounds() {
        let mut pen = BoundsPen::new();
        pen.move_to(2.0, 0.0);
        pen.line_to(2.0, 10.0);
        assert_eq!(pen.bounds(), None, "zero-width box");
    }

    #[test]
    fn zeno_pen_flips_y() {
        let mut pen = ZenoPen::new();
        pen.move_to(1.0, 2.0);
        pen.line_to(3.0, 4.0);
        pen.close();
        let commands = pen.build();
        assert_eq!(commands.len(), 3);
        assert!(matches!(commands[0], Command::MoveTo(p) if p.x == 1.0 && p.y == -2.0));
        assert!(matches!(commands[1], Command::LineTo(p) if p.x == 3.0 && p.y == -4.0));
        assert!(matches!(commands[2], Command::Close));
    }

    #[test]
    fn empty_chain_is_rejected() {
        let err = FontGlyphSource::open(&[], 20.0).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn chain_without_faces_reports_unsupported() {
        let source = FontGlyphSource::from_faces(Vec::new(), f32::NAN);
        assert_eq!(source.px(), DEFAULT_GLYPH_PX);
        let err = source.rasterize('A').unwrap_err();
        assert!(matches!(err, Error::UnsupportedCharacter { ch: 'A' }));
        // Negative coverage is memoized too.
        assert_eq!(source.face_for('A'), None);
    }
}
