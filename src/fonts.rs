// this_file: src/fonts.rs

//! Zero-copy font faces and default font discovery.
//!
//! Faces are memory-mapped once and parsed with read-fonts. Each face is
//! validated on open: the file must exist, be non-empty, stay under
//! [`MAX_FONT_SIZE`], carry a known sfnt signature and parse.

use crate::error::{Error, Result};
use camino::{Utf8Path, Utf8PathBuf};
use memmap2::Mmap;
use read_fonts::{types::GlyphId, FileRef, FontRef};
use skrifa::MetadataProvider;
use std::fs::File;
use std::io::ErrorKind;
use std::path::Path;
use std::sync::Arc;

/// Maximum font file size (50MB)
pub const MAX_FONT_SIZE: u64 = 50 * 1024 * 1024;

/// Monospace fonts tried, in order, when no font is given.
pub const DEFAULT_FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSansMono.ttf",
    "/usr/share/fonts/dejavu/DejaVuSansMono.ttf",
    "/usr/share/fonts/TTF/DejaVuSansMono.ttf",
    "/usr/share/fonts/dejavu-sans-mono-fonts/DejaVuSansMono.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationMono-Regular.ttf",
    "/usr/share/fonts/liberation-mono/LiberationMono-Regular.ttf",
    "/usr/share/fonts/truetype/ubuntu/UbuntuMono-R.ttf",
    "/usr/share/fonts/noto/NotoSansMono-Regular.ttf",
    "/usr/share/fonts/truetype/noto/NotoSansMono-Regular.ttf",
    "/System/Library/Fonts/Menlo.ttc",
    "/System/Library/Fonts/Monaco.ttf",
    "/Library/Fonts/Courier New.ttf",
    "C:\\Windows\\Fonts\\consola.ttf",
    "C:\\Windows\\Fonts\\cour.ttf",
];

/// Existing paths from [`DEFAULT_FONT_CANDIDATES`].
pub fn default_font_paths() -> Vec<Utf8PathBuf> {
    DEFAULT_FONT_CANDIDATES
        .iter()
        .map(Utf8PathBuf::from)
        .filter(|path| path.is_file())
        .collect()
}

/// Font file kinds recognised by their first four bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontKind {
    TrueType,
    OpenType,
    Collection,
    Woff,
    Woff2,
}

impl FontKind {
    pub fn detect(data: &[u8]) -> Option<Self> {
        match data.get(0..4)? {
            b"\x00\x01\x00\x00" | b"true" => Some(FontKind::TrueType),
            b"OTTO" => Some(FontKind::OpenType),
            b"ttcf" => Some(FontKind::Collection),
            b"wOFF" => Some(FontKind::Woff),
            b"wOF2" => Some(FontKind::Woff2),
            _ => None,
        }
    }
}

/// One memory-mapped font face.
pub struct FontFace {
    path: Utf8PathBuf,
    /// Zero-copy view into `_mmap`; must be declared before it.
    font_ref: FontRef<'static>,
    _mmap: Arc<Mmap>,
}

impl std::fmt::Debug for FontFace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontFace")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl FontFace {
    /// Map and parse the font at `path` (first face of a collection).
    pub fn open(path: &Utf8Path) -> Result<Self> {
        let std_path = path.as_std_path();
        let file = File::open(std_path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => Error::FontNotFound {
                path: std_path.to_path_buf(),
            },
            _ => Error::Mmap {
                path: std_path.to_path_buf(),
                source: e,
            },
        })?;

        // Pre-check file size against limit
        let meta = file.metadata().map_err(|e| Error::Mmap {
            path: std_path.to_path_buf(),
            source: e,
        })?;
        if meta.len() == 0 {
            return Err(invalid(std_path, "font file is empty".to_string()));
        }
        if meta.len() > MAX_FONT_SIZE {
            return Err(invalid(
                std_path,
                format!(
                    "font file is {} bytes, limit is {} bytes",
                    meta.len(),
                    MAX_FONT_SIZE
                ),
            ));
        }

        // SAFETY: the mapping is read-only and kept alive by `_mmap` for as
        // long as `font_ref` exists.
        let mmap = unsafe {
            Mmap::map(&file).map_err(|e| Error::Mmap {
                path: std_path.to_path_buf(),
                source: e,
            })?
        };
        let mmap = Arc::new(mmap);

        let kind = FontKind::detect(&mmap)
            .ok_or_else(|| invalid(std_path, "unrecognised font signature".to_string()))?;

        let font_data: &'static [u8] =
            unsafe { std::slice::from_raw_parts(mmap.as_ptr(), mmap.len()) };

        let file_ref = FileRef::new(font_data)
            .map_err(|e| invalid(std_path, format!("Failed to parse font file: {}", e)))?;

        let font_ref = match file_ref {
            FileRef::Font(f) => f,
            FileRef::Collection(c) => c.get(0).map_err(|e| {
                invalid(std_path, format!("Failed to get font from collection: {}", e))
            })?,
        };

        log::debug!("Mapped font {} ({:?}, {} bytes)", path, kind, meta.len());

        Ok(Self {
            path: path.to_path_buf(),
            font_ref,
            _mmap: mmap,
        })
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    pub fn font_ref(&self) -> &FontRef<'static> {
        &self.font_ref
    }

    /// Glyph mapped to `ch` by the charmap, if any (glyph 0 means missing).
    pub fn glyph_id(&self, ch: char) -> Option<GlyphId> {
        self.font_ref
            .charmap()
            .map(ch)
            .filter(|gid| gid.to_u32() != 0)
    }

    pub fn covers(&self, ch: char) -> bool {
        self.glyph_id(ch).is_some()
    }
}

fn invalid(path: &Path, reason: String) -> Error {
    Error::InvalidFont {
        path: path.to_path_buf(),
        reason,
    }
}
