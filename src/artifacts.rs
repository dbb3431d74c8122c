// this_file: src/artifacts.rs
//! PNG dumps of rendered glyphs and image blocks for debugging

use crate::bitmap::Bitmap;
use crate::error::{Error, Result};
use camino::{Utf8Path, Utf8PathBuf};
use image::GrayImage;
use std::fs;

/// File name for a glyph of `ch` rendered at `width`×`height`.
pub fn char_file_name(ch: char, width: u32, height: u32) -> String {
    format!("{}_{}x{}.png", ch as u32, width, height)
}

/// File name for block `index` of frame `frame`.
pub fn block_file_name(frame: usize, index: usize) -> String {
    format!("f{:04}_b{:05}.png", frame, index)
}

/// Write `bitmap` as an 8-bit grayscale PNG at `dir/name`, creating `dir`.
pub fn save_png(dir: &Utf8Path, name: &str, bitmap: &Bitmap) -> Result<Utf8PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(name);
    let image = GrayImage::from_raw(bitmap.width(), bitmap.height(), bitmap.pixels().to_vec())
        .ok_or_else(|| {
            Error::Internal(format!(
                "bitmap buffer does not match {}x{}",
                bitmap.width(),
                bitmap.height()
            ))
        })?;
    image.save(path.as_std_path())?;
    log::trace!("Wrote {}", path);
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn file_names() {
        assert_eq!(char_file_name('A', 5, 10), "65_5x10.png");
        assert_eq!(block_file_name(3, 42), "f0003_b00042.png");
    }

    #[test]
    fn writes_readable_png() {
        let tmp = TempDir::new().unwrap();
        let dir = Utf8PathBuf::from_path_buf(tmp.path().join("chars")).unwrap();
        let bitmap = Bitmap::new(3, 2, vec![0, 50, 100, 150, 200, 250]).unwrap();

        let path = save_png(&dir, "x.png", &bitmap).unwrap();
        let loaded = image::open(path.as_std_path()).unwrap().to_luma8();
        assert_eq!(loaded.dimensions(), (3, 2));
        assert_eq!(loaded.into_raw(), bitmap.pixels());
    }
}
