// this_file: src/bitmap.rs

//! Grayscale bitmaps shared by blocks and glyphs.
//!
//! A [`Bitmap`] is a row-major 8-bit plane with explicit dimensions. Image
//! blocks and rendered glyphs use the same type so similarity engines can
//! compare them directly, and so a block can serve as its own cache key
//! (dimensions plus exact bytes).

use crate::error::{Error, Result};

/// Row-major grayscale plane (0 = black, 255 = white).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Bitmap {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

/// Image blocks are plain bitmaps; equality is exact content equality.
pub type PixelBlock = Bitmap;

impl Bitmap {
    /// Create a new bitmap, validating dimensions and buffer size.
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidDimensions {
                width,
                height,
                reason: "bitmap dimensions must be non-zero".to_string(),
            });
        }
        let expected = (width as usize) * (height as usize);
        if pixels.len() != expected {
            return Err(Error::Internal(format!(
                "Pixel data size mismatch: expected {} bytes, got {}",
                expected,
                pixels.len()
            )));
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Bitmap filled with a single value.
    pub fn filled(width: u32, height: u32, value: u8) -> Result<Self> {
        Self::new(width, height, vec![value; width as usize * height as usize])
    }

    /// Access raw pixels.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// (width, height) pair.
    pub fn shape(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Total number of pixels.
    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    /// Return true when every pixel is zero (blank render).
    pub fn is_blank(&self) -> bool {
        self.pixels.iter().all(|&px| px == 0)
    }

    /// Copy a rectangle out of a row-major plane of `plane_width` columns.
    pub fn from_region(
        plane: &[u8],
        plane_width: u32,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    ) -> Result<Self> {
        let mut pixels = Vec::with_capacity(width as usize * height as usize);
        for row in y..y + height {
            let start = (row * plane_width + x) as usize;
            let end = start + width as usize;
            let slice = plane.get(start..end).ok_or_else(|| {
                Error::Internal(format!(
                    "Region {}x{}+{}+{} exceeds plane of width {}",
                    width, height, x, y, plane_width
                ))
            })?;
            pixels.extend_from_slice(slice);
        }
        Self::new(width, height, pixels)
    }

    /// Tight bounding box of non-zero pixels as (x, y, w, h).
    ///
    /// Returns `None` when the bitmap is blank.
    pub fn ink_bbox(&self) -> Option<(u32, u32, u32, u32)> {
        let mut min_x = self.width;
        let mut min_y = self.height;
        let mut max_x = 0u32;
        let mut max_y = 0u32;

        for y in 0..self.height {
            for x in 0..self.width {
                let idx = (y * self.width + x) as usize;
                if self.pixels[idx] > 0 {
                    min_x = min_x.min(x);
                    min_y = min_y.min(y);
                    max_x = max_x.max(x);
                    max_y = max_y.max(y);
                }
            }
        }

        if min_x > max_x {
            return None;
        }

        Some((min_x, min_y, max_x - min_x + 1, max_y - min_y + 1))
    }

    /// Crop away all-zero margins. `None` for a blank bitmap.
    pub fn crop_to_ink(&self) -> Option<Self> {
        let (x, y, w, h) = self.ink_bbox()?;
        if (x, y, w, h) == (0, 0, self.width, self.height) {
            return Some(self.clone());
        }
        Self::from_region(&self.pixels, self.width, x, y, w, h).ok()
    }

    /// Resize to exactly `new_width`×`new_height` with bilinear interpolation.
    ///
    /// Sample positions are pixel-centre aligned so that resizing to the same
    /// size is the identity and a constant bitmap stays constant.
    pub fn resize_bilinear(&self, new_width: u32, new_height: u32) -> Result<Self> {
        if new_width == 0 || new_height == 0 {
            return Err(Error::InvalidDimensions {
                width: new_width,
                height: new_height,
                reason: "resize target must be non-zero".to_string(),
            });
        }

        // Fast path: no scaling
        if (new_width, new_height) == (self.width, self.height) {
            return Ok(self.clone());
        }

        let (width, height) = (self.width, self.height);
        let mut output = vec![0u8; new_width as usize * new_height as usize];

        let x_ratio = width as f32 / new_width as f32;
        let y_ratio = height as f32 / new_height as f32;
        let max_x = (width - 1) as f32;
        let max_y = (height - 1) as f32;

        for y in 0..new_height {
            let src_y = ((y as f32 + 0.5) * y_ratio - 0.5).clamp(0.0, max_y);
            let y0 = src_y.floor() as u32;
            let y1 = (y0 + 1).min(height - 1);
            let dy = src_y - y0 as f32;

            for x in 0..new_width {
                // Map output pixel to input coordinates
                let src_x = ((x as f32 + 0.5) * x_ratio - 0.5).clamp(0.0, max_x);
                let x0 = src_x.floor() as u32;
                let x1 = (x0 + 1).min(width - 1);
                let dx = src_x - x0 as f32;

                let p00 = self.pixels[(y0 * width + x0) as usize] as f32;
                let p01 = self.pixels[(y0 * width + x1) as usize] as f32;
                let p10 = self.pixels[(y1 * width + x0) as usize] as f32;
                let p11 = self.pixels[(y1 * width + x1) as usize] as f32;

                let top = p00 * (1.0 - dx) + p01 * dx;
                let bottom = p10 * (1.0 - dx) + p11 * dx;
                let value = top * (1.0 - dy) + bottom * dy;

                output[(y * new_width + x) as usize] = value.round().clamp(0.0, 255.0) as u8;
            }
        }

        Self::new(new_width, new_height, output)
    }
}
