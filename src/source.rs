// this_file: src/source.rs

//! Decoded frames from still images and animated GIFs.

use crate::error::{Error, Result};
use image::codecs::gif::GifDecoder;
use image::{AnimationDecoder, DynamicImage, ImageFormat, ImageReader};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Duration;

/// `0.299 R + 0.587 G + 0.114 B`, rounded.
fn rec601_luma([r, g, b]: [u8; 3]) -> u8 {
    ((r as u32 * 19_595 + g as u32 * 38_470 + b as u32 * 7_471 + 0x8000) >> 16) as u8
}

/// Display time used when a GIF frame declares a zero delay.
pub const DEFAULT_FRAME_DELAY: Duration = Duration::from_millis(100);

/// One decoded frame: a grayscale plane plus optional interleaved RGB.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    width: u32,
    height: u32,
    luma: Vec<u8>,
    rgb: Option<Vec<u8>>,
    delay: Duration,
}

impl Frame {
    /// Grayscale frame from raw row-major bytes.
    pub fn from_luma(width: u32, height: u32, luma: Vec<u8>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidDimensions {
                width,
                height,
                reason: "frame must have non-zero width and height".to_string(),
            });
        }
        if luma.len() != width as usize * height as usize {
            return Err(Error::Internal(format!(
                "Frame data size mismatch: expected {} bytes, got {}",
                width as usize * height as usize,
                luma.len()
            )));
        }
        Ok(Self {
            width,
            height,
            luma,
            rgb: None,
            delay: Duration::ZERO,
        })
    }

    /// Convert a decoded image, keeping its colour plane when `keep_rgb` is set.
    ///
    /// Grayscale uses ITU-R 601 weights in 16-bit fixed point.
    pub fn from_image(image: &DynamicImage, keep_rgb: bool) -> Result<Self> {
        let rgb = image.to_rgb8();
        let (width, height) = rgb.dimensions();
        let luma = rgb.pixels().map(|p| rec601_luma(p.0)).collect();
        let mut frame = Self::from_luma(width, height, luma)?;
        if keep_rgb {
            frame.rgb = Some(rgb.into_raw());
        }
        Ok(frame)
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn luma(&self) -> &[u8] {
        &self.luma
    }

    pub fn rgb(&self) -> Option<&[u8]> {
        self.rgb.as_deref()
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

/// Decode every frame of the image at `path`.
///
/// GIFs yield one frame per animation frame; other formats yield one.
pub fn load_frames(path: &Path, keep_rgb: bool) -> Result<Vec<Frame>> {
    let reader = ImageReader::open(path)?.with_guessed_format()?;

    if reader.format() == Some(ImageFormat::Gif) {
        let decoder = GifDecoder::new(BufReader::new(File::open(path)?))?;
        let frames = decoder.into_frames().collect_frames()?;
        if frames.is_empty() {
            return Err(Error::InvalidDimensions {
                width: 0,
                height: 0,
                reason: format!("{} contains no frames", path.display()),
            });
        }
        log::debug!("Decoded {} GIF frame(s) from {}", frames.len(), path.display());
        return frames
            .into_iter()
            .map(|frame| {
                let (numer, denom) = frame.delay().numer_denom_ms();
                let delay = frame_delay(numer, denom);
                let image = DynamicImage::ImageRgba8(frame.into_buffer());
                Frame::from_image(&image, keep_rgb).map(|f| f.with_delay(delay))
            })
            .collect();
    }

    let image = reader.decode()?;
    Ok(vec![Frame::from_image(&image, keep_rgb)?])
}

/// Delay of `numer / denom` milliseconds, with zero mapped to the default.
pub fn frame_delay(numer: u32, denom: u32) -> Duration {
    let ms = if denom == 0 { 0 } else { numer / denom };
    if ms == 0 {
        DEFAULT_FRAME_DELAY
    } else {
        Duration::from_millis(ms as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::codecs::gif::GifEncoder;
    use image::{Delay, GrayImage, Luma, Rgba, RgbaImage};
    use tempfile::TempDir;

    #[test]
    fn zero_delay_becomes_default() {
        assert_eq!(frame_delay(0, 1), DEFAULT_FRAME_DELAY);
        assert_eq!(frame_delay(5, 0), DEFAULT_FRAME_DELAY);
        assert_eq!(frame_delay(40, 1), Duration::from_millis(40));
        assert_eq!(frame_delay(250, 2), Duration::from_millis(125));
    }

    #[test]
    fn rejects_mismatched_planes() {
        assert!(Frame::from_luma(0, 4, vec![]).is_err());
        assert!(Frame::from_luma(2, 2, vec![0; 3]).is_err());
    }

    #[test]
    fn colour_luma_uses_601_weights() {
        let image = DynamicImage::ImageRgb8(image::RgbImage::from_fn(4, 1, |x, _| {
            [
                image::Rgb([255, 0, 0]),
                image::Rgb([0, 255, 0]),
                image::Rgb([0, 0, 255]),
                image::Rgb([255, 255, 255]),
            ][x as usize]
        }));
        let frame = Frame::from_image(&image, true).unwrap();
        assert_eq!(frame.luma(), &[76, 150, 29, 255]);
        assert_eq!(&frame.rgb().unwrap()[..3], &[255, 0, 0]);
    }

    #[test]
    fn loads_still_png() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("still.png");
        GrayImage::from_pixel(6, 4, Luma([200])).save(&path).unwrap();

        let frames = load_frames(&path, true).unwrap();
        assert_eq!(frames.len(), 1);
        let frame = &frames[0];
        assert_eq!((frame.width(), frame.height()), (6, 4));
        assert!(frame.luma().iter().all(|&p| p == 200));
        assert_eq!(frame.rgb().unwrap().len(), 6 * 4 * 3);
    }

    #[test]
    fn loads_animated_gif_frames() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("anim.gif");
        {
            let file = File::create(&path).unwrap();
            let mut encoder = GifEncoder::new(file);
            let frames = vec![
                image::Frame::from_parts(
                    RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 255])),
                    0,
                    0,
                    Delay::from_numer_denom_ms(0, 1),
                ),
                image::Frame::from_parts(
                    RgbaImage::from_pixel(4, 4, Rgba([255, 255, 255, 255])),
                    0,
                    0,
                    Delay::from_numer_denom_ms(50, 1),
                ),
            ];
            encoder.encode_frames(frames).unwrap();
        }

        let frames = load_frames(&path, false).unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].delay(), DEFAULT_FRAME_DELAY);
        assert_eq!(frames[1].delay(), Duration::from_millis(50));
        assert!(frames[0].rgb().is_none());
        assert!(frames[0].luma().iter().all(|&p| p < 10));
        assert!(frames[1].luma().iter().all(|&p| p > 245));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_frames(Path::new("/nonexistent/image.png"), false).unwrap_err();
        assert!(matches!(err, Error::Io(_)), "{err}");
    }
}
