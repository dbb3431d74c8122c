// this_file: src/engine.rs

//! Similarity engines scoring a glyph against an image block.
//!
//! Every engine is a pure function of two equal-shape grayscale planes and
//! returns a similarity in `[0, 1]`, where 1 means identical. Degenerate
//! inputs (zero variance, zero norm, windows larger than the block) resolve
//! to a defined value through explicit branches; clamping to `[0, 1]` is the
//! last step.

use crate::bitmap::Bitmap;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Largest window used by the structural-similarity engine.
pub const SSIM_MAX_WINDOW: u32 = 7;

/// Blocks at or below this size cannot be scored with SSIM.
pub const SSIM_MIN_BLOCK: u32 = 7;

const SSIM_K1: f64 = 0.01;
const SSIM_K2: f64 = 0.03;
const DATA_RANGE: f64 = 255.0;
const HIST_BINS: usize = 256;

/// Available similarity metrics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Engine {
    Brightness,
    #[default]
    Diff,
    Mse,
    Ncc,
    Hist,
    Cosine,
    Ssim,
}

impl Engine {
    /// Every engine, in documentation order.
    pub const ALL: [Engine; 7] = [
        Engine::Brightness,
        Engine::Ssim,
        Engine::Diff,
        Engine::Mse,
        Engine::Ncc,
        Engine::Hist,
        Engine::Cosine,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Engine::Brightness => "brightness",
            Engine::Diff => "diff",
            Engine::Mse => "mse",
            Engine::Ncc => "ncc",
            Engine::Hist => "hist",
            Engine::Cosine => "cosine",
            Engine::Ssim => "ssim",
        }
    }

    /// Score `glyph` against `block`; both must have the same shape.
    pub fn similarity(self, block: &Bitmap, glyph: &Bitmap) -> f64 {
        debug_assert_eq!(block.shape(), glyph.shape(), "engine inputs must share a shape");
        if block.shape() != glyph.shape() {
            return 0.0;
        }
        let a = block.pixels();
        let b = glyph.pixels();
        let raw = match self {
            Engine::Brightness => brightness(a, b),
            Engine::Diff => diff(a, b),
            Engine::Mse => mse(a, b),
            Engine::Ncc => ncc(a, b),
            Engine::Hist => hist_intersection(a, b),
            Engine::Cosine => cosine(a, b),
            Engine::Ssim => ssim(a, b, block.width() as usize, block.height() as usize),
        };
        raw.clamp(0.0, 1.0)
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Engine {
    type Err = Error;

    fn from_str(name: &str) -> Result<Self> {
        let wanted = name.trim().to_ascii_lowercase();
        Engine::ALL
            .into_iter()
            .find(|engine| engine.name() == wanted)
            .ok_or_else(|| Error::UnknownEngine {
                name: name.to_string(),
                expected: Engine::ALL
                    .iter()
                    .map(|e| e.name())
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }
}

fn mean(data: &[u8]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    data.iter().map(|&v| v as f64).sum::<f64>() / data.len() as f64
}

fn brightness(a: &[u8], b: &[u8]) -> f64 {
    1.0 - (mean(a) - mean(b)).abs() / DATA_RANGE
}

fn diff(a: &[u8], b: &[u8]) -> f64 {
    if a.is_empty() {
        return 1.0;
    }
    let total: u64 = a
        .iter()
        .zip(b)
        .map(|(&x, &y)| x.abs_diff(y) as u64)
        .sum();
    1.0 - total as f64 / (a.len() as f64 * DATA_RANGE)
}

fn mse(a: &[u8], b: &[u8]) -> f64 {
    if a.is_empty() {
        return 1.0;
    }
    let total: u64 = a
        .iter()
        .zip(b)
        .map(|(&x, &y)| {
            let d = x.abs_diff(y) as u64;
            d * d
        })
        .sum();
    1.0 - (total as f64 / a.len() as f64) / (DATA_RANGE * DATA_RANGE)
}

/// Population mean and standard deviation.
fn mean_std(data: &[u8]) -> (f64, f64) {
    let mu = mean(data);
    let var = data
        .iter()
        .map(|&v| {
            let d = v as f64 - mu;
            d * d
        })
        .sum::<f64>()
        / data.len().max(1) as f64;
    (mu, var.sqrt())
}

fn ncc(a: &[u8], b: &[u8]) -> f64 {
    let (mean_a, std_a) = mean_std(a);
    let (mean_b, std_b) = mean_std(b);

    match (std_a == 0.0, std_b == 0.0) {
        (true, true) => {
            if mean_a == mean_b {
                1.0
            } else {
                0.0
            }
        }
        (true, false) | (false, true) => 0.0,
        (false, false) => {
            let corr = a
                .iter()
                .zip(b)
                .map(|(&x, &y)| ((x as f64 - mean_a) / std_a) * ((y as f64 - mean_b) / std_b))
                .sum::<f64>()
                / a.len() as f64;
            (corr + 1.0) / 2.0
        }
    }
}

/// Density histogram over `[0, 255]` with 256 equal bins.
fn density_histogram(data: &[u8]) -> [f64; HIST_BINS] {
    let mut counts = [0u32; HIST_BINS];
    let scale = HIST_BINS as f64 / DATA_RANGE;
    for &v in data {
        let bin = ((v as f64 * scale) as usize).min(HIST_BINS - 1);
        counts[bin] += 1;
    }
    let bin_width = DATA_RANGE / HIST_BINS as f64;
    let norm = data.len().max(1) as f64 * bin_width;
    let mut density = [0.0f64; HIST_BINS];
    for (d, &c) in density.iter_mut().zip(counts.iter()) {
        *d = c as f64 / norm;
    }
    density
}

fn hist_intersection(a: &[u8], b: &[u8]) -> f64 {
    let ha = density_histogram(a);
    let hb = density_histogram(b);
    ha.iter().zip(hb.iter()).map(|(x, y)| x.min(*y)).sum()
}

fn cosine(a: &[u8], b: &[u8]) -> f64 {
    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (&x, &y) in a.iter().zip(b) {
        let (x, y) = (x as f64, y as f64);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    let (norm_a, norm_b) = (norm_a.sqrt(), norm_b.sqrt());

    match (norm_a == 0.0, norm_b == 0.0) {
        (true, true) => 1.0,
        (true, false) | (false, true) => 0.0,
        (false, false) => (dot / (norm_a * norm_b) + 1.0) / 2.0,
    }
}

/// Window used for a block whose shorter side is `min_side`.
pub fn ssim_window(min_side: u32) -> u32 {
    let mut win = min_side.min(SSIM_MAX_WINDOW);
    if win % 2 == 0 {
        win = win.saturating_sub(1);
    }
    win.max(3)
}

/// Mean structural similarity over every window fully inside the plane.
fn ssim(a: &[u8], b: &[u8], width: usize, height: usize) -> f64 {
    let win = ssim_window(width.min(height) as u32) as usize;
    if win > width || win > height {
        return 0.0;
    }

    let np = (win * win) as f64;
    let cov_norm = np / (np - 1.0);
    let c1 = (SSIM_K1 * DATA_RANGE).powi(2);
    let c2 = (SSIM_K2 * DATA_RANGE).powi(2);

    let mut total = 0.0f64;
    let mut windows = 0usize;
    for top in 0..=height - win {
        for left in 0..=width - win {
            let (mut sx, mut sy, mut sxx, mut syy, mut sxy) = (0.0, 0.0, 0.0, 0.0, 0.0);
            for y in top..top + win {
                let row = y * width;
                for x in left..left + win {
                    let px = a[row + x] as f64;
                    let py = b[row + x] as f64;
                    sx += px;
                    sy += py;
                    sxx += px * px;
                    syy += py * py;
                    sxy += px * py;
                }
            }
            let ux = sx / np;
            let uy = sy / np;
            let vx = cov_norm * (sxx / np - ux * ux);
            let vy = cov_norm * (syy / np - uy * uy);
            let vxy = cov_norm * (sxy / np - ux * uy);

            let numerator = (2.0 * ux * uy + c1) * (2.0 * vxy + c2);
            let denominator = (ux * ux + uy * uy + c1) * (vx + vy + c2);
            total += numerator / denominator;
            windows += 1;
        }
    }

    if windows == 0 {
        return 0.0;
    }
    let score = total / windows as f64;
    if score.is_finite() {
        score.max(0.0)
    } else {
        0.0
    }
}
