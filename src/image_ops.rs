// this_file: src/image_ops.rs
//! Frame preprocessing: inversion, contrast stretch and per-cell colour.

use crate::grid::CellRect;

/// Invert a grayscale plane in place (`v -> 255 - v`).
pub fn invert(plane: &mut [u8]) {
    for px in plane.iter_mut() {
        *px = 255 - *px;
    }
}

/// Stretch intensities so the darkest pixel becomes 0 and the brightest 255.
///
/// A flat plane is left unchanged.
pub fn autocontrast(plane: &mut [u8]) {
    let Some((&lo, &hi)) = plane.iter().min().zip(plane.iter().max()) else {
        return;
    };
    if hi <= lo {
        return;
    }

    let span = (hi - lo) as u32;
    let mut lut = [0u8; 256];
    for (i, slot) in lut.iter_mut().enumerate() {
        let shifted = (i as u32).saturating_sub(lo as u32);
        *slot = (shifted * 255 / span).min(255) as u8;
    }
    for px in plane.iter_mut() {
        *px = lut[*px as usize];
    }
}

/// Mean colour of `rect` in an interleaved RGB plane `plane_width` pixels wide.
pub fn mean_rgb(rgb: &[u8], plane_width: u32, rect: CellRect) -> [u8; 3] {
    let mut sums = [0u64; 3];
    let mut count = 0u64;
    for y in rect.y..rect.y + rect.height {
        let row = (y as usize * plane_width as usize + rect.x as usize) * 3;
        let Some(span) = rgb.get(row..row + rect.width as usize * 3) else {
            continue;
        };
        for px in span.chunks_exact(3) {
            sums[0] += px[0] as u64;
            sums[1] += px[1] as u64;
            sums[2] += px[2] as u64;
            count += 1;
        }
    }
    if count == 0 {
        return [0, 0, 0];
    }
    [
        (sums[0] / count) as u8,
        (sums[1] / count) as u8,
        (sums[2] / count) as u8,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invert_is_an_involution() {
        let mut plane = vec![0, 1, 128, 254, 255];
        invert(&mut plane);
        assert_eq!(plane, vec![255, 254, 127, 1, 0]);
        invert(&mut plane);
        assert_eq!(plane, vec![0, 1, 128, 254, 255]);
    }

    #[test]
    fn autocontrast_stretches_range() {
        let mut plane = vec![50, 100, 150];
        autocontrast(&mut plane);
        assert_eq!(plane, vec![0, 127, 255]);
    }

    #[test]
    fn autocontrast_leaves_flat_planes() {
        let mut plane = vec![42; 9];
        autocontrast(&mut plane);
        assert_eq!(plane, vec![42; 9]);

        let mut empty: Vec<u8> = Vec::new();
        autocontrast(&mut empty);
        assert!(empty.is_empty());
    }

    #[test]
    fn mean_rgb_of_cell() {
        // 2x2 image: red, green / blue, white
        let rgb = vec![255, 0, 0, 0, 255, 0, 0, 0, 255, 255, 255, 255];
        let all = CellRect {
            x: 0,
            y: 0,
            width: 2,
            height: 2,
        };
        assert_eq!(mean_rgb(&rgb, 2, all), [127, 127, 127]);

        let right_column = CellRect {
            x: 1,
            y: 0,
            width: 1,
            height: 2,
        };
        assert_eq!(mean_rgb(&rgb, 2, right_column), [127, 255, 127]);
    }
}
