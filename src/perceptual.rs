//! Hand-rolled DCT perceptual hash.
//!
//! An average hash computed in the frequency domain:
//!
//! 1. Resample the whole frame to a 32×32 sample (4× the hash side).
//! 2. Convert to integer luminance, `floor(0.299 R + 0.587 G + 0.114 B)`.
//! 3. Orthonormal 1-D DCT-II over every row, then over every column of the
//!    row result.
//! 4. Keep the 8×8 lowest frequencies (64 coefficients) and average all of
//!    them except the DC term.
//! 5. One bit per coefficient, set when it is above that average, packed
//!    MSB first.
//!
//! Resizing and mild recompression barely move the low frequencies, so
//! near-duplicates land within a few bits of each other
//! ([`hamming_distance`]).

use crate::imaging::{BackendError, CropRegion, ImageBackend};
use image::{DynamicImage, RgbaImage};
use std::f64::consts::{FRAC_1_SQRT_2, PI};

/// Side of the coefficient block; the hash has `HASH_SIDE²` bits.
pub const HASH_SIDE: usize = 8;

/// Side of the luminance sample the DCT runs on.
pub const SAMPLE_SIDE: usize = HASH_SIDE * 4;

/// Hash a decoded image. Sampling goes through `backend` so it shares the
/// resampler used for conversions.
pub fn dct_hash(backend: &dyn ImageBackend, image: &DynamicImage) -> Result<[u8; 8], BackendError> {
    let side = SAMPLE_SIDE as u32;
    let sample = backend.resample(
        image,
        CropRegion::full(image.width(), image.height()),
        side,
        side,
    )?;
    Ok(hash_sample(&sample))
}

/// Hash a prepared `SAMPLE_SIDE × SAMPLE_SIDE` sample.
pub fn hash_sample(sample: &RgbaImage) -> [u8; 8] {
    let n = SAMPLE_SIDE;
    let rows: Vec<Vec<f64>> = (0..n)
        .map(|y| {
            let row: Vec<f64> = (0..n).map(|x| luminance(sample, x, y)).collect();
            dct_1d(&row)
        })
        .collect();

    // matrix[u] is the column transform of horizontal frequency u.
    let matrix: Vec<Vec<f64>> = (0..n)
        .map(|u| {
            let col: Vec<f64> = rows.iter().map(|row| row[u]).collect();
            dct_1d(&col)
        })
        .collect();

    let coefficients: Vec<f64> = matrix[..HASH_SIDE]
        .iter()
        .flat_map(|col| col[..HASH_SIDE].iter().copied())
        .collect();
    let mean = coefficients[1..].iter().sum::<f64>() / (coefficients.len() - 1) as f64;

    let mut hash = [0u8; 8];
    for (k, coefficient) in coefficients.iter().enumerate() {
        if *coefficient > mean {
            hash[k / 8] |= 0x80 >> (k % 8);
        }
    }
    hash
}

fn luminance(sample: &RgbaImage, x: usize, y: usize) -> f64 {
    // Out-of-range samples read as black; callers always pass a full sample.
    let [r, g, b, _] = sample
        .get_pixel_checked(x as u32, y as u32)
        .map_or([0; 4], |p| p.0);
    (f64::from(r) * 0.299 + f64::from(g) * 0.587 + f64::from(b) * 0.114).floor()
}

/// Orthonormal DCT-II.
pub fn dct_1d(input: &[f64]) -> Vec<f64> {
    let n = input.len() as f64;
    let scale = (2.0 / n).sqrt();
    (0..input.len())
        .map(|i| {
            let sum: f64 = input
                .iter()
                .enumerate()
                .map(|(j, x)| x * (i as f64 * PI * (j as f64 + 0.5) / n).cos())
                .sum();
            let c = if i == 0 { FRAC_1_SQRT_2 } else { 1.0 };
            sum * scale * c
        })
        .collect()
}

/// Number of differing bits, or `None` when the hashes differ in length.
pub fn hamming_distance(a: &[u8], b: &[u8]) -> Option<u32> {
    (a.len() == b.len()).then(|| a.iter().zip(b).map(|(x, y)| (x ^ y).count_ones()).sum())
}
