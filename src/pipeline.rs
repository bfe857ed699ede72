//! Per-frame pixel transforms.
//!
//! Stages run in a fixed order on an RGBA buffer: transparency short-circuit,
//! color multiply, channel offset, grayscale, scanline glitch, alpha keying.
//! Each stage is skipped when its sampled parameters are absent. Reads past the
//! end of the buffer produce 0, nothing here fails.

use image::RgbaImage;

use crate::{random::RandomSource, sampler::SampledParameters};

pub fn process(
    frame: &mut RgbaImage,
    params: &SampledParameters,
    transparent: Option<u32>,
    rng: &mut impl RandomSource,
) {
    let width = frame.width() as usize;
    let height = frame.height() as usize;
    let pixels: &mut [u8] = frame;

    let untouched = short_circuit_mask(pixels);

    for (i, &skip) in untouched.iter().enumerate() {
        if skip {
            continue;
        }
        let p = i * 4;

        // Only the r coefficient is used, for all three channels.
        if let Some([c, _, _]) = params.color {
            for ch in 0..3 {
                pixels[p + ch] = store(pixels[p + ch] as f64 * c);
            }
        }

        if let Some(offset) = params.offset {
            for ch in 0..3 {
                pixels[p + ch] = match distance(offset[ch]) {
                    Some(d) => read_ahead(pixels, p + ch, d),
                    None => 0,
                };
            }
        }

        // Red is sampled twice, green never.
        if let Some([wr, wg, wb]) = params.grayscale {
            let r = pixels[p] as f64;
            let b = pixels[p + 2] as f64;
            let luminance = store(r * wr + r * wg + b * wb);
            pixels[p..p + 3].fill(luminance);
        }
    }

    if let Some(shifts) = params
        .glitches
        .and_then(|g| band_shifts(height, g.value, g.height, rng))
    {
        for (y, shift) in shifts.into_iter().enumerate() {
            for x in 0..width {
                let p = (y * width + x) * 4;
                for ch in 0..4 {
                    pixels[p + ch] = read_ahead(pixels, p + ch, shift);
                }
            }
        }
    }

    alpha_key(pixels, transparent);
}

/// Marks pixels whose next pixel in scan order is fully transparent.
///
/// Only color, offset and grayscale honor the mask. None of them write
/// alpha, so checking the input alphas up front sees the same values a
/// pixel-by-pixel check would.
fn short_circuit_mask(pixels: &[u8]) -> Vec<bool> {
    let count = pixels.len() / 4;
    (0..count)
        .map(|i| i + 1 < count && pixels[(i + 1) * 4 + 3] == 0)
        .collect()
}

/// Horizontal shift for every scanline, redrawn at the start of each band.
///
/// Returns `None` when the band height is not positive. Positive heights
/// below one scanline round up to one.
pub fn band_shifts(
    rows: usize,
    value: f64,
    height: f64,
    rng: &mut impl RandomSource,
) -> Option<Vec<usize>> {
    if !(height > 0.0) {
        return None;
    }
    let band = height.round().max(1.0) as usize;
    let value = value.max(0.0);

    let mut shift = 0;
    let shifts = (0..rows)
        .map(|y| {
            if y % band == 0 {
                shift = (rng.next_unit() * value).round().min(value.floor()) as usize;
            }
            shift
        })
        .collect();

    Some(shifts)
}

/// Recomputes every alpha from the pixel's packed RGB.
pub fn alpha_key(pixels: &mut [u8], transparent: Option<u32>) {
    for px in pixels.chunks_exact_mut(4) {
        let packed = (px[0] as u32) << 16 | (px[1] as u32) << 8 | px[2] as u32;
        px[3] = if Some(packed) == transparent { 0 } else { 255 };
    }
}

fn distance(offset: f64) -> Option<usize> {
    let d = offset.round();
    if d >= 0.0 {
        Some(d as usize)
    } else {
        None
    }
}

fn read_ahead(pixels: &[u8], idx: usize, pixels_ahead: usize) -> u8 {
    pixels_ahead
        .checked_mul(4)
        .and_then(|o| idx.checked_add(o))
        .and_then(|i| pixels.get(i))
        .copied()
        .unwrap_or(0)
}

/// Stores like a clamped byte array: round half to even, saturate.
fn store(v: f64) -> u8 {
    if v.is_nan() {
        return 0;
    }
    v.round_ties_even().clamp(0.0, 255.0) as u8
}
