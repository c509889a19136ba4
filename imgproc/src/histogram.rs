use crate::color::{rgb_to_ycrcb, ycrcb_to_rgb};
use image::{GrayImage, RgbImage};
use rayon::prelude::*;

pub fn compute_histogram(image: &GrayImage) -> [u32; 256] {
    image
        .as_raw()
        .par_chunks(4096)
        .fold(
            || [0u32; 256],
            |mut local, chunk| {
                for &v in chunk {
                    local[v as usize] += 1;
                }
                local
            },
        )
        .reduce(
            || [0u32; 256],
            |mut a, b| {
                for (x, y) in a.iter_mut().zip(b.iter()) {
                    *x += y;
                }
                a
            },
        )
}

pub fn compute_cdf(hist: &[u32; 256]) -> [u32; 256] {
    let mut cdf = [0u32; 256];
    let mut acc = 0u32;
    for (c, &h) in cdf.iter_mut().zip(hist.iter()) {
        acc += h;
        *c = acc;
    }
    cdf
}

/// Lookup table stretching the CDF over `0..=255`; `None` for constant images.
fn equalization_lut(hist: &[u32; 256]) -> Option<[u8; 256]> {
    let cdf = compute_cdf(hist);
    let total = cdf[255];
    let cdf_min = cdf.iter().copied().find(|&c| c > 0).unwrap_or(0);
    if total <= cdf_min {
        return None;
    }

    let denom = (total - cdf_min) as f32;
    let mut lut = [0u8; 256];
    for (l, &c) in lut.iter_mut().zip(cdf.iter()) {
        *l = (c.saturating_sub(cdf_min) as f32 / denom * 255.0).round() as u8;
    }
    Some(lut)
}

pub fn histogram_equalization(image: &GrayImage) -> GrayImage {
    let Some(lut) = equalization_lut(&compute_histogram(image)) else {
        return image.clone();
    };

    let mut output = image.clone();
    let buf: &mut [u8] = &mut output;
    buf.par_iter_mut().for_each(|p| *p = lut[*p as usize]);
    output
}

/// Equalize brightness only: the Y channel of YCrCb, chroma untouched.
pub fn equalize_luma(image: &RgbImage) -> RgbImage {
    let mut ycc = rgb_to_ycrcb(image);
    let luma = GrayImage::from_raw(
        ycc.width(),
        ycc.height(),
        ycc.as_raw().chunks_exact(3).map(|p| p[0]).collect(),
    );
    let Some(luma) = luma else {
        return image.clone();
    };
    let equalized = histogram_equalization(&luma);

    let buf: &mut [u8] = &mut ycc;
    buf.par_chunks_exact_mut(3)
        .zip(equalized.as_raw().par_iter())
        .for_each(|(p, &y)| p[0] = y);
    ycrcb_to_rgb(&ycc)
}
