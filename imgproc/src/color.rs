//! Colour space conversions (BT.601, full range).
//!
//! YCrCb rasters reuse `RgbImage` storage with channels ordered `[Y, Cr, Cb]`.

use image::{GrayImage, RgbImage};
use rayon::prelude::*;
use rayon::ThreadPool;

pub type YCrCbImage = RgbImage;

const KR: f32 = 0.299;
const KG: f32 = 0.587;
const KB: f32 = 0.114;

#[inline]
fn clamp_u8(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

#[inline]
fn luma(r: f32, g: f32, b: f32) -> f32 {
    KR * r + KG * g + KB * b
}

pub fn convert_rgb_to_gray(rgb: &RgbImage) -> GrayImage {
    convert_rgb_to_gray_in_pool(rgb, None)
}

pub fn convert_rgb_to_gray_in_pool(rgb: &RgbImage, pool: Option<&ThreadPool>) -> GrayImage {
    let run = || {
        let mut gray = GrayImage::new(rgb.width(), rgb.height());
        let out: &mut [u8] = &mut gray;
        out.par_iter_mut()
            .zip(rgb.as_raw().par_chunks_exact(3))
            .for_each(|(g, p)| *g = luma(p[0] as f32, p[1] as f32, p[2] as f32) as u8);
        gray
    };

    match pool {
        Some(p) => p.install(run),
        None => run(),
    }
}

pub fn rgb_to_ycrcb(rgb: &RgbImage) -> YCrCbImage {
    let mut out = rgb.clone();
    let buf: &mut [u8] = &mut out;
    buf.par_chunks_exact_mut(3).for_each(|p| {
        let (r, g, b) = (p[0] as f32, p[1] as f32, p[2] as f32);
        let y = luma(r, g, b);
        p[0] = clamp_u8(y);
        p[1] = clamp_u8((r - y) * 0.713 + 128.0);
        p[2] = clamp_u8((b - y) * 0.564 + 128.0);
    });
    out
}

pub fn ycrcb_to_rgb(ycrcb: &YCrCbImage) -> RgbImage {
    let mut out = ycrcb.clone();
    let buf: &mut [u8] = &mut out;
    buf.par_chunks_exact_mut(3).for_each(|p| {
        let y = p[0] as f32;
        let cr = p[1] as f32 - 128.0;
        let cb = p[2] as f32 - 128.0;
        p[0] = clamp_u8(y + 1.403 * cr);
        p[1] = clamp_u8(y - 0.714 * cr - 0.344 * cb);
        p[2] = clamp_u8(y + 1.773 * cb);
    });
    out
}
