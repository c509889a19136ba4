use crate::{Interpolation, Result};
use image::{ImageBuffer, Pixel};
use nalgebra::Matrix3;
use pano_core::{Homography, W_EPSILON};
use rayon::prelude::*;

/// Resample `src` into a `width` x `height` raster through `h`.
///
/// Each destination pixel `(u, v)` is pulled from `H^-1 * (u, v, 1)`.
/// Destination pixels whose source falls outside `[0, w) x [0, h)`, or at
/// infinity, are black. Every output pixel is written.
pub fn warp_perspective<P>(
    src: &ImageBuffer<P, Vec<u8>>,
    h: &Homography,
    width: u32,
    height: u32,
    interpolation: Interpolation,
) -> Result<ImageBuffer<P, Vec<u8>>>
where
    P: Pixel<Subpixel = u8> + Send + Sync,
{
    let inv = *h.inverse()?.matrix();
    let mut dst = ImageBuffer::<P, Vec<u8>>::new(width, height);
    if width == 0 || height == 0 || src.width() == 0 || src.height() == 0 {
        return Ok(dst);
    }

    let channels = P::CHANNEL_COUNT as usize;
    let row_len = width as usize * channels;
    let sampler = Sampler {
        raw: src.as_raw(),
        width: src.width() as usize,
        height: src.height() as usize,
        channels,
    };

    let buf: &mut [u8] = &mut dst;
    buf.par_chunks_mut(row_len).enumerate().for_each(|(v, row)| {
        for (u, out) in row.chunks_exact_mut(channels).enumerate() {
            match source_coord(&inv, u as f64, v as f64) {
                Some((sx, sy)) if sampler.contains(sx, sy) => match interpolation {
                    Interpolation::Nearest => sampler.nearest(sx, sy, out),
                    Interpolation::Linear => sampler.bilinear(sx, sy, out),
                },
                _ => out.fill(0),
            }
        }
    });

    Ok(dst)
}

fn source_coord(inv: &Matrix3<f64>, x: f64, y: f64) -> Option<(f64, f64)> {
    let w = inv[(2, 0)] * x + inv[(2, 1)] * y + inv[(2, 2)];
    if w.abs() < W_EPSILON {
        return None;
    }
    Some((
        (inv[(0, 0)] * x + inv[(0, 1)] * y + inv[(0, 2)]) / w,
        (inv[(1, 0)] * x + inv[(1, 1)] * y + inv[(1, 2)]) / w,
    ))
}

struct Sampler<'a> {
    raw: &'a [u8],
    width: usize,
    height: usize,
    channels: usize,
}

impl Sampler<'_> {
    fn contains(&self, x: f64, y: f64) -> bool {
        x >= 0.0 && y >= 0.0 && x < self.width as f64 && y < self.height as f64
    }

    fn px(&self, x: usize, y: usize) -> &[u8] {
        let start = (y * self.width + x) * self.channels;
        &self.raw[start..start + self.channels]
    }

    fn nearest(&self, x: f64, y: f64, out: &mut [u8]) {
        let xi = (x.round() as usize).min(self.width - 1);
        let yi = (y.round() as usize).min(self.height - 1);
        out.copy_from_slice(self.px(xi, yi));
    }

    /// Neighbours past the last row or column repeat the edge pixel.
    fn bilinear(&self, x: f64, y: f64, out: &mut [u8]) {
        let x0 = x.floor() as usize;
        let y0 = y.floor() as usize;
        let x1 = (x0 + 1).min(self.width - 1);
        let y1 = (y0 + 1).min(self.height - 1);
        let fx = x - x0 as f64;
        let fy = y - y0 as f64;

        let (p00, p10, p01, p11) = (self.px(x0, y0), self.px(x1, y0), self.px(x0, y1), self.px(x1, y1));
        for c in 0..self.channels {
            let top = p00[c] as f64 * (1.0 - fx) + p10[c] as f64 * fx;
            let bottom = p01[c] as f64 * (1.0 - fx) + p11[c] as f64 * fx;
            out[c] = (top * (1.0 - fy) + bottom * fy).round().clamp(0.0, 255.0) as u8;
        }
    }
}
