use rayon::prelude::*;

use crate::foundation::error::{FogError, FogResult};

/// Upper bound on the blur radius in texels.
pub const MAX_BLUR_RADIUS: u32 = 64;

/// Normalized Gaussian weights in Q16 fixed point; they sum to exactly `1 << 16`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlurKernel {
    weights: Vec<u32>,
}

impl BlurKernel {
    /// Build a `2 * radius + 1` tap kernel. Radius 0 is the identity.
    pub fn gaussian(radius: u32, sigma: f32) -> FogResult<Self> {
        if radius == 0 {
            return Ok(Self {
                weights: vec![1 << 16],
            });
        }
        if radius > MAX_BLUR_RADIUS {
            return Err(FogError::validation(format!(
                "blur radius must be <= {MAX_BLUR_RADIUS}"
            )));
        }
        if !sigma.is_finite() || sigma <= 0.0 {
            return Err(FogError::validation("blur sigma must be > 0"));
        }

        let r = radius as i32;
        let denom = 2.0 * f64::from(sigma) * f64::from(sigma);
        let weights_f: Vec<f64> = (-r..=r)
            .map(|i| {
                let x = f64::from(i);
                (-x * x / denom).exp()
            })
            .collect();
        let sum: f64 = weights_f.iter().sum();
        if sum <= 0.0 {
            return Err(FogError::validation("gaussian kernel sum is zero"));
        }

        let mut weights: Vec<u32> = weights_f
            .iter()
            .map(|wf| ((wf / sum) * 65536.0).round().clamp(0.0, 65536.0) as u32)
            .collect();
        let acc: i64 = weights.iter().map(|&w| i64::from(w)).sum();
        let delta = 65536 - acc;
        if delta != 0 {
            let mid = weights.len() / 2;
            weights[mid] = (i64::from(weights[mid]) + delta).clamp(0, 65536) as u32;
        }
        Ok(Self { weights })
    }

    /// Kernel radius in texels.
    pub fn radius(&self) -> u32 {
        (self.weights.len() / 2) as u32
    }

    /// Q16 weights, centre tap in the middle.
    pub fn weights(&self) -> &[u32] {
        &self.weights
    }
}

fn q16_to_u8(acc: u64) -> u8 {
    ((acc + 32768) >> 16).min(255) as u8
}

/// Blur `src` horizontally into `tmp`, then vertically into `dst`. Edges clamp.
///
/// All three buffers must be `width * height` bytes; `src` is only read.
pub(crate) fn blur_opacity(
    src: &[u8],
    tmp: &mut [u8],
    dst: &mut [u8],
    width: u32,
    height: u32,
    kernel: &BlurKernel,
) {
    let w = width as usize;
    let len = w * height as usize;
    debug_assert!(src.len() == len && tmp.len() == len && dst.len() == len);
    if kernel.weights.len() == 1 {
        dst.copy_from_slice(src);
        tmp.copy_from_slice(src);
        return;
    }
    horizontal_pass(src, tmp, w, &kernel.weights);
    vertical_pass(tmp, dst, w, height as usize, &kernel.weights);
}

fn horizontal_pass(src: &[u8], dst: &mut [u8], w: usize, k: &[u32]) {
    let radius = (k.len() / 2) as isize;
    dst.par_chunks_mut(w)
        .zip(src.par_chunks(w))
        .for_each(|(out_row, in_row)| {
            for (x, out) in out_row.iter_mut().enumerate() {
                let mut acc = 0u64;
                for (ki, &kw) in k.iter().enumerate() {
                    let sx = (x as isize + ki as isize - radius).clamp(0, w as isize - 1);
                    acc += u64::from(kw) * u64::from(in_row[sx as usize]);
                }
                *out = q16_to_u8(acc);
            }
        });
}

fn vertical_pass(src: &[u8], dst: &mut [u8], w: usize, h: usize, k: &[u32]) {
    let radius = (k.len() / 2) as isize;
    dst.par_chunks_mut(w).enumerate().for_each(|(y, out_row)| {
        for (x, out) in out_row.iter_mut().enumerate() {
            let mut acc = 0u64;
            for (ki, &kw) in k.iter().enumerate() {
                let sy = (y as isize + ki as isize - radius).clamp(0, h as isize - 1);
                acc += u64::from(kw) * u64::from(src[sy as usize * w + x]);
            }
            *out = q16_to_u8(acc);
        }
    });
}

#[cfg(test)]
#[path = "../../tests/unit/upload/blur.rs"]
mod tests;
