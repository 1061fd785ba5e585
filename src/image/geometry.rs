//! Crop, flip and rotate-and-crop kernels.
//!
//! These write into caller-provided destination slices so the training
//! loop can reuse one scratch buffer per oriented variant. Preconditions
//! (destination size, patch not larger than the source) are the caller's
//! responsibility and only checked in debug builds.

use crate::image::Image;

/// Copies the centered `n` x `n` window of `src` into `dst`.
///
/// The window's top-left corner is at `((W - n) / 2, (H - n) / 2)` using
/// floor division.
pub fn crop(src: &Image, dst: &mut [f32], n: usize) {
    debug_assert!(n <= src.width() && n <= src.height());
    debug_assert_eq!(dst.len(), n * n);

    let x0 = (src.width() - n) / 2;
    let y0 = (src.height() - n) / 2;
    let pixels = src.as_slice();

    for v in 0..n {
        let src_off = (y0 + v) * src.width() + x0;
        dst[v * n..(v + 1) * n].copy_from_slice(&pixels[src_off..src_off + n]);
    }
}

/// Mirrors `src` horizontally into `dst`: `dst[x, y] = src[W - 1 - x, y]`.
pub fn flip_horizontal(src: &Image, dst: &mut Image) {
    debug_assert_eq!(src.width(), dst.width());
    debug_assert_eq!(src.height(), dst.height());

    let w = src.width();
    let input = src.as_slice();
    let output = dst.as_mut_slice();

    for y in 0..src.height() {
        let row = &input[y * w..(y + 1) * w];
        let out_row = &mut output[y * w..(y + 1) * w];
        for x in 0..w {
            out_row[x] = row[w - 1 - x];
        }
    }
}

/// Rotates `src` by `angle` radians about its center and writes the
/// centered `n` x `n` window of the result into `dst`.
///
/// Positive angles rotate content counterclockwise. Each destination
/// pixel is pulled from the source by the inverse rotation and sampled
/// bilinearly; taps outside the source contribute zero. A zero angle
/// short-circuits to [`crop`] so the unrotated variant is exact.
pub fn rotate_and_crop(src: &Image, dst: &mut [f32], n: usize, angle: f32) {
    debug_assert!(n <= src.width() && n <= src.height());
    debug_assert_eq!(dst.len(), n * n);

    if angle == 0.0 {
        crop(src, dst, n);
        return;
    }

    let (sin, cos) = angle.sin_cos();
    let cx = (src.width() as f32 - 1.0) / 2.0;
    let cy = (src.height() as f32 - 1.0) / 2.0;
    let cn = (n as f32 - 1.0) / 2.0;

    for v in 0..n {
        let dv = v as f32 - cn;
        for u in 0..n {
            let du = u as f32 - cn;
            let x = cx + cos * du - sin * dv;
            let y = cy + sin * du + cos * dv;
            dst[v * n + u] = sample_bilinear(src, x, y);
        }
    }
}

/// Bilinear sample at a fractional coordinate, zero outside the image.
#[inline]
fn sample_bilinear(src: &Image, x: f32, y: f32) -> f32 {
    let x0 = x.floor();
    let y0 = y.floor();
    let fx = x - x0;
    let fy = y - y0;
    let x0 = x0 as i64;
    let y0 = y0 as i64;

    let tap = |xi: i64, yi: i64| -> f32 {
        if xi < 0 || yi < 0 || xi >= src.width() as i64 || yi >= src.height() as i64 {
            0.0
        } else {
            src.get(xi as usize, yi as usize)
        }
    };

    let top = tap(x0, y0) * (1.0 - fx) + tap(x0 + 1, y0) * fx;
    let bottom = tap(x0, y0 + 1) * (1.0 - fx) + tap(x0 + 1, y0 + 1) * fx;
    top * (1.0 - fy) + bottom * fy
}
