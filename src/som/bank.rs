//! Oriented variant bank.
//!
//! For every training input the engine matches neurons against all
//! rotations of the image (and of its mirror image when flip matching is
//! enabled). The bank owns one contiguous scratch buffer of `K * N * N`
//! floats plus a flip scratch image, both allocated once and overwritten
//! per input.

use crate::image::{crop, flip_horizontal, rotate_and_crop, Image};
use rayon::prelude::*;
use std::f32::consts::PI;

/// Bank of `K = R` (flip disabled) or `K = 2R` (flip enabled) oriented
/// `N x N` patches of one input image.
///
/// Variant 0 is the unrotated, unflipped center crop. Variants `1..R`
/// rotate the original image by `k * 2 pi / R` counterclockwise.
/// Variants `R..2R` apply the same rotation sequence to the horizontally
/// flipped image.
#[derive(Debug)]
pub struct RotationBank {
    neuron_dim: usize,
    rotations: usize,
    flip: bool,
    variants: Vec<f32>,
    flipped: Image,
}

impl RotationBank {
    /// Allocates a bank for images of the given source dimensions.
    pub fn new(
        neuron_dim: usize,
        rotations: usize,
        flip: bool,
        image_width: usize,
        image_height: usize,
    ) -> Self {
        let count = if flip { 2 * rotations } else { rotations };
        Self {
            neuron_dim,
            rotations,
            flip,
            variants: vec![0.0; count * neuron_dim * neuron_dim],
            flipped: Image::zeros(image_width, image_height),
        }
    }

    /// Number of oriented variants K.
    #[inline]
    pub fn count(&self) -> usize {
        if self.flip {
            2 * self.rotations
        } else {
            self.rotations
        }
    }

    /// Pixels per variant (N * N).
    #[inline]
    pub fn variant_size(&self) -> usize {
        self.neuron_dim * self.neuron_dim
    }

    /// Pixel slice of variant `index`.
    #[inline]
    pub fn variant(&self, index: usize) -> &[f32] {
        let size = self.variant_size();
        &self.variants[index * size..(index + 1) * size]
    }

    /// The whole variant buffer, variant `i` at offset `i * N * N`.
    #[inline]
    pub fn variants(&self) -> &[f32] {
        &self.variants
    }

    /// Fills the bank from one input image, overwriting previous contents.
    ///
    /// Rotations of the original and of the flipped image are fanned out
    /// across the worker pool; every variant writes a disjoint chunk.
    pub fn build(&mut self, image: &Image) {
        let n = self.neuron_dim;
        let size = self.variant_size();
        let step = 2.0 * PI / self.rotations as f32;

        let (plain, mirrored) = self.variants.split_at_mut(self.rotations * size);

        let (first, rest) = plain.split_at_mut(size);
        crop(image, first, n);
        rest.par_chunks_mut(size).enumerate().for_each(|(k, dst)| {
            rotate_and_crop(image, dst, n, (k + 1) as f32 * step);
        });

        if self.flip {
            flip_horizontal(image, &mut self.flipped);
            let flipped = &self.flipped;

            let (first, rest) = mirrored.split_at_mut(size);
            crop(flipped, first, n);
            rest.par_chunks_mut(size).enumerate().for_each(|(k, dst)| {
                rotate_and_crop(flipped, dst, n, (k + 1) as f32 * step);
            });
        }
    }

    /// Renders the bank as one tall composite image of `K * N` rows by
    /// `N` columns, variant `i` occupying rows `[i*N, (i+1)*N)`.
    pub fn to_composite_image(&self) -> Image {
        let n = self.neuron_dim;
        let mut composite = Image::zeros(n, self.count() * n);
        composite.as_mut_slice().copy_from_slice(&self.variants);
        composite
    }
}
