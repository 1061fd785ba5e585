//! Best-matching-neuron search.
//!
//! The hot loop of training: every neuron is compared against every
//! oriented variant under squared Euclidean distance. Parallelism runs
//! over neurons; the variant scan inside each neuron stays sequential so
//! the smallest-index tie rule survives any thread schedule.

use crate::som::bank::RotationBank;
use crate::som::map::Som;
use rayon::prelude::*;

/// Squared Euclidean distance between two equal-length float vectors.
///
/// Unrolled eight wide so the compiler can vectorize the main loop. The
/// result is only ever used for ordering, so no square root is taken.
#[inline]
pub fn distance_squared(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());

    let chunks = a.len() / 8;
    let remainder = a.len() % 8;
    let mut sum = 0.0f32;

    for i in 0..chunks {
        let base = i * 8;
        let d0 = a[base] - b[base];
        let d1 = a[base + 1] - b[base + 1];
        let d2 = a[base + 2] - b[base + 2];
        let d3 = a[base + 3] - b[base + 3];
        let d4 = a[base + 4] - b[base + 4];
        let d5 = a[base + 5] - b[base + 5];
        let d6 = a[base + 6] - b[base + 6];
        let d7 = a[base + 7] - b[base + 7];
        sum += d0 * d0 + d1 * d1 + d2 * d2 + d3 * d3
            + d4 * d4 + d5 * d5 + d6 * d6 + d7 * d7;
    }

    let base = chunks * 8;
    for i in 0..remainder {
        let d = a[base + i] - b[base + i];
        sum += d * d;
    }

    sum
}

/// Fills the distance and best-rotation matrices for one input.
///
/// For each neuron `i`, `distances[i]` becomes the minimum squared
/// distance over all variants and `best_rotation[i]` the index of the
/// variant that produced it. Ties go to the smallest variant index via
/// the strict less-than comparison.
pub fn find_best_rotations(
    som: &Som,
    bank: &RotationBank,
    distances: &mut [f32],
    best_rotation: &mut [usize],
) {
    debug_assert_eq!(distances.len(), som.total_neurons());
    debug_assert_eq!(best_rotation.len(), som.total_neurons());
    debug_assert_eq!(som.neuron_size(), bank.variant_size());

    let size = som.neuron_size();

    som.weights()
        .par_chunks(size)
        .zip(distances.par_iter_mut())
        .zip(best_rotation.par_iter_mut())
        .for_each(|((neuron, distance), rotation)| {
            let mut best = f32::INFINITY;
            let mut best_index = 0;
            for (j, variant) in bank.variants().chunks_exact(size).enumerate() {
                let d = distance_squared(neuron, variant);
                if d < best {
                    best = d;
                    best_index = j;
                }
            }
            *distance = best;
            *rotation = best_index;
        });
}

/// Linear index of the neuron with the smallest distance.
///
/// Ties go to the smallest layout-linear index; the scan is sequential
/// and compares with strict less-than.
pub fn find_best_matching_neuron(distances: &[f32]) -> usize {
    debug_assert!(!distances.is_empty());

    let mut best = f32::INFINITY;
    let mut best_index = 0;
    for (i, &d) in distances.iter().enumerate() {
        if d < best {
            best = d;
            best_index = i;
        }
    }
    best_index
}
