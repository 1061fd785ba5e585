//! Neighborhood-weighted neuron update.

use crate::som::bank::RotationBank;
use crate::som::layout::Layout;
use crate::som::map::Som;
use crate::som::neighborhood::Neighborhood;
use rayon::prelude::*;

/// Moves every neuron toward its best-matching oriented variant.
///
/// The update weight for neuron `i` at layout coordinate `c_i` is
/// `f(distance(bmu, c_i)) * learning_rate`. The weight is not clamped;
/// Mexican-hat kernels produce negative weights away from the center,
/// pushing those neurons away from the variant. Each neuron writes a
/// disjoint slice, so the pass parallelizes over neurons without locks.
pub fn update_neurons(
    som: &mut Som,
    bank: &RotationBank,
    best_rotation: &[usize],
    bmu: (usize, usize),
    neighborhood: Neighborhood,
    learning_rate: f32,
) {
    debug_assert_eq!(best_rotation.len(), som.total_neurons());

    let size = som.neuron_size();
    let layout = *som.layout();

    som.weights_mut()
        .par_chunks_mut(size)
        .enumerate()
        .for_each(|(i, neuron)| {
            let r = layout.distance(bmu, layout.coords(i));
            let factor = neighborhood.weight(r) * learning_rate;
            blend_toward(neuron, bank.variant(best_rotation[i]), factor);
        });
}

/// `neuron[p] -= (neuron[p] - target[p]) * factor`, unrolled four wide.
#[inline]
pub fn blend_toward(neuron: &mut [f32], target: &[f32], factor: f32) {
    debug_assert_eq!(neuron.len(), target.len());

    let chunks = neuron.len() / 4;
    let remainder = neuron.len() % 4;

    for i in 0..chunks {
        let base = i * 4;
        neuron[base] -= (neuron[base] - target[base]) * factor;
        neuron[base + 1] -= (neuron[base + 1] - target[base + 1]) * factor;
        neuron[base + 2] -= (neuron[base + 2] - target[base + 2]) * factor;
        neuron[base + 3] -= (neuron[base + 3] - target[base + 3]) * factor;
    }

    let base = chunks * 4;
    for i in 0..remainder {
        neuron[base + i] -= (neuron[base + i] - target[base + i]) * factor;
    }
}
