//! Self-Organizing Map storage.

use crate::config::{Initialization, TrainingConfig};
use crate::image::Image;
use crate::som::layout::{CartesianLayout, Layout};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// A map of square image-patch neurons on a Cartesian grid.
///
/// Storage is one contiguous `S * N * N` float buffer, neurons in
/// layout-linear order, pixels row-major within each neuron. The buffer
/// is created once at training start and mutated in place by every
/// update pass.
#[derive(Debug, Clone)]
pub struct Som {
    layout: CartesianLayout,
    neuron_dim: usize,
    weights: Vec<f32>,
}

impl Som {
    /// Creates a map initialized according to the configuration.
    pub fn new(config: &TrainingConfig) -> Self {
        let layout = CartesianLayout::new(config.som_width, config.som_height);
        let len = layout.size() * config.neuron_dim * config.neuron_dim;

        let weights = match config.init {
            Initialization::Zero => vec![0.0; len],
            Initialization::Random => {
                let mut rng = match config.seed {
                    Some(seed) => ChaCha8Rng::seed_from_u64(seed),
                    None => ChaCha8Rng::from_entropy(),
                };
                (0..len).map(|_| rng.gen::<f32>()).collect()
            }
        };

        Self {
            layout,
            neuron_dim: config.neuron_dim,
            weights,
        }
    }

    /// The map topology.
    #[inline]
    pub fn layout(&self) -> &CartesianLayout {
        &self.layout
    }

    /// Neuron patch edge length N.
    #[inline]
    pub fn neuron_dim(&self) -> usize {
        self.neuron_dim
    }

    /// Pixels per neuron (N * N).
    #[inline]
    pub fn neuron_size(&self) -> usize {
        self.neuron_dim * self.neuron_dim
    }

    /// Total number of neurons.
    #[inline]
    pub fn total_neurons(&self) -> usize {
        self.layout.size()
    }

    /// Pixel slice of the neuron with the given linear index.
    #[inline]
    pub fn neuron(&self, index: usize) -> &[f32] {
        let size = self.neuron_size();
        &self.weights[index * size..(index + 1) * size]
    }

    /// The whole weight buffer, neurons in layout-linear order.
    #[inline]
    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    /// Mutable view of the whole weight buffer.
    #[inline]
    pub fn weights_mut(&mut self) -> &mut [f32] {
        &mut self.weights
    }

    /// True when every weight is a finite number.
    pub fn is_finite(&self) -> bool {
        self.weights.iter().all(|w| w.is_finite())
    }

    /// Renders the map as one composite image of size
    /// `(Dx * N) x (Dy * N)`, the neuron at layout coordinate `(x, y)`
    /// occupying columns `[x*N, (x+1)*N)` and rows `[y*N, (y+1)*N)`.
    pub fn to_composite_image(&self) -> Image {
        let n = self.neuron_dim;
        let width = self.layout.width() * n;
        let height = self.layout.height() * n;
        let mut composite = Image::zeros(width, height);

        for index in 0..self.total_neurons() {
            let (x, y) = self.layout.coords(index);
            let neuron = self.neuron(index);
            for row in 0..n {
                for col in 0..n {
                    composite.set(x * n + col, y * n + row, neuron[row * n + col]);
                }
            }
        }

        composite
    }
}
