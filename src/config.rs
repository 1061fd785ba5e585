//! Configuration for the rotsom training engine.

use crate::error::{Result, RotsomError};
use serde::{Deserialize, Serialize};

/// How the map weights are initialized before training.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Initialization {
    /// All neuron pixels start at zero.
    Zero,
    /// Neuron pixels drawn uniformly from [0, 1), seeded for reproducibility.
    Random,
}

/// Neighborhood kernel selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NeighborhoodKind {
    /// Gaussian bell curve.
    Gaussian,
    /// Mexican hat (negative lobes produce repulsion away from the center).
    MexicanHat,
}

/// Decay schedule for sigma and the learning rate over the input stream.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Schedule {
    /// Hold the starting value for the whole run.
    Constant,
    /// Interpolate linearly from the starting value to `end` across the
    /// planned number of inputs.
    Linear {
        /// Value reached on the last input.
        end: f32,
    },
    /// Multiply the current value by `rate` after every consumed input.
    Exponential {
        /// Per-input multiplier.
        rate: f32,
    },
}

impl Schedule {
    /// Value of a scheduled parameter before input `step` of `total`.
    pub fn value(&self, start: f32, step: usize, total: usize) -> f32 {
        match *self {
            Schedule::Constant => start,
            Schedule::Linear { end } => {
                if total <= 1 {
                    start
                } else {
                    let t = step as f32 / (total - 1) as f32;
                    start + (end - start) * t
                }
            }
            Schedule::Exponential { rate } => start * rate.powi(step as i32),
        }
    }
}

/// Main configuration for SOM training.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Neuron patch edge length N (neurons are N x N pixels).
    /// Default: 32.
    pub neuron_dim: usize,

    /// Map width Dx in neurons.
    /// Default: 10.
    pub som_width: usize,

    /// Map height Dy in neurons.
    /// Default: 10.
    pub som_height: usize,

    /// Weight initialization mode.
    /// Default: zero.
    pub init: Initialization,

    /// Seed for random initialization.
    /// Default: None (seeded from entropy).
    pub seed: Option<u64>,

    /// Number of rotations R per input image.
    /// Default: 360.
    pub rotations: usize,

    /// Also match against the horizontally flipped image.
    /// Default: true.
    pub flip: bool,

    /// Neighborhood kernel.
    /// Default: gaussian.
    pub neighborhood: NeighborhoodKind,

    /// Starting neighborhood width sigma.
    /// Default: 1.1.
    pub sigma: f32,

    /// Starting learning rate (damping on the update step).
    /// Default: 0.2.
    pub learning_rate: f32,

    /// Schedule applied to sigma.
    /// Default: constant.
    pub sigma_schedule: Schedule,

    /// Schedule applied to the learning rate.
    /// Default: constant.
    pub learning_rate_schedule: Schedule,

    /// Stop after this many inputs, even if the stream has more.
    /// Default: None (consume the whole stream).
    pub max_inputs: Option<usize>,

    /// Scan the distance matrix and map for NaN after every input and
    /// fail with a numeric error when one appears.
    /// Default: false.
    pub check_finite: bool,

    /// Number of rayon worker threads, 0 for all available cores.
    /// Default: 0.
    pub num_threads: usize,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            neuron_dim: 32,
            som_width: 10,
            som_height: 10,
            init: Initialization::Zero,
            seed: None,
            rotations: 360,
            flip: true,
            neighborhood: NeighborhoodKind::Gaussian,
            sigma: 1.1,
            learning_rate: 0.2,
            sigma_schedule: Schedule::Constant,
            learning_rate_schedule: Schedule::Constant,
            max_inputs: None,
            check_finite: false,
            num_threads: 0,
        }
    }
}

impl TrainingConfig {
    /// Total number of neurons in the map.
    #[inline]
    pub fn som_size(&self) -> usize {
        self.som_width * self.som_height
    }

    /// Number of oriented variants generated per input.
    #[inline]
    pub fn variant_count(&self) -> usize {
        if self.flip {
            2 * self.rotations
        } else {
            self.rotations
        }
    }

    /// Checks parameters that do not depend on the input stream.
    ///
    /// Input-dependent checks (neuron size versus image size) happen when
    /// the stream header has been read.
    pub fn validate(&self) -> Result<()> {
        if self.neuron_dim == 0 {
            return Err(RotsomError::Config("neuron dimension must be positive".into()));
        }
        if self.som_width == 0 || self.som_height == 0 {
            return Err(RotsomError::Config(format!(
                "map dimensions must be positive, got {}x{}",
                self.som_width, self.som_height
            )));
        }
        if self.rotations < 1 {
            return Err(RotsomError::Config("rotation count must be at least 1".into()));
        }
        if self.sigma <= 0.0 {
            return Err(RotsomError::Config(format!(
                "sigma must be positive, got {}",
                self.sigma
            )));
        }
        if self.learning_rate <= 0.0 {
            return Err(RotsomError::Config(format!(
                "learning rate must be positive, got {}",
                self.learning_rate
            )));
        }
        for (name, schedule) in [
            ("sigma", self.sigma_schedule),
            ("learning rate", self.learning_rate_schedule),
        ] {
            match schedule {
                Schedule::Linear { end } if end <= 0.0 => {
                    return Err(RotsomError::Config(format!(
                        "{} schedule endpoint must be positive, got {}",
                        name, end
                    )));
                }
                Schedule::Exponential { rate } if rate <= 0.0 => {
                    return Err(RotsomError::Config(format!(
                        "{} schedule rate must be positive, got {}",
                        name, rate
                    )));
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Checks the neuron patch against the input image dimensions.
    pub fn validate_against_input(&self, width: usize, height: usize) -> Result<()> {
        if self.neuron_dim > width || self.neuron_dim > height {
            return Err(RotsomError::Config(format!(
                "neuron dimension {} exceeds input image size {}x{}",
                self.neuron_dim, width, height
            )));
        }
        Ok(())
    }
}
