//! Neighborhood kernels.
//!
//! The kernel maps a grid distance from the best-matching neuron to an
//! update weight. Selection happens once per training step; the update
//! pass receives the resolved [`Neighborhood`] and evaluates it once per
//! neuron, never inside the per-pixel loop.

use crate::config::NeighborhoodKind;

/// A neighborhood kernel bound to its current sigma.
#[derive(Debug, Clone, Copy)]
pub struct Neighborhood {
    kind: NeighborhoodKind,
    sigma: f32,
}

impl Neighborhood {
    /// Binds `kind` to the sigma used for the current step.
    ///
    /// Sigma must be positive; configuration validation rejects other
    /// values before training starts.
    pub fn new(kind: NeighborhoodKind, sigma: f32) -> Self {
        debug_assert!(sigma > 0.0);
        Self { kind, sigma }
    }

    /// Kernel value at grid distance `r`.
    #[inline]
    pub fn weight(&self, r: f32) -> f32 {
        match self.kind {
            NeighborhoodKind::Gaussian => gaussian(r, self.sigma),
            NeighborhoodKind::MexicanHat => mexican_hat(r, self.sigma),
        }
    }
}

/// Gaussian bell: `1 / (sigma * sqrt(2 pi)) * exp(-0.5 * (x / sigma)^2)`.
#[inline]
pub fn gaussian(x: f32, sigma: f32) -> f32 {
    let norm = 1.0 / (sigma * (2.0 * std::f32::consts::PI).sqrt());
    norm * (-0.5 * (x / sigma).powi(2)).exp()
}

/// Mexican hat:
/// `2 / (sqrt(3 sigma) * pi^(1/4)) * (1 - x^2 / sigma^2) * exp(-x^2 / (2 sigma^2))`.
///
/// Negative for `|x| > sigma`, pushing distant neurons away from the
/// chosen variant instead of toward it.
#[inline]
pub fn mexican_hat(x: f32, sigma: f32) -> f32 {
    let x2 = x * x;
    let sigma2 = sigma * sigma;
    let norm = 2.0 / ((3.0 * sigma).sqrt() * std::f32::consts::PI.powf(0.25));
    norm * (1.0 - x2 / sigma2) * (-x2 / (2.0 * sigma2)).exp()
}
