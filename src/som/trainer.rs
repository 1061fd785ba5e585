//! Training driver.
//!
//! One sequential loop over the input stream; inside each step the bank
//! build, the best-match search, and the update pass fan work out to the
//! rayon pool and join before the next stage. All scratch buffers are
//! allocated in [`Trainer::new`] and reused for every input.

use crate::config::TrainingConfig;
use crate::error::{Result, RotsomError};
use crate::image::Image;
use crate::som::bank::RotationBank;
use crate::som::layout::Layout;
use crate::som::map::Som;
use crate::som::neighborhood::Neighborhood;
use crate::som::search::{find_best_matching_neuron, find_best_rotations};
use crate::som::update::update_neurons;
use log::{debug, info};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Outcome of a training run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrainingReport {
    /// Number of inputs fully processed.
    pub inputs_consumed: usize,
    /// True when the run stopped on the cancellation flag rather than on
    /// stream exhaustion or the configured input cap.
    pub cancelled: bool,
}

/// Drives SOM training over a stream of input images.
pub struct Trainer {
    config: TrainingConfig,
    som: Som,
    bank: RotationBank,
    distances: Vec<f32>,
    best_rotation: Vec<usize>,
    planned_inputs: usize,
    steps_done: usize,
    cancel: Arc<AtomicBool>,
}

impl Trainer {
    /// Validates the configuration against the input dimensions and
    /// allocates the map and all scratch buffers.
    ///
    /// `planned_inputs` is the number of inputs the schedules stretch
    /// over, normally the stream's entry count capped by `max_inputs`.
    pub fn new(
        config: TrainingConfig,
        image_width: usize,
        image_height: usize,
        planned_inputs: usize,
    ) -> Result<Self> {
        config.validate()?;
        config.validate_against_input(image_width, image_height)?;

        let som = Som::new(&config);
        let bank = RotationBank::new(
            config.neuron_dim,
            config.rotations,
            config.flip,
            image_width,
            image_height,
        );
        let som_size = config.som_size();

        Ok(Self {
            config,
            som,
            bank,
            distances: vec![0.0; som_size],
            best_rotation: vec![0; som_size],
            planned_inputs,
            steps_done: 0,
            cancel: Arc::new(AtomicBool::new(false)),
        })
    }

    /// The trained (or in-progress) map.
    #[inline]
    pub fn som(&self) -> &Som {
        &self.som
    }

    /// Consumes the trainer, returning the map.
    pub fn into_som(self) -> Som {
        self.som
    }

    /// Number of inputs processed so far.
    #[inline]
    pub fn steps_done(&self) -> usize {
        self.steps_done
    }

    /// The oriented-variant scratch of the most recent step.
    #[inline]
    pub fn bank(&self) -> &RotationBank {
        &self.bank
    }

    /// Flag that aborts training when set; checked between inputs, so
    /// the map is always left in a consistent, serializable state.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// Sigma for the upcoming step.
    #[inline]
    pub fn current_sigma(&self) -> f32 {
        self.config
            .sigma_schedule
            .value(self.config.sigma, self.steps_done, self.planned_inputs)
    }

    /// Learning rate for the upcoming step.
    #[inline]
    pub fn current_learning_rate(&self) -> f32 {
        self.config.learning_rate_schedule.value(
            self.config.learning_rate,
            self.steps_done,
            self.planned_inputs,
        )
    }

    /// Trains over every image the stream yields, in delivery order.
    ///
    /// Stops when the stream ends, the configured input cap is reached,
    /// or the cancellation flag is set. Any error from the stream or
    /// from a step halts training immediately; the map keeps the state
    /// of the last completed step.
    pub fn train<I>(&mut self, inputs: I) -> Result<TrainingReport>
    where
        I: IntoIterator<Item = Result<Image>>,
    {
        info!(
            "Training {}x{} map of {}x{} neurons, {} rotations{}, {} planned inputs",
            self.som.layout().width(),
            self.som.layout().height(),
            self.config.neuron_dim,
            self.config.neuron_dim,
            self.config.rotations,
            if self.config.flip { " with flip" } else { "" },
            self.planned_inputs,
        );

        let mut cancelled = false;
        let started_at = self.steps_done;

        for entry in inputs {
            if self.cancel.load(Ordering::Relaxed) {
                cancelled = true;
                break;
            }
            if let Some(cap) = self.config.max_inputs {
                if self.steps_done >= cap {
                    break;
                }
            }

            let image = entry?;
            self.step(&image)?;

            if self.steps_done % 100 == 0 {
                info!(
                    "Processed {} inputs (sigma {:.4}, learning rate {:.4})",
                    self.steps_done,
                    self.current_sigma(),
                    self.current_learning_rate(),
                );
            }
        }

        let report = TrainingReport {
            inputs_consumed: self.steps_done - started_at,
            cancelled,
        };
        info!(
            "Training {}: {} inputs consumed",
            if cancelled { "cancelled" } else { "finished" },
            report.inputs_consumed
        );
        Ok(report)
    }

    /// Runs the five-stage pipeline for one input image.
    pub fn step(&mut self, image: &Image) -> Result<()> {
        let sigma = self.current_sigma();
        let learning_rate = self.current_learning_rate();
        if sigma <= 0.0 || learning_rate <= 0.0 {
            return Err(RotsomError::Training(format!(
                "schedule produced a non-positive parameter at step {}: sigma {}, learning rate {}",
                self.steps_done, sigma, learning_rate
            )));
        }

        self.bank.build(image);

        find_best_rotations(
            &self.som,
            &self.bank,
            &mut self.distances,
            &mut self.best_rotation,
        );
        if self.config.check_finite && self.distances.iter().any(|d| d.is_nan()) {
            return Err(RotsomError::Numeric(format!(
                "NaN in distance matrix at input {}",
                self.steps_done
            )));
        }

        let bmu_index = find_best_matching_neuron(&self.distances);
        let bmu = self.som.layout().coords(bmu_index);
        debug!(
            "Input {}: best matching neuron at ({}, {})",
            self.steps_done, bmu.0, bmu.1
        );

        let neighborhood = Neighborhood::new(self.config.neighborhood, sigma);
        update_neurons(
            &mut self.som,
            &self.bank,
            &self.best_rotation,
            bmu,
            neighborhood,
            learning_rate,
        );
        if self.config.check_finite && !self.som.is_finite() {
            return Err(RotsomError::Numeric(format!(
                "NaN in map after input {}",
                self.steps_done
            )));
        }

        self.steps_done += 1;
        Ok(())
    }
}
