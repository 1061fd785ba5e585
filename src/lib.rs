//! # rotsom - Rotation-Invariant Self-Organizing Map Training
//!
//! rotsom trains a Self-Organizing Map over a corpus of 2D grayscale
//! float images, producing a spatial arrangement of prototype patches in
//! which topologically nearby neurons respond to visually similar inputs
//! under arbitrary rotation and reflection. It was built for clustering
//! astronomical source morphologies, but nothing in the engine is tied
//! to that domain.
//!
//! ## How it works
//!
//! For every input image the engine:
//!
//! 1. expands the image into a bank of oriented variants (R rotations,
//!    optionally doubled by a horizontal flip), each cropped to the
//!    neuron patch size;
//! 2. exhaustively searches, for every neuron, the nearest variant under
//!    squared Euclidean distance, then picks the globally best matching
//!    neuron;
//! 3. moves every neuron toward its own best variant, weighted by a
//!    neighborhood kernel of the grid distance to the best match.
//!
//! The output after N inputs is a deterministic function of the seed,
//! the input sequence, and the parameters, also under parallel
//! execution.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use rotsom::{ImageStream, Trainer, TrainingConfig};
//!
//! let config = TrainingConfig::default();
//! let stream = ImageStream::open("images.bin")?;
//! let planned = stream.number_of_entries();
//!
//! let mut trainer = Trainer::new(config, stream.width(), stream.height(), planned)?;
//! trainer.train(stream)?;
//! rotsom::storage::write_som(trainer.som(), "map.bin")?;
//! ```
//!
//! ## Modules
//!
//! - [`image`] - float image container and geometry kernels
//! - [`som`] - map storage, layout, neighborhood kernels, search, update,
//!   and the training driver
//! - [`storage`] - binary input streaming and map serialization
//! - [`config`] - training parameters and validation

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod image;
pub mod som;
pub mod storage;

pub use config::{Initialization, NeighborhoodKind, Schedule, TrainingConfig};
pub use error::{Result, RotsomError};
pub use image::Image;
pub use som::{CartesianLayout, Layout, RotationBank, Som, Trainer, TrainingReport};
pub use storage::ImageStream;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
