//! Binary input streaming and map serialization.

mod stream;
mod writer;

pub use stream::ImageStream;
pub use writer::{write_image, write_rotation_bank, write_som};
