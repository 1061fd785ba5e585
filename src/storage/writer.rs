//! Binary writers for trained maps and rotation-bank dumps.
//!
//! Outputs use the same container as the input stream (six i32 fields,
//! two i32 dimensions, f32 payload), so a written file can be opened
//! again with [`crate::storage::ImageStream`]. The payload of a map
//! file is exactly the row-major composite image: the neuron at layout
//! coordinate `(x, y)` occupies columns `[x*N, (x+1)*N)` and rows
//! `[y*N, (y+1)*N)`.

use crate::error::Result;
use crate::image::Image;
use crate::som::{RotationBank, Som};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Writes one image in the stream container format.
pub fn write_image<P: AsRef<Path>>(image: &Image, path: P) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    for value in [0i32, 0, 0, 1, 0, 2, image.width() as i32, image.height() as i32] {
        writer.write_all(&value.to_le_bytes())?;
    }
    for pixel in image.as_slice() {
        writer.write_all(&pixel.to_le_bytes())?;
    }
    writer.flush()?;
    Ok(())
}

/// Serializes the trained map as one composite image.
pub fn write_som<P: AsRef<Path>>(som: &Som, path: P) -> Result<()> {
    write_image(&som.to_composite_image(), path)
}

/// Serializes a rotation bank as a tall strip of its variants, for
/// visual inspection of the oriented matching candidates.
pub fn write_rotation_bank<P: AsRef<Path>>(bank: &RotationBank, path: P) -> Result<()> {
    write_image(&bank.to_composite_image(), path)
}
