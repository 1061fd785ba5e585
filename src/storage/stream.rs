//! Binary input stream reader.
//!
//! The stream starts with an optional textual header of `#`-prefixed
//! lines terminated by the marker line `# END OF HEADER`, then six
//! little-endian i32 fields: three reserved values, the number of
//! entries, a layout code, and the dimensionality D, followed by D i32
//! image dimensions and the entry payloads of `W * H` f32 each,
//! row-major.

use crate::error::{Result, RotsomError};
use crate::image::Image;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

/// Marker line closing the optional textual header.
const HEADER_END: &str = "# END OF HEADER";

/// Streaming reader over a binary image file.
pub struct ImageStream<R: BufRead> {
    reader: R,
    entries: usize,
    width: usize,
    height: usize,
    consumed: usize,
    payload: Vec<u8>,
}

impl ImageStream<BufReader<File>> {
    /// Opens a stream file and parses its header.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::new(BufReader::new(file))
    }
}

impl<R: BufRead> ImageStream<R> {
    /// Parses the header from an already-buffered reader.
    pub fn new(mut reader: R) -> Result<Self> {
        skip_text_header(&mut reader)?;

        for _ in 0..3 {
            read_i32(&mut reader)?;
        }
        let entries = read_i32(&mut reader)?;
        if entries < 0 {
            return Err(RotsomError::InputFormat(format!(
                "negative entry count {}",
                entries
            )));
        }
        read_i32(&mut reader)?; // layout code
        let dimensionality = read_i32(&mut reader)?;
        if dimensionality != 2 {
            return Err(RotsomError::InputFormat(format!(
                "expected 2-dimensional entries, got dimensionality {}",
                dimensionality
            )));
        }
        let width = read_i32(&mut reader)?;
        let height = read_i32(&mut reader)?;
        if width <= 0 || height <= 0 {
            return Err(RotsomError::InputFormat(format!(
                "invalid image dimensions {}x{}",
                width, height
            )));
        }

        let width = width as usize;
        let height = height as usize;
        Ok(Self {
            reader,
            entries: entries as usize,
            width,
            height,
            consumed: 0,
            payload: vec![0; width * height * 4],
        })
    }

    /// Number of entries announced by the header.
    #[inline]
    pub fn number_of_entries(&self) -> usize {
        self.entries
    }

    /// Image width in pixels.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Image height in pixels.
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Entries read (or skipped) so far.
    #[inline]
    pub fn position(&self) -> usize {
        self.consumed
    }

    /// Skips the next `n` entries without decoding them.
    pub fn skip(&mut self, n: usize) -> Result<()> {
        for _ in 0..n {
            if self.consumed >= self.entries {
                return Err(RotsomError::InputFormat(format!(
                    "cannot skip past the last of {} entries",
                    self.entries
                )));
            }
            self.reader
                .read_exact(&mut self.payload)
                .map_err(|e| truncation(e, self.consumed))?;
            self.consumed += 1;
        }
        Ok(())
    }

    fn read_entry(&mut self) -> Result<Image> {
        self.reader
            .read_exact(&mut self.payload)
            .map_err(|e| truncation(e, self.consumed))?;

        let pixels: Vec<f32> = self
            .payload
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect();
        self.consumed += 1;

        // Payload length is fixed by construction, so this cannot fail.
        Ok(Image::from_vec(self.width, self.height, pixels).unwrap())
    }
}

impl<R: BufRead> Iterator for ImageStream<R> {
    type Item = Result<Image>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.consumed >= self.entries {
            return None;
        }
        Some(self.read_entry())
    }
}

fn truncation(err: std::io::Error, entry: usize) -> RotsomError {
    if err.kind() == std::io::ErrorKind::UnexpectedEof {
        RotsomError::InputFormat(format!("truncated payload at entry {}", entry))
    } else {
        RotsomError::Io(err)
    }
}

/// Consumes the optional `#` header lines including the end marker.
fn skip_text_header<R: BufRead>(reader: &mut R) -> Result<()> {
    loop {
        let buf = reader.fill_buf()?;
        if buf.first() != Some(&b'#') {
            return Ok(());
        }
        let mut line = String::new();
        reader.read_line(&mut line)?;
        if line.trim_end() == HEADER_END {
            return Ok(());
        }
        if line.is_empty() {
            return Err(RotsomError::InputFormat(
                "unterminated textual header".into(),
            ));
        }
    }
}

fn read_i32<R: Read>(reader: &mut R) -> Result<i32> {
    let mut bytes = [0u8; 4];
    reader.read_exact(&mut bytes).map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            RotsomError::InputFormat("truncated stream header".into())
        } else {
            RotsomError::Io(e)
        }
    })?;
    Ok(i32::from_le_bytes(bytes))
}
