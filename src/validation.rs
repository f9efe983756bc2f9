use std::io::Cursor;

use image::io::Reader as ImageReader;
use image::RgbImage;
use tracing::debug;

use crate::{Error, Result};

/// An RGB image whose dimensions were checked against the model's input.
#[derive(Debug, Clone)]
pub struct ValidatedImage {
    pixels: RgbImage,
}

impl ValidatedImage {
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn pixels(&self) -> &RgbImage {
        &self.pixels
    }
}

/// Decode `bytes` in memory and accept only a `size` x `size` image.
///
/// Dimensions come from the image header, so a wrongly sized upload is
/// rejected before any pixel buffer is allocated. Any alpha or grayscale
/// input is converted to 3-channel RGB, so the result always has the
/// `(size, size, 3)` shape the model expects.
pub fn decode(bytes: &[u8], size: u32) -> Result<ValidatedImage> {
    if bytes.is_empty() {
        return Err(Error::NoInputData);
    }

    let (width, height) = reader(bytes)?.into_dimensions()?;
    debug!(width, height, "read input image header");

    if width != size || height != size {
        return Err(Error::InvalidDimensions {
            width,
            height,
            expected: size,
        });
    }

    let img = reader(bytes)?.decode()?;
    Ok(ValidatedImage {
        pixels: img.into_rgb8(),
    })
}

fn reader(bytes: &[u8]) -> Result<ImageReader<Cursor<&[u8]>>> {
    Ok(ImageReader::new(Cursor::new(bytes)).with_guessed_format()?)
}
