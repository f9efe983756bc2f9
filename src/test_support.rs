//! Image fixtures shared by the unit tests.

use std::io::Cursor;

use image::{DynamicImage, GrayImage, ImageOutputFormat, RgbImage};

use crate::validation::{self, ValidatedImage};

pub fn encode(img: DynamicImage) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageOutputFormat::Png).unwrap();
    buf.into_inner()
}

/// All-black RGB PNG.
pub fn png(width: u32, height: u32) -> Vec<u8> {
    encode(DynamicImage::ImageRgb8(RgbImage::new(width, height)))
}

pub fn validated(img: RgbImage) -> ValidatedImage {
    let size = img.width();
    validation::decode(&encode(DynamicImage::ImageRgb8(img)), size).unwrap()
}

/// A 1x1 grayscale PNG whose IHDR claims `width` x `height`.
pub fn png_with_header_dimensions(width: u32, height: u32) -> Vec<u8> {
    let mut bytes = encode(DynamicImage::ImageLuma8(GrayImage::new(1, 1)));
    // signature(8) | length(4) | "IHDR"(4) | width(4) | height(4) | ... | crc at 29
    bytes[16..20].copy_from_slice(&width.to_be_bytes());
    bytes[20..24].copy_from_slice(&height.to_be_bytes());
    let crc = crc32(&bytes[12..29]);
    bytes[29..33].copy_from_slice(&crc.to_be_bytes());
    bytes
}

fn crc32(data: &[u8]) -> u32 {
    let mut crc = 0xffff_ffffu32;
    for &byte in data {
        crc ^= byte as u32;
        for _ in 0..8 {
            let mask = (crc & 1).wrapping_neg();
            crc = (crc >> 1) ^ (0xedb8_8320 & mask);
        }
    }
    !crc
}
