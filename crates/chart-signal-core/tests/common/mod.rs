//! Shared fixtures for core integration tests.

use std::io::Cursor;

use image::{ImageFormat, RgbaImage};

/// Encodes a blank RGBA image of the given size as PNG bytes.
#[allow(dead_code)]
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut encoded = Vec::new();
    RgbaImage::new(width, height)
        .write_to(&mut Cursor::new(&mut encoded), ImageFormat::Png)
        .expect("png fixture should encode");
    encoded
}
