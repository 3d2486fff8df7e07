//! Raw video frames
//!
//! A [`Frame`] is one RGBA raster at the stream's native resolution. Front
//! camera stills are flipped horizontally before encoding so the saved photo
//! matches the mirrored preview the user saw.

use idv_common::{Error, Result};

/// Bytes per RGBA pixel
pub const BYTES_PER_PIXEL: usize = 4;

/// RGBA raster, rows top to bottom, pixels left to right
#[derive(Clone, PartialEq, Eq)]
pub struct Frame {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Frame {
    /// Wrap a raster, checking the buffer matches the dimensions
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * BYTES_PER_PIXEL;
        if pixels.len() != expected {
            return Err(Error::InvalidInput(format!(
                "Frame {}x{} needs {} bytes, got {}",
                width,
                height,
                expected,
                pixels.len()
            )));
        }

        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// RGBA value at (x, y)
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y as usize * self.width as usize + x as usize) * BYTES_PER_PIXEL;
        let mut rgba = [0u8; 4];
        rgba.copy_from_slice(&self.pixels[offset..offset + BYTES_PER_PIXEL]);
        Some(rgba)
    }

    /// Horizontal mirror image
    pub fn mirrored(&self) -> Frame {
        let row_len = self.width as usize * BYTES_PER_PIXEL;
        let mut pixels = Vec::with_capacity(self.pixels.len());

        if row_len > 0 {
            for row in self.pixels.chunks_exact(row_len) {
                for pixel in row.chunks_exact(BYTES_PER_PIXEL).rev() {
                    pixels.extend_from_slice(pixel);
                }
            }
        }

        Frame {
            width: self.width,
            height: self.height,
            pixels,
        }
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}
