//! RGBA8 pixel buffers and the load-time aspect ratio cap.

use crate::error::{Error, Result};
use tracing::debug;

/// Widest aspect ratio kept at load time.
pub const MAX_WIDE_ASPECT: f64 = 21.0 / 9.0;
/// Tallest aspect ratio kept at load time.
pub const MAX_TALL_ASPECT: f64 = 9.0 / 21.0;

/// A `width × height` grid of RGBA pixels, one byte per channel, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl PixelBuffer {
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * 4;
        if data.len() != expected {
            return Err(Error::Format(format!(
                "pixel buffer of {width}x{height} needs {expected} bytes, got {}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub(crate) fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }

    /// Copy out the `w × h` rectangle whose top-left corner is (`x`, `y`).
    fn crop(&self, x: u32, y: u32, w: u32, h: u32) -> PixelBuffer {
        let stride = self.width as usize * 4;
        let mut data = Vec::with_capacity(w as usize * h as usize * 4);
        for row in y..y + h {
            let start = row as usize * stride + x as usize * 4;
            data.extend_from_slice(&self.data[start..start + w as usize * 4]);
        }
        PixelBuffer {
            width: w,
            height: h,
            data,
        }
    }

    /// Centre-crop images wider than 21:9 or taller than 9:21 to that ratio.
    pub fn cap_aspect_ratio(self) -> PixelBuffer {
        if self.width == 0 || self.height == 0 {
            return self;
        }
        let aspect = self.width as f64 / self.height as f64;
        let (w, h) = if aspect > MAX_WIDE_ASPECT {
            let w = (self.height as f64 * MAX_WIDE_ASPECT).round() as u32;
            (w.clamp(1, self.width), self.height)
        } else if aspect < MAX_TALL_ASPECT {
            let h = (self.width as f64 / MAX_TALL_ASPECT).round() as u32;
            (self.width, h.clamp(1, self.height))
        } else {
            return self;
        };
        debug!("cropping {}x{} to {w}x{h}", self.width, self.height);
        self.crop((self.width - w) / 2, (self.height - h) / 2, w, h)
    }
}
