//! Grading state for one image. The original is kept so every `process` call
//! starts again from unmodified pixels.

use super::apply::apply_luts;
use super::image::PixelBuffer;
use super::LutCollection;
use crate::error::{Error, Result};
use tracing::{debug, trace};

/// One loaded image plus the LUT stack being tuned against it.
///
/// The original is cropped once at load time; every call to
/// [`LutSession::process`] starts again from it, so repeated slider moves
/// never compound.
#[derive(Debug, Clone)]
pub struct LutSession {
    original: PixelBuffer,
    current: PixelBuffer,
    luts: LutCollection,
    global_intensity: f32,
}

impl LutSession {
    pub fn new(image: PixelBuffer) -> Self {
        let original = image.cap_aspect_ratio();
        Self {
            current: original.clone(),
            original,
            luts: LutCollection::new(),
            global_intensity: 1.0,
        }
    }

    /// Swap in a new image, keeping the loaded LUTs.
    pub fn load_image(&mut self, image: PixelBuffer) {
        trace!("LutSession::load_image({}x{})", image.width(), image.height());
        self.original = image.cap_aspect_ratio();
        self.current = self.original.clone();
    }

    pub fn luts(&self) -> &LutCollection {
        &self.luts
    }

    pub fn luts_mut(&mut self) -> &mut LutCollection {
        &mut self.luts
    }

    pub fn original(&self) -> &PixelBuffer {
        &self.original
    }

    pub fn current(&self) -> &PixelBuffer {
        &self.current
    }

    pub fn global_intensity(&self) -> f32 {
        self.global_intensity
    }

    /// Re-grade the original with the enabled LUTs at `global_intensity`.
    pub fn process(&mut self, global_intensity: f32) -> Result<&PixelBuffer> {
        if !(0.0..=1.0).contains(&global_intensity) {
            return Err(Error::Validation(format!(
                "global intensity must be within [0, 1], got {global_intensity}"
            )));
        }
        self.global_intensity = global_intensity;
        debug!(
            "processing {} active LUTs at {}",
            self.luts.active().count(),
            global_intensity
        );
        self.current = apply_luts(&self.original, self.luts.active(), global_intensity);
        Ok(&self.current)
    }

    /// Drop every grade, restoring the pixels as loaded (still cropped).
    pub fn reset(&mut self) {
        self.current = self.original.clone();
    }
}
