//! 3D LUT colour grading: `.cube` parsing, trilinear sampling, and the
//! collection/session types a previewer keeps between edits.

pub mod apply;
pub mod cube;
pub mod image;
pub mod preview;
pub mod session;

pub use apply::{apply_lut, apply_luts};
pub use cube::parse_cube;
pub use image::PixelBuffer;
pub use preview::PreviewWorker;
pub use session::LutSession;

use crate::error::{Error, Result};
use tracing::{debug, trace};

/// Largest lattice accepted, in points per axis.
pub const MAX_SIZE: usize = 256;

fn cell_count(size: usize) -> Result<usize> {
    if size == 0 || size > MAX_SIZE {
        return Err(Error::Format(format!(
            "LUT size must be between 1 and {MAX_SIZE}, got {size}"
        )));
    }
    Ok(size * size * size)
}

/// A parsed 3D lookup table.
#[derive(Debug, Clone, PartialEq)]
pub struct Lut3d {
    pub title: String,
    /// Points per axis; the lattice holds `size³` entries.
    pub size: usize,
    pub domain_min: [f32; 3],
    pub domain_max: [f32; 3],
    /// Output colours, red varying fastest: cell (r, g, b) lives at
    /// `b * size * size + g * size + r`.
    data: Vec<[f32; 3]>,
    pub enabled: bool,
    /// Blend strength in [0, 1].
    pub intensity: f32,
}

impl Lut3d {
    /// Build a lattice, checking that `data` holds exactly `size³` entries.
    pub fn new(title: impl Into<String>, size: usize, data: Vec<[f32; 3]>) -> Result<Self> {
        let expected = cell_count(size)?;
        if data.len() != expected {
            return Err(Error::Format(format!(
                "invalid LUT data: expected {expected} entries, got {}",
                data.len()
            )));
        }
        Ok(Self {
            title: title.into(),
            size,
            domain_min: [0.0; 3],
            domain_max: [1.0; 3],
            data,
            enabled: true,
            intensity: 1.0,
        })
    }

    /// The identity lattice of `size` points per axis.
    pub fn identity(size: usize) -> Result<Self> {
        let step = 1.0 / (size.max(2) - 1) as f32;
        let data = (0..cell_count(size)?)
            .map(|i| {
                let r = i % size;
                let g = (i / size) % size;
                let b = i / (size * size);
                [r as f32 * step, g as f32 * step, b as f32 * step]
            })
            .collect();
        Self::new("identity", size, data)
    }

    pub fn data(&self) -> &[[f32; 3]] {
        &self.data
    }

    /// Lattice value at integer coordinates.
    #[inline]
    pub fn cell(&self, r: usize, g: usize, b: usize) -> [f32; 3] {
        self.data[(b * self.size + g) * self.size + r]
    }
}

/// Property changes accepted by [`LutCollection::update`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LutUpdate {
    pub enabled: Option<bool>,
    pub intensity: Option<f32>,
}

/// LUTs keyed by file name. Insertion order is application order.
#[derive(Debug, Clone, Default)]
pub struct LutCollection {
    entries: Vec<(String, Lut3d)>,
}

impl LutCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `content` and store it under `filename`. Re-adding a name replaces
    /// the old table in place.
    pub fn add(&mut self, filename: &str, content: &str) -> Result<&Lut3d> {
        trace!("LutCollection::add(filename={filename})");
        let lut = parse_cube(content, filename)?;
        let pos = match self.entries.iter().position(|(name, _)| name == filename) {
            Some(pos) => {
                self.entries[pos].1 = lut;
                pos
            }
            None => {
                self.entries.push((filename.to_string(), lut));
                self.entries.len() - 1
            }
        };
        debug!("{} LUTs loaded", self.entries.len());
        Ok(&self.entries[pos].1)
    }

    pub fn remove(&mut self, filename: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(name, _)| name != filename);
        self.entries.len() != before
    }

    pub fn get(&self, filename: &str) -> Option<&Lut3d> {
        self.entries
            .iter()
            .find(|(name, _)| name == filename)
            .map(|(_, lut)| lut)
    }

    /// Toggle or re-weight a stored LUT. Returns `Ok(None)` for an unknown name.
    pub fn update(&mut self, filename: &str, update: LutUpdate) -> Result<Option<&Lut3d>> {
        if let Some(intensity) = update.intensity {
            if !(0.0..=1.0).contains(&intensity) {
                return Err(Error::Validation(format!(
                    "LUT intensity must be within [0, 1], got {intensity}"
                )));
            }
        }
        let Some((_, lut)) = self.entries.iter_mut().find(|(name, _)| name == filename) else {
            return Ok(None);
        };
        if let Some(enabled) = update.enabled {
            lut.enabled = enabled;
        }
        if let Some(intensity) = update.intensity {
            lut.intensity = intensity;
        }
        Ok(Some(lut))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Lut3d)> {
        self.entries.iter().map(|(name, lut)| (name.as_str(), lut))
    }

    /// Enabled LUTs in application order.
    pub fn active(&self) -> impl Iterator<Item = &Lut3d> {
        self.entries.iter().map(|(_, lut)| lut).filter(|lut| lut.enabled)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
