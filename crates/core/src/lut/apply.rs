//! Per-pixel LUT application with trilinear interpolation.

use super::image::PixelBuffer;
use super::Lut3d;
use rayon::prelude::*;
use tracing::trace;

#[inline]
fn lerp(a: [f32; 3], b: [f32; 3], t: f32) -> [f32; 3] {
    [
        a[0] + t * (b[0] - a[0]),
        a[1] + t * (b[1] - a[1]),
        a[2] + t * (b[2] - a[2]),
    ]
}

/// Sample `lut` at the normalized colour `rgb`, interpolating between the eight
/// surrounding lattice points.
pub fn sample(lut: &Lut3d, rgb: [f32; 3]) -> [f32; 3] {
    let max_index = lut.size - 1;
    let mut low = [0usize; 3];
    let mut high = [0usize; 3];
    let mut frac = [0.0f32; 3];
    for axis in 0..3 {
        let coord = rgb[axis] * max_index as f32;
        let floor = (coord.floor().max(0.0) as usize).min(max_index);
        low[axis] = floor;
        high[axis] = (floor + 1).min(max_index);
        frac[axis] = coord - floor as f32;
    }
    let c = |r: usize, g: usize, b: usize| lut.cell(r, g, b);

    let c00 = lerp(c(low[0], low[1], low[2]), c(high[0], low[1], low[2]), frac[0]);
    let c01 = lerp(c(low[0], low[1], high[2]), c(high[0], low[1], high[2]), frac[0]);
    let c10 = lerp(c(low[0], high[1], low[2]), c(high[0], high[1], low[2]), frac[0]);
    let c11 = lerp(c(low[0], high[1], high[2]), c(high[0], high[1], high[2]), frac[0]);

    let c0 = lerp(c00, c10, frac[1]);
    let c1 = lerp(c01, c11, frac[1]);

    lerp(c0, c1, frac[2])
}

#[inline]
fn to_byte(v: f32) -> u8 {
    (v * 255.0).round().clamp(0.0, 255.0) as u8
}

fn grade_pixel(lut: &Lut3d, intensity: f32, px: &mut [u8]) {
    let mut rgb = [0.0f32; 3];
    for axis in 0..3 {
        let v = px[axis] as f32 / 255.0;
        rgb[axis] = v.max(lut.domain_min[axis]).min(lut.domain_max[axis]);
    }
    let mapped = sample(lut, rgb);
    for axis in 0..3 {
        px[axis] = to_byte(rgb[axis] + intensity * (mapped[axis] - rgb[axis]));
    }
}

/// Apply one LUT to a copy of `pixels`, blending `intensity` of the way toward
/// the mapped colour. Alpha is left alone. A disabled LUT or zero intensity
/// returns the input unchanged.
pub fn apply_lut(pixels: &PixelBuffer, lut: &Lut3d, intensity: f32) -> PixelBuffer {
    let mut out = pixels.clone();
    apply_lut_in_place(&mut out, lut, intensity);
    out
}

fn apply_lut_in_place(pixels: &mut PixelBuffer, lut: &Lut3d, intensity: f32) {
    trace!(
        "apply_lut(title={}, size={}, intensity={}, {}x{})",
        lut.title,
        lut.size,
        intensity,
        pixels.width(),
        pixels.height()
    );
    if !lut.enabled || intensity == 0.0 {
        return;
    }
    let row_bytes = (pixels.width() as usize * 4).max(4);
    pixels.data_mut().par_chunks_mut(row_bytes).for_each(|row| {
        for px in row.chunks_exact_mut(4) {
            grade_pixel(lut, intensity, px);
        }
    });
}

/// Apply the enabled LUTs in order, each one grading the output of the one
/// before. Each LUT blends at its own intensity times `global_intensity`.
pub fn apply_luts<'a>(
    pixels: &PixelBuffer,
    luts: impl IntoIterator<Item = &'a Lut3d>,
    global_intensity: f32,
) -> PixelBuffer {
    let mut out = pixels.clone();
    for lut in luts.into_iter().filter(|lut| lut.enabled) {
        apply_lut_in_place(&mut out, lut, lut.intensity * global_intensity);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient() -> PixelBuffer {
        let mut data = Vec::new();
        for i in 0..64u32 {
            data.extend_from_slice(&[(i * 4) as u8, (255 - i * 3) as u8, (i * 7 % 256) as u8, 200]);
        }
        PixelBuffer::from_rgba(8, 8, data).unwrap()
    }

    fn invert() -> Lut3d {
        let identity = Lut3d::identity(2).unwrap();
        let data = identity.data().iter().map(|c| [1.0 - c[0], 1.0 - c[1], 1.0 - c[2]]).collect();
        Lut3d::new("invert", 2, data).unwrap()
    }

    #[test]
    fn identity_lut_is_lossless() {
        let img = gradient();
        for size in [2, 17, 33] {
            let out = apply_lut(&img, &Lut3d::identity(size).unwrap(), 1.0);
            assert_eq!(out, img);
        }
    }

    #[test]
    fn zero_intensity_is_noop() {
        let img = gradient();
        assert_eq!(apply_lut(&img, &invert(), 0.0), img);
        let mut disabled = invert();
        disabled.enabled = false;
        assert_eq!(apply_lut(&img, &disabled, 1.0), img);
    }

    /// Ensure colours invert, partial intensity blends linearly, and alpha is kept.
    #[test]
    fn blends_toward_mapped_colour() {
        let img = PixelBuffer::from_rgba(1, 1, vec![255, 0, 51, 9]).unwrap();
        let full = apply_lut(&img, &invert(), 1.0);
        assert_eq!(full.data(), &[0, 255, 204, 9]);
        let quarter = apply_lut(&img, &invert(), 0.25);
        assert_eq!(quarter.data(), &[191, 64, 89, 9]);
    }

    #[test]
    fn composes_in_order() {
        let img = gradient();
        let (first, second) = (invert(), invert());
        let twice = apply_luts(&img, [&first, &second], 1.0);
        assert_eq!(twice, img);
        let skipped = apply_luts(&img, [&first, &second], 0.0);
        assert_eq!(skipped, img);
    }

    /// Ensure channels outside the declared domain are clamped before lookup.
    #[test]
    fn clamps_to_domain() {
        let mut lut = Lut3d::identity(2).unwrap();
        lut.domain_min = [0.2; 3];
        lut.domain_max = [0.8; 3];
        let img = PixelBuffer::from_rgba(1, 1, vec![0, 255, 128, 7]).unwrap();
        let out = apply_lut(&img, &lut, 1.0);
        assert_eq!(out.data(), &[51, 204, 128, 7]);
    }

    #[test]
    fn interpolates_between_points() {
        let lut = Lut3d::identity(2).unwrap();
        let out = sample(&lut, [0.25, 0.5, 0.75]);
        assert!((out[0] - 0.25).abs() < 1e-6);
        assert!((out[1] - 0.5).abs() < 1e-6);
        assert!((out[2] - 0.75).abs() < 1e-6);
    }
}
