//! Reader for the Resolve/Adobe `.cube` 3D LUT format.

use super::{Lut3d, MAX_SIZE};
use crate::error::{Error, Result};
use tracing::{debug, trace};

fn parse_floats<const N: usize>(fields: &[&str], line: &str) -> Result<[f32; N]> {
    if fields.len() < N {
        return Err(Error::parse(format!("expected {N} numbers"), line));
    }
    let mut out = [0.0f32; N];
    for (slot, field) in out.iter_mut().zip(fields) {
        *slot = field
            .parse()
            .map_err(|_| Error::parse(format!("`{field}` is not a number"), line))?;
    }
    Ok(out)
}

/// Parse `.cube` text. `filename` supplies the title when the file has none.
///
/// Without `LUT_3D_SIZE` the size is inferred from the row count, which must
/// then be a perfect cube.
pub fn parse_cube(content: &str, filename: &str) -> Result<Lut3d> {
    trace!("parse_cube(filename={filename}, len={})", content.len());
    let mut title = filename
        .strip_suffix(".cube")
        .unwrap_or(filename)
        .to_string();
    let mut size: Option<usize> = None;
    let mut domain_min = [0.0f32; 3];
    let mut domain_max = [1.0f32; 3];
    let mut data: Vec<[f32; 3]> = Vec::new();

    for raw in content.trim_start_matches('\u{feff}').lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();
        match fields[0] {
            "TITLE" => {
                if let Some(quoted) = line.split('"').nth(1) {
                    title = quoted.to_string();
                }
            }
            "LUT_3D_SIZE" => {
                let [n] = parse_floats::<1>(&fields[1..], line)?;
                if n < 1.0 || n.fract() != 0.0 {
                    return Err(Error::parse("LUT_3D_SIZE must be a positive integer", line));
                }
                if n > MAX_SIZE as f32 {
                    return Err(Error::Format(format!(
                        "LUT_3D_SIZE {n} exceeds the supported maximum of {MAX_SIZE}"
                    )));
                }
                size = Some(n as usize);
            }
            "DOMAIN_MIN" => domain_min = parse_floats::<3>(&fields[1..], line)?,
            "DOMAIN_MAX" => domain_max = parse_floats::<3>(&fields[1..], line)?,
            "LUT_1D_SIZE" => {
                return Err(Error::Format("1D LUTs are not supported".into()));
            }
            keyword if keyword.starts_with(|c: char| c.is_ascii_uppercase() || c == '_') => {
                debug!("ignoring cube directive {keyword}");
            }
            _ => data.push(parse_floats::<3>(&fields, line)?),
        }
    }

    if data.is_empty() {
        return Err(Error::Format("LUT contains no data rows".into()));
    }
    let size = size.unwrap_or_else(|| (data.len() as f64).cbrt().round() as usize);
    let mut lut = Lut3d::new(title, size, data)?;
    lut.domain_min = domain_min;
    lut.domain_max = domain_max;
    debug!("parsed {}³ LUT `{}`", lut.size, lut.title);
    Ok(lut)
}
