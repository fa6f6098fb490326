//! Timecode codec for the SRT, VTT, LRC and BCC notations.
//!
//! All timecodes are exchanged as floating point seconds. Formatting rounds to
//! the nearest millisecond (centisecond for LRC) and clamps negative values to zero.

use crate::error::{Error, Result};

/// The textual notation of a timecode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimecodeFormat {
    /// `HH:MM:SS,mmm`
    Srt,
    /// `HH:MM:SS.mmm` (hours optional when parsing)
    Vtt,
    /// `[M+:SS.xx]` or `[M+:SS.xxx]`
    Lrc,
    /// Plain floating point seconds.
    Bcc,
}

/// Parse `text` written in `format` into seconds.
pub fn parse_timecode(text: &str, format: TimecodeFormat) -> Result<f64> {
    let trimmed = text.trim();
    let millis = match format {
        TimecodeFormat::Srt => parse_clock(trimmed, ',', false),
        TimecodeFormat::Vtt => parse_clock(trimmed, '.', true),
        TimecodeFormat::Lrc => parse_lrc(trimmed),
        TimecodeFormat::Bcc => {
            return match trimmed.parse::<f64>() {
                Ok(v) if v.is_finite() && v >= 0.0 => Ok(v),
                _ => Err(Error::parse("invalid BCC seconds", trimmed)),
            }
        }
    };
    millis
        .map(|ms| ms as f64 / 1000.0)
        .ok_or_else(|| Error::parse(format!("invalid {format:?} timecode"), trimmed))
}

/// Format `seconds` in the notation of `format`.
pub fn format_timecode(seconds: f64, format: TimecodeFormat) -> String {
    let ms = to_millis(seconds);
    match format {
        TimecodeFormat::Srt => format_clock(ms, ','),
        TimecodeFormat::Vtt => format_clock(ms, '.'),
        TimecodeFormat::Lrc => {
            let cs = (ms + 5) / 10;
            let minutes = cs / 6000;
            let secs = (cs % 6000) / 100;
            format!("[{:02}:{:02}.{:02}]", minutes, secs, cs % 100)
        }
        TimecodeFormat::Bcc => {
            let whole = ms / 1000;
            let frac = ms % 1000;
            if frac == 0 {
                format!("{whole}")
            } else {
                format!("{whole}.{frac:03}")
                    .trim_end_matches('0')
                    .to_string()
            }
        }
    }
}

/// Round seconds to whole milliseconds, clamping negatives to zero.
pub fn to_millis(seconds: f64) -> u64 {
    if !seconds.is_finite() || seconds <= 0.0 {
        return 0;
    }
    (seconds * 1000.0).round() as u64
}

fn format_clock(ms: u64, separator: char) -> String {
    let h = ms / 3_600_000;
    let m = (ms % 3_600_000) / 60_000;
    let s = (ms % 60_000) / 1000;
    let frac = ms % 1000;
    format!("{h:02}:{m:02}:{s:02}{separator}{frac:03}")
}

/// Parse `[H+:]MM:SS<sep>mmm` into milliseconds.
fn parse_clock(text: &str, separator: char, hours_optional: bool) -> Option<u64> {
    let (clock, frac) = text.split_once(separator)?;
    if frac.len() != 3 {
        return None;
    }
    let ms = digits(frac)?;
    let parts: Vec<&str> = clock.split(':').collect();
    let (h, m, s) = match parts.as_slice() {
        [h, m, s] => (digits(h)?, two_digits(m)?, two_digits(s)?),
        [m, s] if hours_optional => (0, two_digits(m)?, two_digits(s)?),
        _ => return None,
    };
    if m >= 60 || s >= 60 {
        return None;
    }
    h.checked_mul(3_600_000)?.checked_add((m * 60 + s) * 1000 + ms)
}

/// Parse `[M+:SS.xx]`, brackets optional. Two fractional digits are centiseconds,
/// three are milliseconds.
fn parse_lrc(text: &str) -> Option<u64> {
    let inner = match (text.strip_prefix('['), text.ends_with(']')) {
        (Some(rest), true) => &rest[..rest.len() - 1],
        (None, false) => text,
        _ => return None,
    };
    let (minutes, rest) = inner.split_once(':')?;
    let (secs, frac) = rest.split_once('.')?;
    let m = digits(minutes)?;
    let s = two_digits(secs)?;
    if s >= 60 {
        return None;
    }
    let frac_ms = match frac.len() {
        2 => digits(frac)? * 10,
        3 => digits(frac)?,
        _ => return None,
    };
    m.checked_mul(60_000)?.checked_add(s * 1000 + frac_ms)
}

fn digits(text: &str) -> Option<u64> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

fn two_digits(text: &str) -> Option<u64> {
    if text.len() != 2 {
        return None;
    }
    digits(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn srt_roundtrip_is_exact_to_the_millisecond() {
        let secs = parse_timecode("01:02:03,456", TimecodeFormat::Srt).unwrap();
        assert!((secs - 3723.456).abs() < 1e-9);
        assert_eq!(format_timecode(secs, TimecodeFormat::Srt), "01:02:03,456");
    }

    #[test]
    fn negative_seconds_clamp_to_zero() {
        assert_eq!(format_timecode(-4.2, TimecodeFormat::Srt), "00:00:00,000");
    }

    /// Ensure VTT only differs from SRT by the fraction separator.
    #[test]
    fn vtt_uses_a_period() {
        assert_eq!(format_timecode(61.5, TimecodeFormat::Vtt), "00:01:01.500");
        let secs = parse_timecode("01:01.500", TimecodeFormat::Vtt).unwrap();
        assert!((secs - 61.5).abs() < 1e-9);
        assert!(parse_timecode("00:00:01,500", TimecodeFormat::Vtt).is_err());
    }

    #[test]
    fn lrc_centiseconds_and_milliseconds() {
        let cs = parse_timecode("[00:02.50]", TimecodeFormat::Lrc).unwrap();
        let ms = parse_timecode("[0:02.505]", TimecodeFormat::Lrc).unwrap();
        assert!((cs - 2.5).abs() < 1e-9);
        assert!((ms - 2.505).abs() < 1e-9);
        assert_eq!(format_timecode(125.25, TimecodeFormat::Lrc), "[02:05.25]");
    }

    #[test]
    fn bcc_seconds() {
        let secs = parse_timecode("12.3", TimecodeFormat::Bcc).unwrap();
        assert_eq!(format_timecode(secs, TimecodeFormat::Bcc), "12.3");
        assert_eq!(format_timecode(4.0, TimecodeFormat::Bcc), "4");
    }

    /// Ensure malformed input reports the offending text.
    #[test]
    fn malformed_timecode_carries_fragment() {
        match parse_timecode("00:61:00,000", TimecodeFormat::Srt) {
            Err(Error::Parse { fragment, .. }) => assert_eq!(fragment, "00:61:00,000"),
            other => panic!("unexpected {other:?}"),
        }
        assert!(parse_timecode("00:00:01,5", TimecodeFormat::Srt).is_err());
        assert!(parse_timecode("[00:01.5]", TimecodeFormat::Lrc).is_err());
    }

    /// Ensure absurd hour or minute fields are rejected instead of overflowing.
    #[test]
    fn huge_fields_are_parse_errors() {
        let srt = parse_timecode("18446744073709551615:00:00,000", TimecodeFormat::Srt);
        assert!(matches!(srt, Err(Error::Parse { .. })));
        let lrc = parse_timecode("[18446744073709551615:00.00]", TimecodeFormat::Lrc);
        assert!(matches!(lrc, Err(Error::Parse { .. })));
    }
}
