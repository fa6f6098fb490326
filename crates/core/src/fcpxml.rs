//! Final Cut Pro XML (FCPXML 1.7) export.
//!
//! Every cue becomes a `Basic Title` inside a single gap on the primary
//! storyline. Times are expressed as rational frame counts so they land on
//! frame boundaries for the chosen rate.

use crate::error::{Error, Result};
use crate::srt::Cue;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use serde::Deserialize;
use std::io::Cursor;
use std::str::FromStr;
use tracing::{debug, trace, warn};

/// Rates Final Cut Pro offers for a new project.
pub const SUPPORTED_RATES: [&str; 8] = ["23.98", "24", "25", "29.97", "30", "50", "59.94", "60"];

const TITLE_UID: &str =
    ".../Titles.localized/Bumper:Opener.localized/Basic Title.localized/Basic Title.moti";
/// Timescale of title durations.
const DURATION_SCALE: u64 = 120_000;
/// Longest title name shown in the timeline.
const NAME_CHARS: usize = 50;

/// Project frame rate. NTSC rates such as `29.97` run at `1001/30000 s` per frame.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(try_from = "String")]
pub enum FrameRate {
    Whole(u32),
    Fractional(f64),
}

impl FrameRate {
    pub fn fps(self) -> f64 {
        match self {
            FrameRate::Whole(r) => r as f64,
            FrameRate::Fractional(r) => r,
        }
    }

    /// Numerator of one frame's duration.
    fn molecular(self) -> u64 {
        match self {
            FrameRate::Whole(_) => 100,
            FrameRate::Fractional(_) => 1001,
        }
    }

    /// Timescale all offsets are written in.
    fn denominator(self) -> u64 {
        match self {
            FrameRate::Whole(r) => r as u64 * 100,
            FrameRate::Fractional(r) => round_half_up(r) * 1000,
        }
    }

    /// Timeline start, one hour in, in units of `1 / denominator` seconds.
    fn project_start(self) -> u64 {
        self.denominator() * self.molecular() * 36 / 10
    }

    fn frames(self, seconds: f64) -> u64 {
        round_half_up(seconds * self.fps())
    }
}

impl FromStr for FrameRate {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if !SUPPORTED_RATES.contains(&s) {
            warn!("frame rate {s} may not be supported by Final Cut Pro");
        }
        let rate = if s.contains('.') {
            match s.parse::<f64>() {
                Ok(r) if r.is_finite() && r > 0.0 => FrameRate::Fractional(r),
                _ => return Err(Error::Validation(format!("invalid frame rate `{s}`"))),
            }
        } else {
            match s.parse::<u32>() {
                Ok(r) if r > 0 => FrameRate::Whole(r),
                _ => return Err(Error::Validation(format!("invalid frame rate `{s}`"))),
            }
        };
        Ok(rate)
    }
}

impl TryFrom<String> for FrameRate {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl Default for FrameRate {
    fn default() -> Self {
        FrameRate::Whole(60)
    }
}

/// Horizontal placement of the titles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    Left,
    #[default]
    Center,
    Right,
}

impl Alignment {
    fn param(self) -> &'static str {
        match self {
            Alignment::Left => "0 (Left)",
            Alignment::Center => "1 (Center)",
            Alignment::Right => "2 (Right)",
        }
    }

    fn x_position(self) -> i32 {
        match self {
            Alignment::Left => -840,
            Alignment::Center => 0,
            Alignment::Right => 840,
        }
    }
}

impl FromStr for Alignment {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "left" => Ok(Alignment::Left),
            "center" => Ok(Alignment::Center),
            "right" => Ok(Alignment::Right),
            other => Err(Error::Validation(format!("unknown alignment `{other}`"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FcpxmlOptions {
    pub frame_rate: FrameRate,
    pub width: u32,
    pub height: u32,
    pub alignment: Alignment,
    /// Vertical title position; negative is below centre.
    pub y_position: i32,
    /// Empty means the input file's stem.
    pub project_name: String,
    pub event_name: String,
}

impl Default for FcpxmlOptions {
    fn default() -> Self {
        Self {
            frame_rate: FrameRate::default(),
            width: 1920,
            height: 1080,
            alignment: Alignment::default(),
            y_position: -420,
            project_name: String::new(),
            event_name: "_FCPXMLs".into(),
        }
    }
}

fn round_half_up(value: f64) -> u64 {
    (value.max(0.0) + 0.5).floor() as u64
}

type XmlWriter = Writer<Cursor<Vec<u8>>>;

fn open(writer: &mut XmlWriter, name: &str, attrs: &[(&str, &str)]) -> Result<()> {
    let elem = BytesStart::new(name).with_attributes(attrs.iter().copied());
    writer.write_event(Event::Start(elem))?;
    Ok(())
}

fn close(writer: &mut XmlWriter, name: &str) -> Result<()> {
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

fn empty(writer: &mut XmlWriter, name: &str, attrs: &[(&str, &str)]) -> Result<()> {
    let elem = BytesStart::new(name).with_attributes(attrs.iter().copied());
    writer.write_event(Event::Empty(elem))?;
    Ok(())
}

fn write_title(writer: &mut XmlWriter, cue: &Cue, id: usize, opts: &FcpxmlOptions) -> Result<()> {
    let rate = opts.frame_rate;
    let den = rate.denominator();
    let offset = rate.frames(cue.start) * rate.molecular() + rate.project_start();
    let duration = rate.frames(cue.duration()) * rate.molecular() * DURATION_SCALE / den;
    let name: String = cue.text.replace('\n', " ").chars().take(NAME_CHARS).collect();
    let style = format!("ts{id}");
    let offset = format!("{offset}/{den}s");
    let duration = format!("{duration}/{DURATION_SCALE}s");
    let start = format!("{}/{den}s", rate.project_start());

    open(
        writer,
        "title",
        &[
            ("name", name.as_str()),
            ("lane", "1"),
            ("offset", offset.as_str()),
            ("ref", "r2"),
            ("duration", duration.as_str()),
            ("start", start.as_str()),
        ],
    )?;
    let position = format!("{} {}", opts.alignment.x_position(), opts.y_position);
    let params = [
        ("Position", "9999/999166631/999166633/1/100/101", position.as_str()),
        ("Alignment", "9999/999166631/999166633/2/354/999169573/401", opts.alignment.param()),
        ("Flatten", "9999/999166631/999166633/2/351", "1"),
    ];
    for (name, key, value) in params {
        empty(writer, "param", &[("name", name), ("key", key), ("value", value)])?;
    }

    // `text` has to come before `text-style-def`.
    open(writer, "text", &[])?;
    open(writer, "text-style", &[("ref", style.as_str())])?;
    writer.write_event(Event::Text(BytesText::new(&cue.text)))?;
    close(writer, "text-style")?;
    close(writer, "text")?;

    open(writer, "text-style-def", &[("id", style.as_str())])?;
    empty(
        writer,
        "text-style",
        &[
            ("font", "Helvetica"),
            ("fontSize", "72"),
            ("fontFace", "Regular"),
            ("fontColor", "1 1 1 1"),
            ("alignment", "center"),
        ],
    )?;
    close(writer, "text-style-def")?;
    close(writer, "title")
}

/// Render `cues` as an FCPXML document.
pub fn write(cues: &[Cue], opts: &FcpxmlOptions) -> Result<String> {
    trace!("fcpxml::write(count={}, opts={:?})", cues.len(), opts);
    if cues.is_empty() {
        return Err(Error::Format("no subtitles to export".into()));
    }
    let rate = opts.frame_rate;
    let den = rate.denominator();
    let total = cues.iter().map(|c| c.end).fold(0.0, f64::max);
    let duration = format!("{}/{den}s", rate.frames(total) * rate.molecular());
    let start = format!("{}/{den}s", rate.project_start());
    let format_name = format!(
        "FFVideoFormat{}x{}p{}",
        opts.width,
        opts.height,
        (rate.fps() * 100.0 + 1e-6) as u64
    );
    let frame_duration = format!("{}/{den}s", rate.molecular());
    let width = opts.width.to_string();
    let height = opts.height.to_string();
    let project = match opts.project_name.as_str() {
        "" => "Untitled",
        name => name,
    };

    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 4);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    writer.write_event(Event::DocType(BytesText::from_escaped("fcpxml")))?;

    open(&mut writer, "fcpxml", &[("version", "1.7")])?;
    open(&mut writer, "resources", &[])?;
    empty(
        &mut writer,
        "format",
        &[
            ("id", "r1"),
            ("name", format_name.as_str()),
            ("frameDuration", frame_duration.as_str()),
            ("width", width.as_str()),
            ("height", height.as_str()),
            ("colorSpace", "1-1-1 (Rec. 709)"),
        ],
    )?;
    empty(
        &mut writer,
        "effect",
        &[("id", "r2"), ("name", "Basic Title"), ("uid", TITLE_UID)],
    )?;
    close(&mut writer, "resources")?;

    open(&mut writer, "library", &[])?;
    open(&mut writer, "event", &[("name", opts.event_name.as_str())])?;
    open(&mut writer, "project", &[("name", project)])?;
    open(
        &mut writer,
        "sequence",
        &[
            ("format", "r1"),
            ("duration", duration.as_str()),
            ("tcStart", "0s"),
            ("tcFormat", "NDF"),
            ("audioLayout", "stereo"),
            ("audioRate", "48k"),
        ],
    )?;
    open(&mut writer, "spine", &[])?;
    open(
        &mut writer,
        "gap",
        &[
            ("name", "Gap"),
            ("offset", "0s"),
            ("duration", duration.as_str()),
            ("start", start.as_str()),
        ],
    )?;
    for (i, cue) in cues.iter().enumerate() {
        write_title(&mut writer, cue, i + 1, opts)?;
    }
    for name in ["gap", "spine", "sequence", "project", "event", "library", "fcpxml"] {
        close(&mut writer, name)?;
    }

    let mut xml = String::from_utf8(writer.into_inner().into_inner())
        .map_err(|e| Error::Format(format!("generated XML is not UTF-8: {e}")))?;
    xml.push('\n');
    debug!("wrote {} titles to FCPXML", cues.len());
    Ok(xml)
}
