//! Conversion dispatch.
//! Each [`Tool`] maps to a [`Pipeline`] in a static table, and the file helpers
//! read an input, run its pipeline and write the result next to it.

use crate::error::{Error, Result};
use crate::fcpxml::{self, FcpxmlOptions};
use crate::lrc::{self, lrcx::{self, LrcxMode}};
use crate::srt::{self, Cue};
use crate::transform::{self, CleanOptions, ExtractOptions};
use crate::{bcc, vtt};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, trace, warn};

/// Every single-input tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    LrcToSrt,
    LrcxToSrt,
    VttToSrt,
    BccToSrt,
    TimeShift,
    Clean,
    SplitLines,
    ExtractText,
    SrtToFcpxml,
}

/// The tools that turn another format into SRT.
pub const TO_SRT: [Tool; 4] = [Tool::LrcToSrt, Tool::LrcxToSrt, Tool::VttToSrt, Tool::BccToSrt];

/// Parameters for every tool. Each tool reads only the fields it needs.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConvertOptions {
    pub mode: LrcxMode,
    /// Time shift in seconds.
    pub offset: f64,
    pub clean: CleanOptions,
    pub max_chars: usize,
    pub extract: ExtractOptions,
    pub fcpxml: FcpxmlOptions,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            mode: LrcxMode::default(),
            offset: 0.0,
            clean: CleanOptions::default(),
            max_chars: transform::DEFAULT_MAX_CHARS,
            extract: ExtractOptions::default(),
            fcpxml: FcpxmlOptions::default(),
        }
    }
}

type ParseFn = fn(&str, &ConvertOptions) -> Result<Vec<Cue>>;
type TransformFn = fn(Vec<Cue>, &ConvertOptions) -> Result<Vec<Cue>>;
type SerializeFn = fn(&[Cue], &ConvertOptions) -> Result<String>;
type TextFn = fn(&str, &ConvertOptions) -> Result<String>;

/// How a tool turns its input into output text.
pub enum Pipeline {
    Cues {
        parse: ParseFn,
        transform: TransformFn,
        serialize: SerializeFn,
    },
    /// Tools that work line by line on the raw text.
    Text(TextFn),
}

fn keep(cues: Vec<Cue>, _: &ConvertOptions) -> Result<Vec<Cue>> {
    Ok(cues)
}

fn parse_srt(text: &str, _: &ConvertOptions) -> Result<Vec<Cue>> {
    srt::parse(text)
}

fn write_srt(cues: &[Cue], _: &ConvertOptions) -> Result<String> {
    Ok(srt::format(cues))
}

const fn to_srt(parse: ParseFn) -> Pipeline {
    Pipeline::Cues {
        parse,
        transform: keep,
        serialize: write_srt,
    }
}

const fn on_srt(transform: TransformFn) -> Pipeline {
    Pipeline::Cues {
        parse: parse_srt,
        transform,
        serialize: write_srt,
    }
}

// Ordered like the variants of `Tool`.
static PIPELINES: [(Tool, Pipeline); 9] = [
    (Tool::LrcToSrt, to_srt(|text, _| lrc::parse(text))),
    (Tool::LrcxToSrt, to_srt(|text, opts| lrcx::parse(text, opts.mode))),
    (Tool::VttToSrt, to_srt(|text, _| vtt::parse(text))),
    (Tool::BccToSrt, to_srt(|text, _| bcc::parse(text))),
    (
        Tool::TimeShift,
        Pipeline::Text(|text, opts| transform::shift_srt(text, opts.offset)),
    ),
    (
        Tool::Clean,
        on_srt(|cues, opts| transform::clean_cues(&cues, &opts.clean)),
    ),
    (
        Tool::SplitLines,
        on_srt(|cues, opts| transform::split_cues(&cues, opts.max_chars)),
    ),
    (
        Tool::ExtractText,
        Pipeline::Text(|text, opts| Ok(transform::extract_text(text, &opts.extract))),
    ),
    (
        Tool::SrtToFcpxml,
        Pipeline::Cues {
            parse: parse_srt,
            transform: keep,
            serialize: |cues, opts| fcpxml::write(cues, &opts.fcpxml),
        },
    ),
];

impl Tool {
    pub fn pipeline(self) -> &'static Pipeline {
        let (tool, pipeline) = &PIPELINES[self as usize];
        debug_assert_eq!(*tool, self);
        pipeline
    }

    /// Pick the format conversion for a file extension.
    pub fn from_extension(ext: &str) -> Option<Tool> {
        match ext.to_ascii_lowercase().as_str() {
            "lrc" => Some(Tool::LrcToSrt),
            "lrcx" => Some(Tool::LrcxToSrt),
            "vtt" => Some(Tool::VttToSrt),
            "bcc" => Some(Tool::BccToSrt),
            _ => None,
        }
    }

    /// Extension of the files this tool reads.
    pub fn input_extension(self) -> &'static str {
        match self {
            Tool::LrcToSrt => "lrc",
            Tool::LrcxToSrt => "lrcx",
            Tool::VttToSrt => "vtt",
            Tool::BccToSrt => "bcc",
            Tool::TimeShift
            | Tool::Clean
            | Tool::SplitLines
            | Tool::ExtractText
            | Tool::SrtToFcpxml => "srt",
        }
    }

    /// Output file name for an input with stem `stem`.
    pub fn output_name(self, stem: &str) -> String {
        match self {
            Tool::LrcToSrt | Tool::LrcxToSrt | Tool::VttToSrt | Tool::BccToSrt => {
                format!("{stem}.srt")
            }
            Tool::TimeShift => format!("{stem}_shifted.srt"),
            Tool::Clean => format!("{stem}_cleaned.srt"),
            Tool::SplitLines => format!("{stem}_split.srt"),
            Tool::ExtractText => format!("{stem}.txt"),
            Tool::SrtToFcpxml => format!("{stem}.fcpxml"),
        }
    }
}

/// Run `tool` over `input`.
pub fn convert(tool: Tool, input: &str, opts: &ConvertOptions) -> Result<String> {
    trace!("convert(tool={:?}, len={})", tool, input.len());
    match tool.pipeline() {
        Pipeline::Cues {
            parse,
            transform,
            serialize,
        } => {
            let cues = transform(parse(input, opts)?, opts)?;
            serialize(&cues, opts)
        }
        Pipeline::Text(run) => run(input, opts),
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string()
}

/// Convert the file at `input` and write the result next to it.
/// Returns the path of the written file.
pub fn process_file(input: &Path, tool: Tool, opts: &ConvertOptions) -> Result<PathBuf> {
    trace!("process_file input={} tool={:?}", input.display(), tool);
    let content = fs::read_to_string(input)?;
    let stem = file_stem(input);
    let output = if tool == Tool::SrtToFcpxml && opts.fcpxml.project_name.is_empty() {
        let mut named = opts.clone();
        named.fcpxml.project_name = stem.clone();
        convert(tool, &content, &named)?
    } else {
        convert(tool, &content, opts)?
    };
    let out_path = input.with_file_name(tool.output_name(&stem));
    if out_path == input {
        return Err(Error::Validation(format!(
            "refusing to overwrite input {}",
            input.display()
        )));
    }
    fs::write(&out_path, output)?;
    info!("wrote {}", out_path.display());
    Ok(out_path)
}

/// Run `tool` over every file in `dir` with its input extension, in name order.
///
/// A file that fails is logged and skipped. Returns the paths written.
pub fn process_dir(dir: &Path, tool: Tool, opts: &ConvertOptions) -> Result<Vec<PathBuf>> {
    trace!("process_dir dir={} tool={:?}", dir.display(), tool);
    let ext = tool.input_extension();
    let mut inputs = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let matches = path
            .extension()
            .is_some_and(|e| e.to_string_lossy().eq_ignore_ascii_case(ext));
        if matches && path.is_file() {
            inputs.push(path);
        }
    }
    inputs.sort();
    debug!("found {} .{ext} files in {}", inputs.len(), dir.display());

    let mut written = Vec::with_capacity(inputs.len());
    for input in &inputs {
        match process_file(input, tool, opts) {
            Ok(out) => written.push(out),
            Err(e) => warn!("skipping {}: {e}", input.display()),
        }
    }
    Ok(written)
}

/// Merge the SRT files at `inputs`, in order, into `merged_<n>_subtitles.srt`
/// beside the first input.
pub fn merge_files(inputs: &[PathBuf], gap: f64) -> Result<PathBuf> {
    trace!("merge_files(count={}, gap={})", inputs.len(), gap);
    let first = inputs
        .first()
        .ok_or_else(|| Error::Validation("no files to merge".into()))?;
    let contents = inputs
        .iter()
        .map(fs::read_to_string)
        .collect::<std::io::Result<Vec<_>>>()?;
    let refs: Vec<&str> = contents.iter().map(String::as_str).collect();
    let merged = transform::merge_srt(&refs, gap)?;
    let out_path = first.with_file_name(format!("merged_{}_subtitles.srt", inputs.len()));
    fs::write(&out_path, merged)?;
    info!("merged {} files into {}", inputs.len(), out_path.display());
    Ok(out_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn dispatches_by_tool() {
        let opts = ConvertOptions::default();
        let out = convert(Tool::LrcToSrt, "[00:01.00]Hello", &opts).unwrap();
        assert_eq!(out, "1\n00:00:01,000 --> 00:00:03,000\nHello\n\n");

        let opts = ConvertOptions {
            offset: 1.0,
            ..Default::default()
        };
        let out = convert(Tool::TimeShift, "1\n00:00:01,000 --> 00:00:02,000\nHi\n", &opts).unwrap();
        assert_eq!(out, "1\n00:00:02,000 --> 00:00:03,000\nHi\n");
    }

    #[test]
    fn pipeline_table_matches_tools() {
        for (i, (tool, _)) in PIPELINES.iter().enumerate() {
            assert_eq!(*tool as usize, i);
        }
    }

    #[test]
    fn picks_tool_from_extension() {
        assert_eq!(Tool::from_extension("VTT"), Some(Tool::VttToSrt));
        assert_eq!(Tool::from_extension("srt"), None);
    }

    #[test]
    fn reads_options_json() {
        let opts: ConvertOptions = serde_json::from_str(
            r#"{"mode":"translation-only","maxChars":30,"clean":{"fixTiming":true}}"#,
        )
        .unwrap();
        assert_eq!(opts.mode, LrcxMode::TranslationOnly);
        assert_eq!(opts.max_chars, 30);
        assert!(opts.clean.fix_timing);
    }

    /// Ensure the output lands next to the input with the tool's suffix.
    #[test]
    fn writes_output_beside_input() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("song.vtt");
        fs::write(&path, "WEBVTT\n\n00:00:01.000 --> 00:00:02.000\nhi\n").unwrap();
        let out = process_file(&path, Tool::VttToSrt, &ConvertOptions::default()).unwrap();
        assert_eq!(out, dir.path().join("song.srt"));
        assert_eq!(
            fs::read_to_string(out).unwrap(),
            "1\n00:00:01,000 --> 00:00:02,000\nhi\n\n"
        );

        let srt_path = dir.path().join("song.srt");
        let out = process_file(&srt_path, Tool::Clean, &ConvertOptions::default()).unwrap();
        assert_eq!(out, dir.path().join("song_cleaned.srt"));
    }

    #[test]
    fn merges_files() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("a.srt");
        let b = dir.path().join("b.srt");
        fs::write(&a, "1\n00:00:00,000 --> 00:00:01,000\na\n").unwrap();
        fs::write(&b, "1\n00:00:00,000 --> 00:00:01,000\nb\n").unwrap();
        let out = merge_files(&[a, b], 0.5).unwrap();
        assert_eq!(out, dir.path().join("merged_2_subtitles.srt"));
        let text = fs::read_to_string(out).unwrap();
        assert!(text.contains("00:00:01,500 --> 00:00:02,500\nb"));
    }

    /// Ensure every matching file is converted and bad ones are skipped.
    #[test]
    fn converts_whole_directory() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("b.lrc"), "[00:02.00]Two").unwrap();
        fs::write(dir.path().join("a.lrc"), "[00:01.00]One").unwrap();
        fs::write(dir.path().join("bad.lrc"), [0xffu8, 0xfe, 0x00]).unwrap();
        fs::write(dir.path().join("notes.txt"), "[00:03.00]Skip").unwrap();
        let written = process_dir(dir.path(), Tool::LrcToSrt, &ConvertOptions::default()).unwrap();
        assert_eq!(written, vec![dir.path().join("a.srt"), dir.path().join("b.srt")]);
        assert!(!dir.path().join("notes.srt").exists());
    }

    #[test]
    fn fcpxml_is_named_after_the_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("episode.srt");
        fs::write(&path, "1\n00:00:01,000 --> 00:00:02,000\nHi\n").unwrap();
        let out = process_file(&path, Tool::SrtToFcpxml, &ConvertOptions::default()).unwrap();
        assert_eq!(out, dir.path().join("episode.fcpxml"));
        let xml = fs::read_to_string(out).unwrap();
        assert!(xml.contains(r#"<project name="episode">"#));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempdir().unwrap();
        let err = process_file(&dir.path().join("nope.lrc"), Tool::LrcToSrt, &ConvertOptions::default());
        assert!(matches!(err, Err(Error::Io(_))));
    }
}
