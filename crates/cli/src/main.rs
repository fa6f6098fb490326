//! Binary entry point for the subtitle and LUT toolkit.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use image::{DynamicImage, RgbaImage};
use std::fs;
use std::path::{Path, PathBuf};
use subkit_core::convert::{merge_files, process_dir, process_file, ConvertOptions, Tool, TO_SRT};
use subkit_core::fcpxml::{Alignment, FcpxmlOptions, FrameRate};
use subkit_core::lrc::lrcx::LrcxMode;
use subkit_core::lut::{LutSession, PixelBuffer};
use subkit_core::transform::{
    parse_offset, CleanOptions, ExtractOptions, DEFAULT_GAP, DEFAULT_MAX_CHARS,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Command line options for the binary.
#[derive(Parser)]
#[command(version)]
struct Cli {
    /// Enable verbose debug and trace logs.
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

/// Every command taking an `input` also accepts a directory and converts each
/// file in it with the matching extension.
#[derive(Subcommand)]
enum Command {
    /// Convert an LRC, LRCX, VTT or BCC file to SRT based on its extension.
    ToSrt { input: PathBuf },

    /// Convert LRC lyrics to SRT.
    Lrc { input: PathBuf },

    /// Convert bilingual LRCX lyrics to SRT.
    Lrcx {
        /// original, intelligent or translation-only.
        #[arg(long, default_value = "intelligent")]
        mode: LrcxMode,
        input: PathBuf,
    },

    /// Convert WebVTT to SRT.
    Vtt { input: PathBuf },

    /// Convert Bilibili BCC JSON to SRT.
    Bcc { input: PathBuf },

    /// Move every timestamp of an SRT file by an offset in seconds.
    Shift {
        #[arg(long, allow_negative_numbers = true, value_parser = parse_offset)]
        offset: f64,
        input: PathBuf,
    },

    /// Clean up an SRT file.
    Clean {
        #[command(flatten)]
        flags: CleanFlags,
        /// JSON file with cleaning options; flags given on the command line are added on top.
        #[arg(long)]
        options: Option<PathBuf>,
        input: PathBuf,
    },

    /// Join SRT files one after another.
    Merge {
        /// Seconds between the end of one file and the start of the next.
        #[arg(long, default_value_t = DEFAULT_GAP)]
        gap: f64,
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
    },

    /// Break long subtitle lines.
    Split {
        #[arg(long, default_value_t = DEFAULT_MAX_CHARS)]
        max_chars: usize,
        input: PathBuf,
    },

    /// Pull the plain text out of a subtitle file.
    Extract {
        #[arg(long)]
        timestamps: bool,
        #[arg(long)]
        numbers: bool,
        #[arg(long)]
        blank_lines: bool,
        input: PathBuf,
    },

    /// Export SRT subtitles as Final Cut Pro titles.
    Fcpxml {
        /// 23.98, 24, 25, 29.97, 30, 50, 59.94 or 60.
        #[arg(long, default_value = "60")]
        fps: FrameRate,
        #[arg(long, default_value_t = 1920)]
        width: u32,
        #[arg(long, default_value_t = 1080)]
        height: u32,
        /// left, center or right.
        #[arg(long, default_value = "center")]
        align: Alignment,
        /// Vertical title position.
        #[arg(short = 'y', long, allow_negative_numbers = true, default_value_t = -420)]
        y_position: i32,
        /// Defaults to the input file's name.
        #[arg(long)]
        project: Option<String>,
        #[arg(long, default_value = "_FCPXMLs")]
        event: String,
        input: PathBuf,
    },

    /// Colour grade an image with one or more .cube LUTs.
    Lut {
        #[arg(long)]
        image: PathBuf,
        /// LUT files, applied in the order given.
        #[arg(long = "lut", required = true)]
        luts: Vec<PathBuf>,
        /// Global strength in [0, 1].
        #[arg(long, default_value_t = 1.0)]
        intensity: f32,
        /// Defaults to `<image stem>_graded.png` beside the input.
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[derive(Args)]
struct CleanFlags {
    #[arg(long)]
    remove_empty: bool,
    /// Drop cues shorter than this many seconds.
    #[arg(long, default_value_t = 0.0)]
    min_duration: f64,
    #[arg(long)]
    remove_sound_effects: bool,
    #[arg(long)]
    remove_speakers: bool,
    #[arg(long)]
    remove_formatting: bool,
    #[arg(long)]
    fix_capitalization: bool,
    #[arg(long)]
    remove_duplicates: bool,
    #[arg(long)]
    make_continuous: bool,
    #[arg(long)]
    fix_timing: bool,
}

impl CleanFlags {
    fn apply_to(&self, opts: &mut CleanOptions) {
        opts.remove_empty |= self.remove_empty;
        opts.remove_sound_effects |= self.remove_sound_effects;
        opts.remove_speakers |= self.remove_speakers;
        opts.remove_formatting |= self.remove_formatting;
        opts.fix_capitalization |= self.fix_capitalization;
        opts.remove_duplicates |= self.remove_duplicates;
        opts.make_continuous |= self.make_continuous;
        opts.fix_timing |= self.fix_timing;
        if self.min_duration > 0.0 {
            opts.min_duration = self.min_duration;
        }
    }
}

fn load_clean_options(path: Option<&Path>, flags: &CleanFlags) -> Result<CleanOptions> {
    let mut opts = match path {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("parsing cleaning options in {}", path.display()))?
        }
        None => CleanOptions::default(),
    };
    flags.apply_to(&mut opts);
    Ok(opts)
}

/// Grade `image_path` with `luts` and write the result. Returns the output path.
fn grade_image(
    image_path: &Path,
    luts: &[PathBuf],
    intensity: f32,
    output: Option<PathBuf>,
) -> Result<PathBuf> {
    let rgba = image::open(image_path)
        .with_context(|| format!("decoding {}", image_path.display()))?
        .to_rgba8();
    let (width, height) = rgba.dimensions();
    let mut session = LutSession::new(PixelBuffer::from_rgba(width, height, rgba.into_raw())?);
    for path in luts {
        let content =
            fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        let name = path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();
        let lut = session.luts_mut().add(&name, &content)?;
        info!("loaded LUT `{}` ({}³)", lut.title, lut.size);
    }
    let graded = session.process(intensity)?;

    let out = output.unwrap_or_else(|| {
        let stem = image_path.file_stem().unwrap_or_default().to_string_lossy();
        image_path.with_file_name(format!("{stem}_graded.png"))
    });
    let buffer = RgbaImage::from_raw(graded.width(), graded.height(), graded.data().to_vec())
        .context("graded buffer does not match its dimensions")?;
    let img = DynamicImage::ImageRgba8(buffer);
    let is_jpeg = out
        .extension()
        .map(|e| e.eq_ignore_ascii_case("jpg") || e.eq_ignore_ascii_case("jpeg"))
        .unwrap_or(false);
    if is_jpeg {
        img.to_rgb8().save(&out)?;
    } else {
        img.save(&out)?;
    }
    info!("wrote {}", out.display());
    Ok(out)
}

fn run(command: Command) -> Result<Vec<PathBuf>> {
    let mut opts = ConvertOptions::default();
    let (tools, input) = match command {
        Command::ToSrt { input } if input.is_dir() => (TO_SRT.to_vec(), input),
        Command::ToSrt { input } => {
            let ext = input.extension().and_then(|e| e.to_str()).unwrap_or_default();
            let tool = Tool::from_extension(ext)
                .with_context(|| format!("no SRT converter for {}", input.display()))?;
            (vec![tool], input)
        }
        Command::Lrc { input } => (vec![Tool::LrcToSrt], input),
        Command::Lrcx { mode, input } => {
            opts.mode = mode;
            (vec![Tool::LrcxToSrt], input)
        }
        Command::Vtt { input } => (vec![Tool::VttToSrt], input),
        Command::Bcc { input } => (vec![Tool::BccToSrt], input),
        Command::Shift { offset, input } => {
            opts.offset = offset;
            (vec![Tool::TimeShift], input)
        }
        Command::Clean {
            flags,
            options,
            input,
        } => {
            opts.clean = load_clean_options(options.as_deref(), &flags)?;
            (vec![Tool::Clean], input)
        }
        Command::Split { max_chars, input } => {
            opts.max_chars = max_chars;
            (vec![Tool::SplitLines], input)
        }
        Command::Extract {
            timestamps,
            numbers,
            blank_lines,
            input,
        } => {
            opts.extract = ExtractOptions {
                include_timestamps: timestamps,
                add_line_numbers: numbers,
                add_blank_lines: blank_lines,
            };
            (vec![Tool::ExtractText], input)
        }
        Command::Fcpxml {
            fps,
            width,
            height,
            align,
            y_position,
            project,
            event,
            input,
        } => {
            opts.fcpxml = FcpxmlOptions {
                frame_rate: fps,
                width,
                height,
                alignment: align,
                y_position,
                project_name: project.unwrap_or_default(),
                event_name: event,
            };
            (vec![Tool::SrtToFcpxml], input)
        }
        Command::Merge { gap, inputs } => return Ok(vec![merge_files(&inputs, gap)?]),
        Command::Lut {
            image,
            luts,
            intensity,
            output,
        } => return Ok(vec![grade_image(&image, &luts, intensity, output)?]),
    };

    if !input.is_dir() {
        return Ok(vec![process_file(&input, tools[0], &opts)?]);
    }
    let mut written = Vec::new();
    for tool in tools {
        written.extend(process_dir(&input, tool, &opts)?);
    }
    if written.is_empty() {
        bail!("nothing was converted in {}", input.display());
    }
    info!("converted {} files in {}", written.len(), input.display());
    Ok(written)
}

/// Application entry point which parses CLI args and performs actions.
/// This function should initialize logging and delegate to the core library.
fn main() -> Result<()> {
    let cli = Cli::parse();
    let filter = if cli.debug {
        EnvFilter::default()
            .add_directive("subkit=trace".parse().unwrap())
            .add_directive("subkit_core=trace".parse().unwrap())
            .add_directive("info".parse().unwrap())
    } else {
        EnvFilter::default()
            .add_directive("subkit=info".parse().unwrap())
            .add_directive("subkit_core=info".parse().unwrap())
            .add_directive("warn".parse().unwrap())
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
    for out in run(cli.command)? {
        println!("{}", out.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    /// Ensure negative offsets reach the shift tool.
    #[test]
    fn parses_negative_offset() {
        let cli = Cli::parse_from(["subkit", "shift", "--offset", "-2.5", "a.srt"]);
        match cli.command {
            Command::Shift { offset, .. } => assert_eq!(offset, -2.5),
            _ => panic!("expected shift"),
        }
    }

    #[test]
    fn flags_extend_json_options() {
        let cli = Cli::parse_from([
            "subkit",
            "clean",
            "--remove-speakers",
            "--min-duration",
            "0.5",
            "a.srt",
        ]);
        let Command::Clean { flags, .. } = cli.command else {
            panic!("expected clean");
        };
        let mut opts = CleanOptions {
            fix_timing: true,
            ..Default::default()
        };
        flags.apply_to(&mut opts);
        assert!(opts.fix_timing && opts.remove_speakers);
        assert_eq!(opts.min_duration, 0.5);
    }

    #[test]
    fn fcpxml_flags() {
        let cli = Cli::parse_from([
            "subkit", "fcpxml", "--fps", "29.97", "--align", "right", "-y", "-300", "a.srt",
        ]);
        let Command::Fcpxml {
            fps,
            align,
            y_position,
            project,
            ..
        } = cli.command
        else {
            panic!("expected fcpxml");
        };
        assert_eq!(fps, FrameRate::Fractional(29.97));
        assert_eq!(align, Alignment::Right);
        assert_eq!(y_position, -300);
        assert!(project.is_none());
    }

    /// Ensure a directory runs every SRT converter over its files.
    #[test]
    fn converts_directory_to_srt() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.lrc"), "[00:01.00]One").unwrap();
        fs::write(dir.path().join("b.vtt"), "WEBVTT\n\n00:01.000 --> 00:02.000\nTwo\n").unwrap();
        let written = run(Command::ToSrt {
            input: dir.path().to_path_buf(),
        })
        .unwrap();
        assert_eq!(written, vec![dir.path().join("a.srt"), dir.path().join("b.srt")]);
    }

    #[test]
    fn empty_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(run(Command::Vtt {
            input: dir.path().to_path_buf(),
        })
        .is_err());
    }

    #[test]
    fn lrcx_mode_from_flag() {
        let cli = Cli::parse_from(["subkit", "lrcx", "--mode", "translation-only", "a.lrcx"]);
        match cli.command {
            Command::Lrcx { mode, .. } => assert_eq!(mode, LrcxMode::TranslationOnly),
            _ => panic!("expected lrcx"),
        }
    }
}
