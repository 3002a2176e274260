// ============================================================================
// seqconv-cli/src/cli.rs
// ============================================================================
//
// COMMAND-LINE DEFINITION: Argument structures parsed with clap
//
// KEY COMPONENTS:
// - Cli: global flags shared by every subcommand
// - Commands: to-video, to-frames, run, check, presets
// - Value enums mirroring the core's format, codec and image format choices
//
// Numeric ranges match what the conversion settings accept: frame rate 1-60,
// quality 1-51, width 1-7680, height 1-4320, frame numbers 0-999999.
//
// AI-ASSISTANT-INFO: clap derive definitions for the seqconv binary

use clap::{Args, Parser, Subcommand, ValueEnum};
use seqconv_core::config::ENGINE_PATH_ENV;
use seqconv_core::{ImageFormat, VideoCodec, VideoFormat};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "seqconv: image sequence <-> video conversion",
    long_about = "Converts numbered image sequences to video and video to image sequences by driving ffmpeg."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable debug logging, including raw ffmpeg output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit conversion events as JSON lines on stdout instead of a progress bar
    #[arg(long, global = true)]
    pub json: bool,

    /// Path to the ffmpeg executable (overrides automatic discovery)
    #[arg(long, global = true, value_name = "PATH", env = ENGINE_PATH_ENV)]
    pub ffmpeg: Option<PathBuf>,

    /// Presets document to use (defaults to presets/presets.json next to the executable)
    #[arg(long, global = true, value_name = "FILE", env = "SEQCONV_PRESETS")]
    pub presets_file: Option<PathBuf>,

    /// Also write a timestamped run log into this directory
    #[arg(long, global = true, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Encode a directory of numbered images into a video file
    ToVideo(ToVideoArgs),
    /// Extract the frames of a video into a directory of images
    ToFrames(ToFramesArgs),
    /// Run a raw ffmpeg command line through the system shell
    Run(RunArgs),
    /// Show which ffmpeg will be used and its version
    Check,
    /// Manage stored presets
    #[command(subcommand)]
    Presets(PresetsCommand),
}

/// Options shared by the conversion subcommands.
#[derive(Args, Debug, Clone, Default)]
pub struct CommonArgs {
    /// Start from the settings stored in this preset
    #[arg(long, value_name = "NAME")]
    pub preset: Option<String>,

    /// Store the effective settings under this preset name before running
    #[arg(long, value_name = "NAME")]
    pub save_preset: Option<String>,

    /// Print the ffmpeg command without running it
    #[arg(long)]
    pub dry_run: bool,

    /// Cancel the conversion if it runs longer than this many seconds
    #[arg(long, value_name = "SECONDS", value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,
}

#[derive(Args, Debug, Clone)]
pub struct ToVideoArgs {
    /// Directory containing the image sequence
    #[arg(short = 'i', long = "input", value_name = "DIR")]
    pub input_dir: Option<PathBuf>,

    /// Video file to write
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output_file: Option<PathBuf>,

    /// Container format
    #[arg(long, value_enum)]
    pub format: Option<FormatArg>,

    /// Video codec
    #[arg(long, value_enum)]
    pub codec: Option<CodecArg>,

    /// Frames per second of the image sequence
    #[arg(long, value_name = "FPS", value_parser = clap::value_parser!(u32).range(1..=60))]
    pub fps: Option<u32>,

    /// Constant rate factor for H.264/H.265 (lower is better)
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=51))]
    pub quality: Option<u8>,

    /// Output width in pixels
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=7680))]
    pub width: Option<u32>,

    /// Output height in pixels
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=4320))]
    pub height: Option<u32>,

    /// Scale to the exact size instead of letterboxing
    #[arg(long, conflicts_with = "fit")]
    pub stretch: bool,

    /// Keep the aspect ratio and pad to the output size
    #[arg(long)]
    pub fit: bool,

    #[command(flatten)]
    pub common: CommonArgs,
}

#[derive(Args, Debug, Clone)]
pub struct ToFramesArgs {
    /// Video file to read
    #[arg(short = 'i', long = "input", value_name = "FILE")]
    pub input_file: Option<PathBuf>,

    /// Directory to write frames into (created if missing)
    #[arg(short = 'o', long = "output", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Image format of the extracted frames
    #[arg(long, value_enum)]
    pub image_format: Option<ImageFormatArg>,

    /// First frame of the range to extract
    #[arg(long, value_name = "FRAME", value_parser = clap::value_parser!(u32).range(0..=999_999))]
    pub start_frame: Option<u32>,

    /// Last frame of the range to extract
    #[arg(long, value_name = "FRAME", value_parser = clap::value_parser!(u32).range(0..=999_999))]
    pub end_frame: Option<u32>,

    /// Extract every frame, ignoring any stored range
    #[arg(long, conflicts_with_all = ["start_frame", "end_frame"])]
    pub all: bool,

    #[command(flatten)]
    pub common: CommonArgs,
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Complete command line, passed to the shell unchanged
    #[arg(value_name = "COMMAND")]
    pub command: String,

    /// Print the command without running it
    #[arg(long)]
    pub dry_run: bool,

    /// Cancel the command if it runs longer than this many seconds
    #[arg(long, value_name = "SECONDS", value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum PresetsCommand {
    /// List stored preset names
    List,
    /// Print a preset as JSON
    Show {
        #[arg(value_name = "NAME")]
        name: String,
    },
    /// Delete a preset
    Remove {
        #[arg(value_name = "NAME")]
        name: String,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatArg {
    Mp4,
    Avi,
    Mov,
    Mkv,
    Webm,
}

impl From<FormatArg> for VideoFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Mp4 => VideoFormat::Mp4,
            FormatArg::Avi => VideoFormat::Avi,
            FormatArg::Mov => VideoFormat::Mov,
            FormatArg::Mkv => VideoFormat::Mkv,
            FormatArg::Webm => VideoFormat::WebM,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecArg {
    H264,
    H265,
    Vp9,
    Prores,
}

impl From<CodecArg> for VideoCodec {
    fn from(arg: CodecArg) -> Self {
        match arg {
            CodecArg::H264 => VideoCodec::H264,
            CodecArg::H265 => VideoCodec::H265,
            CodecArg::Vp9 => VideoCodec::Vp9,
            CodecArg::Prores => VideoCodec::ProRes,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormatArg {
    Png,
    #[value(alias = "jpg")]
    Jpeg,
    Tiff,
    Bmp,
    Exr,
}

impl From<ImageFormatArg> for ImageFormat {
    fn from(arg: ImageFormatArg) -> Self {
        match arg {
            ImageFormatArg::Png => ImageFormat::Png,
            ImageFormatArg::Jpeg => ImageFormat::Jpeg,
            ImageFormatArg::Tiff => ImageFormat::Tiff,
            ImageFormatArg::Bmp => ImageFormat::Bmp,
            ImageFormatArg::Exr => ImageFormat::Exr,
        }
    }
}
