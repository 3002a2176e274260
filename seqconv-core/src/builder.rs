// ============================================================================
// seqconv-core/src/builder.rs
// ============================================================================
//
// ARGUMENT BUILDER: ConversionRequest -> ffmpeg invocation
//
// This module turns a declarative `ConversionRequest` into the exact argument
// vector handed to ffmpeg, or into a raw shell command when the request
// carries a custom command. Apart from listing the input directory of a
// sequence-to-video request it has no side effects.
//
// KEY COMPONENTS:
// - Invocation: ordered argument vector or raw shell string
// - VideoFilterChain: comma-joined `-vf` filter builder
// - sequence_to_video_args / video_to_sequence_args: per-mode argument lists
// - build_invocation: entry point used by previews and the engine
//
// AI-ASSISTANT-INFO: ffmpeg argument construction for image sequence conversions

use crate::request::{ConversionMode, ConversionRequest};
use crate::scanner;
use std::path::{Path, PathBuf};

/// File name pattern for frames written by video-to-sequence conversions.
pub const OUTPUT_FRAME_PATTERN: &str = "frame_%04d";

/// Global flags that settle what ffmpeg does when the output already exists.
const OVERWRITE_FLAGS: [&str; 3] = ["-y", "-n", "-nostdin"];

/// ffmpeg must never stop to ask about an existing output file, so a
/// non-empty vector without an overwrite flag gets a leading `-n`.
fn with_overwrite_flag(args: &[String]) -> Vec<String> {
    if args.is_empty() || args.iter().any(|arg| OVERWRITE_FLAGS.contains(&arg.as_str())) {
        return args.to_vec();
    }
    std::iter::once("-n".to_string())
        .chain(args.iter().cloned())
        .collect()
}

/// The concrete command a conversion runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    /// Arguments passed to the resolved ffmpeg executable, in order.
    Args(Vec<String>),
    /// A user-supplied command line run through the platform shell.
    Shell(String),
}

impl Invocation {
    /// Renders the invocation the way it is shown in logs and previews.
    ///
    /// Arguments are joined with single spaces and never quoted. Argument
    /// vectors are rendered as launched, see [`Invocation::launch_args`].
    #[must_use]
    pub fn display_command(&self, program: &Path) -> String {
        match self {
            Self::Args(args) if args.is_empty() => program.display().to_string(),
            Self::Args(args) => format!("{} {}", program.display(), with_overwrite_flag(args).join(" ")),
            Self::Shell(command) => command.clone(),
        }
    }

    /// The exact argument vector handed to ffmpeg, or `None` for shell
    /// invocations.
    #[must_use]
    pub fn launch_args(&self) -> Option<Vec<String>> {
        match self {
            Self::Args(args) => Some(with_overwrite_flag(args)),
            Self::Shell(_) => None,
        }
    }

    #[must_use]
    pub fn is_shell(&self) -> bool {
        matches!(self, Self::Shell(_))
    }

    /// True when the argument vector names an input (`-i`).
    ///
    /// Shell commands are opaque and always count as having one.
    #[must_use]
    pub fn has_input(&self) -> bool {
        match self {
            Self::Args(args) => args.iter().any(|arg| arg == "-i"),
            Self::Shell(_) => true,
        }
    }
}

/// Builder for constructing video filter chains
#[derive(Debug, Default)]
pub struct VideoFilterChain {
    filters: Vec<String>,
}

impl VideoFilterChain {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Scales down to fit inside `width`x`height`, keeping the source aspect ratio.
    #[must_use]
    pub fn add_fit_scale(self, width: u32, height: u32) -> Self {
        self.add_filter(format!(
            "scale={width}:{height}:force_original_aspect_ratio=decrease"
        ))
    }

    /// Pads to exactly `width`x`height` with the picture centred.
    #[must_use]
    pub fn add_center_pad(self, width: u32, height: u32) -> Self {
        self.add_filter(format!("pad={width}:{height}:(ow-iw)/2:(oh-ih)/2"))
    }

    /// Adds a custom filter to the chain
    #[must_use]
    pub fn add_filter(mut self, filter: String) -> Self {
        if !filter.is_empty() {
            self.filters.push(filter);
        }
        self
    }

    /// Builds the filter chain into a single filter string
    #[must_use]
    pub fn build(self) -> Option<String> {
        if self.filters.is_empty() {
            None
        } else {
            Some(self.filters.join(","))
        }
    }
}

/// Codecs whose quality is driven by `-crf`.
fn uses_crf(encoder: &str) -> bool {
    encoder == "libx264" || encoder == "libx265"
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Builds the arguments for encoding `images` into a video.
///
/// `images` is the scanned content of the request's input directory; its
/// first entry determines the input pattern. An empty slice produces an
/// argument list without any input, which callers must not execute.
#[must_use]
pub fn sequence_to_video_args(request: &ConversionRequest, images: &[PathBuf]) -> Vec<String> {
    let video = &request.video;
    let mut args = Vec::new();

    if let Some(pattern) = images.first().and_then(|first| scanner::input_pattern(first)) {
        let input = absolute(&request.input_path).join(pattern);
        args.push("-framerate".to_string());
        args.push(video.frame_rate.to_string());
        args.push("-i".to_string());
        args.push(input.to_string_lossy().into_owned());
    }

    let encoder = video.codec.encoder_name();
    args.push("-c:v".to_string());
    args.push(encoder.to_string());

    if uses_crf(encoder) {
        args.push("-crf".to_string());
        args.push(video.quality.to_string());
    }

    if video.maintain_aspect_ratio {
        let filters = VideoFilterChain::new()
            .add_fit_scale(video.width, video.height)
            .add_center_pad(video.width, video.height);
        if let Some(filters) = filters.build() {
            args.push("-vf".to_string());
            args.push(filters);
        }
    } else {
        args.push("-s".to_string());
        args.push(format!("{}x{}", video.width, video.height));
    }

    args.push("-f".to_string());
    args.push(video.format.muxer_name());
    args.push("-y".to_string());
    args.push(request.output_path.to_string_lossy().into_owned());
    args
}

/// Builds the arguments for extracting frames from a video.
///
/// With a limited range the start frame index is handed to `-ss` as is.
/// ffmpeg reads that value as seconds, so `start_frame` 48 seeks to 0:48
/// rather than to the 48th frame.
#[must_use]
pub fn video_to_sequence_args(request: &ConversionRequest) -> Vec<String> {
    let sequence = &request.sequence;
    let mut args = vec![
        "-i".to_string(),
        request.input_path.to_string_lossy().into_owned(),
    ];

    if !sequence.extract_all_frames {
        args.push("-ss".to_string());
        args.push(sequence.start_frame.to_string());
        args.push("-frames:v".to_string());
        args.push(sequence.frame_count().to_string());
    }

    let file_name = format!("{OUTPUT_FRAME_PATTERN}.{}", sequence.image_format.extension());
    let output = absolute(&request.output_path).join(file_name);
    args.push(output.to_string_lossy().into_owned());
    args
}

/// Builds the invocation for `request`, scanning the input directory when needed.
#[must_use]
pub fn build_invocation(request: &ConversionRequest) -> Invocation {
    if let Some(command) = request.custom_command() {
        return Invocation::Shell(command.to_string());
    }

    match request.mode {
        ConversionMode::SequenceToVideo => {
            let images = scanner::scan_image_sequence(&request.input_path);
            Invocation::Args(sequence_to_video_args(request, &images))
        }
        ConversionMode::VideoToSequence => Invocation::Args(video_to_sequence_args(request)),
    }
}
