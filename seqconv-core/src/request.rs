//! Conversion request data model.
//!
//! A [`ConversionRequest`] is an immutable description of one conversion. Only
//! the field group selected by [`ConversionMode`] is meaningful; the other
//! group is carried along untouched and never validated.
//!
//! The enum name mappings here are total: parsing an unknown codec, container
//! or image format name falls back to the default variant instead of failing,
//! matching how stored presets and free-form CLI input are treated.

use std::fmt;
use std::path::PathBuf;

/// Direction of a conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConversionMode {
    SequenceToVideo,
    VideoToSequence,
}

impl fmt::Display for ConversionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SequenceToVideo => write!(f, "image sequence to video"),
            Self::VideoToSequence => write!(f, "video to image sequence"),
        }
    }
}

/// Lower-cases a name and strips the separators people put in codec names.
fn normalize_name(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, '.' | '-' | '_' | ' '))
        .flat_map(char::to_lowercase)
        .collect()
}

// ============================================================================
// VIDEO CONTAINER
// ============================================================================

/// Output container format for sequence-to-video conversions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VideoFormat {
    #[default]
    Mp4,
    Avi,
    Mov,
    Mkv,
    WebM,
}

impl VideoFormat {
    pub const ALL: [VideoFormat; 5] = [Self::Mp4, Self::Avi, Self::Mov, Self::Mkv, Self::WebM];

    /// Name shown to users.
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Mp4 => "MP4",
            Self::Avi => "AVI",
            Self::Mov => "MOV",
            Self::Mkv => "MKV",
            Self::WebM => "WebM",
        }
    }

    /// Lower-cased name passed to ffmpeg's `-f` option.
    #[must_use]
    pub fn muxer_name(self) -> String {
        self.display_name().to_lowercase()
    }

    /// Parses a container name, defaulting to MP4 for anything unrecognised.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match normalize_name(name).as_str() {
            "avi" => Self::Avi,
            "mov" | "quicktime" => Self::Mov,
            "mkv" | "matroska" => Self::Mkv,
            "webm" => Self::WebM,
            _ => Self::Mp4,
        }
    }
}

impl fmt::Display for VideoFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

// ============================================================================
// VIDEO CODEC
// ============================================================================

/// Video codec for sequence-to-video conversions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VideoCodec {
    #[default]
    H264,
    H265,
    Vp9,
    ProRes,
}

impl VideoCodec {
    pub const ALL: [VideoCodec; 4] = [Self::H264, Self::H265, Self::Vp9, Self::ProRes];

    /// Name shown to users and stored in presets.
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Self::H264 => "H.264",
            Self::H265 => "H.265",
            Self::Vp9 => "VP9",
            Self::ProRes => "ProRes",
        }
    }

    /// The ffmpeg encoder identifier passed to `-c:v`.
    #[must_use]
    pub fn encoder_name(self) -> &'static str {
        match self {
            Self::H264 => "libx264",
            Self::H265 => "libx265",
            Self::Vp9 => "libvpx-vp9",
            Self::ProRes => "prores",
        }
    }

    /// Parses a codec name. Unknown names resolve to H.264.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match normalize_name(name).as_str() {
            "h265" | "hevc" | "x265" | "libx265" => Self::H265,
            "vp9" | "libvpxvp9" => Self::Vp9,
            "prores" | "proresks" => Self::ProRes,
            _ => Self::H264,
        }
    }
}

impl fmt::Display for VideoCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

// ============================================================================
// IMAGE FORMAT
// ============================================================================

/// Image format written by video-to-sequence conversions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ImageFormat {
    #[default]
    Png,
    Jpeg,
    Tiff,
    Bmp,
    Exr,
}

impl ImageFormat {
    pub const ALL: [ImageFormat; 5] = [Self::Png, Self::Jpeg, Self::Tiff, Self::Bmp, Self::Exr];

    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Png => "PNG",
            Self::Jpeg => "JPEG",
            Self::Tiff => "TIFF",
            Self::Bmp => "BMP",
            Self::Exr => "EXR",
        }
    }

    /// Lower-cased file extension for extracted frames.
    #[must_use]
    pub fn extension(self) -> String {
        self.display_name().to_lowercase()
    }

    /// Parses an image format name. Unknown names resolve to PNG.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match normalize_name(name).as_str() {
            "jpeg" | "jpg" => Self::Jpeg,
            "tiff" | "tif" => Self::Tiff,
            "bmp" => Self::Bmp,
            "exr" | "openexr" => Self::Exr,
            _ => Self::Png,
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

// ============================================================================
// SETTINGS GROUPS
// ============================================================================

pub const DEFAULT_FRAME_RATE: u32 = 24;
pub const DEFAULT_QUALITY: u8 = 23;
pub const DEFAULT_WIDTH: u32 = 1920;
pub const DEFAULT_HEIGHT: u32 = 1080;
pub const DEFAULT_END_FRAME: u32 = 100;

/// Settings used when encoding an image sequence into a video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoSettings {
    pub format: VideoFormat,
    pub codec: VideoCodec,
    /// Input frame rate of the image sequence.
    pub frame_rate: u32,
    /// CRF value, 1-51; lower means higher fidelity.
    pub quality: u8,
    pub width: u32,
    pub height: u32,
    /// Letterbox into `width`x`height` instead of stretching.
    pub maintain_aspect_ratio: bool,
}

impl Default for VideoSettings {
    fn default() -> Self {
        Self {
            format: VideoFormat::default(),
            codec: VideoCodec::default(),
            frame_rate: DEFAULT_FRAME_RATE,
            quality: DEFAULT_QUALITY,
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            maintain_aspect_ratio: true,
        }
    }
}

/// Settings used when extracting frames from a video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceSettings {
    pub image_format: ImageFormat,
    pub extract_all_frames: bool,
    pub start_frame: u32,
    pub end_frame: u32,
}

impl SequenceSettings {
    /// Number of frames in the inclusive `start_frame..=end_frame` range.
    ///
    /// The range is not validated, so an inverted range yields zero or a
    /// negative count which is passed to ffmpeg unchanged.
    #[must_use]
    pub fn frame_count(&self) -> i64 {
        i64::from(self.end_frame) - i64::from(self.start_frame) + 1
    }
}

impl Default for SequenceSettings {
    fn default() -> Self {
        Self {
            image_format: ImageFormat::default(),
            extract_all_frames: true,
            start_frame: 0,
            end_frame: DEFAULT_END_FRAME,
        }
    }
}

// ============================================================================
// CONVERSION REQUEST
// ============================================================================

/// Declarative description of one conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionRequest {
    pub mode: ConversionMode,
    /// Image directory for sequence-to-video, video file for video-to-sequence.
    pub input_path: PathBuf,
    /// Video file for sequence-to-video, frame directory for video-to-sequence.
    pub output_path: PathBuf,
    pub video: VideoSettings,
    pub sequence: SequenceSettings,
    custom_command: Option<String>,
}

impl ConversionRequest {
    /// Creates a request of the given mode with default settings.
    pub fn new(
        mode: ConversionMode,
        input_path: impl Into<PathBuf>,
        output_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            mode,
            input_path: input_path.into(),
            output_path: output_path.into(),
            video: VideoSettings::default(),
            sequence: SequenceSettings::default(),
            custom_command: None,
        }
    }

    pub fn sequence_to_video(input_dir: impl Into<PathBuf>, output_file: impl Into<PathBuf>) -> Self {
        Self::new(ConversionMode::SequenceToVideo, input_dir, output_file)
    }

    pub fn video_to_sequence(input_file: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self::new(ConversionMode::VideoToSequence, input_file, output_dir)
    }

    #[must_use]
    pub fn with_video(mut self, video: VideoSettings) -> Self {
        self.video = video;
        self
    }

    #[must_use]
    pub fn with_sequence(mut self, sequence: SequenceSettings) -> Self {
        self.sequence = sequence;
        self
    }

    /// Sets a raw command that replaces all structured argument building.
    /// Blank commands clear the override.
    #[must_use]
    pub fn with_custom_command(mut self, command: impl Into<String>) -> Self {
        let command = command.into();
        self.custom_command = if command.trim().is_empty() {
            None
        } else {
            Some(command)
        };
        self
    }

    /// The raw command override, if one is set.
    #[must_use]
    pub fn custom_command(&self) -> Option<&str> {
        self.custom_command.as_deref()
    }

    /// True when both paths are non-empty.
    #[must_use]
    pub fn has_paths(&self) -> bool {
        !self.input_path.as_os_str().is_empty() && !self.output_path.as_os_str().is_empty()
    }
}

/// Describes a CRF value the way the settings form labels it.
#[must_use]
pub fn quality_label(quality: u8) -> &'static str {
    match quality {
        0..=18 => "Very High",
        19..=23 => "High",
        24..=28 => "Medium",
        29..=33 => "Low",
        _ => "Very Low",
    }
}
