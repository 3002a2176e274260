//! Named conversion presets stored in a JSON document.
//!
//! The document is a single JSON object mapping preset names to flat
//! settings objects with camelCase keys:
//!
//! ```json
//! {
//!   "web proxy": {
//!     "inputPath": "/renders/shot010",
//!     "outputPath": "/tmp/shot010.webm",
//!     "videoFormat": "WebM",
//!     "videoCodec": "VP9",
//!     "frameRate": 25,
//!     "quality": 30,
//!     "width": 1280,
//!     "height": 720,
//!     "maintainAspectRatio": true,
//!     "imageFormat": "PNG",
//!     "startFrame": 0,
//!     "endFrame": 100,
//!     "extractAllFrames": true,
//!     "customCommand": ""
//!   }
//! }
//! ```
//!
//! Missing keys take their default values. Reading never fails: a missing,
//! unreadable or malformed document is treated as empty, and individual
//! entries that do not parse are skipped.

use crate::error::{CoreError, CoreResult};
use crate::request::{
    ConversionMode, ConversionRequest, DEFAULT_END_FRAME, ImageFormat, SequenceSettings,
    VideoCodec, VideoFormat, VideoSettings,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub const PRESET_DIR_NAME: &str = "presets";
pub const PRESET_FILE_NAME: &str = "presets.json";

/// One stored preset.
///
/// Format, codec and image format are kept as display names ("MP4",
/// "H.264", "PNG") and parsed leniently when turned into a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PresetSettings {
    pub input_path: String,
    pub output_path: String,
    pub video_format: String,
    pub video_codec: String,
    pub frame_rate: u32,
    pub quality: u8,
    pub width: u32,
    pub height: u32,
    pub maintain_aspect_ratio: bool,
    pub image_format: String,
    pub start_frame: u32,
    pub end_frame: u32,
    pub extract_all_frames: bool,
    /// Empty when no custom command is set.
    pub custom_command: String,
}

impl Default for PresetSettings {
    fn default() -> Self {
        let video = VideoSettings::default();
        Self {
            input_path: String::new(),
            output_path: String::new(),
            video_format: video.format.display_name().to_string(),
            video_codec: video.codec.display_name().to_string(),
            frame_rate: video.frame_rate,
            quality: video.quality,
            width: video.width,
            height: video.height,
            maintain_aspect_ratio: video.maintain_aspect_ratio,
            image_format: ImageFormat::default().display_name().to_string(),
            start_frame: 0,
            end_frame: DEFAULT_END_FRAME,
            extract_all_frames: true,
            custom_command: String::new(),
        }
    }
}

impl From<&ConversionRequest> for PresetSettings {
    fn from(request: &ConversionRequest) -> Self {
        Self {
            input_path: request.input_path.to_string_lossy().into_owned(),
            output_path: request.output_path.to_string_lossy().into_owned(),
            video_format: request.video.format.display_name().to_string(),
            video_codec: request.video.codec.display_name().to_string(),
            frame_rate: request.video.frame_rate,
            quality: request.video.quality,
            width: request.video.width,
            height: request.video.height,
            maintain_aspect_ratio: request.video.maintain_aspect_ratio,
            image_format: request.sequence.image_format.display_name().to_string(),
            start_frame: request.sequence.start_frame,
            end_frame: request.sequence.end_frame,
            extract_all_frames: request.sequence.extract_all_frames,
            custom_command: request.custom_command().unwrap_or_default().to_string(),
        }
    }
}

impl PresetSettings {
    /// Builds a request of the given mode from these settings.
    #[must_use]
    pub fn to_request(&self, mode: ConversionMode) -> ConversionRequest {
        ConversionRequest::new(mode, &self.input_path, &self.output_path)
            .with_video(VideoSettings {
                format: VideoFormat::from_name(&self.video_format),
                codec: VideoCodec::from_name(&self.video_codec),
                frame_rate: self.frame_rate,
                quality: self.quality,
                width: self.width,
                height: self.height,
                maintain_aspect_ratio: self.maintain_aspect_ratio,
            })
            .with_sequence(SequenceSettings {
                image_format: ImageFormat::from_name(&self.image_format),
                extract_all_frames: self.extract_all_frames,
                start_frame: self.start_frame,
                end_frame: self.end_frame,
            })
            .with_custom_command(self.custom_command.clone())
    }
}

/// File-backed collection of named presets.
#[derive(Debug, Clone)]
pub struct PresetStore {
    path: PathBuf,
}

impl PresetStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `presets/presets.json` next to the running executable.
    pub fn default_location() -> CoreResult<PathBuf> {
        let exe = std::env::current_exe()?;
        let dir = exe.parent().ok_or_else(|| {
            CoreError::OperationFailed(format!(
                "Executable path has no parent directory: {}",
                exe.display()
            ))
        })?;
        Ok(dir.join(PRESET_DIR_NAME).join(PRESET_FILE_NAME))
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the raw document, treating anything unusable as empty.
    fn read_document(&self) -> Map<String, Value> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Map::new(),
            Err(e) => {
                log::warn!("Cannot read presets file {}: {}", self.path.display(), e);
                return Map::new();
            }
        };

        match serde_json::from_str::<Value>(&content) {
            Ok(Value::Object(map)) => map,
            Ok(_) => {
                log::warn!("Presets file {} is not a JSON object", self.path.display());
                Map::new()
            }
            Err(e) => {
                log::warn!("Presets file {} is not valid JSON: {}", self.path.display(), e);
                Map::new()
            }
        }
    }

    fn write_document(&self, document: &Map<String, Value>) -> CoreResult<()> {
        if let Some(dir) = self.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        let json = serde_json::to_string_pretty(document)?;
        let staging = self.path.with_extension("json.tmp");
        fs::write(&staging, json)?;
        fs::rename(&staging, &self.path)?;
        Ok(())
    }

    /// All presets that parse, by name.
    #[must_use]
    pub fn load(&self) -> BTreeMap<String, PresetSettings> {
        self.read_document()
            .into_iter()
            .filter_map(|(name, value)| match serde_json::from_value(value) {
                Ok(settings) => Some((name, settings)),
                Err(e) => {
                    log::warn!("Skipping preset '{}': {}", name, e);
                    None
                }
            })
            .collect()
    }

    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.load().into_keys().collect()
    }

    pub fn get(&self, name: &str) -> CoreResult<PresetSettings> {
        self.load()
            .remove(name)
            .ok_or_else(|| CoreError::PresetNotFound(name.to_string()))
    }

    /// Adds or replaces the preset `name` and rewrites the document.
    ///
    /// Other entries are written back exactly as they were read.
    pub fn save(&self, name: &str, settings: &PresetSettings) -> CoreResult<()> {
        let mut document = self.read_document();
        document.insert(name.to_string(), serde_json::to_value(settings)?);
        self.write_document(&document)?;
        log::debug!("Saved preset '{}' to {}", name, self.path.display());
        Ok(())
    }

    /// Deletes the preset `name`. Returns whether it existed.
    pub fn remove(&self, name: &str) -> CoreResult<bool> {
        let mut document = self.read_document();
        if document.remove(name).is_none() {
            return Ok(false);
        }
        self.write_document(&document)?;
        log::debug!("Removed preset '{}' from {}", name, self.path.display());
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_keys_take_defaults() {
        let settings: PresetSettings = serde_json::from_str(r#"{"quality": 30}"#).unwrap();
        assert_eq!(settings.quality, 30);
        assert_eq!(settings.frame_rate, 24);
        assert_eq!(settings.video_codec, "H.264");
        assert!(settings.maintain_aspect_ratio);
        assert!(settings.custom_command.is_empty());
    }

    #[test]
    fn test_camel_case_keys() {
        let value = serde_json::to_value(PresetSettings::default()).unwrap();
        for key in [
            "inputPath",
            "outputPath",
            "videoFormat",
            "videoCodec",
            "frameRate",
            "quality",
            "width",
            "height",
            "maintainAspectRatio",
            "imageFormat",
            "startFrame",
            "endFrame",
            "extractAllFrames",
            "customCommand",
        ] {
            assert!(value.get(key).is_some(), "missing key {key}");
        }
    }

    #[test]
    fn test_request_conversion_keeps_fields() {
        let request = ConversionRequest::sequence_to_video("/seq", "/out.mkv")
            .with_video(VideoSettings {
                format: VideoFormat::Mkv,
                codec: VideoCodec::ProRes,
                frame_rate: 30,
                quality: 12,
                width: 3840,
                height: 2160,
                maintain_aspect_ratio: false,
            })
            .with_custom_command("ffmpeg -h");

        let settings = PresetSettings::from(&request);
        assert_eq!(settings.video_format, "MKV");
        assert_eq!(settings.video_codec, "ProRes");
        assert_eq!(settings.to_request(ConversionMode::SequenceToVideo), request);
    }

    #[test]
    fn test_unknown_names_resolve_to_defaults() {
        let settings = PresetSettings {
            video_codec: "av1".to_string(),
            video_format: "flv".to_string(),
            image_format: "gif".to_string(),
            ..PresetSettings::default()
        };
        let request = settings.to_request(ConversionMode::VideoToSequence);
        assert_eq!(request.video.codec, VideoCodec::H264);
        assert_eq!(request.video.format, VideoFormat::Mp4);
        assert_eq!(request.sequence.image_format, ImageFormat::Png);
        assert_eq!(request.custom_command(), None);
    }

    #[test]
    fn test_store_save_load_remove() {
        let dir = tempfile::tempdir().unwrap();
        let store = PresetStore::new(dir.path().join("presets").join("presets.json"));
        assert!(store.load().is_empty());
        assert!(!store.remove("nothing").unwrap());

        let settings = PresetSettings {
            quality: 18,
            ..PresetSettings::default()
        };
        store.save("hq", &settings).unwrap();
        store.save("default", &PresetSettings::default()).unwrap();

        assert_eq!(store.names(), vec!["default".to_string(), "hq".to_string()]);
        assert_eq!(store.get("hq").unwrap(), settings);

        assert!(store.remove("hq").unwrap());
        assert!(matches!(store.get("hq"), Err(CoreError::PresetNotFound(_))));
        assert_eq!(store.names(), vec!["default".to_string()]);
    }

    #[test]
    fn test_malformed_documents_load_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("presets.json");
        let store = PresetStore::new(&path);

        fs::write(&path, "[1, 2, 3]").unwrap();
        assert!(store.load().is_empty());

        fs::write(&path, "{ not json").unwrap();
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_bad_entry_skipped_but_preserved_on_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("presets.json");
        fs::write(&path, r#"{"broken": {"quality": "best"}, "ok": {"width": 640}}"#).unwrap();
        let store = PresetStore::new(&path);

        let loaded = store.load();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded["ok"].width, 640);

        store.save("new", &PresetSettings::default()).unwrap();
        let raw: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["broken"]["quality"], "best");
    }
}
