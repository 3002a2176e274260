//! Image sequence discovery and naming pattern detection.
//!
//! This module lists the image files of a sequence directory and derives the
//! printf-style input pattern ffmpeg's image2 demuxer expects. Only the top
//! level of the directory is searched.

use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};

/// File extensions (lower-case) recognised as sequence frames.
pub const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "tiff", "tif", "bmp", "exr", "hdr", "pic", "ppm",
];

/// Width of the zero-padded frame placeholder in generated patterns.
///
/// Fixed regardless of how many digits the first frame actually uses.
pub const PATTERN_PADDING_WIDTH: usize = 4;

static TRAILING_DIGITS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)$").expect("trailing digit pattern is valid"));

/// Returns true when the path has one of the [`IMAGE_EXTENSIONS`] (case-insensitive).
#[must_use]
pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|allowed| ext.eq_ignore_ascii_case(allowed))
        })
}

/// Lists the image files in `directory`, sorted by file name.
///
/// Returned paths are absolute. A missing or unreadable directory, or one with
/// no matching files, yields an empty list rather than an error.
///
/// # Examples
///
/// ```rust,no_run
/// use seqconv_core::scanner::scan_image_sequence;
/// use std::path::Path;
///
/// let frames = scan_image_sequence(Path::new("/renders/shot010"));
/// println!("{} frames", frames.len());
/// ```
#[must_use]
pub fn scan_image_sequence(directory: &Path) -> Vec<PathBuf> {
    let directory = std::path::absolute(directory).unwrap_or_else(|_| directory.to_path_buf());

    let read_dir = match std::fs::read_dir(&directory) {
        Ok(read_dir) => read_dir,
        Err(e) => {
            log::debug!("Cannot read image directory {}: {}", directory.display(), e);
            return Vec::new();
        }
    };

    let mut files: Vec<PathBuf> = read_dir
        .filter_map(|entry| {
            let path = entry.ok()?.path();
            (path.is_file() && is_image_file(&path)).then_some(path)
        })
        .collect();

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    log::debug!("Found {} image file(s) in {}", files.len(), directory.display());
    files
}

/// A numbered file name pattern such as `shot%04d.png`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequencePattern {
    /// File stem with the trailing digit run removed.
    pub prefix: String,
    pub padding_width: usize,
    /// Extension as it appears on disk, without the dot.
    pub extension: String,
}

impl SequencePattern {
    /// Renders the pattern, e.g. `frame_%04d.exr`.
    #[must_use]
    pub fn render(&self) -> String {
        format!(
            "{}%0{}d.{}",
            self.prefix, self.padding_width, self.extension
        )
    }
}

/// Detects a trailing frame number in `file_name`.
///
/// The base name is everything before the first dot and the extension is
/// everything after the last one, so `plate.0042.exr` has the base name
/// `plate` and no frame number. Returns `None` when the base name does not
/// end in digits.
#[must_use]
pub fn detect_pattern(file_name: &str) -> Option<SequencePattern> {
    let (base_name, _) = file_name.split_once('.')?;
    let (_, extension) = file_name.rsplit_once('.')?;

    let digits = TRAILING_DIGITS.captures(base_name)?.get(1)?;
    Some(SequencePattern {
        prefix: base_name[..digits.start()].to_string(),
        padding_width: PATTERN_PADDING_WIDTH,
        extension: extension.to_string(),
    })
}

/// Builds the input pattern for a sequence whose first frame is `first_file`.
///
/// Numbered names produce a printf pattern; anything else falls back to a
/// wildcard on the extension.
#[must_use]
pub fn input_pattern(first_file: &Path) -> Option<String> {
    let file_name = first_file.file_name()?.to_str()?;
    match detect_pattern(file_name) {
        Some(pattern) => Some(pattern.render()),
        None => {
            let extension = first_file.extension()?.to_str()?;
            Some(format!("*.{extension}"))
        }
    }
}
