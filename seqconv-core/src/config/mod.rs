//! Configuration structures and constants for the seqconv-core library.
//!
//! This module holds the settings that shape how the engine runs ffmpeg:
//! which executable to use and the timings of process supervision.

mod builder;

use crate::external::locator;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub use builder::EngineConfigBuilder;

// Default constants

/// How long a cancelled process may take to exit after being killed.
pub const DEFAULT_CANCEL_GRACE_PERIOD: Duration = Duration::from_secs(3);

/// How often the supervising thread checks for exit and cancellation
/// while no stderr output arrives.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Environment variable naming an explicit ffmpeg executable.
pub const ENGINE_PATH_ENV: &str = "SEQCONV_FFMPEG";

/// Configuration for a [`ConversionEngine`](crate::ConversionEngine).
///
/// # Examples
///
/// ```rust
/// use seqconv_core::config::EngineConfigBuilder;
/// use std::time::Duration;
///
/// let config = EngineConfigBuilder::new()
///     .cancel_grace_period(Duration::from_secs(5))
///     .build();
/// assert!(config.ffmpeg_path.is_none());
/// ```
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Explicit ffmpeg executable. Ignored (with a warning) if it does not exist.
    pub ffmpeg_path: Option<PathBuf>,

    pub cancel_grace_period: Duration,

    pub poll_interval: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: None,
            cancel_grace_period: DEFAULT_CANCEL_GRACE_PERIOD,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl EngineConfig {
    /// Resolves the ffmpeg executable to use.
    ///
    /// An explicit path wins when it names an existing file; otherwise the
    /// cached result of the conventional-location and PATH probe is used.
    #[must_use]
    pub fn resolve_engine_path(&self) -> Option<PathBuf> {
        if let Some(path) = &self.ffmpeg_path {
            if path.is_file() {
                return Some(path.clone());
            }
            log::warn!(
                "Configured ffmpeg path {} does not exist; falling back to discovery",
                path.display()
            );
        }
        locator::cached_engine_path().map(Path::to_path_buf)
    }
}
