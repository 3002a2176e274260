// ============================================================================
// seqconv-core/src/config/builder.rs
// ============================================================================
//
// CONFIGURATION BUILDER: Builder Pattern for EngineConfig
//
// Fluent construction of `EngineConfig`, used by the CLI to fold command-line
// flags and environment variables over the defaults.
//
// AI-ASSISTANT-INFO: Builder pattern implementation for EngineConfig

use std::path::PathBuf;
use std::time::Duration;

use super::{DEFAULT_CANCEL_GRACE_PERIOD, DEFAULT_POLL_INTERVAL, EngineConfig};

/// Builder for creating EngineConfig instances.
///
/// # Examples
///
/// ```rust
/// use seqconv_core::config::EngineConfigBuilder;
/// use std::path::PathBuf;
/// use std::time::Duration;
///
/// let config = EngineConfigBuilder::new()
///     .ffmpeg_path(PathBuf::from("/opt/ffmpeg/bin/ffmpeg"))
///     .poll_interval(Duration::from_millis(50))
///     .build();
/// assert_eq!(config.poll_interval, Duration::from_millis(50));
/// ```
#[derive(Debug, Clone)]
pub struct EngineConfigBuilder {
    ffmpeg_path: Option<PathBuf>,
    cancel_grace_period: Duration,
    poll_interval: Duration,
}

impl Default for EngineConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            ffmpeg_path: None,
            cancel_grace_period: DEFAULT_CANCEL_GRACE_PERIOD,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Sets an explicit ffmpeg executable.
    #[must_use]
    pub fn ffmpeg_path(mut self, path: PathBuf) -> Self {
        self.ffmpeg_path = Some(path);
        self
    }

    /// Sets the ffmpeg executable if one is given, keeping discovery otherwise.
    #[must_use]
    pub fn maybe_ffmpeg_path(mut self, path: Option<PathBuf>) -> Self {
        self.ffmpeg_path = path;
        self
    }

    #[must_use]
    pub fn cancel_grace_period(mut self, period: Duration) -> Self {
        self.cancel_grace_period = period;
        self
    }

    /// Sets the supervisor poll interval. Zero is raised to one millisecond.
    #[must_use]
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval.max(Duration::from_millis(1));
        self
    }

    #[must_use]
    pub fn build(self) -> EngineConfig {
        EngineConfig {
            ffmpeg_path: self.ffmpeg_path,
            cancel_grace_period: self.cancel_grace_period,
            poll_interval: self.poll_interval,
        }
    }
}
