//! Core library for converting image sequences to video and back with ffmpeg.
//!
//! This crate turns a declarative [`ConversionRequest`] into an ffmpeg command
//! line, runs it as a supervised child process, and reports progress, log
//! output and the final outcome as [`ConversionEvent`]s.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use seqconv_core::{ConversionEngine, ConversionEvent, ConversionRequest, EngineConfig, EventDispatcher};
//! use seqconv_core::request::VideoSettings;
//! use std::sync::Arc;
//!
//! let mut dispatcher = EventDispatcher::new();
//! dispatcher.add_handler(Arc::new(|event: &ConversionEvent| match event {
//!     ConversionEvent::Progress { percent } => println!("{percent}%"),
//!     ConversionEvent::Finished { outcome } => println!("{}", outcome.message),
//!     ConversionEvent::Log { .. } => {}
//! }));
//!
//! let engine = ConversionEngine::new(EngineConfig::default(), dispatcher);
//! let request = ConversionRequest::sequence_to_video("/renders/shot010", "/tmp/shot010.mp4")
//!     .with_video(VideoSettings { quality: 18, ..VideoSettings::default() });
//!
//! println!("{}", engine.preview_command(&request));
//! engine.convert(&request).unwrap();
//! engine.wait_idle(None);
//! ```

pub mod builder;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod external;
pub mod presets;
pub mod progress;
pub mod request;
pub mod scanner;
pub mod supervisor;
pub mod utils;

pub use external::locator;

// Re-exports for public API
pub use builder::{Invocation, build_invocation};
pub use config::{EngineConfig, EngineConfigBuilder};
pub use engine::ConversionEngine;
pub use error::{CoreError, CoreResult, SessionFailure};
pub use events::{
    ConversionEvent, ConversionOutcome, EventDispatcher, EventHandler, OutcomeStatus,
};
pub use presets::{PresetSettings, PresetStore};
pub use request::{
    ConversionMode, ConversionRequest, ImageFormat, SequenceSettings, VideoCodec, VideoFormat,
    VideoSettings, quality_label,
};
pub use scanner::{detect_pattern, scan_image_sequence};
pub use supervisor::{SessionHandle, SessionState};
pub use utils::{format_bytes, format_duration};
