// ============================================================================
// seqconv-core/src/error.rs
// ============================================================================
//
// ERROR HANDLING: Error Types for the Conversion Core
//
// This module defines the error types surfaced by seqconv-core. Two families
// exist: `CoreError` covers everything a caller can get back synchronously
// (precondition failures, launch failures, preset I/O), while
// `SessionFailure` describes how an already running ffmpeg session ended
// badly. The `Display` text of both is the user-facing message carried in
// terminal events.
//
// AI-ASSISTANT-INFO: Error types for seqconv-core

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Errors returned by the conversion engine, the supervisor and the preset store.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Another conversion is already in progress.")]
    AlreadyRunning,

    #[error("FFmpeg not found. Please install FFmpeg and restart the application.")]
    EngineNotFound,

    #[error("Please select both input and output paths.")]
    MissingPath,

    #[error("No image files found in the selected directory ({}).", .0.display())]
    NoImagesFound(PathBuf),

    #[error("Failed to start FFmpeg: {0}")]
    CommandStart(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Preset not found: {0}")]
    PresetNotFound(String),

    #[error("Operation failed: {0}")]
    OperationFailed(String),
}

/// Result type for seqconv-core operations
pub type CoreResult<T> = std::result::Result<T, CoreError>;

/// Ways a running ffmpeg session can fail.
///
/// Cancellation is not a failure kind; it is reported through its own
/// outcome status.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionFailure {
    #[error("Conversion failed with exit code {0}")]
    ExitCode(i32),

    #[error("FFmpeg process crashed.")]
    Crashed,

    #[error("Read error occurred: {0}")]
    ReadError(String),

    #[error("Unknown error occurred: {0}")]
    WaitFailed(String),

    #[error("FFmpeg process did not exit within {0:?} of cancellation.")]
    TerminationTimedOut(Duration),
}
