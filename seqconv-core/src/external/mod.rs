// ============================================================================
// seqconv-core/src/external/mod.rs
// ============================================================================
//
// EXTERNAL TOOLS: Interactions with the ffmpeg Executable
//
// This module encapsulates everything that touches the ffmpeg binary:
// finding it, asking it for its version and launching it. Process launching
// sits behind traits so the supervisor can be driven by a scripted spawner
// in tests.
//
// KEY COMPONENTS:
// - locator: conventional install locations + PATH lookup, cached per process
// - ffmpeg_executor: EngineSpawner / EngineProcess traits and the
//   ffmpeg-sidecar backed implementation
//
// AI-ASSISTANT-INFO: External tool interactions and abstractions for ffmpeg

// ============================================================================
// SUBMODULES
// ============================================================================

/// Locating the ffmpeg executable
pub mod locator;

/// Contains traits and implementations for executing ffmpeg commands
pub mod ffmpeg_executor;

#[cfg(test)]
pub(crate) mod mocks;

// ============================================================================
// RE-EXPORTS
// ============================================================================

pub use ffmpeg_executor::{EngineProcess, EngineSpawner, ProcessExit, SidecarProcess, SidecarSpawner};
pub use locator::{
    CONVENTIONAL_LOCATIONS, cached_engine_path, locate_engine, locate_from, probe_engine_version,
};

// ============================================================================
// PLATFORM DETECTION
// ============================================================================

/// Shell used to run custom command lines on this platform.
#[must_use]
pub fn platform_shell() -> (&'static str, &'static str) {
    if cfg!(windows) { ("cmd", "/C") } else { ("sh", "-c") }
}
