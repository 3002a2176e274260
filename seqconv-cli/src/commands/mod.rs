//! Command implementations for the CLI.
//!
//! Each submodule contains the implementation of one subcommand; [`Context`]
//! carries the global flags they share.

pub mod check;
pub mod convert;
pub mod presets;

use crate::cli::Cli;
use crate::error::CliResult;
use seqconv_core::{EngineConfig, EngineConfigBuilder, PresetStore};
use std::path::PathBuf;

/// Global options resolved once per invocation.
#[derive(Debug, Clone, Default)]
pub struct Context {
    pub json: bool,
    pub ffmpeg: Option<PathBuf>,
    pub presets_file: Option<PathBuf>,
}

impl Context {
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            json: cli.json,
            ffmpeg: cli.ffmpeg.clone(),
            presets_file: cli.presets_file.clone(),
        }
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfigBuilder::new()
            .maybe_ffmpeg_path(self.ffmpeg.clone())
            .build()
    }

    pub fn preset_store(&self) -> CliResult<PresetStore> {
        let path = match &self.presets_file {
            Some(path) => path.clone(),
            None => PresetStore::default_location()?,
        };
        Ok(PresetStore::new(path))
    }
}
