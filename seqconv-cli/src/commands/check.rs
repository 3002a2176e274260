//! Implementation of the `check` subcommand.

use crate::commands::Context;
use crate::error::CliResult;
use crate::terminal;
use seqconv_core::CoreError;
use seqconv_core::locator::probe_engine_version;

/// Reports the ffmpeg executable that conversions would use.
pub fn run_check(ctx: &Context) -> CliResult<()> {
    let path = ctx
        .engine_config()
        .resolve_engine_path()
        .ok_or(CoreError::EngineNotFound)?;
    let version = probe_engine_version(&path)?;

    log::debug!("Engine probe succeeded for {}", path.display());
    terminal::print_section("ffmpeg");
    terminal::print_status("Path", &path.display().to_string());
    terminal::print_status("Version", &version);
    Ok(())
}
