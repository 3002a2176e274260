// seqconv-cli/src/lib.rs
//
// Library portion of the seqconv CLI application.
// Contains argument definitions and command logic.

pub mod cli;
pub mod commands;
pub mod error;
pub mod logging;
pub mod terminal;

pub use cli::{Cli, Commands};
pub use commands::Context;
pub use error::CliResult;

use seqconv_core::OutcomeStatus;

/// Exit status for a conversion cancelled by its time limit, as with timeout(1).
pub const EXIT_CANCELLED: i32 = 124;

/// Maps the outcome of a command to the process exit status.
pub fn exit_code(status: OutcomeStatus) -> i32 {
    match status {
        OutcomeStatus::Succeeded => 0,
        OutcomeStatus::Failed => 1,
        OutcomeStatus::Cancelled => EXIT_CANCELLED,
    }
}

/// Runs the parsed command line.
pub fn run(cli: Cli) -> CliResult<OutcomeStatus> {
    let log_path = logging::init_logging(cli.verbose, cli.log_dir.as_deref())?;
    if let Some(path) = &log_path {
        log::info!("Writing run log to {}", path.display());
    }

    let ctx = Context::from_cli(&cli);
    match &cli.command {
        Commands::ToVideo(args) => commands::convert::run_to_video(&ctx, args),
        Commands::ToFrames(args) => commands::convert::run_to_frames(&ctx, args),
        Commands::Run(args) => commands::convert::run_custom(&ctx, args),
        Commands::Check => commands::check::run_check(&ctx).map(|()| OutcomeStatus::Succeeded),
        Commands::Presets(command) => {
            commands::presets::run_presets(&ctx, command.clone()).map(|()| OutcomeStatus::Succeeded)
        }
    }
}
