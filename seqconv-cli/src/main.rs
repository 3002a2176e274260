// ============================================================================
// seqconv-cli/src/main.rs
// ============================================================================
//
// MAIN ENTRY POINT: seqconv binary
//
// Parses the command line, runs the selected subcommand through the library
// crate and turns its result into the process exit status. Errors returned
// before a conversion starts (missing ffmpeg, missing paths, empty sequence
// directories, unknown presets) are printed here.
//
// AI-ASSISTANT-INFO: Entry point for the seqconv CLI

use clap::Parser;
use owo_colors::OwoColorize;
use seqconv_cli::{Cli, exit_code, run};
use std::process;

fn main() {
    let cli = Cli::parse();

    let code = match run(cli) {
        Ok(status) => exit_code(status),
        Err(e) => {
            log::debug!("Command failed: {:?}", e);
            eprintln!("{} {}", "Error:".red().bold(), e);
            1
        }
    };
    process::exit(code);
}
