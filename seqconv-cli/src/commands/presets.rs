//! Implementation of the `presets` subcommands and `--save-preset`.

use crate::cli::PresetsCommand;
use crate::commands::Context;
use crate::error::CliResult;
use seqconv_core::{ConversionRequest, CoreError, PresetSettings};

pub fn run_presets(ctx: &Context, command: PresetsCommand) -> CliResult<()> {
    let store = ctx.preset_store()?;
    match command {
        PresetsCommand::List => {
            let names = store.names();
            if names.is_empty() {
                log::info!("No presets stored in {}", store.path().display());
            }
            for name in names {
                println!("{name}");
            }
        }
        PresetsCommand::Show { name } => {
            let settings = store.get(&name)?;
            println!("{}", serde_json::to_string_pretty(&settings)?);
        }
        PresetsCommand::Remove { name } => {
            if !store.remove(&name)? {
                return Err(CoreError::PresetNotFound(name));
            }
            println!("Removed preset '{name}'");
        }
    }
    Ok(())
}

/// Stores the settings of `request` under `name`, replacing any existing preset.
pub fn save_preset(ctx: &Context, name: &str, request: &ConversionRequest) -> CliResult<()> {
    let store = ctx.preset_store()?;
    store.save(name, &PresetSettings::from(request))?;
    log::info!("Saved preset '{}' to {}", name, store.path().display());
    Ok(())
}
