//! Implementation of the `to-video`, `to-frames` and `run` subcommands.
//!
//! Settings start from a stored preset (or the defaults), command-line flags
//! override them, and the resulting request is handed to the core engine.
//! The CLI never assembles ffmpeg arguments itself.

use crate::cli::{CommonArgs, RunArgs, ToFramesArgs, ToVideoArgs};
use crate::commands::Context;
use crate::commands::presets::save_preset;
use crate::error::{CliErrorContext, CliResult};
use crate::terminal::{self, TerminalReporter};

use seqconv_core::events::{ChannelEventHandler, JsonProgressHandler};
use seqconv_core::utils::directory_footprint;
use seqconv_core::{
    ConversionEngine, ConversionEvent, ConversionMode, ConversionOutcome, ConversionRequest,
    CoreError, EventDispatcher, OutcomeStatus, format_bytes, format_duration, quality_label,
};

use log::{debug, info, warn};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

/// Starting point for a request: the named preset, or defaults with no paths.
fn base_request(
    ctx: &Context,
    mode: ConversionMode,
    preset: Option<&str>,
) -> CliResult<ConversionRequest> {
    match preset {
        Some(name) => {
            let settings = ctx.preset_store()?.get(name)?;
            debug!("Loaded preset '{}'", name);
            Ok(settings.to_request(mode))
        }
        None => Ok(ConversionRequest::new(mode, PathBuf::new(), PathBuf::new())),
    }
}

pub fn to_video_request(ctx: &Context, args: &ToVideoArgs) -> CliResult<ConversionRequest> {
    let mut request = base_request(
        ctx,
        ConversionMode::SequenceToVideo,
        args.common.preset.as_deref(),
    )?;

    if let Some(dir) = &args.input_dir {
        request.input_path = dir.clone();
    }
    if let Some(file) = &args.output_file {
        request.output_path = file.clone();
    }

    let video = &mut request.video;
    if let Some(format) = args.format {
        video.format = format.into();
    }
    if let Some(codec) = args.codec {
        video.codec = codec.into();
    }
    if let Some(fps) = args.fps {
        video.frame_rate = fps;
    }
    if let Some(quality) = args.quality {
        video.quality = quality;
    }
    if let Some(width) = args.width {
        video.width = width;
    }
    if let Some(height) = args.height {
        video.height = height;
    }
    if args.stretch {
        video.maintain_aspect_ratio = false;
    } else if args.fit {
        video.maintain_aspect_ratio = true;
    }
    Ok(request)
}

pub fn to_frames_request(ctx: &Context, args: &ToFramesArgs) -> CliResult<ConversionRequest> {
    let mut request = base_request(
        ctx,
        ConversionMode::VideoToSequence,
        args.common.preset.as_deref(),
    )?;

    if let Some(file) = &args.input_file {
        request.input_path = file.clone();
    }
    if let Some(dir) = &args.output_dir {
        request.output_path = dir.clone();
    }

    let sequence = &mut request.sequence;
    if let Some(format) = args.image_format {
        sequence.image_format = format.into();
    }
    if args.all {
        sequence.extract_all_frames = true;
    }
    if args.start_frame.is_some() || args.end_frame.is_some() {
        sequence.extract_all_frames = false;
    }
    if let Some(start) = args.start_frame {
        sequence.start_frame = start;
    }
    if let Some(end) = args.end_frame {
        sequence.end_frame = end;
    }
    Ok(request)
}

pub fn run_to_video(ctx: &Context, args: &ToVideoArgs) -> CliResult<OutcomeStatus> {
    let request = to_video_request(ctx, args)?;
    execute(ctx, &request, &args.common)
}

pub fn run_to_frames(ctx: &Context, args: &ToFramesArgs) -> CliResult<OutcomeStatus> {
    let request = to_frames_request(ctx, args)?;

    // ffmpeg will not create the frame directory itself
    let creates_frames = request.custom_command().is_none() && request.has_paths();
    if creates_frames && !args.common.dry_run && !request.output_path.is_dir() {
        fs::create_dir_all(&request.output_path).cli_with_context(|| {
            format!(
                "Failed to create output directory '{}'",
                request.output_path.display()
            )
        })?;
        info!("Created output directory {}", request.output_path.display());
    }

    execute(ctx, &request, &args.common)
}

pub fn run_custom(ctx: &Context, args: &RunArgs) -> CliResult<OutcomeStatus> {
    let request = ConversionRequest::new(ConversionMode::SequenceToVideo, "", "")
        .with_custom_command(args.command.as_str());
    if request.custom_command().is_none() {
        return Err(CoreError::OperationFailed("The command is empty".to_string()));
    }
    let common = CommonArgs {
        dry_run: args.dry_run,
        timeout: args.timeout,
        ..CommonArgs::default()
    };
    execute(ctx, &request, &common)
}

/// Saves, previews or runs `request` and waits for its terminal event.
fn execute(
    ctx: &Context,
    request: &ConversionRequest,
    common: &CommonArgs,
) -> CliResult<OutcomeStatus> {
    if let Some(name) = &common.save_preset {
        save_preset(ctx, name, request)?;
    }

    // The channel goes last so the bar is cleared before the outcome prints
    let (channel, events) = ChannelEventHandler::channel();
    let mut dispatcher = EventDispatcher::new();
    if ctx.json {
        dispatcher.add_handler(Arc::new(JsonProgressHandler::new()));
    } else {
        dispatcher.add_handler(Arc::new(TerminalReporter::new()));
    }
    dispatcher.add_handler(Arc::new(channel));

    let engine = ConversionEngine::new(ctx.engine_config(), dispatcher);
    let command = engine.preview_command(request);

    if common.dry_run {
        println!("{command}");
        return Ok(OutcomeStatus::Succeeded);
    }

    if !ctx.json {
        print_request(request, &engine);
    }

    let started = Instant::now();
    let handle = engine.convert(request)?;
    debug!(
        "Session {} started, expecting {} frames",
        handle.id, handle.total_units
    );

    let timeout = common.timeout.map(Duration::from_secs);
    let outcome = wait_for_outcome(&engine, &events, timeout)?;
    let elapsed = started.elapsed();
    info!("Session {} finished after {}", handle.id, format_duration(elapsed));

    if !ctx.json {
        terminal::print_outcome(&outcome);
        if outcome.is_success() {
            print_summary(request, elapsed);
        }
    }
    Ok(outcome.status)
}

/// Blocks until the session finishes, cancelling it once `timeout` passes.
fn wait_for_outcome(
    engine: &ConversionEngine,
    events: &Receiver<ConversionEvent>,
    timeout: Option<Duration>,
) -> CliResult<ConversionOutcome> {
    let mut deadline = timeout.map(|limit| Instant::now() + limit);

    loop {
        let event = match deadline {
            Some(at) => match events.recv_timeout(at.saturating_duration_since(Instant::now())) {
                Ok(event) => event,
                Err(RecvTimeoutError::Timeout) => {
                    warn!("Time limit reached, cancelling the conversion");
                    engine.cancel();
                    deadline = None;
                    continue;
                }
                Err(RecvTimeoutError::Disconnected) => break,
            },
            None => match events.recv() {
                Ok(event) => event,
                Err(_) => break,
            },
        };

        if let ConversionEvent::Finished { outcome } = event {
            return Ok(outcome);
        }
    }

    Err(CoreError::OperationFailed(
        "Event channel closed before the conversion finished".to_string(),
    ))
}

fn print_request(request: &ConversionRequest, engine: &ConversionEngine) {
    let engine_path = engine
        .engine_path()
        .map_or_else(|| "not found".to_string(), |path| path.display().to_string());

    terminal::print_section("conversion");
    terminal::print_status("Engine", &engine_path);
    if let Some(command) = request.custom_command() {
        terminal::print_status("Command", command);
        return;
    }

    terminal::print_status("Input", &request.input_path.display().to_string());
    terminal::print_status("Output", &request.output_path.display().to_string());
    match request.mode {
        ConversionMode::SequenceToVideo => {
            let video = &request.video;
            terminal::print_status(
                "Video",
                &format!(
                    "{} / {} at {} fps, {}x{}",
                    video.format.display_name(),
                    video.codec.display_name(),
                    video.frame_rate,
                    video.width,
                    video.height
                ),
            );
            terminal::print_status(
                "Quality",
                &format!("{} ({})", video.quality, quality_label(video.quality)),
            );
        }
        ConversionMode::VideoToSequence => {
            let sequence = &request.sequence;
            let range = if sequence.extract_all_frames {
                "all frames".to_string()
            } else {
                format!("{} to {}", sequence.start_frame, sequence.end_frame)
            };
            terminal::print_status("Frames", &range);
            terminal::print_status("Format", sequence.image_format.display_name());
        }
    }
}

fn print_summary(request: &ConversionRequest, elapsed: Duration) {
    terminal::print_section("results");
    terminal::print_status("Elapsed", &format_duration(elapsed));
    if request.custom_command().is_some() {
        return;
    }

    match request.mode {
        ConversionMode::SequenceToVideo => {
            if let Ok(meta) = fs::metadata(&request.output_path) {
                terminal::print_status("Size", &format_bytes(meta.len()));
            }
        }
        ConversionMode::VideoToSequence => {
            let extension = request.sequence.image_format.extension();
            let (count, bytes) = directory_footprint(&request.output_path, &extension);
            terminal::print_status("Frames", &count.to_string());
            terminal::print_status("Size", &format_bytes(bytes));
        }
    }
}
