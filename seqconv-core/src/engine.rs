// ============================================================================
// seqconv-core/src/engine.rs
// ============================================================================
//
// CONVERSION ENGINE: Public Facade of the Core
//
// Ties the pieces together: checks preconditions, builds the invocation,
// announces it through log events and hands it to the process supervisor.
// Every rejected request produces a terminal failure event as well as an
// `Err`, so event-driven callers and `?`-driven callers both see it.
//
// AI-ASSISTANT-INFO: Entry point for running image sequence conversions

use crate::builder::{self, Invocation};
use crate::config::EngineConfig;
use crate::error::{CoreError, CoreResult};
use crate::events::{ConversionEvent, ConversionOutcome, EventDispatcher};
use crate::external::{EngineSpawner, SidecarSpawner};
use crate::external::locator::ENGINE_BINARY_NAME;
use crate::request::{ConversionMode, ConversionRequest};
use crate::scanner;
use crate::supervisor::{ProcessSupervisor, SessionHandle, SessionState};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Converts between image sequences and videos by driving ffmpeg.
///
/// At most one conversion runs at a time. Progress, log output and the final
/// outcome are delivered through the [`EventDispatcher`] given at
/// construction.
///
/// # Examples
///
/// ```rust,no_run
/// use seqconv_core::{ConversionEngine, ConversionRequest, EngineConfig, EventDispatcher};
/// use seqconv_core::events::ChannelEventHandler;
/// use std::sync::Arc;
///
/// let (handler, events) = ChannelEventHandler::channel();
/// let dispatcher = EventDispatcher::new().with_handler(Arc::new(handler));
/// let engine = ConversionEngine::new(EngineConfig::default(), dispatcher);
///
/// let request = ConversionRequest::sequence_to_video("/renders/shot010", "/tmp/shot010.mp4");
/// engine.convert(&request)?;
/// for event in events {
///     if event.is_terminal() {
///         break;
///     }
/// }
/// # Ok::<(), seqconv_core::CoreError>(())
/// ```
pub struct ConversionEngine<S: EngineSpawner = SidecarSpawner> {
    engine_path: Option<PathBuf>,
    dispatcher: Arc<EventDispatcher>,
    supervisor: ProcessSupervisor<S>,
}

impl ConversionEngine<SidecarSpawner> {
    /// Creates an engine that launches the real ffmpeg.
    pub fn new(config: EngineConfig, dispatcher: EventDispatcher) -> Self {
        Self::with_spawner(config, dispatcher, SidecarSpawner)
    }
}

impl<S: EngineSpawner> ConversionEngine<S> {
    /// Creates an engine with a custom process spawner.
    pub fn with_spawner(config: EngineConfig, dispatcher: EventDispatcher, spawner: S) -> Self {
        let engine_path = config.resolve_engine_path();
        let dispatcher = Arc::new(dispatcher);
        let supervisor = ProcessSupervisor::new(Arc::new(spawner), Arc::clone(&dispatcher), &config);
        Self {
            engine_path,
            dispatcher,
            supervisor,
        }
    }

    /// Replaces the resolved executable path.
    #[must_use]
    pub fn with_engine_path(mut self, engine_path: Option<PathBuf>) -> Self {
        self.engine_path = engine_path;
        self
    }

    #[must_use]
    pub fn is_engine_available(&self) -> bool {
        self.engine_path.is_some()
    }

    #[must_use]
    pub fn engine_path(&self) -> Option<&Path> {
        self.engine_path.as_deref()
    }

    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.supervisor.is_running()
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.supervisor.state()
    }

    /// Starts the conversion described by `request`, dispatching on its mode.
    pub fn convert(&self, request: &ConversionRequest) -> CoreResult<SessionHandle> {
        self.start_conversion(request, request.mode)
    }

    /// Encodes the images in `request.input_path` into `request.output_path`.
    ///
    /// The request's `mode` field is not consulted.
    pub fn convert_sequence_to_video(&self, request: &ConversionRequest) -> CoreResult<SessionHandle> {
        self.start_conversion(request, ConversionMode::SequenceToVideo)
    }

    /// Extracts frames of `request.input_path` into `request.output_path`.
    ///
    /// The request's `mode` field is not consulted.
    pub fn convert_video_to_sequence(&self, request: &ConversionRequest) -> CoreResult<SessionHandle> {
        self.start_conversion(request, ConversionMode::VideoToSequence)
    }

    /// Requests cancellation of the running conversion. See
    /// [`ProcessSupervisor::cancel`].
    pub fn cancel(&self) -> bool {
        self.supervisor.cancel()
    }

    /// Blocks until no conversion is running or `timeout` elapses.
    pub fn wait_idle(&self, timeout: Option<Duration>) -> bool {
        self.supervisor.wait_idle(timeout)
    }

    /// The command line `request` would run, for display.
    ///
    /// Uses the bare `ffmpeg` name when no executable was found. Scans the
    /// input directory of sequence-to-video requests; never spawns anything.
    #[must_use]
    pub fn preview_command(&self, request: &ConversionRequest) -> String {
        let program = self
            .engine_path
            .as_deref()
            .unwrap_or_else(|| Path::new(ENGINE_BINARY_NAME));
        builder::build_invocation(request).display_command(program)
    }

    /// Reports a request that will not run and hands the error back.
    fn reject<T>(&self, error: CoreError) -> CoreResult<T> {
        log::warn!("Conversion rejected: {}", error);
        self.dispatcher.emit(ConversionEvent::Finished {
            outcome: ConversionOutcome::failed(error.to_string()),
        });
        Err(error)
    }

    fn start_conversion(
        &self,
        request: &ConversionRequest,
        mode: ConversionMode,
    ) -> CoreResult<SessionHandle> {
        if self.supervisor.is_running() {
            return self.reject(CoreError::AlreadyRunning);
        }
        let Some(program) = self.engine_path.as_deref() else {
            return self.reject(CoreError::EngineNotFound);
        };

        if let Some(command) = request.custom_command() {
            let announcements = vec![
                "Running custom FFmpeg command:".to_string(),
                command.to_string(),
            ];
            return self.launch(program, Invocation::Shell(command.to_string()), 0, &announcements);
        }

        if !request.has_paths() {
            return self.reject(CoreError::MissingPath);
        }

        log::info!(
            "Converting {} ({} -> {})",
            mode,
            request.input_path.display(),
            request.output_path.display()
        );

        let (invocation, total_units, heading) = match mode {
            ConversionMode::SequenceToVideo => {
                let images = scanner::scan_image_sequence(&request.input_path);
                let invocation = Invocation::Args(builder::sequence_to_video_args(request, &images));
                if !invocation.has_input() {
                    return self.reject(CoreError::NoImagesFound(request.input_path.clone()));
                }
                (invocation, images.len() as u64, "Starting conversion...")
            }
            ConversionMode::VideoToSequence => {
                let invocation = Invocation::Args(builder::video_to_sequence_args(request));
                (invocation, 0, "Starting video extraction...")
            }
        };

        let announcements = vec![
            heading.to_string(),
            format!("Command: {}", invocation.display_command(program)),
        ];
        self.launch(program, invocation, total_units, &announcements)
    }

    fn launch(
        &self,
        program: &Path,
        invocation: Invocation,
        total_units: u64,
        announcements: &[String],
    ) -> CoreResult<SessionHandle> {
        match self
            .supervisor
            .start(program, invocation, total_units, announcements)
        {
            Ok(handle) => Ok(handle),
            Err(e) => self.reject(e),
        }
    }
}
