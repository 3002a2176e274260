// ============================================================================
// seqconv-core/src/supervisor.rs
// ============================================================================
//
// PROCESS SUPERVISOR: One ffmpeg Session at a Time
//
// This module launches an invocation, owns the resulting process on a
// dedicated supervising thread, turns its stderr into log and progress
// events, and reports exactly one terminal event when the process ends.
//
// KEY COMPONENTS:
// - ProcessSupervisor: single-session guard plus start / cancel / wait_idle
// - SessionState: Idle -> Starting -> Running (-> Cancelling) -> Idle
// - supervise(): the per-session loop (exit polling, stderr, cancellation)
//
// THREADING:
// A reader thread forwards raw stderr chunks over a channel; the supervising
// thread is the only one that touches the process handle, the parser and the
// event dispatcher for that session. The session slot is released before the
// terminal event is dispatched.
//
// AI-ASSISTANT-INFO: ffmpeg process lifecycle supervision and cancellation

use crate::builder::Invocation;
use crate::config::EngineConfig;
use crate::error::{CoreError, CoreResult, SessionFailure};
use crate::events::{ConversionEvent, ConversionOutcome, EventDispatcher, MSG_CANCELLED};
use crate::external::{EngineProcess, EngineSpawner, ProcessExit};
use crate::progress::{ProgressParser, Utf8ChunkDecoder};
use std::io::{ErrorKind, Read};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

const STDERR_READ_BUFFER: usize = 8192;
const REAP_ATTEMPTS: usize = 5;

/// Lifecycle of the supervisor's single session slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    /// Slot claimed, process being launched.
    Starting,
    Running,
    /// Kill requested, waiting for the process to exit.
    Cancelling,
}

/// Identifies a started session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionHandle {
    pub id: u64,
    /// Frames expected, or 0 when unknown.
    pub total_units: u64,
    /// The command line as shown to users.
    pub command: String,
}

struct ActiveSession {
    id: u64,
    state: SessionState,
    cancel_requested: Arc<AtomicBool>,
}

#[derive(Default)]
struct SessionSlot {
    active: Mutex<Option<ActiveSession>>,
    released: Condvar,
}

impl SessionSlot {
    fn lock(&self) -> MutexGuard<'_, Option<ActiveSession>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn release(&self, id: u64) {
        let mut active = self.lock();
        if active.as_ref().is_some_and(|session| session.id == id) {
            *active = None;
        }
        self.released.notify_all();
    }
}

/// Runs at most one ffmpeg process at a time and reports on it through an
/// [`EventDispatcher`].
pub struct ProcessSupervisor<S: EngineSpawner> {
    spawner: Arc<S>,
    dispatcher: Arc<EventDispatcher>,
    slot: Arc<SessionSlot>,
    next_id: AtomicU64,
    cancel_grace_period: Duration,
    poll_interval: Duration,
}

impl<S: EngineSpawner> ProcessSupervisor<S> {
    pub fn new(spawner: Arc<S>, dispatcher: Arc<EventDispatcher>, config: &EngineConfig) -> Self {
        Self {
            spawner,
            dispatcher,
            slot: Arc::new(SessionSlot::default()),
            next_id: AtomicU64::new(1),
            cancel_grace_period: config.cancel_grace_period,
            poll_interval: config.poll_interval,
        }
    }

    /// Launches `invocation` and starts supervising it.
    ///
    /// Fails with [`CoreError::AlreadyRunning`] without side effects while
    /// another session holds the slot. Otherwise the slot is claimed, each
    /// of `announcements` is emitted as a log event, and the process is
    /// spawned. A launch failure releases the slot and is returned to the
    /// caller without a terminal event.
    pub fn start(
        &self,
        program: &Path,
        invocation: Invocation,
        total_units: u64,
        announcements: &[String],
    ) -> CoreResult<SessionHandle> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let cancel_requested = Arc::new(AtomicBool::new(false));
        {
            let mut active = self.slot.lock();
            if active.is_some() {
                return Err(CoreError::AlreadyRunning);
            }
            *active = Some(ActiveSession {
                id,
                state: SessionState::Starting,
                cancel_requested: Arc::clone(&cancel_requested),
            });
        }

        // The slot is ours, so nothing else writes to the event stream now
        for message in announcements {
            self.dispatcher.emit(ConversionEvent::log(message.as_str()));
        }

        let process = match self.spawner.spawn(program, &invocation) {
            Ok(process) => process,
            Err(e) => {
                self.slot.release(id);
                return Err(e);
            }
        };

        let handle = SessionHandle {
            id,
            total_units,
            command: invocation.display_command(program),
        };
        let context = SessionContext {
            id,
            total_units,
            cancel_requested,
            dispatcher: Arc::clone(&self.dispatcher),
            slot: Arc::clone(&self.slot),
            cancel_grace_period: self.cancel_grace_period,
            poll_interval: self.poll_interval,
        };

        // Running before the thread exists, so a fast exit cannot be overwritten
        if let Some(session) = self.slot.lock().as_mut() {
            session.state = SessionState::Running;
        }

        let spawned = thread::Builder::new()
            .name(format!("seqconv-session-{id}"))
            .spawn(move || supervise(process, context));
        if let Err(e) = spawned {
            self.slot.release(id);
            log::error!("Failed to start supervising thread: {}", e);
            return Err(CoreError::Io(e));
        }

        log::info!("Session {} started: {}", id, handle.command);
        Ok(handle)
    }

    /// Requests termination of the running session.
    ///
    /// Returns immediately; the outcome arrives as the session's terminal
    /// event. Returns `false` (and does nothing) when there is no running
    /// session or it is already being cancelled.
    pub fn cancel(&self) -> bool {
        let mut active = self.slot.lock();
        match active.as_mut() {
            Some(session) if session.state == SessionState::Running => {
                session.cancel_requested.store(true, Ordering::SeqCst);
                session.state = SessionState::Cancelling;
                log::info!("Cancellation requested for session {}", session.id);
                true
            }
            _ => false,
        }
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.slot
            .lock()
            .as_ref()
            .map_or(SessionState::Idle, |session| session.state)
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state() != SessionState::Idle
    }

    /// Blocks until no session is active, or until `timeout` elapses.
    ///
    /// Returns `true` if the supervisor is idle.
    pub fn wait_idle(&self, timeout: Option<Duration>) -> bool {
        let active = self.slot.lock();
        match timeout {
            None => {
                let _guard = self
                    .slot
                    .released
                    .wait_while(active, |active| active.is_some())
                    .unwrap_or_else(PoisonError::into_inner);
                true
            }
            Some(timeout) => {
                let (guard, _) = self
                    .slot
                    .released
                    .wait_timeout_while(active, timeout, |active| active.is_some())
                    .unwrap_or_else(PoisonError::into_inner);
                guard.is_none()
            }
        }
    }
}

// ============================================================================
// SUPERVISING THREAD
// ============================================================================

struct SessionContext {
    id: u64,
    total_units: u64,
    cancel_requested: Arc<AtomicBool>,
    dispatcher: Arc<EventDispatcher>,
    slot: Arc<SessionSlot>,
    cancel_grace_period: Duration,
    poll_interval: Duration,
}

enum StderrMessage {
    Chunk(Vec<u8>),
    Failed(String),
}

fn spawn_stderr_reader(
    mut stderr: Box<dyn Read + Send>,
    sender: Sender<StderrMessage>,
    id: u64,
) -> std::io::Result<thread::JoinHandle<()>> {
    thread::Builder::new()
        .name(format!("seqconv-stderr-{id}"))
        .spawn(move || {
            let mut buffer = [0u8; STDERR_READ_BUFFER];
            loop {
                match stderr.read(&mut buffer) {
                    Ok(0) => break,
                    Ok(n) => {
                        if sender.send(StderrMessage::Chunk(buffer[..n].to_vec())).is_err() {
                            break;
                        }
                    }
                    Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                    Err(e) => {
                        let _ = sender.send(StderrMessage::Failed(e.to_string()));
                        break;
                    }
                }
            }
        })
}

/// Per-session stream state, private to the supervising thread.
struct StderrState {
    decoder: Utf8ChunkDecoder,
    parser: ProgressParser,
    last_percent: Option<u8>,
    read_error: Option<String>,
    open: bool,
}

impl StderrState {
    fn handle(&mut self, message: StderrMessage, context: &SessionContext) {
        match message {
            StderrMessage::Chunk(bytes) => {
                let text = self.decoder.decode(&bytes);
                self.handle_text(&text, context);
            }
            StderrMessage::Failed(reason) => {
                log::warn!("Reading ffmpeg stderr failed: {}", reason);
                self.read_error.get_or_insert(reason);
            }
        }
    }

    fn handle_text(&mut self, text: &str, context: &SessionContext) {
        if text.is_empty() {
            return;
        }
        log::debug!(target: "seqconv::ffmpeg", "{}", text.trim_end());
        context.dispatcher.emit(ConversionEvent::log(text));

        if context.cancel_requested.load(Ordering::SeqCst) {
            return;
        }
        if let Some(percent) = self.parser.on_chunk(text, context.total_units) {
            self.emit_progress(percent, context);
        }
    }

    /// Emits `percent` if it moves progress forward.
    fn emit_progress(&mut self, percent: u8, context: &SessionContext) {
        if self.last_percent.is_none_or(|last| percent > last) {
            self.last_percent = Some(percent);
            context.dispatcher.emit(ConversionEvent::Progress { percent });
        }
    }

    /// Receives one message, waiting at most `timeout`.
    fn poll(&mut self, receiver: &Receiver<StderrMessage>, timeout: Duration, context: &SessionContext) {
        if !self.open {
            thread::sleep(timeout);
            return;
        }
        match receiver.recv_timeout(timeout) {
            Ok(message) => self.handle(message, context),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => self.finish_stream(context),
        }
    }

    /// Reads what is left of stderr after the process exited.
    fn drain(&mut self, receiver: &Receiver<StderrMessage>, deadline: Instant, context: &SessionContext) {
        while self.open {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                log::debug!("Stopped waiting for ffmpeg stderr to close");
                break;
            }
            match receiver.recv_timeout(remaining) {
                Ok(message) => self.handle(message, context),
                Err(RecvTimeoutError::Timeout) => break,
                Err(RecvTimeoutError::Disconnected) => self.finish_stream(context),
            }
        }
    }

    fn finish_stream(&mut self, context: &SessionContext) {
        self.open = false;
        let rest = self.decoder.finish();
        self.handle_text(&rest, context);
    }
}

fn supervise<P: EngineProcess>(mut process: P, context: SessionContext) {
    let (sender, receiver) = mpsc::channel();
    let mut stream = StderrState {
        decoder: Utf8ChunkDecoder::new(),
        parser: ProgressParser::new(),
        last_percent: None,
        read_error: None,
        open: true,
    };

    match process.take_stderr() {
        Some(stderr) => {
            if let Err(e) = spawn_stderr_reader(stderr, sender, context.id) {
                stream.read_error = Some(e.to_string());
            }
        }
        None => drop(sender),
    }

    let mut kill_deadline: Option<Instant> = None;
    let exit = loop {
        if kill_deadline.is_none() && context.cancel_requested.load(Ordering::SeqCst) {
            if let Err(e) = process.kill() {
                log::debug!("Kill request for session {} failed: {}", context.id, e);
            }
            kill_deadline = Some(Instant::now() + context.cancel_grace_period);
            context.dispatcher.emit(ConversionEvent::log(MSG_CANCELLED));
        }

        match process.try_wait() {
            Ok(Some(exit)) => break Ok(exit),
            Ok(None) => {}
            Err(e) => break Err(SessionFailure::WaitFailed(e.to_string())),
        }

        if kill_deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            break Err(SessionFailure::TerminationTimedOut(context.cancel_grace_period));
        }

        stream.poll(&receiver, context.poll_interval, &context);
    };

    match exit {
        Ok(_) => {
            let drain_deadline = Instant::now() + context.cancel_grace_period;
            stream.drain(&receiver, drain_deadline, &context);
        }
        Err(_) => reap(&mut process, &context),
    }

    let cancelled = context.cancel_requested.load(Ordering::SeqCst);
    let outcome = classify(exit, cancelled, stream.read_error.take());

    if outcome.is_success() {
        stream.emit_progress(100, &context);
    }
    log::info!("Session {} finished: {}", context.id, outcome.message);

    context.slot.release(context.id);
    context
        .dispatcher
        .emit(ConversionEvent::Finished { outcome });
}

/// Last attempt to collect a process the supervising loop gave up on.
fn reap<P: EngineProcess>(process: &mut P, context: &SessionContext) {
    if let Err(e) = process.kill() {
        log::debug!("Kill request for session {} failed: {}", context.id, e);
    }
    for _ in 0..REAP_ATTEMPTS {
        match process.try_wait() {
            Ok(Some(_)) => {
                log::debug!("Session {} process reaped", context.id);
                return;
            }
            Ok(None) => thread::sleep(context.poll_interval),
            Err(e) => {
                log::warn!("Session {} process could not be reaped: {}", context.id, e);
                return;
            }
        }
    }
    log::warn!("Session {} process is still running after supervision ended", context.id);
}

/// Maps how the process ended to the session's terminal outcome.
fn classify(
    exit: Result<ProcessExit, SessionFailure>,
    cancelled: bool,
    read_error: Option<String>,
) -> ConversionOutcome {
    match exit {
        Err(failure @ SessionFailure::TerminationTimedOut(_)) => {
            log::error!("{}", failure);
            ConversionOutcome::failed(failure.to_string())
        }
        _ if cancelled => ConversionOutcome::cancelled(),
        Ok(ProcessExit::Code(0)) => match read_error {
            Some(reason) => ConversionOutcome::failed(SessionFailure::ReadError(reason).to_string()),
            None => ConversionOutcome::succeeded(),
        },
        Ok(ProcessExit::Code(code)) => {
            ConversionOutcome::failed(SessionFailure::ExitCode(code).to_string())
        }
        Ok(ProcessExit::Crashed) => ConversionOutcome::failed(SessionFailure::Crashed.to_string()),
        Err(failure) => ConversionOutcome::failed(failure.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{ChannelEventHandler, OutcomeStatus};
    use crate::external::mocks::{MockBehavior, MockSpawner};
    use std::path::PathBuf;

    const RECV_TIMEOUT: Duration = Duration::from_secs(10);

    fn supervisor(spawner: MockSpawner) -> (ProcessSupervisor<MockSpawner>, Receiver<ConversionEvent>, Arc<MockSpawner>) {
        let (handler, receiver) = ChannelEventHandler::channel();
        let dispatcher = EventDispatcher::new().with_handler(Arc::new(handler));
        let config = EngineConfig {
            ffmpeg_path: None,
            cancel_grace_period: Duration::from_millis(200),
            poll_interval: Duration::from_millis(5),
        };
        let spawner = Arc::new(spawner);
        (
            ProcessSupervisor::new(Arc::clone(&spawner), Arc::new(dispatcher), &config),
            receiver,
            spawner,
        )
    }

    /// Collects events up to and including the terminal one.
    fn collect_until_finished(receiver: &Receiver<ConversionEvent>) -> Vec<ConversionEvent> {
        let mut events = Vec::new();
        loop {
            let event = receiver.recv_timeout(RECV_TIMEOUT).expect("terminal event");
            let done = event.is_terminal();
            events.push(event);
            if done {
                return events;
            }
        }
    }

    fn progress_values(events: &[ConversionEvent]) -> Vec<u8> {
        events
            .iter()
            .filter_map(|event| match event {
                ConversionEvent::Progress { percent } => Some(*percent),
                _ => None,
            })
            .collect()
    }

    fn outcome(events: &[ConversionEvent]) -> &ConversionOutcome {
        match events.last() {
            Some(ConversionEvent::Finished { outcome }) => outcome,
            other => panic!("expected terminal event, got {other:?}"),
        }
    }

    fn program() -> PathBuf {
        PathBuf::from("/usr/bin/ffmpeg")
    }

    fn args() -> Invocation {
        Invocation::Args(vec!["-i".into(), "in.mp4".into()])
    }

    #[test]
    fn test_success_reports_progress_then_completion() {
        let spawner = MockSpawner::new();
        spawner.push(MockBehavior::Exit {
            chunks: vec!["frame=   5 fps=0\r", "frame=  10 fps=9\r"],
            exit: ProcessExit::Code(0),
        });
        let (supervisor, receiver, _) = supervisor(spawner);

        let handle = supervisor.start(&program(), args(), 20, &[]).unwrap();
        assert_eq!(handle.total_units, 20);
        assert_eq!(handle.command, "/usr/bin/ffmpeg -i in.mp4");

        let events = collect_until_finished(&receiver);
        assert_eq!(progress_values(&events), vec![25, 50, 100]);
        let outcome = outcome(&events);
        assert!(outcome.is_success());
        assert_eq!(outcome.message, "Conversion completed successfully!");
        assert!(supervisor.wait_idle(Some(RECV_TIMEOUT)));
    }

    #[test]
    fn test_log_events_follow_stderr_order() {
        let spawner = MockSpawner::new();
        spawner.push(MockBehavior::Exit {
            chunks: vec!["ffmpeg version 7.0\n", "Input #0\n", "frame=1\r"],
            exit: ProcessExit::Code(0),
        });
        let (supervisor, receiver, _) = supervisor(spawner);
        supervisor.start(&program(), args(), 0, &[]).unwrap();

        let events = collect_until_finished(&receiver);
        let logs: String = events
            .iter()
            .filter_map(|event| match event {
                ConversionEvent::Log { message } => Some(message.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(logs, "ffmpeg version 7.0\nInput #0\nframe=1\r");
        // Unknown total: only the completion progress is reported
        assert_eq!(progress_values(&events), vec![100]);
    }

    #[test]
    fn test_progress_never_decreases() {
        let spawner = MockSpawner::new();
        spawner.push(MockBehavior::Exit {
            chunks: vec!["frame=8\r", "frame=4\r", "frame=8\r", "frame=9\r"],
            exit: ProcessExit::Code(0),
        });
        let (supervisor, receiver, _) = supervisor(spawner);
        supervisor.start(&program(), args(), 10, &[]).unwrap();

        let events = collect_until_finished(&receiver);
        assert_eq!(progress_values(&events), vec![80, 90, 100]);
    }

    #[test]
    fn test_non_zero_exit_fails_with_code() {
        let spawner = MockSpawner::new();
        spawner.push(MockBehavior::Exit {
            chunks: vec!["frame=2\r", "Conversion failed!\n"],
            exit: ProcessExit::Code(1),
        });
        let (supervisor, receiver, _) = supervisor(spawner);
        supervisor.start(&program(), args(), 4, &[]).unwrap();

        let events = collect_until_finished(&receiver);
        let outcome = outcome(&events);
        assert_eq!(outcome.status, OutcomeStatus::Failed);
        assert_eq!(outcome.message, "Conversion failed with exit code 1");
        assert_eq!(progress_values(&events), vec![50]);
    }

    #[test]
    fn test_crash_is_reported() {
        let spawner = MockSpawner::new();
        spawner.push(MockBehavior::Exit {
            chunks: vec![],
            exit: ProcessExit::Crashed,
        });
        let (supervisor, receiver, _) = supervisor(spawner);
        supervisor.start(&program(), args(), 0, &[]).unwrap();

        let events = collect_until_finished(&receiver);
        assert_eq!(outcome(&events).message, "FFmpeg process crashed.");
    }

    #[test]
    fn test_read_error_fails_clean_exit() {
        let spawner = MockSpawner::new();
        spawner.push(MockBehavior::ReadError {
            chunks: vec!["frame=1\r"],
            message: "pipe closed unexpectedly",
            exit: ProcessExit::Code(0),
        });
        let (supervisor, receiver, _) = supervisor(spawner);
        supervisor.start(&program(), args(), 0, &[]).unwrap();

        let events = collect_until_finished(&receiver);
        assert_eq!(
            outcome(&events).message,
            "Read error occurred: pipe closed unexpectedly"
        );
    }

    #[test]
    fn test_launch_failure_releases_slot_without_events() {
        let spawner = MockSpawner::new();
        spawner.push(MockBehavior::FailToSpawn("permission denied"));
        let (supervisor, receiver, spawner) = supervisor(spawner);

        let err = supervisor.start(&program(), args(), 0, &[]).unwrap_err();
        assert_eq!(err.to_string(), "Failed to start FFmpeg: permission denied");
        assert_eq!(supervisor.state(), SessionState::Idle);
        assert!(receiver.try_recv().is_err());
        assert_eq!(spawner.spawn_count(), 0);

        // The slot is free for the next attempt
        supervisor.start(&program(), args(), 0, &[]).unwrap();
        assert!(outcome(&collect_until_finished(&receiver)).is_success());
    }

    #[test]
    fn test_second_start_rejected_while_running() {
        let spawner = MockSpawner::new();
        spawner.push(MockBehavior::RunUntilKilled { chunks: vec![] });
        let (supervisor, receiver, spawner) = supervisor(spawner);

        supervisor.start(&program(), args(), 0, &[]).unwrap();
        assert_eq!(supervisor.state(), SessionState::Running);

        let announcements = ["Starting video extraction...".to_string()];
        let err = supervisor
            .start(&program(), args(), 0, &announcements)
            .unwrap_err();
        assert!(matches!(err, CoreError::AlreadyRunning));
        assert_eq!(spawner.spawn_count(), 1);
        // The rejected start must not write into the running session's stream
        assert!(receiver.try_recv().is_err());

        assert!(supervisor.cancel());
        let events = collect_until_finished(&receiver);
        assert_eq!(outcome(&events).status, OutcomeStatus::Cancelled);
    }

    #[test]
    fn test_cancel_yields_single_cancelled_event_and_no_progress_after() {
        let spawner = MockSpawner::new();
        spawner.push(MockBehavior::RunUntilKilled {
            chunks: vec!["frame=1\r"],
        });
        let (supervisor, receiver, spawner) = supervisor(spawner);
        supervisor.start(&program(), args(), 10, &[]).unwrap();

        // Wait until the first progress event shows the session is streaming
        loop {
            match receiver.recv_timeout(RECV_TIMEOUT).unwrap() {
                ConversionEvent::Progress { percent } => {
                    assert_eq!(percent, 10);
                    break;
                }
                _ => continue,
            }
        }

        assert!(supervisor.cancel());
        assert!(!supervisor.cancel(), "second cancel is a no-op");

        let events = collect_until_finished(&receiver);
        assert!(progress_values(&events).is_empty());
        let outcome = outcome(&events);
        assert_eq!(outcome.status, OutcomeStatus::Cancelled);
        assert_eq!(outcome.message, "Conversion cancelled by user.");
        assert_eq!(events.iter().filter(|event| event.is_terminal()).count(), 1);
        assert!(spawner.was_killed());

        assert!(supervisor.wait_idle(Some(RECV_TIMEOUT)));
        assert!(receiver.recv_timeout(Duration::from_millis(50)).is_err());
    }

    #[test]
    fn test_cancel_when_idle_is_noop() {
        let (supervisor, receiver, _) = supervisor(MockSpawner::new());
        assert!(!supervisor.cancel());
        assert_eq!(supervisor.state(), SessionState::Idle);
        assert!(receiver.try_recv().is_err());
    }

    #[test]
    fn test_unkillable_process_times_out() {
        let spawner = MockSpawner::new();
        spawner.push(MockBehavior::IgnoreKill { chunks: vec![] });
        let (supervisor, receiver, _) = supervisor(spawner);
        supervisor.start(&program(), args(), 0, &[]).unwrap();

        assert!(supervisor.cancel());
        let events = collect_until_finished(&receiver);
        let outcome = outcome(&events);
        assert_eq!(outcome.status, OutcomeStatus::Failed);
        assert!(outcome.message.contains("did not exit"));
        assert!(supervisor.wait_idle(Some(RECV_TIMEOUT)));
    }

    #[test]
    fn test_failed_exit_check_kills_and_reaps() {
        let spawner = MockSpawner::new();
        spawner.push(MockBehavior::WaitError {
            message: "wait interrupted",
        });
        let (supervisor, receiver, spawner) = supervisor(spawner);
        supervisor.start(&program(), args(), 0, &[]).unwrap();

        let events = collect_until_finished(&receiver);
        let outcome = outcome(&events);
        assert_eq!(outcome.status, OutcomeStatus::Failed);
        assert_eq!(outcome.message, "Unknown error occurred: wait interrupted");
        assert!(spawner.was_killed());
        assert!(spawner.was_reaped());
        assert!(supervisor.wait_idle(Some(RECV_TIMEOUT)));
    }

    #[test]
    fn test_announcements_precede_process_output() {
        let spawner = MockSpawner::new();
        spawner.push(MockBehavior::Exit {
            chunks: vec!["ffmpeg version 7.0\n"],
            exit: ProcessExit::Code(0),
        });
        let (supervisor, receiver, _) = supervisor(spawner);
        let announcements = ["Starting conversion...".to_string(), "Command: ffmpeg".to_string()];
        supervisor
            .start(&program(), args(), 0, &announcements)
            .unwrap();

        let events = collect_until_finished(&receiver);
        assert_eq!(events[0], ConversionEvent::log("Starting conversion..."));
        assert_eq!(events[1], ConversionEvent::log("Command: ffmpeg"));
        assert_eq!(events[2], ConversionEvent::log("ffmpeg version 7.0\n"));
    }

    #[test]
    fn test_split_utf8_and_frame_token_across_chunks() {
        let spawner = MockSpawner::new();
        let text = "résumé frame=  42 fps=1\r".as_bytes().to_vec();
        let (head, tail) = text.split_at(2);
        spawner.push(MockBehavior::RawBytes(vec![
            head.to_vec(),
            tail[..12].to_vec(),
            tail[12..].to_vec(),
        ]));
        let (supervisor, receiver, _) = supervisor(spawner);
        supervisor.start(&program(), args(), 100, &[]).unwrap();

        let events = collect_until_finished(&receiver);
        let logs: String = events
            .iter()
            .filter_map(|event| match event {
                ConversionEvent::Log { message } => Some(message.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(logs, "résumé frame=  42 fps=1\r");
        assert_eq!(progress_values(&events).last(), Some(&100));
        assert!(progress_values(&events).contains(&42));
    }

    #[test]
    fn test_slot_released_before_terminal_event() {
        let spawner = Arc::new(MockSpawner::new());
        let slot_free_at_finish = Arc::new(Mutex::new(None));
        let supervisor_cell: Arc<Mutex<Option<Arc<ProcessSupervisor<MockSpawner>>>>> =
            Arc::new(Mutex::new(None));

        let observed = Arc::clone(&slot_free_at_finish);
        let cell = Arc::clone(&supervisor_cell);
        let dispatcher = EventDispatcher::new().with_handler(Arc::new(move |event: &ConversionEvent| {
            if event.is_terminal() {
                if let Some(supervisor) = cell.lock().unwrap().as_ref() {
                    *observed.lock().unwrap() = Some(supervisor.state());
                }
            }
        }));

        let supervisor = Arc::new(ProcessSupervisor::new(
            Arc::clone(&spawner),
            Arc::new(dispatcher),
            &EngineConfig::default(),
        ));
        *supervisor_cell.lock().unwrap() = Some(Arc::clone(&supervisor));

        supervisor.start(&program(), args(), 0, &[]).unwrap();
        assert!(supervisor.wait_idle(Some(RECV_TIMEOUT)));

        let deadline = Instant::now() + RECV_TIMEOUT;
        while slot_free_at_finish.lock().unwrap().is_none() {
            assert!(Instant::now() < deadline);
            thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(*slot_free_at_finish.lock().unwrap(), Some(SessionState::Idle));
        supervisor_cell.lock().unwrap().take();
    }

    #[test]
    fn test_classify_prefers_timeout_over_cancel() {
        let outcome = classify(
            Err(SessionFailure::TerminationTimedOut(Duration::from_secs(3))),
            true,
            None,
        );
        assert_eq!(outcome.status, OutcomeStatus::Failed);
        assert_eq!(
            classify(Ok(ProcessExit::Code(0)), true, None).status,
            OutcomeStatus::Cancelled
        );
        assert_eq!(
            classify(Err(SessionFailure::WaitFailed("EINTR".into())), false, None).message,
            "Unknown error occurred: EINTR"
        );
    }
}
