// ============================================================================
// seqconv-core/src/external/ffmpeg_executor.rs
// ============================================================================
//
// FFMPEG EXECUTOR: FFmpeg Process Management and Abstraction
//
// This module provides the abstraction the supervisor uses to launch ffmpeg
// and to observe the running process. Argument-vector invocations are
// launched through ffmpeg-sidecar with exactly the arguments shown in
// previews; raw custom commands go through the platform shell.
//
// On unix a custom command runs in its own process group, and killing it
// signals the whole group so nothing the shell started outlives a cancel.
//
// KEY COMPONENTS:
// - EngineProcess: Trait representing an active ffmpeg process
// - EngineSpawner: Trait for creating new ffmpeg processes
// - SidecarSpawner: Concrete implementation using ffmpeg-sidecar / std::process
//
// ARCHITECTURE:
// The supervisor is generic over `EngineSpawner`, so tests substitute a
// scripted spawner without touching real processes.
//
// AI-ASSISTANT-INFO: FFmpeg process management and execution abstraction

use crate::builder::Invocation;
use crate::error::{CoreError, CoreResult};
use ffmpeg_sidecar::child::FfmpegChild as SidecarChild;
use ffmpeg_sidecar::command::FfmpegCommand;
use std::io::{self, Read};
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};

/// How a finished process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessExit {
    /// Normal exit with the given code.
    Code(i32),
    /// Terminated by a signal or otherwise without an exit code.
    Crashed,
}

impl ProcessExit {
    #[must_use]
    pub fn is_success(self) -> bool {
        self == Self::Code(0)
    }
}

impl From<ExitStatus> for ProcessExit {
    fn from(status: ExitStatus) -> Self {
        status.code().map_or(Self::Crashed, Self::Code)
    }
}

// --- FFmpeg Execution Abstraction ---

/// Trait representing an active ffmpeg process instance.
///
/// The supervising thread owns the process exclusively; implementations
/// only need to be movable across threads.
pub trait EngineProcess: Send + 'static {
    /// Takes the process's stderr pipe. Returns `None` after the first call.
    fn take_stderr(&mut self) -> Option<Box<dyn Read + Send>>;

    /// Returns the exit state without blocking.
    fn try_wait(&mut self) -> io::Result<Option<ProcessExit>>;

    /// Forcefully terminates the process.
    fn kill(&mut self) -> io::Result<()>;
}

/// Trait representing something that can spawn an `EngineProcess`.
pub trait EngineSpawner: Send + Sync + 'static {
    type Process: EngineProcess;

    /// Launches `invocation`. `program` is only used for argument vectors.
    fn spawn(&self, program: &Path, invocation: &Invocation) -> CoreResult<Self::Process>;
}

// --- Concrete Implementation using ffmpeg-sidecar ---

/// A process launched by [`SidecarSpawner`].
pub enum SidecarProcess {
    /// ffmpeg launched directly with an argument vector.
    Sidecar(SidecarChild),
    /// A custom command line running under the platform shell.
    Shell(Child),
}

impl EngineProcess for SidecarProcess {
    fn take_stderr(&mut self) -> Option<Box<dyn Read + Send>> {
        match self {
            Self::Sidecar(child) => child
                .take_stderr()
                .map(|stderr| Box::new(stderr) as Box<dyn Read + Send>),
            Self::Shell(child) => child
                .stderr
                .take()
                .map(|stderr| Box::new(stderr) as Box<dyn Read + Send>),
        }
    }

    fn try_wait(&mut self) -> io::Result<Option<ProcessExit>> {
        let child = match self {
            Self::Sidecar(child) => child.as_inner_mut(),
            Self::Shell(child) => child,
        };
        Ok(child.try_wait()?.map(ProcessExit::from))
    }

    fn kill(&mut self) -> io::Result<()> {
        match self {
            Self::Sidecar(child) => child.kill(),
            Self::Shell(child) => kill_shell(child),
        }
    }
}

#[cfg(unix)]
fn kill_shell(child: &mut Child) -> io::Result<()> {
    use nix::errno::Errno;
    use nix::sys::signal::{Signal, killpg};
    use nix::unistd::Pid;

    let pgid = i32::try_from(child.id()).map_err(io::Error::other)?;
    match killpg(Pid::from_raw(pgid), Signal::SIGKILL) {
        Ok(()) => Ok(()),
        // Group already gone; the shell itself may still need reaping
        Err(Errno::ESRCH) => child.kill(),
        Err(e) => Err(io::Error::from(e)),
    }
}

#[cfg(not(unix))]
fn kill_shell(child: &mut Child) -> io::Result<()> {
    child.kill()
}

/// Concrete implementation of `EngineSpawner` using `ffmpeg-sidecar`.
#[derive(Debug, Clone, Default)]
pub struct SidecarSpawner;

impl SidecarSpawner {
    fn shell_command(command_line: &str) -> Command {
        let (shell, flag) = super::platform_shell();
        let mut cmd = Command::new(shell);
        cmd.arg(flag)
            .arg(command_line)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            cmd.process_group(0);
        }
        cmd
    }

    /// An ffmpeg command that runs `args` untouched.
    ///
    /// `FfmpegCommand::new_with_path` would add its own `-loglevel` flags,
    /// and `spawn` only adds `-n` when no overwrite flag is present, which
    /// `Invocation::launch_args` already guarantees.
    fn engine_command(program: &Path, args: &[String]) -> FfmpegCommand {
        let mut inner = Command::new(program);
        inner
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        let mut cmd = FfmpegCommand::from(inner);
        cmd.args(args);
        cmd
    }
}

impl EngineSpawner for SidecarSpawner {
    type Process = SidecarProcess;

    fn spawn(&self, program: &Path, invocation: &Invocation) -> CoreResult<Self::Process> {
        match invocation {
            Invocation::Args(_) => {
                let args = invocation.launch_args().unwrap_or_default();
                let mut cmd = Self::engine_command(program, &args);
                log::debug!("Spawning {}", invocation.display_command(program));
                cmd.spawn().map(SidecarProcess::Sidecar).map_err(|e| {
                    log::error!("Failed to start {}: {}", program.display(), e);
                    CoreError::CommandStart(e.to_string())
                })
            }
            Invocation::Shell(command_line) => {
                log::debug!("Spawning shell command: {}", command_line);
                Self::shell_command(command_line)
                    .spawn()
                    .map(SidecarProcess::Shell)
                    .map_err(|e| {
                        log::error!("Failed to start shell command: {}", e);
                        CoreError::CommandStart(e.to_string())
                    })
            }
        }
    }
}
