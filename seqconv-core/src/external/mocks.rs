// seqconv-core/src/external/mocks.rs

// --- Mocking Infrastructure (for testing) ---

use super::{EngineProcess, EngineSpawner, ProcessExit};
use crate::builder::Invocation;
use crate::error::{CoreError, CoreResult};
use std::collections::VecDeque;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};

type StderrItem = Result<Vec<u8>, String>;

/// Scripted behaviour for one spawned process.
pub enum MockBehavior {
    /// Writes `chunks` to stderr, then exits.
    Exit {
        chunks: Vec<&'static str>,
        exit: ProcessExit,
    },
    /// Writes `chunks` and keeps running until killed.
    RunUntilKilled { chunks: Vec<&'static str> },
    /// Writes `chunks` and survives being killed.
    IgnoreKill { chunks: Vec<&'static str> },
    /// Writes `chunks`, fails the stderr read, then exits with `exit`.
    ReadError {
        chunks: Vec<&'static str>,
        message: &'static str,
        exit: ProcessExit,
    },
    /// Keeps running, fails the first exit check with `message`, and
    /// exits once killed.
    WaitError { message: &'static str },
    /// Raw byte chunks written to stderr, then exit 0.
    RawBytes(Vec<Vec<u8>>),
    /// The spawn call itself fails.
    FailToSpawn(&'static str),
}

/// Blocking reader over a channel of stderr chunks.
struct ChannelReader {
    receiver: Receiver<StderrItem>,
    current: Vec<u8>,
    position: usize,
}

impl Read for ChannelReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        while self.position >= self.current.len() {
            match self.receiver.recv() {
                Ok(Ok(chunk)) => {
                    self.current = chunk;
                    self.position = 0;
                }
                Ok(Err(message)) => return Err(io::Error::other(message)),
                Err(_) => return Ok(0),
            }
        }
        let n = buf.len().min(self.current.len() - self.position);
        buf[..n].copy_from_slice(&self.current[self.position..self.position + n]);
        self.position += n;
        Ok(n)
    }
}

/// Shared view of what the mock processes went through.
#[derive(Default)]
pub struct MockRecord {
    pub invocations: Mutex<Vec<(PathBuf, Invocation)>>,
    pub killed: AtomicBool,
    /// An exit status was collected after a kill.
    pub reaped: AtomicBool,
}

pub struct MockProcess {
    stderr: Option<ChannelReader>,
    // Keeps stderr open while the process is "running"
    sender: Option<Sender<StderrItem>>,
    exit: Option<ProcessExit>,
    exits_on_kill: bool,
    wait_error: Option<&'static str>,
    record: Arc<MockRecord>,
}

impl EngineProcess for MockProcess {
    fn take_stderr(&mut self) -> Option<Box<dyn Read + Send>> {
        self.stderr
            .take()
            .map(|reader| Box::new(reader) as Box<dyn Read + Send>)
    }

    fn try_wait(&mut self) -> io::Result<Option<ProcessExit>> {
        if let Some(message) = self.wait_error.take() {
            return Err(io::Error::other(message));
        }
        if self.exit.is_some() && self.record.killed.load(Ordering::SeqCst) {
            self.record.reaped.store(true, Ordering::SeqCst);
        }
        Ok(self.exit)
    }

    fn kill(&mut self) -> io::Result<()> {
        self.record.killed.store(true, Ordering::SeqCst);
        if self.exits_on_kill && self.exit.is_none() {
            self.sender = None;
            self.exit = Some(ProcessExit::Crashed);
        }
        Ok(())
    }
}

/// Spawner that replays queued behaviours, one per spawn call.
///
/// With an empty queue every spawn exits 0 without output.
#[derive(Default)]
pub struct MockSpawner {
    behaviors: Mutex<VecDeque<MockBehavior>>,
    pub record: Arc<MockRecord>,
}

impl MockSpawner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, behavior: MockBehavior) -> &Self {
        self.behaviors.lock().unwrap().push_back(behavior);
        self
    }

    pub fn was_killed(&self) -> bool {
        self.record.killed.load(Ordering::SeqCst)
    }

    pub fn was_reaped(&self) -> bool {
        self.record.reaped.load(Ordering::SeqCst)
    }

    pub fn spawn_count(&self) -> usize {
        self.record.invocations.lock().unwrap().len()
    }

    pub fn invocations(&self) -> Vec<(PathBuf, Invocation)> {
        self.record.invocations.lock().unwrap().clone()
    }

    fn process(
        &self,
        items: Vec<StderrItem>,
        exit: Option<ProcessExit>,
        exits_on_kill: bool,
    ) -> MockProcess {
        let (sender, receiver) = mpsc::channel();
        for item in items {
            sender.send(item).unwrap();
        }
        MockProcess {
            stderr: Some(ChannelReader {
                receiver,
                current: Vec::new(),
                position: 0,
            }),
            sender: exit.is_none().then_some(sender),
            exit,
            exits_on_kill,
            wait_error: None,
            record: Arc::clone(&self.record),
        }
    }
}

fn text_chunks(chunks: Vec<&'static str>) -> Vec<StderrItem> {
    chunks
        .into_iter()
        .map(|chunk| Ok(chunk.as_bytes().to_vec()))
        .collect()
}

impl EngineSpawner for MockSpawner {
    type Process = MockProcess;

    fn spawn(&self, program: &Path, invocation: &Invocation) -> CoreResult<Self::Process> {
        let behavior = self
            .behaviors
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(MockBehavior::Exit {
                chunks: Vec::new(),
                exit: ProcessExit::Code(0),
            });

        if let MockBehavior::FailToSpawn(reason) = behavior {
            return Err(CoreError::CommandStart(reason.to_string()));
        }

        self.record
            .invocations
            .lock()
            .unwrap()
            .push((program.to_path_buf(), invocation.clone()));

        let process = match behavior {
            MockBehavior::Exit { chunks, exit } => self.process(text_chunks(chunks), Some(exit), true),
            MockBehavior::RunUntilKilled { chunks } => self.process(text_chunks(chunks), None, true),
            MockBehavior::IgnoreKill { chunks } => self.process(text_chunks(chunks), None, false),
            MockBehavior::ReadError {
                chunks,
                message,
                exit,
            } => {
                let mut items = text_chunks(chunks);
                items.push(Err(message.to_string()));
                self.process(items, Some(exit), true)
            }
            MockBehavior::WaitError { message } => {
                let mut process = self.process(Vec::new(), None, true);
                process.wait_error = Some(message);
                process
            }
            MockBehavior::RawBytes(chunks) => self.process(
                chunks.into_iter().map(Ok).collect(),
                Some(ProcessExit::Code(0)),
                true,
            ),
            MockBehavior::FailToSpawn(_) => unreachable!("handled above"),
        };
        Ok(process)
    }
}
