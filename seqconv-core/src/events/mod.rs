//! Typed event stream for conversion sessions.
//!
//! Every session produces zero or more `Progress` and `Log` events followed
//! by exactly one `Finished` event. Events of one session are emitted from a
//! single thread, in the order they were produced.

use std::sync::Arc;

pub mod channel;
pub mod json_handler;

pub use channel::ChannelEventHandler;
pub use json_handler::JsonProgressHandler;

pub const MSG_COMPLETED: &str = "Conversion completed successfully!";
pub const MSG_CANCELLED: &str = "Conversion cancelled by user.";

/// How a conversion ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeStatus {
    Succeeded,
    Failed,
    Cancelled,
}

/// Terminal result of a conversion, with its user-facing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionOutcome {
    pub status: OutcomeStatus,
    pub message: String,
}

impl ConversionOutcome {
    #[must_use]
    pub fn succeeded() -> Self {
        Self {
            status: OutcomeStatus::Succeeded,
            message: MSG_COMPLETED.to_string(),
        }
    }

    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            status: OutcomeStatus::Failed,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn cancelled() -> Self {
        Self {
            status: OutcomeStatus::Cancelled,
            message: MSG_CANCELLED.to_string(),
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == OutcomeStatus::Succeeded
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionEvent {
    /// Percentage of total work done, 0-100.
    Progress { percent: u8 },
    /// Engine output or a status line from the core.
    Log { message: String },
    /// The session is over; always the last event of a session.
    Finished { outcome: ConversionOutcome },
}

impl ConversionEvent {
    pub fn log(message: impl Into<String>) -> Self {
        Self::Log {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished { .. })
    }
}

pub trait EventHandler: Send + Sync {
    fn handle(&self, event: &ConversionEvent);
}

impl<F> EventHandler for F
where
    F: Fn(&ConversionEvent) + Send + Sync,
{
    fn handle(&self, event: &ConversionEvent) {
        self(event);
    }
}

pub struct EventDispatcher {
    handlers: Vec<Arc<dyn EventHandler>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    pub fn add_handler(&mut self, handler: Arc<dyn EventHandler>) {
        self.handlers.push(handler);
    }

    #[must_use]
    pub fn with_handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
        self.add_handler(handler);
        self
    }

    pub fn emit(&self, event: ConversionEvent) {
        if let ConversionEvent::Log { message } = &event {
            log::trace!(target: "seqconv::events", "{}", message.trim_end());
        }
        for handler in &self.handlers {
            handler.handle(&event);
        }
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new()
    }
}
