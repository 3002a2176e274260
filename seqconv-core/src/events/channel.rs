//! Forwards events into an `mpsc` channel.

use super::{ConversionEvent, EventHandler};
use std::sync::mpsc::{self, Receiver, Sender};

/// Event handler that sends a copy of every event to a channel.
///
/// Send errors (receiver dropped) are ignored.
pub struct ChannelEventHandler {
    sender: Sender<ConversionEvent>,
}

impl ChannelEventHandler {
    #[must_use]
    pub fn new(sender: Sender<ConversionEvent>) -> Self {
        Self { sender }
    }

    /// Creates a handler together with the receiving end of its channel.
    #[must_use]
    pub fn channel() -> (Self, Receiver<ConversionEvent>) {
        let (sender, receiver) = mpsc::channel();
        (Self::new(sender), receiver)
    }
}

impl EventHandler for ChannelEventHandler {
    fn handle(&self, event: &ConversionEvent) {
        let _ = self.sender.send(event.clone());
    }
}
