//! JSON progress handler for structured progress output
//!
//! Writes one JSON object per event, newline-delimited, so wrapper scripts
//! can follow a conversion without scraping human-readable output.

use super::{ConversionEvent, EventHandler, OutcomeStatus};
use serde_json::json;
use std::io::{self, Write};
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

/// Event handler that outputs events as structured JSON to stdout
pub struct JsonProgressHandler {
    output: Mutex<Box<dyn Write + Send>>,
}

impl Default for JsonProgressHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonProgressHandler {
    /// Create a new JSON progress handler that writes to stdout
    #[must_use]
    pub fn new() -> Self {
        Self {
            output: Mutex::new(Box::new(io::stdout())),
        }
    }

    /// Create a new JSON progress handler with a custom writer
    #[must_use]
    pub fn with_writer(writer: Box<dyn Write + Send>) -> Self {
        Self {
            output: Mutex::new(writer),
        }
    }

    /// Get current timestamp as seconds since Unix epoch
    fn get_timestamp() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    }

    fn write_json(&self, value: serde_json::Value) {
        if let Ok(mut output) = self.output.lock() {
            if let Ok(json_str) = serde_json::to_string(&value) {
                let _ = writeln!(output, "{}", json_str);
                let _ = output.flush();
            }
        }
    }
}

fn status_name(status: OutcomeStatus) -> &'static str {
    match status {
        OutcomeStatus::Succeeded => "succeeded",
        OutcomeStatus::Failed => "failed",
        OutcomeStatus::Cancelled => "cancelled",
    }
}

impl EventHandler for JsonProgressHandler {
    fn handle(&self, event: &ConversionEvent) {
        let timestamp = Self::get_timestamp();

        let value = match event {
            ConversionEvent::Progress { percent } => json!({
                "type": "progress",
                "percent": percent,
                "timestamp": timestamp
            }),
            ConversionEvent::Log { message } => json!({
                "type": "log",
                "message": message,
                "timestamp": timestamp
            }),
            ConversionEvent::Finished { outcome } => json!({
                "type": "finished",
                "status": status_name(outcome.status),
                "success": outcome.is_success(),
                "message": outcome.message,
                "timestamp": timestamp
            }),
        };
        self.write_json(value);
    }
}
