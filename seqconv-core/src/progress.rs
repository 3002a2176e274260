//! Progress extraction from ffmpeg's stderr stream.
//!
//! ffmpeg reports encoding status on stderr as `frame=  123 fps=...` lines,
//! usually terminated by `\r` instead of `\n`. Reads from the pipe end at
//! arbitrary byte boundaries, so [`ProgressParser`] keeps the unterminated
//! tail of each chunk and [`Utf8ChunkDecoder`] keeps incomplete UTF-8
//! sequences until the rest of their bytes arrive.

use once_cell::sync::Lazy;
use regex::Regex;

static FRAME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"frame=\s*(\d+)").expect("frame counter pattern is valid"));

/// Upper bound for the buffered partial line.
const MAX_PENDING_BYTES: usize = 4096;

/// Returns the value of the last `frame=N` token in `text`.
#[must_use]
pub fn last_frame_number(text: &str) -> Option<u64> {
    FRAME_REGEX
        .captures_iter(text)
        .filter_map(|caps| caps.get(1)?.as_str().parse::<u64>().ok())
        .last()
}

/// Percentage of `total_units` covered by `current`, clamped to 100.
///
/// Returns `None` when the total is unknown (zero).
#[must_use]
pub fn percent_complete(current: u64, total_units: u64) -> Option<u8> {
    if total_units == 0 {
        return None;
    }
    let percent = current.saturating_mul(100) / total_units;
    Some(percent.min(100) as u8)
}

/// Incremental frame-counter parser for one session.
#[derive(Debug, Default)]
pub struct ProgressParser {
    pending: String,
}

impl ProgressParser {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one decoded chunk of stderr and returns the resulting percentage.
    ///
    /// `None` means the chunk (together with the buffered partial line) holds
    /// no frame counter or that `total_units` is zero. A counter cut in half
    /// by a read boundary is reported with the digits seen so far and
    /// corrected by the next chunk, so the value can lag but never overshoot.
    pub fn on_chunk(&mut self, text: &str, total_units: u64) -> Option<u8> {
        let mut combined = std::mem::take(&mut self.pending);
        combined.push_str(text);

        let frame = last_frame_number(&combined);

        let tail_start = combined.rfind(['\r', '\n']).map_or(0, |idx| idx + 1);
        let mut tail_start = tail_start.max(combined.len().saturating_sub(MAX_PENDING_BYTES));
        while !combined.is_char_boundary(tail_start) {
            tail_start += 1;
        }
        self.pending = combined.split_off(tail_start);

        frame.and_then(|frame| percent_complete(frame, total_units))
    }
}

/// Decodes a byte stream as UTF-8 across arbitrary chunk boundaries.
///
/// Invalid sequences are replaced with U+FFFD; a sequence that is merely
/// incomplete at the end of a chunk is held back until the next call.
#[derive(Debug, Default)]
pub struct Utf8ChunkDecoder {
    carry: Vec<u8>,
}

impl Utf8ChunkDecoder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn decode(&mut self, bytes: &[u8]) -> String {
        let mut buffer = std::mem::take(&mut self.carry);
        buffer.extend_from_slice(bytes);

        let mut output = String::with_capacity(buffer.len());
        let mut rest = buffer.as_slice();
        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    output.push_str(valid);
                    break;
                }
                Err(e) => {
                    let (valid, after) = rest.split_at(e.valid_up_to());
                    // `valid_up_to` marks the end of a valid prefix
                    output.push_str(std::str::from_utf8(valid).unwrap_or_default());
                    match e.error_len() {
                        Some(len) => {
                            output.push(char::REPLACEMENT_CHARACTER);
                            rest = &after[len..];
                        }
                        None => {
                            self.carry = after.to_vec();
                            break;
                        }
                    }
                }
            }
        }
        output
    }

    /// Flushes bytes held back at the end of the stream.
    pub fn finish(&mut self) -> String {
        let carry = std::mem::take(&mut self.carry);
        String::from_utf8_lossy(&carry).into_owned()
    }
}
