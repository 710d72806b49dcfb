//! Incremental server-sent-event framing

use tracing::debug;

use super::StreamEvent;

/// Frame delimiter
const FRAME_DELIMITER: &[u8] = b"\n\n";

/// Meta-line prefix that carries a payload
const DATA_PREFIX: &str = "data:";

/// Reassembles arbitrarily split chunks into frames and events
///
/// Bytes are buffered undecoded so multi-byte characters split across chunks
/// survive; each complete frame is decoded on its own.
#[derive(Debug, Default)]
pub struct SseFramer {
    buffer: Vec<u8>,
    /// Prefix of `buffer` already searched without finding a delimiter
    scanned: usize,
}

impl SseFramer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and return events for every frame it completed
    pub fn push(&mut self, chunk: &[u8]) -> Vec<StreamEvent> {
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        loop {
            // a delimiter may straddle the old end, so back up by one byte less than its length
            let from = self.scanned.saturating_sub(FRAME_DELIMITER.len() - 1);
            let Some(pos) = find_delimiter(&self.buffer[from..]).map(|p| p + from) else {
                self.scanned = self.buffer.len();
                break;
            };
            let frame: Vec<u8> = self.buffer.drain(..pos + FRAME_DELIMITER.len()).collect();
            self.scanned = 0;
            events.extend(parse_frame(&String::from_utf8_lossy(&frame)));
        }
        events
    }

    /// Flush a trailing frame that was never delimited
    pub fn finish(self) -> Vec<StreamEvent> {
        if self.buffer.is_empty() {
            return Vec::new();
        }
        debug!(remaining = self.buffer.len(), "SseFramer::finish: flushing partial frame");
        parse_frame(&String::from_utf8_lossy(&self.buffer))
    }

    /// Bytes buffered toward the next frame
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }
}

fn find_delimiter(buffer: &[u8]) -> Option<usize> {
    buffer.windows(FRAME_DELIMITER.len()).position(|w| w == FRAME_DELIMITER)
}

/// Parse one frame into events, one per `data:` line, in line order
pub fn parse_frame(frame: &str) -> Vec<StreamEvent> {
    frame
        .split('\n')
        .filter_map(|line| line.strip_prefix(DATA_PREFIX))
        .map(|payload| StreamEvent::from_payload(payload.trim()))
        .collect()
}
