//! Server-sent events consumption
//!
//! Minimal decoder for the progress feed's SSE framing: `data:` lines are
//! accumulated and dispatched as one event per blank line, comment lines
//! (keep-alive heartbeats) are skipped, other fields are ignored. Each event
//! payload is a JSON-encoded [`ProgressSnapshot`].

use async_stream::stream;
use futures::{Stream, StreamExt};
use sesan_common::ProgressSnapshot;
use tracing::debug;

/// Incremental SSE event decoder
///
/// Feed raw transport chunks in; complete event payloads come out. Lines are
/// only decoded once complete, so multi-byte characters split across chunk
/// boundaries survive.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buf: Vec<u8>,
    data_lines: Vec<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume one transport chunk, returning any events it completed
    pub fn push_chunk(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let raw: Vec<u8> = self.buf.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&raw[..pos]);
            let line = line.strip_suffix('\r').unwrap_or(&line);

            if line.is_empty() {
                // Blank line dispatches the accumulated event
                if !self.data_lines.is_empty() {
                    events.push(self.data_lines.join("\n"));
                    self.data_lines.clear();
                }
            } else if let Some(rest) = line.strip_prefix("data:") {
                self.data_lines
                    .push(rest.strip_prefix(' ').unwrap_or(rest).to_string());
            } else if line.starts_with(':') {
                // Comment (heartbeat keep-alive)
            }
            // event:/id:/retry: fields carry nothing we use
        }

        events
    }
}

/// Decode a progress feed response into a stream of snapshots
///
/// The stream ends after a terminal snapshot, when the connection drops, or
/// when the response body finishes. Transport and parse errors end or skip
/// silently; the polling channel is the reliability backstop.
pub fn snapshot_stream(response: reqwest::Response) -> impl Stream<Item = ProgressSnapshot> {
    stream! {
        let mut body = response.bytes_stream();
        let mut decoder = SseDecoder::new();

        while let Some(chunk) = body.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    debug!("SSE: connection dropped: {}", e);
                    return;
                }
            };

            for payload in decoder.push_chunk(&chunk) {
                match serde_json::from_str::<ProgressSnapshot>(&payload) {
                    Ok(snapshot) => {
                        let terminal = snapshot.is_terminal();
                        yield snapshot;
                        if terminal {
                            return;
                        }
                    }
                    Err(e) => debug!("SSE: unparseable event skipped: {}", e),
                }
            }
        }
    }
}
