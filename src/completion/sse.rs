// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// Incremental server-sent events decoder for streamed chat completions

use super::types::ChatCompletionChunk;

const DATA_PREFIX: &str = "data:";
const DONE_MARKER: &str = "[DONE]";

/// Decoded event from the stream
#[derive(Debug, Clone, PartialEq)]
pub enum SseEvent {
    /// Text fragment from `choices[0].delta.content`
    Delta(String),
    /// `data: [DONE]` terminator
    Done,
    /// In-band error payload or undecodable data line
    Error(String),
}

/// Buffers raw bytes and yields events for every complete line
///
/// Network reads may split a line (or a multi-byte character) anywhere,
/// so bytes are held until a newline arrives.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed bytes and return the events completed by them
    pub fn push(&mut self, bytes: &[u8]) -> Vec<SseEvent> {
        self.buffer.extend_from_slice(bytes);

        let mut events = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line);
            if let Some(event) = decode_line(line.trim()) {
                events.push(event);
            }
        }
        events
    }

    /// Decode whatever is left once the body ends without a trailing newline
    pub fn finish(&mut self) -> Option<SseEvent> {
        if self.buffer.is_empty() {
            return None;
        }
        let rest = std::mem::take(&mut self.buffer);
        let line = String::from_utf8_lossy(&rest);
        decode_line(line.trim())
    }
}

fn decode_line(line: &str) -> Option<SseEvent> {
    // Blank separators, comments and non-data fields carry no content
    let data = line.strip_prefix(DATA_PREFIX)?.trim_start();
    if data.is_empty() {
        return None;
    }
    if data == DONE_MARKER {
        return Some(SseEvent::Done);
    }

    match serde_json::from_str::<ChatCompletionChunk>(data) {
        Ok(chunk) => {
            if let Some(error) = chunk.error {
                return Some(SseEvent::Error(error.message));
            }
            chunk
                .choices
                .into_iter()
                .next()
                .and_then(|choice| choice.delta.content)
                .filter(|content| !content.is_empty())
                .map(SseEvent::Delta)
        }
        Err(e) => Some(SseEvent::Error(format!("Malformed stream data: {}", e))),
    }
}
