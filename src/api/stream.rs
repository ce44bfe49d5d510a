use super::logging::emit_sse_parse_error;
use crate::types::gemini::GenerateContentResponse;

/// Incremental parser for `streamGenerateContent?alt=sse` bodies.
///
/// Bytes are buffered until a full event (terminated by a blank line, LF or
/// CRLF) is available, so frames split across network chunks and multi-byte
/// characters split across chunks both decode correctly.
#[derive(Default)]
pub struct StreamParser {
    buffer: Vec<u8>,
}

impl StreamParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn process(&mut self, chunk: &[u8]) -> Vec<GenerateContentResponse> {
        self.buffer.extend_from_slice(chunk);
        let mut events = Vec::new();
        let mut start = 0;

        while let Some((end, separator_len)) = find_event_end(&self.buffer[start..]) {
            let event_bytes = &self.buffer[start..start + end];
            if let Some(event) = parse_event(event_bytes) {
                events.push(event);
            }
            start += end + separator_len;
        }

        if start > 0 {
            self.buffer.drain(..start);
        }

        events
    }

    /// Parses whatever is left once the body has ended without a final blank line.
    pub fn finish(&mut self) -> Vec<GenerateContentResponse> {
        let rest = std::mem::take(&mut self.buffer);
        parse_event(&rest).into_iter().collect()
    }
}

fn find_event_end(buffer: &[u8]) -> Option<(usize, usize)> {
    let lf = find(buffer, b"\n\n").map(|idx| (idx, 2));
    let crlf = find(buffer, b"\r\n\r\n").map(|idx| (idx, 4));
    match (lf, crlf) {
        (Some(a), Some(b)) => Some(if a.0 <= b.0 { a } else { b }),
        (a, b) => a.or(b),
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

fn parse_event(bytes: &[u8]) -> Option<GenerateContentResponse> {
    let text = String::from_utf8_lossy(bytes);
    let data: Vec<&str> = text
        .lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(|rest| rest.strip_prefix(' ').unwrap_or(rest).trim_end_matches('\r'))
        .collect();
    if data.is_empty() {
        return None;
    }
    let json_data = data.join("\n");
    if json_data.trim().is_empty() || json_data.trim() == "[DONE]" {
        return None;
    }

    match serde_json::from_str::<GenerateContentResponse>(&json_data) {
        Ok(event) => Some(event),
        Err(error) => {
            emit_sse_parse_error(&json_data, &error);
            None
        }
    }
}
