//! Incremental parser for `data:`-framed streaming responses
//!
//! The native backend streams one JSON payload per server-sent-event data
//! frame, blank-line delimited. Network chunks split frames arbitrarily, so
//! the parser buffers across pushes. Only `data` fields matter here;
//! comments and other SSE fields are skipped.

/// Accumulates network chunks and yields complete data payloads
#[derive(Debug, Default)]
pub struct DataFrameParser {
    /// Unconsumed tail of the byte stream
    buffer: String,
    /// Data lines of the frame under assembly
    data: String,
}

impl DataFrameParser {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one network chunk; returns the payloads it completed.
    pub fn push(&mut self, chunk: &str) -> Vec<String> {
        let mut frames = Vec::new();
        self.buffer.push_str(chunk);

        while let Some(newline) = self.buffer.find('\n') {
            let line = self.buffer[..newline].trim_end_matches('\r').to_string();
            self.buffer.drain(..=newline);

            if line.is_empty() {
                // Blank line closes the frame.
                if !self.data.is_empty() {
                    frames.push(std::mem::take(&mut self.data));
                }
            } else {
                self.take_data_line(&line);
            }
        }

        frames
    }

    /// Yield a trailing frame the stream never closed with a blank line.
    pub fn finish(&mut self) -> Option<String> {
        if !self.buffer.is_empty() {
            let line = std::mem::take(&mut self.buffer);
            self.take_data_line(line.trim_end_matches('\r'));
        }
        if self.data.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.data))
        }
    }

    fn take_data_line(&mut self, line: &str) {
        if let Some(value) = line.strip_prefix("data:") {
            let value = value.strip_prefix(' ').unwrap_or(value);
            if !self.data.is_empty() {
                self.data.push('\n');
            }
            self.data.push_str(value);
        }
        // Comments, event names, ids: irrelevant for this backend.
    }
}
