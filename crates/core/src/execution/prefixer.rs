//! Line-buffered output prefixing
//!
//! Output arrives in arbitrary chunks. [`LinePrefixer`] keeps the unterminated
//! tail of the previous chunk and writes each completed line to the shared
//! sink as `label + " " + line`, so output from many tasks stays readable.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

use crate::output::SharedSink;

#[allow(clippy::expect_used)]
static ESCAPE_CODES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\x1b\x{9b}][\[()#;?]*(?:[0-9]{1,4}(?:;[0-9]{0,4})*)?[0-9A-ORZcf-nqry=><]")
        .expect("escape code pattern is valid")
});

/// Remove ANSI escape sequences such as color codes from `text`
pub fn strip_escape_codes(text: &str) -> Cow<'_, str> {
    ESCAPE_CODES.replace_all(text, "")
}

pub struct LinePrefixer {
    label: String,
    buffer: Vec<u8>,
    sink: SharedSink,
}

impl LinePrefixer {
    pub fn new(label: impl Into<String>, sink: SharedSink) -> Self {
        Self {
            label: label.into(),
            buffer: Vec::new(),
            sink,
        }
    }

    /// Feed one chunk. Every line it completes is written to the sink and
    /// returned without its line feed, in arrival order.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut lines = Vec::new();
        let mut start = 0;
        while let Some(pos) = self.buffer[start..].iter().position(|&b| b == b'\n') {
            let line = String::from_utf8_lossy(&self.buffer[start..start + pos]).into_owned();
            self.emit(&line);
            lines.push(line);
            start += pos + 1;
        }
        self.buffer.drain(..start);
        lines
    }

    /// Flush the unterminated tail, if any, as a final line
    pub fn finish(&mut self) -> Option<String> {
        if self.buffer.is_empty() {
            return None;
        }
        let line = String::from_utf8_lossy(&self.buffer).into_owned();
        self.buffer.clear();
        self.emit(&line);
        Some(line)
    }

    pub fn has_pending(&self) -> bool {
        !self.buffer.is_empty()
    }

    fn emit(&self, line: &str) {
        self.sink.write(&format!("{} {}\n", self.label, line));
    }
}
