//! Incremental line splitting over a byte stream that arrives in arbitrary
//! chunks.

/// Turns a sequence of byte chunks into complete text lines.
///
/// State between chunks is exactly two things: the undecoded tail of a
/// multi-byte UTF-8 sequence cut by a chunk boundary, and the text of a line
/// whose newline has not arrived yet. Neither is ever handed out early.
#[derive(Debug, Default)]
pub struct LineReassembler {
    pending_bytes: Vec<u8>,
    partial_line: String,
}

impl LineReassembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one chunk and returns every line it completed, in order, without
    /// the terminating `\n` (or `\r\n`).
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending_bytes.extend_from_slice(chunk);
        let text = self.decode_pending();
        self.partial_line.push_str(&text);
        self.drain_lines()
    }

    /// Ends the input. Returns the unterminated remainder, if any.
    pub fn finish(&mut self) -> Option<String> {
        if !self.pending_bytes.is_empty() {
            let tail = String::from_utf8_lossy(&self.pending_bytes).into_owned();
            self.partial_line.push_str(&tail);
            self.pending_bytes.clear();
        }
        let mut rest = std::mem::take(&mut self.partial_line);
        if rest.ends_with('\r') {
            rest.pop();
        }
        (!rest.is_empty()).then_some(rest)
    }

    /// Bytes held back because they end in an incomplete UTF-8 sequence.
    pub fn pending_bytes(&self) -> &[u8] {
        &self.pending_bytes
    }

    /// Text received after the last newline.
    pub fn partial_line(&self) -> &str {
        &self.partial_line
    }

    /// Decodes the longest decodable prefix of `pending_bytes`. An incomplete
    /// sequence at the very end stays buffered; invalid sequences elsewhere
    /// become U+FFFD.
    fn decode_pending(&mut self) -> String {
        let mut text = String::new();
        let mut consumed = 0;
        loop {
            let rest = &self.pending_bytes[consumed..];
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    text.push_str(valid);
                    consumed = self.pending_bytes.len();
                    break;
                }
                Err(err) => {
                    let valid_len = err.valid_up_to();
                    text.push_str(&String::from_utf8_lossy(&rest[..valid_len]));
                    match err.error_len() {
                        Some(bad_len) => {
                            text.push(char::REPLACEMENT_CHARACTER);
                            consumed += valid_len + bad_len;
                        }
                        None => {
                            consumed += valid_len;
                            break;
                        }
                    }
                }
            }
        }
        self.pending_bytes.drain(..consumed);
        text
    }

    fn drain_lines(&mut self) -> Vec<String> {
        let Some(last_newline) = self.partial_line.rfind('\n') else {
            return Vec::new();
        };
        let rest = self.partial_line.split_off(last_newline + 1);
        let complete = std::mem::replace(&mut self.partial_line, rest);
        complete[..last_newline]
            .split('\n')
            .map(|line| line.strip_suffix('\r').unwrap_or(line).to_string())
            .collect()
    }
}
