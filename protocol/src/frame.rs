//! Text-delta frames: one line `0:"<escaped text>"` per delta.

/// Prefix of a text-delta frame: type discriminator `0`, colon, opening quote.
pub const TEXT_DELTA_PREFIX: &str = "0:\"";

/// Escapes text for embedding in a quoted frame line.
///
/// Backslash goes first so the escapes added afterwards are not doubled.
pub fn escape(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('\t', "\\t")
}

/// Reverses [`escape`]. Unknown escape sequences are kept as written.
pub fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('"') => out.push('"'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Encodes one text delta as a newline-terminated frame.
pub fn encode_text_delta(text: &str) -> String {
    format!("{TEXT_DELTA_PREFIX}{}\"\n", escape(text))
}

/// Decodes one complete frame line (without its newline) into its text delta.
///
/// Returns `None` for anything that is not a text-delta frame.
pub fn decode_frame(line: &str) -> Option<String> {
    let payload = line.strip_prefix(TEXT_DELTA_PREFIX)?.strip_suffix('"')?;
    Some(unescape(payload))
}
