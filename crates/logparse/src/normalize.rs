/// Input normalization applied before detection and parsing.
///
/// Uploaded logs arrive from every platform: Windows editors prepend a UTF-8
/// byte-order mark and write `\r\n`, old Mac tooling writes bare `\r`. Both
/// are folded away here so that every parser sees `\n`-separated lines only.

use std::borrow::Cow;

const BOM: char = '\u{FEFF}';

/// Strip a leading byte-order mark.
pub fn strip_bom(input: &str) -> &str {
    input.strip_prefix(BOM).unwrap_or(input)
}

/// Strip the BOM and rewrite `\r\n` and lone `\r` as `\n`.
///
/// Borrows when the input is already clean.
pub fn normalize_content(input: &str) -> Cow<'_, str> {
    let input = strip_bom(input);
    if !input.contains('\r') {
        return Cow::Borrowed(input);
    }
    Cow::Owned(input.replace("\r\n", "\n").replace('\r', "\n"))
}

/// Split normalized content into physical lines.
///
/// A trailing newline yields a final empty line, so the line count matches
/// what an editor would show.
pub fn split_lines(content: &str) -> Vec<&str> {
    content.split('\n').collect()
}

/// Lossy UTF-8 decode for raw uploads. Invalid sequences become U+FFFD.
pub fn decode_bytes(raw: &[u8]) -> Cow<'_, str> {
    String::from_utf8_lossy(raw)
}
