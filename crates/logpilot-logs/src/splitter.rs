//! Raw byte chunks to log lines

/// Split one raw chunk from a process stream into lines.
///
/// The chunk is decoded as UTF-8 (invalid sequences become U+FFFD) and split
/// on `\n`, dropping a `\r` that precedes it. A single terminator at the very
/// end of the chunk is stripped so it does not produce an empty trailing line.
///
/// Chunks are processed independently: a line that spans two reads comes out
/// as two lines.
pub fn split_chunk(chunk: &[u8]) -> Vec<String> {
    if chunk.is_empty() {
        return Vec::new();
    }

    let text = String::from_utf8_lossy(chunk);
    let body = match text.strip_suffix('\n') {
        Some(rest) => rest.strip_suffix('\r').unwrap_or(rest),
        None => &text,
    };

    body.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line).to_string())
        .collect()
}
