use logpilot_logs::ansi_to_html;
use tracing::warn;

/// Client-side copy of the server's log store
///
/// Frames land in a pending queue and are moved into `lines` by
/// [`LogMirror::flush`], so a burst of frames becomes a single append.
#[derive(Debug, Default)]
pub struct LogMirror {
    lines: Vec<String>,
    pending: Vec<String>,
}

impl LogMirror {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index the next received line should have
    pub fn next_index(&self) -> usize {
        self.lines.len() + self.pending.len()
    }

    /// Queue a frame's lines.
    ///
    /// Lines the mirror already holds (a reconnect replays the store from
    /// index 0) are skipped. Returns the number of lines queued.
    pub fn receive_frame(&mut self, logs: Vec<String>, cursor: Option<usize>) -> usize {
        let expected = self.next_index();
        let cursor = cursor.unwrap_or(expected);

        if cursor > expected {
            warn!(expected, cursor, "Log frame skips lines; mirror indices will drift");
            let count = logs.len();
            self.pending.extend(logs);
            return count;
        }

        let already_have = expected - cursor;
        if already_have >= logs.len() {
            return 0;
        }
        let fresh = logs.into_iter().skip(already_have);
        let before = self.pending.len();
        self.pending.extend(fresh);
        self.pending.len() - before
    }

    /// Move pending lines into the mirror, returning them
    pub fn flush(&mut self) -> Option<Vec<String>> {
        if self.pending.is_empty() {
            return None;
        }
        let flushed = std::mem::take(&mut self.pending);
        self.lines.extend(flushed.iter().cloned());
        Some(flushed)
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Display form of a line; empty lines keep their height
pub fn render_html(line: &str) -> String {
    if line.is_empty() {
        "&nbsp;".to_string()
    } else {
        ansi_to_html(line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_frames_coalesce_into_one_flush() {
        let mut mirror = LogMirror::new();
        mirror.receive_frame(lines(&["a", "b"]), Some(0));
        mirror.receive_frame(lines(&["c"]), Some(2));
        assert!(mirror.is_empty());

        assert_eq!(mirror.flush(), Some(lines(&["a", "b", "c"])));
        assert_eq!(mirror.lines(), lines(&["a", "b", "c"]).as_slice());
        assert_eq!(mirror.flush(), None);
    }

    #[test]
    fn test_replay_is_not_duplicated() {
        let mut mirror = LogMirror::new();
        mirror.receive_frame(lines(&["a", "b"]), Some(0));
        mirror.flush();

        // Reconnect: the server starts over from 0
        assert_eq!(mirror.receive_frame(lines(&["a"]), Some(0)), 0);
        assert_eq!(mirror.receive_frame(lines(&["b", "c"]), Some(1)), 1);
        mirror.flush();
        assert_eq!(mirror.lines(), lines(&["a", "b", "c"]).as_slice());
    }

    #[test]
    fn test_frame_without_cursor_appends() {
        let mut mirror = LogMirror::new();
        mirror.receive_frame(lines(&["a"]), None);
        mirror.receive_frame(lines(&["b"]), None);
        assert_eq!(mirror.next_index(), 2);
    }

    #[test]
    fn test_gap_still_appends() {
        let mut mirror = LogMirror::new();
        assert_eq!(mirror.receive_frame(lines(&["x"]), Some(5)), 1);
        assert_eq!(mirror.next_index(), 1);
    }

    #[test]
    fn test_render_html() {
        assert_eq!(render_html(""), "&nbsp;");
        assert_eq!(render_html("a<b"), "a&lt;b");
    }
}
