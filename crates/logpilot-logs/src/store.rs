use std::sync::Arc;

use parking_lot::RwLock;

use crate::splitter::split_chunk;

/// Append-only log store shared between the ingest path and its readers.
///
/// A line's index is its append position and never changes: lines are
/// never removed or reordered, so `len()` only grows.
#[derive(Clone, Default)]
pub struct LogStore {
    lines: Arc<RwLock<Vec<String>>>,
}

impl LogStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Append lines in order, returning the new length
    pub fn append<I>(&self, lines: I) -> usize
    where
        I: IntoIterator<Item = String>,
    {
        let mut store = self.lines.write();
        store.extend(lines);
        store.len()
    }

    /// Split a raw process chunk into lines and append them.
    /// Returns the number of lines appended.
    pub fn push_chunk(&self, chunk: &[u8]) -> usize {
        let lines = split_chunk(chunk);
        let count = lines.len();
        if count > 0 {
            self.append(lines);
        }
        count
    }

    /// Up to `max_count` lines starting at `cursor`, plus the cursor that
    /// follows them
    pub fn slice_from(&self, cursor: usize, max_count: usize) -> (Vec<String>, usize) {
        let store = self.lines.read();
        let end = cursor.saturating_add(max_count).min(store.len());
        match store.get(cursor..end) {
            Some(slice) => (slice.to_vec(), end),
            None => (Vec::new(), cursor),
        }
    }

    /// Line at `index`, if it has been written
    pub fn get(&self, index: usize) -> Option<String> {
        self.lines.read().get(index).cloned()
    }

    /// Total line count
    pub fn len(&self) -> usize {
        self.lines.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.read().is_empty()
    }

    /// Get the last N lines
    pub fn tail(&self, n: usize) -> Vec<String> {
        let store = self.lines.read();
        let start = store.len().saturating_sub(n);
        store[start..].to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_append_order_is_index_order() {
        let store = LogStore::new();
        store.append(lines(&["a", "b"]));
        store.append(lines(&["c"]));
        store.append(Vec::new());
        store.append(lines(&["d", "e"]));

        let (all, cursor) = store.slice_from(0, store.len());
        assert_eq!(all, lines(&["a", "b", "c", "d", "e"]));
        assert_eq!(cursor, 5);
        assert_eq!(store.get(3).as_deref(), Some("d"));
    }

    #[test]
    fn test_slice_from_is_capped() {
        let store = LogStore::new();
        store.append((0..25).map(|i| i.to_string()));

        let (first, cursor) = store.slice_from(0, 10);
        assert_eq!(first.len(), 10);
        assert_eq!(cursor, 10);

        let (rest, cursor) = store.slice_from(20, 10);
        assert_eq!(rest, lines(&["20", "21", "22", "23", "24"]));
        assert_eq!(cursor, 25);

        let (none, cursor) = store.slice_from(25, 10);
        assert!(none.is_empty());
        assert_eq!(cursor, 25);
    }

    #[test]
    fn test_slice_past_end_keeps_cursor() {
        let store = LogStore::new();
        store.append(lines(&["a"]));
        let (none, cursor) = store.slice_from(4, 10);
        assert!(none.is_empty());
        assert_eq!(cursor, 4);
    }

    #[test]
    fn test_push_chunk_splits_lines() {
        let store = LogStore::new();
        assert_eq!(store.push_chunk(b"hello\r\nworld\n"), 2);
        assert_eq!(store.push_chunk(b""), 0);
        assert_eq!(store.tail(5), lines(&["hello", "world"]));
    }

    #[test]
    fn test_tail() {
        let store = LogStore::new();
        assert!(store.is_empty());
        store.append(lines(&["a", "b", "c"]));
        assert_eq!(store.tail(2), lines(&["b", "c"]));
        assert_eq!(store.tail(0), Vec::<String>::new());
    }

    #[test]
    fn test_clones_share_lines() {
        let store = LogStore::new();
        let reader = store.clone();
        store.append(lines(&["shared"]));
        assert_eq!(reader.len(), 1);
    }
}
