use std::collections::{BTreeMap, BTreeSet};

/// Accumulated live search results, kept sorted and free of duplicates
/// so that overlapping rescans are harmless.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchResults {
    indices: Vec<usize>,
}

impl SearchResults {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one batch of matches in
    pub fn extend(&mut self, batch: &[usize]) {
        self.indices.extend_from_slice(batch);
        self.indices.sort_unstable();
        self.indices.dedup();
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.indices
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn contains(&self, index: usize) -> bool {
        self.indices.binary_search(&index).is_ok()
    }

    pub fn clear(&mut self) {
        self.indices.clear();
    }

    /// First result strictly after `current`, wrapping to the first result
    pub fn next_after(&self, current: Option<usize>) -> Option<usize> {
        let first = self.indices.first().copied();
        match current {
            None => first,
            Some(current) => {
                let pos = self.indices.partition_point(|&i| i <= current);
                self.indices.get(pos).copied().or(first)
            }
        }
    }

    /// Last result strictly before `current`, wrapping to the last result
    pub fn previous_before(&self, current: Option<usize>) -> Option<usize> {
        let last = self.indices.last().copied();
        match current {
            None => last,
            Some(current) => {
                let pos = self.indices.partition_point(|&i| i < current);
                pos.checked_sub(1)
                    .and_then(|p| self.indices.get(p).copied())
                    .or(last)
            }
        }
    }
}

/// Match sets of the active filters, keyed by query text
///
/// Filters are OR'd: with any filter active, a line is visible when at least
/// one filter matched it. With none active everything is visible.
#[derive(Debug, Clone, Default)]
pub struct FilterTracker {
    filters: BTreeMap<String, BTreeSet<usize>>,
}

impl FilterTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking `query`. Returns false if it was already tracked.
    pub fn add(&mut self, query: &str) -> bool {
        if self.filters.contains_key(query) {
            return false;
        }
        self.filters.insert(query.to_string(), BTreeSet::new());
        true
    }

    /// Stop tracking `query`, discarding its matches
    pub fn remove(&mut self, query: &str) -> bool {
        self.filters.remove(query).is_some()
    }

    /// Record matches for `query`. Results for an unknown filter (one removed
    /// while its scan was in flight) are dropped and false is returned.
    pub fn append_results(&mut self, query: &str, results: &[usize]) -> bool {
        match self.filters.get_mut(query) {
            Some(set) => {
                set.extend(results.iter().copied());
                true
            }
            None => false,
        }
    }

    pub fn is_active(&self) -> bool {
        !self.filters.is_empty()
    }

    pub fn is_visible(&self, index: usize) -> bool {
        !self.is_active() || self.filters.values().any(|set| set.contains(&index))
    }

    pub fn is_filtered_out(&self, index: usize) -> bool {
        !self.is_visible(index)
    }

    /// Number of matches known so far for `query`
    pub fn known_count(&self, query: &str) -> Option<usize> {
        self.filters.get(query).map(BTreeSet::len)
    }

    /// Tracked queries in a stable order
    pub fn queries(&self) -> impl Iterator<Item = &str> {
        self.filters.keys().map(String::as_str)
    }

    /// Forget all matches but keep the filters
    pub fn clear_matches(&mut self) {
        for set in self.filters.values_mut() {
            set.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accumulation_is_idempotent() {
        let mut results = SearchResults::new();
        results.extend(&[5, 1, 3]);
        results.extend(&[5, 1, 3]);
        results.extend(&[2]);
        assert_eq!(results.as_slice(), &[1, 2, 3, 5]);
        assert!(results.contains(3));
        assert!(!results.contains(4));
    }

    #[test]
    fn test_navigation_wraps() {
        let mut results = SearchResults::new();
        results.extend(&[2, 7, 9]);

        assert_eq!(results.next_after(None), Some(2));
        assert_eq!(results.next_after(Some(2)), Some(7));
        assert_eq!(results.next_after(Some(8)), Some(9));
        assert_eq!(results.next_after(Some(9)), Some(2));

        assert_eq!(results.previous_before(None), Some(9));
        assert_eq!(results.previous_before(Some(9)), Some(7));
        assert_eq!(results.previous_before(Some(2)), Some(9));

        assert_eq!(SearchResults::new().next_after(Some(1)), None);
    }

    #[test]
    fn test_filters_are_ored() {
        let mut tracker = FilterTracker::new();
        assert!(tracker.is_visible(3));

        tracker.add("foo");
        tracker.add("bar");
        tracker.append_results("foo", &[2]);
        tracker.append_results("bar", &[5]);

        assert!(tracker.is_visible(2));
        assert!(tracker.is_visible(5));
        assert!(tracker.is_filtered_out(3));
    }

    #[test]
    fn test_active_filter_without_matches_hides_everything() {
        let mut tracker = FilterTracker::new();
        tracker.add("nothing yet");
        assert!(tracker.is_filtered_out(0));
    }

    #[test]
    fn test_remove_discards_matches() {
        let mut tracker = FilterTracker::new();
        assert!(tracker.add("foo"));
        assert!(!tracker.add("foo"));
        tracker.append_results("foo", &[1, 1, 4]);
        assert_eq!(tracker.known_count("foo"), Some(2));

        assert!(tracker.remove("foo"));
        assert!(!tracker.remove("foo"));
        assert_eq!(tracker.known_count("foo"), None);
        assert!(!tracker.append_results("foo", &[9]));
        assert!(tracker.is_visible(9));
    }

    #[test]
    fn test_clear_matches_keeps_filters() {
        let mut tracker = FilterTracker::new();
        tracker.add("b");
        tracker.add("a");
        tracker.append_results("a", &[1]);
        tracker.clear_matches();

        assert_eq!(tracker.known_count("a"), Some(0));
        assert_eq!(tracker.queries().collect::<Vec<_>>(), vec!["a", "b"]);
    }
}
