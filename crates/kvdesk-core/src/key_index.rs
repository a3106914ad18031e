/// The store's key set plus the currently visible subset.
#[derive(Debug, Clone, Default)]
pub struct KeyIndex {
    all: Vec<String>,
    filtered: Vec<String>,
}

impl KeyIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the key set. The visible subset becomes the full set.
    pub fn set_all<I, S>(&mut self, keys: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.all = keys.into_iter().map(Into::into).collect();
        self.filtered = self.all.clone();
    }

    /// Keep the keys containing `substring`, ignoring case, in store order.
    /// An empty substring shows every key.
    pub fn filter(&mut self, substring: &str) -> &[String] {
        if substring.is_empty() {
            self.filtered = self.all.clone();
        } else {
            let needle = substring.to_lowercase();
            self.filtered = self
                .all
                .iter()
                .filter(|key| key.to_lowercase().contains(&needle))
                .cloned()
                .collect();
        }
        &self.filtered
    }

    /// Drop `key` from both sets. Removing an unknown key does nothing.
    pub fn remove(&mut self, key: &str) {
        self.all.retain(|k| k != key);
        self.filtered.retain(|k| k != key);
    }

    pub fn all(&self) -> &[String] {
        &self.all
    }

    pub fn visible(&self) -> &[String] {
        &self.filtered
    }

    pub fn len(&self) -> usize {
        self.all.len()
    }

    pub fn is_empty(&self) -> bool {
        self.all.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.all.iter().any(|k| k == key)
    }

    /// Position of `key` in the visible subset
    pub fn position(&self, key: &str) -> Option<usize> {
        self.filtered.iter().position(|k| k == key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index(keys: &[&str]) -> KeyIndex {
        let mut index = KeyIndex::new();
        index.set_all(keys.iter().copied());
        index
    }

    #[test]
    fn empty_filter_returns_everything_in_order() {
        let mut idx = index(&["b", "a", "c"]);
        assert_eq!(idx.filter(""), ["b", "a", "c"]);
    }

    #[test]
    fn filter_is_case_insensitive_substring() {
        let mut idx = index(&["UserA", "userB", "other"]);
        assert_eq!(idx.filter("user"), ["UserA", "userB"]);
        assert_eq!(idx.filter("SERb"), ["userB"]);
        assert!(idx.filter("missing").is_empty());
        // The authoritative set is never narrowed
        assert_eq!(idx.all().len(), 3);
    }

    #[test]
    fn set_all_resets_the_visible_subset() {
        let mut idx = index(&["one", "two"]);
        idx.filter("one");
        assert_eq!(idx.visible(), ["one"]);

        idx.set_all(["three", "four"]);
        assert_eq!(idx.visible(), ["three", "four"]);
    }

    #[test]
    fn remove_is_idempotent_and_updates_both_sets() {
        let mut idx = index(&["a", "ab", "b"]);
        idx.filter("a");
        idx.remove("ab");
        assert_eq!(idx.all(), ["a", "b"]);
        assert_eq!(idx.visible(), ["a"]);

        idx.remove("ab");
        idx.remove("zzz");
        assert_eq!(idx.all(), ["a", "b"]);
    }

    #[test]
    fn position_refers_to_visible_keys() {
        let mut idx = index(&["alpha", "beta", "gamma"]);
        idx.filter("a");
        assert_eq!(idx.position("gamma"), Some(2));
        idx.filter("m");
        assert_eq!(idx.position("gamma"), Some(0));
        assert_eq!(idx.position("beta"), None);
        assert!(idx.contains("beta"));
    }
}
