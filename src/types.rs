//! Common types and constants for `gachaview`

use std::sync::Arc;
use std::time::Duration;

/// Number of catalog entries indexed between two yields to the host loop
pub const INDEX_BATCH_SIZE: usize = 100;

/// File name suffixes recognized as images
pub const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// Pointer movement (in either axis) that turns a press into a drag
pub const DRAG_THRESHOLD: f32 = 5.0;

/// Fraction of the viewport width a drag must cover to commit a page turn
pub const COMMIT_FRACTION: f32 = 0.15;

/// Duration of the animated page turn or cancel
pub const TRANSITION_DURATION: Duration = Duration::from_millis(300);

/// Delay before typed search text is propagated to the query engine
pub const QUERY_DEBOUNCE: Duration = Duration::from_millis(500);

/// One image discovered in the source repository
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CatalogEntry {
    /// Slash-delimited repository-relative path
    pub path: String,
    /// Fetchable asset URL derived from `path`
    pub url:  String,
}

/// Ordered, immutable list of catalog entries.
///
/// Cloning is cheap and shares the same snapshot. A refetch produces a new
/// snapshot, which [`Catalog::same_snapshot`] tells apart from the old one.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Arc<[CatalogEntry]>,
}

impl Catalog {
    /// Wrap a list of entries into a new snapshot
    #[must_use]
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        Self { entries: entries.into() }
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the catalog holds no entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry at the given ordinal
    #[must_use]
    pub fn get(&self, ordinal: usize) -> Option<&CatalogEntry> {
        self.entries.get(ordinal)
    }

    /// All entries in catalog order
    #[must_use]
    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    /// Iterator over the entry paths in catalog order
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.path.as_str())
    }

    /// Find the ordinal of an entry by path
    #[must_use]
    pub fn position(&self, path: &str) -> Option<usize> {
        self.entries.iter().position(|entry| entry.path == path)
    }

    /// Returns true if both catalogs are the same fetched snapshot
    #[must_use]
    pub fn same_snapshot(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.entries, &other.entries)
    }
}

const _: () = {
    assert!(INDEX_BATCH_SIZE > 0);
    assert!(DRAG_THRESHOLD > 0.0);
    assert!(COMMIT_FRACTION > 0.0 && COMMIT_FRACTION < 1.0);
};

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(path: &str) -> CatalogEntry {
        CatalogEntry { path: path.to_owned(), url: format!("https://example.test/{path}") }
    }

    #[test]
    fn test_snapshot_identity() {
        let catalog = Catalog::new(vec![entry("a/x.png")]);
        let shared = catalog.clone();
        let refetched = Catalog::new(vec![entry("a/x.png")]);

        assert!(catalog.same_snapshot(&shared));
        assert!(!catalog.same_snapshot(&refetched));
    }

    #[test]
    fn test_position_and_paths() {
        let catalog = Catalog::new(vec![entry("a/x.png"), entry("b/y.jpg")]);
        assert_eq!(catalog.position("b/y.jpg"), Some(1));
        assert_eq!(catalog.position("c/z.png"), None);
        assert_eq!(catalog.paths().collect::<Vec<_>>(), ["a/x.png", "b/y.jpg"]);
    }
}
