//! Incremental index builder
//!
//! Indexing is cooperative: the host calls [`Indexer::process_next`] from its
//! event loop and regains control after every batch, so a catalog of any size
//! never stalls the host for longer than one batch.

use crate::search::SearchIndex;
use crate::text::index_terms;
use crate::types::{Catalog, INDEX_BATCH_SIZE};

/// Indexing progress after one committed entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    /// Entries committed so far
    pub processed: usize,
    /// Entries in the catalog
    pub total:     usize,
    /// Whether the index is complete
    pub ready:     bool,
}

impl Progress {
    /// Fraction of the catalog committed, exactly `1.0` when complete
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        self.processed as f64 / self.total as f64
    }
}

/// Result of asking the indexer to build a catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// A fresh build was started, any previous index was discarded
    Started,
    /// This snapshot is already being indexed, nothing was restarted
    AlreadyBuilding,
    /// This snapshot is already fully indexed
    AlreadyBuilt,
}

/// Builds a [`SearchIndex`] over a catalog in fixed-size batches
#[derive(Debug)]
pub struct Indexer {
    /// Snapshot being indexed
    catalog:    Option<Catalog>,
    /// Index under construction, exclusively written here
    index:      SearchIndex,
    /// Next ordinal to commit
    cursor:     usize,
    /// Entries per batch
    batch_size: usize,
}

impl Indexer {
    /// Create an idle indexer with the given batch size
    ///
    /// # Panics
    /// Panics if `batch_size` is zero
    #[must_use]
    pub fn new(batch_size: usize) -> Self {
        assert!(batch_size > 0, "Batch size must be positive");
        Self { catalog: None, index: SearchIndex::new(), cursor: 0, batch_size }
    }

    /// Begin indexing a catalog snapshot.
    ///
    /// The same snapshot is never restarted. A different snapshot (a refetch)
    /// discards the old index and its ready flag. An empty catalog is ready
    /// immediately.
    pub fn start(&mut self, catalog: &Catalog) -> StartOutcome {
        if self.catalog.as_ref().is_some_and(|current| current.same_snapshot(catalog)) {
            return if self.index.is_ready() {
                StartOutcome::AlreadyBuilt
            } else {
                StartOutcome::AlreadyBuilding
            };
        }

        tracing::info!(entries = catalog.len(), "indexing catalog");
        self.catalog = Some(catalog.clone());
        self.index = SearchIndex::new();
        self.cursor = 0;
        if catalog.is_empty() {
            self.index.mark_ready();
        }
        StartOutcome::Started
    }

    /// Index the next batch, reporting progress after every entry.
    ///
    /// Returns the number of entries committed, or `None` when there is
    /// nothing left to do.
    pub fn process_next<F>(&mut self, mut on_progress: F) -> Option<usize>
    where
        F: FnMut(Progress),
    {
        let catalog = self.catalog.as_ref()?;
        if self.index.is_ready() {
            return None;
        }

        let total = catalog.len();
        let end = (self.cursor + self.batch_size).min(total);
        let start = self.cursor;

        for entry in &catalog.entries()[start..end] {
            self.index.insert(self.cursor, index_terms(&entry.path));
            self.cursor += 1;
            if self.cursor == total {
                self.index.mark_ready();
            }
            on_progress(Progress {
                processed: self.cursor,
                total,
                ready: self.index.is_ready(),
            });
        }

        assert!(self.cursor <= total, "Cursor must not pass the catalog end");
        tracing::debug!(committed = self.cursor, total, "index batch done");
        if self.index.is_ready() {
            tracing::info!(entries = total, "index ready");
        }

        Some(end - start)
    }

    /// Current progress
    #[must_use]
    pub fn progress(&self) -> Progress {
        Progress {
            processed: self.cursor,
            total:     self.catalog.as_ref().map_or(0, Catalog::len),
            ready:     self.index.is_ready(),
        }
    }

    /// Returns true once the current snapshot is fully indexed
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        self.index.is_ready()
    }

    /// Read-only view of the index
    #[must_use]
    pub const fn index(&self) -> &SearchIndex {
        &self.index
    }

    /// Snapshot being indexed
    #[must_use]
    pub const fn catalog(&self) -> Option<&Catalog> {
        self.catalog.as_ref()
    }
}

impl Default for Indexer {
    fn default() -> Self {
        Self::new(INDEX_BATCH_SIZE)
    }
}
