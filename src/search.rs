//! Search index and query engine

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::text::tokenize;

/// Source of index generations, unique within the process
static NEXT_GENERATION: AtomicU64 = AtomicU64::new(0);

/// Token index keyed by catalog ordinal.
///
/// Entries are appended strictly in catalog order and never retracted, so any
/// observer sees a consistent prefix of the catalog. Every new index gets a
/// fresh generation, so a rebuilt index is never mistaken for its predecessor.
#[derive(Debug)]
pub struct SearchIndex {
    /// Identity of this build
    generation: u64,
    /// Indexed terms per ordinal
    terms:      Vec<BTreeSet<String>>,
    /// Ordinals per term, ascending
    postings:   HashMap<String, Vec<usize>>,
    /// Set once the whole catalog is committed
    ready:      bool,
}

impl SearchIndex {
    /// Create an empty index that is not ready
    #[must_use]
    pub fn new() -> Self {
        Self {
            generation: NEXT_GENERATION.fetch_add(1, Ordering::Relaxed),
            terms:      Vec::new(),
            postings:   HashMap::new(),
            ready:      false,
        }
    }

    /// Build identity, distinct for every index created
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Commit the terms of the next ordinal.
    ///
    /// # Panics
    /// Panics if `ordinal` is not the next uncommitted ordinal or the index is
    /// already marked ready.
    pub fn insert(&mut self, ordinal: usize, terms: BTreeSet<String>) {
        assert_eq!(ordinal, self.terms.len(), "Ordinals must be committed in catalog order");
        assert!(!self.ready, "Ready index must not be extended");

        for term in &terms {
            self.postings.entry(term.clone()).or_default().push(ordinal);
        }
        self.terms.push(terms);
    }

    /// Flag the index as complete
    pub const fn mark_ready(&mut self) {
        self.ready = true;
    }

    /// Returns true once every catalog entry is committed
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        self.ready
    }

    /// Number of committed ordinals
    #[must_use]
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Returns true if nothing is committed
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Indexed terms of one ordinal
    #[must_use]
    pub fn terms(&self, ordinal: usize) -> Option<&BTreeSet<String>> {
        self.terms.get(ordinal)
    }

    /// Ordinals holding any of the given terms, ascending and deduplicated
    #[must_use]
    pub fn lookup(&self, query_terms: &[String]) -> Vec<usize> {
        let mut hits = BTreeSet::new();
        for term in query_terms {
            if let Some(ordinals) = self.postings.get(term) {
                hits.extend(ordinals.iter().copied());
            }
        }
        hits.into_iter().collect()
    }
}

impl Default for SearchIndex {
    fn default() -> Self {
        Self::new()
    }
}

/// Turns free-text queries into ordered ordinal lists.
///
/// An empty query yields a shuffled permutation of the whole catalog. The
/// permutation is rolled on first use, for every newly built index and whenever
/// the query goes from non-empty to empty, so the grid stays put while the
/// query is idle.
#[derive(Debug)]
pub struct QueryEngine {
    rng:          StdRng,
    /// Permutation served for the empty query
    shuffled:     Vec<usize>,
    /// Index generation the permutation was rolled for
    shuffled_for: Option<u64>,
    /// Whether the previous query was empty, `None` before the first query
    last_empty:   Option<bool>,
}

impl QueryEngine {
    /// Create an engine seeded from the operating system
    #[must_use]
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_os_rng())
    }

    /// Create an engine with a fixed seed
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    const fn with_rng(rng: StdRng) -> Self {
        Self { rng, shuffled: Vec::new(), shuffled_for: None, last_empty: None }
    }

    /// Run a query against the index.
    ///
    /// Returns nothing until the index is ready; callers re-query once it
    /// flips. Whitespace-only text counts as empty.
    pub fn query(&mut self, text: &str, index: &SearchIndex) -> Vec<usize> {
        if !index.is_ready() {
            return Vec::new();
        }

        let text = text.trim();
        if text.is_empty() {
            let entering_empty = self.last_empty != Some(true);
            if entering_empty || self.shuffled_for != Some(index.generation()) {
                self.reshuffle(index);
            }
            self.last_empty = Some(true);
            return self.shuffled.clone();
        }

        self.last_empty = Some(false);
        let results = index.lookup(&tokenize(text));
        tracing::debug!(query = text, hits = results.len(), "query");
        results
    }

    /// Forget query history so the next empty query reshuffles
    pub fn reset(&mut self) {
        self.shuffled.clear();
        self.shuffled_for = None;
        self.last_empty = None;
    }

    fn reshuffle(&mut self, index: &SearchIndex) {
        self.shuffled = (0..index.len()).collect();
        self.shuffled.shuffle(&mut self.rng);
        self.shuffled_for = Some(index.generation());
    }
}

impl Default for QueryEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Delays typed text until input settles.
#[derive(Debug)]
pub struct QueryDebouncer {
    delay:   Duration,
    pending: Option<(String, Instant)>,
    settled: String,
}

impl QueryDebouncer {
    /// Create a debouncer with the given settle delay and initial text
    #[must_use]
    pub fn new(delay: Duration, initial: &str) -> Self {
        Self { delay, pending: None, settled: initial.to_owned() }
    }

    /// Record new input text at time `now`
    pub fn input(&mut self, text: &str, now: Instant) {
        self.pending = Some((text.to_owned(), now));
    }

    /// Returns the newly settled text once `delay` has elapsed since the last
    /// input, or `None` if nothing changed
    pub fn poll(&mut self, now: Instant) -> Option<&str> {
        let (_, at) = self.pending.as_ref()?;
        if now.saturating_duration_since(*at) < self.delay {
            return None;
        }
        let (text, _) = self.pending.take()?;
        if text == self.settled {
            return None;
        }
        self.settled = text;
        Some(&self.settled)
    }

    /// Last settled text
    #[must_use]
    pub fn settled(&self) -> &str {
        &self.settled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::index_terms;

    const PATHS: [&str; 5] = [
        "C++/Miku_C++.png",
        "C#/Sakura_reading_C#.jpg",
        "Rust/Ferris_holding_Rust.png",
        "Python/Python_cookbook.jpeg",
        "Rust/crab_book.png",
    ];

    fn ready_index(paths: &[&str]) -> SearchIndex {
        let mut index = SearchIndex::new();
        for (ordinal, path) in paths.iter().enumerate() {
            index.insert(ordinal, index_terms(path));
        }
        index.mark_ready();
        index
    }

    fn sorted(mut v: Vec<usize>) -> Vec<usize> {
        v.sort_unstable();
        v
    }

    #[test]
    fn test_not_ready_returns_nothing() {
        let mut index = SearchIndex::new();
        index.insert(0, index_terms(PATHS[0]));

        let mut engine = QueryEngine::with_seed(1);
        assert!(engine.query("miku", &index).is_empty());
        assert!(engine.query("", &index).is_empty());
    }

    #[test]
    fn test_empty_query_is_permutation() {
        let index = ready_index(&PATHS);
        let mut engine = QueryEngine::with_seed(7);

        let results = engine.query("", &index);
        assert_eq!(results.len(), PATHS.len());
        assert_eq!(sorted(results), vec![0, 1, 2, 3, 4]);

        let results = engine.query("  \t ", &index);
        assert_eq!(sorted(results), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_empty_query_stable_while_idle() {
        let paths: Vec<String> = (0..64).map(|i| format!("dir/img_{i}.png")).collect();
        let refs: Vec<&str> = paths.iter().map(String::as_str).collect();
        let index = ready_index(&refs);
        let mut engine = QueryEngine::with_seed(3);

        let first = engine.query("", &index);
        assert_eq!(engine.query(" ", &index), first);
        assert_eq!(engine.query("", &index), first);

        engine.query("img", &index);
        let rerolled = engine.query("", &index);
        assert_eq!(sorted(rerolled.clone()), (0..64).collect::<Vec<_>>());
        assert_ne!(rerolled, first);
    }

    #[test]
    fn test_rebuilt_index_reshuffles() {
        let paths: Vec<String> = (0..64).map(|i| format!("dir/img_{i}.png")).collect();
        let refs: Vec<&str> = paths.iter().map(String::as_str).collect();
        let mut engine = QueryEngine::with_seed(11);

        let first_index = ready_index(&refs);
        let first = engine.query("", &first_index);
        assert_eq!(engine.query("", &first_index), first);

        let refetched = ready_index(&refs);
        assert_ne!(refetched.generation(), first_index.generation());
        let second = engine.query("", &refetched);
        assert_eq!(sorted(second.clone()), (0..64).collect::<Vec<_>>());
        assert_ne!(second, first);
        assert_eq!(engine.query(" ", &refetched), second);
    }

    #[test]
    fn test_symbol_tokens() {
        let index = ready_index(&PATHS);
        let mut engine = QueryEngine::with_seed(0);

        assert_eq!(engine.query("C++", &index), vec![0]);
        assert_eq!(engine.query("c#", &index), vec![1]);
    }

    #[test]
    fn test_or_semantics_and_prefixes() {
        let index = ready_index(&PATHS);
        let mut engine = QueryEngine::with_seed(0);

        assert_eq!(engine.query("rust", &index), vec![2, 4]);
        assert_eq!(engine.query("Pyth", &index), vec![3]);
        assert_eq!(engine.query("miku cookbook", &index), vec![0, 3]);
        assert!(engine.query("haskell", &index).is_empty());
    }

    #[test]
    fn test_hits_share_a_token() {
        let index = ready_index(&PATHS);
        let mut engine = QueryEngine::with_seed(0);

        for query in ["book", "r", "sakura png", "c"] {
            let query_tokens = tokenize(query);
            for ordinal in engine.query(query, &index) {
                let terms = index_terms(PATHS[ordinal]);
                assert!(query_tokens.iter().any(|t| terms.contains(t)), "{query} -> {ordinal}");
            }
        }
    }

    #[test]
    fn test_empty_catalog() {
        let index = ready_index(&[]);
        let mut engine = QueryEngine::with_seed(0);
        assert!(engine.query("", &index).is_empty());
        assert!(engine.query("rust", &index).is_empty());
    }

    #[test]
    #[should_panic(expected = "catalog order")]
    fn test_out_of_order_insert() {
        let mut index = SearchIndex::new();
        index.insert(1, index_terms(PATHS[0]));
    }

    #[test]
    fn test_debouncer() {
        let start = Instant::now();
        let mut debouncer = QueryDebouncer::new(Duration::from_millis(500), "");

        debouncer.input("r", start);
        debouncer.input("ru", start + Duration::from_millis(100));
        assert_eq!(debouncer.poll(start + Duration::from_millis(400)), None);
        assert_eq!(debouncer.poll(start + Duration::from_millis(600)), Some("ru"));
        assert_eq!(debouncer.poll(start + Duration::from_millis(700)), None);

        debouncer.input("ru", start + Duration::from_millis(800));
        assert_eq!(debouncer.poll(start + Duration::from_secs(2)), None);
        assert_eq!(debouncer.settled(), "ru");
    }
}
