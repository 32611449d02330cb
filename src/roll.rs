//! Gacha roll session
//!
//! Picks a random catalog entry, scores its rarity and produces the link
//! that lets someone else see the same roll.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use url::Url;

use crate::catalog::asset_url;
use crate::error::{Error, Result};
use crate::permalink::{share_link, shared_path};
use crate::rarity::{RarityInfo, RevealAnimation, calculate_rarity};
use crate::types::{Catalog, CatalogEntry};

/// One rolled image
#[derive(Debug, Clone, PartialEq)]
pub struct Roll {
    /// Catalog position of the image
    pub ordinal: usize,
    /// The rolled entry
    pub image:   CatalogEntry,
    /// Rarity against the catalog the roll was made from
    pub rarity:  RarityInfo,
}

impl Roll {
    /// Share link of this roll on the given share page
    #[must_use]
    pub fn share_link(&self, share_page: &Url) -> Url {
        share_link(share_page, &self.image.path)
    }

    /// Reveal animation ending on this roll's rank
    #[must_use]
    pub const fn reveal(&self) -> RevealAnimation {
        RevealAnimation::new(self.rarity.rank)
    }
}

/// Rolls images independently of the grid; a new roll replaces the shown one
#[derive(Debug)]
pub struct RollSession {
    rng:     StdRng,
    current: Option<Roll>,
}

impl RollSession {
    /// Create a session seeded from the operating system
    #[must_use]
    pub fn new() -> Self {
        Self { rng: StdRng::from_os_rng(), current: None }
    }

    /// Create a session with a fixed seed
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self { rng: StdRng::seed_from_u64(seed), current: None }
    }

    /// Pick a uniformly random entry and compute its rarity.
    ///
    /// # Errors
    /// Returns `EmptyCatalog` if there is nothing to roll
    pub fn roll(&mut self, catalog: &Catalog) -> Result<&Roll> {
        if catalog.is_empty() {
            return Err(Error::EmptyCatalog);
        }

        let ordinal = self.rng.random_range(0..catalog.len());
        let image = catalog.get(ordinal).ok_or(Error::EmptyCatalog)?.clone();
        let rarity = calculate_rarity(&image.path, catalog.paths());
        tracing::info!(
            path = %image.path,
            rank = %rarity.rank,
            rate = rarity.appearance_rate,
            "rolled"
        );

        let roll: &Roll = self.current.insert(Roll { ordinal, image, rarity });
        Ok(roll)
    }

    /// Roll currently shown, if any
    #[must_use]
    pub const fn current(&self) -> Option<&Roll> {
        self.current.as_ref()
    }

    /// Dismiss the shown roll
    pub fn clear(&mut self) {
        self.current = None;
    }
}

impl Default for RollSession {
    fn default() -> Self {
        Self::new()
    }
}

/// A roll reconstructed from a share link
#[derive(Debug, Clone, PartialEq)]
pub struct SharedRoll {
    /// Decoded image path
    pub path:   String,
    /// Asset URL re-derived from the path
    pub url:    String,
    /// Rarity against the local catalog, `None` until a catalog is loaded
    pub rarity: Option<RarityInfo>,
}

/// Resolve a share link.
///
/// Rarity is recomputed against `catalog` when one is available; the link
/// itself never carries a rank.
///
/// # Errors
/// Returns `ShareNotFound` if the link has no decodable image path
pub fn resolve_shared(link: &Url, raw_prefix: &str, catalog: Option<&Catalog>) -> Result<SharedRoll> {
    let path = shared_path(link)?;
    let url = asset_url(raw_prefix, &path);
    let rarity = catalog.map(|catalog| calculate_rarity(&path, catalog.paths()));
    if rarity.is_none() {
        tracing::debug!(path = %path, "catalog not loaded, rarity deferred");
    }
    Ok(SharedRoll { path, url, rarity })
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::rarity::RarityRank;

    const RAW: &str = "https://raw.test/";

    fn catalog(paths: &[&str]) -> Catalog {
        Catalog::new(
            paths
                .iter()
                .map(|path| CatalogEntry { path: (*path).to_owned(), url: asset_url(RAW, path) })
                .collect(),
        )
    }

    fn share_page() -> Url {
        Url::parse("https://gallery.test/share").unwrap()
    }

    #[test]
    fn test_roll_picks_from_catalog() {
        let catalog = catalog(&["a/x.png", "a/y.png", "b/z.png"]);
        let mut session = RollSession::with_seed(42);

        let mut seen = HashSet::new();
        for _ in 0..100 {
            let roll = session.roll(&catalog).unwrap();
            assert_eq!(catalog.get(roll.ordinal), Some(&roll.image));
            assert_eq!(roll.rarity, calculate_rarity(&roll.image.path, catalog.paths()));
            seen.insert(roll.ordinal);
        }
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn test_new_roll_replaces_current() {
        let catalog = catalog(&["a/x.png", "b/y.png"]);
        let mut session = RollSession::with_seed(1);

        let first = session.roll(&catalog).unwrap().clone();
        assert_eq!(session.current(), Some(&first));
        session.roll(&catalog).unwrap();
        assert!(session.current().is_some());

        session.clear();
        assert!(session.current().is_none());
    }

    #[test]
    fn test_empty_catalog() {
        let mut session = RollSession::with_seed(0);
        assert!(matches!(session.roll(&Catalog::default()), Err(Error::EmptyCatalog)));
        assert!(session.current().is_none());
    }

    #[test]
    fn test_share_round_trip_rederives_rarity() {
        let catalog = catalog(&["C#/Sakura reading C#.png", "C#/other.png", "Go/gopher.png"]);
        let mut session = RollSession::with_seed(9);
        let roll = session.roll(&catalog).unwrap().clone();

        let link = roll.share_link(&share_page());
        let shared = resolve_shared(&link, RAW, Some(&catalog)).unwrap();
        assert_eq!(shared.path, roll.image.path);
        assert_eq!(shared.url, roll.image.url);
        assert_eq!(shared.rarity, Some(roll.rarity));
    }

    #[test]
    fn test_shared_without_catalog_defers_rarity() {
        let link = share_page();
        let link = crate::permalink::share_link(&link, "Rust/Ferris.png");
        let shared = resolve_shared(&link, RAW, None).unwrap();
        assert_eq!(shared.url, "https://raw.test/Rust/Ferris.png");
        assert!(shared.rarity.is_none());
    }

    #[test]
    fn test_shared_link_not_found() {
        let err = resolve_shared(&share_page(), RAW, None).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_reveal_ends_on_rank() {
        let catalog = catalog(&["only/one.png"]);
        let mut session = RollSession::with_seed(3);
        let roll = session.roll(&catalog).unwrap();
        assert_eq!(roll.rarity.rank, RarityRank::D);
        let reveal = roll.reveal();
        assert_eq!(reveal.rank_at(RevealAnimation::settle_time()), RarityRank::D);
    }
}
