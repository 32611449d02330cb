//! Image catalog loader
//!
//! Fetches the repository tree listing, keeps image paths in document order and
//! derives a fetchable asset URL for each of them.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use globset::{Glob, GlobSet, GlobSetBuilder};
use reqwest::blocking::Client;
use serde::Deserialize;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::types::{Catalog, CatalogEntry, IMAGE_EXTENSIONS};

/// Timeout for the whole listing request
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// How often a pending request checks its abort handle
const ABORT_POLL_INTERVAL: Duration = Duration::from_millis(20);

/// One record of the tree listing, only the path is read
#[derive(Debug, Deserialize)]
struct TreeRecord {
    path: String,
}

/// Tree listing document
#[derive(Debug, Deserialize)]
struct TreeListing {
    tree:      Vec<TreeRecord>,
    #[serde(default)]
    truncated: bool,
}

/// Cancels an in-flight catalog fetch.
///
/// Clones share the same flag. Aborting never touches a catalog that was
/// already returned.
#[derive(Debug, Clone, Default)]
pub struct AbortHandle {
    aborted: Arc<AtomicBool>,
}

impl AbortHandle {
    /// Create a handle that has not been aborted
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Discard the fetch this handle was given to
    pub fn abort(&self) {
        self.aborted.store(true, Ordering::SeqCst);
    }

    /// Returns true once [`AbortHandle::abort`] was called
    #[must_use]
    pub fn is_aborted(&self) -> bool {
        self.aborted.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<()> {
        if self.is_aborted() {
            tracing::warn!("catalog fetch aborted");
            return Err(Error::Aborted);
        }
        Ok(())
    }
}

/// Build the case-sensitive suffix matcher for image files
fn image_matcher() -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for ext in IMAGE_EXTENSIONS {
        let glob = Glob::new(&format!("*.{ext}"))
            .map_err(|e| Error::config(&format!("Invalid image pattern: {e}")))?;
        builder.add(glob);
    }
    builder.build().map_err(|e| Error::config(&format!("Invalid image pattern: {e}")))
}

/// Derive the asset URL of a path: each `/` segment is percent-encoded and the
/// result is appended to `raw_prefix`.
#[must_use]
pub fn asset_url(raw_prefix: &str, path: &str) -> String {
    let encoded: Vec<_> = path.split('/').map(urlencoding::encode).collect();
    format!("{raw_prefix}{}", encoded.join("/"))
}

/// Fetches and filters the image catalog
#[derive(Debug)]
pub struct CatalogLoader {
    client:      Client,
    listing_url: String,
    raw_prefix:  String,
    images:      GlobSet,
}

impl CatalogLoader {
    /// Create a loader for the configured listing endpoint
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built
    pub fn new(config: &Config) -> Result<Self> {
        let client =
            Client::builder().user_agent(config.user_agent.as_str()).timeout(FETCH_TIMEOUT).build()?;
        Ok(Self {
            client,
            listing_url: config.listing_url.clone(),
            raw_prefix: config.raw_prefix.clone(),
            images: image_matcher()?,
        })
    }

    /// Fetch a fresh catalog snapshot.
    ///
    /// Every call is a full refetch; the result replaces any earlier catalog
    /// wholesale. No retries are attempted.
    ///
    /// The request runs on a worker thread while this call watches `abort`.
    /// An abort returns within a few milliseconds; the abandoned request
    /// finishes or times out in the background and its body is dropped.
    ///
    /// # Errors
    /// Returns error if:
    /// - The request fails or times out
    /// - The endpoint answers with a non-2xx status
    /// - The body is not a tree listing
    /// - `abort` was triggered before the catalog was built
    pub fn fetch(&self, abort: &AbortHandle) -> Result<Catalog> {
        abort.check()?;
        tracing::info!(url = %self.listing_url, "fetching catalog");

        let body = self.request(abort)?;
        abort.check()?;

        let catalog = self.parse(&body)?;
        abort.check()?;

        tracing::info!(images = catalog.len(), "catalog loaded");
        Ok(catalog)
    }

    /// Issue the listing request on a worker thread and wait for its body
    fn request(&self, abort: &AbortHandle) -> Result<String> {
        let client = self.client.clone();
        let url = self.listing_url.clone();
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let _ = tx.send(read_listing(&client, &url));
        });

        loop {
            match rx.recv_timeout(ABORT_POLL_INTERVAL) {
                Ok(body) => return body,
                Err(RecvTimeoutError::Timeout) => abort.check()?,
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(Error::Io(std::io::Error::other("listing request worker exited")));
                },
            }
        }
    }

    /// Build a catalog from a listing document.
    ///
    /// Records are kept by path suffix alone, whatever their record type.
    ///
    /// # Errors
    /// Returns error if the document is not a tree listing
    pub fn parse(&self, body: &str) -> Result<Catalog> {
        let listing: TreeListing = serde_json::from_str(body)?;
        if listing.truncated {
            tracing::warn!(records = listing.tree.len(), "listing is truncated, catalog is partial");
        }

        let entries: Vec<_> = listing
            .tree
            .into_iter()
            .filter(|record| self.images.is_match(&record.path))
            .map(|record| CatalogEntry {
                url:  asset_url(&self.raw_prefix, &record.path),
                path: record.path,
            })
            .collect();

        Ok(Catalog::new(entries))
    }
}

/// Blocking GET of the listing body, non-2xx answers are errors
fn read_listing(client: &Client, url: &str) -> Result<String> {
    let response = client.get(url).send()?;
    let status = response.status();
    if !status.is_success() {
        return Err(Error::Status(status.as_u16()));
    }
    Ok(response.text()?)
}
