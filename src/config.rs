//! Runtime configuration

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::types::{INDEX_BATCH_SIZE, QUERY_DEBOUNCE};

/// Git tree listing of the source repository
pub const DEFAULT_LISTING_URL: &str = "https://api.github.com/repos/cat-milk/Anime-Girls-Holding-Programming-Books/git/trees/master?recursive=1";

/// Prefix of raw file contents in the source repository
pub const DEFAULT_RAW_PREFIX: &str =
    "https://raw.githubusercontent.com/cat-milk/Anime-Girls-Holding-Programming-Books/master/";

/// Page that renders a shared roll
pub const DEFAULT_SHARE_URL: &str = "https://aghpb.example/share";

/// Page that hosts the searchable grid
pub const DEFAULT_HOME_URL: &str = "https://aghpb.example/";

/// Gallery configuration, every field falls back to its default
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Listing endpoint returning the repository tree as JSON
    pub listing_url: String,
    /// Prefix prepended to encoded paths to form asset URLs
    pub raw_prefix:  String,
    /// Base URL of the share page
    pub share_url:   String,
    /// Base URL of the home page
    pub home_url:    String,
    /// Entries indexed per batch
    pub batch_size:  usize,
    /// Search input debounce in milliseconds
    pub debounce_ms: u64,
    /// User agent sent with the listing request
    pub user_agent:  String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listing_url: DEFAULT_LISTING_URL.to_owned(),
            raw_prefix:  DEFAULT_RAW_PREFIX.to_owned(),
            share_url:   DEFAULT_SHARE_URL.to_owned(),
            home_url:    DEFAULT_HOME_URL.to_owned(),
            batch_size:  INDEX_BATCH_SIZE,
            debounce_ms: u64::try_from(QUERY_DEBOUNCE.as_millis()).unwrap_or(u64::MAX),
            user_agent:  concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_owned(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file.
    ///
    /// A missing file yields the defaults.
    ///
    /// # Errors
    /// Returns error if:
    /// - The file exists but cannot be read
    /// - The file is not valid JSON for this schema
    /// - `batch_size` is zero
    pub fn load(path: &Path) -> Result<Self> {
        let data = match std::fs::read_to_string(path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                return Ok(Self::default());
            },
            Err(e) => return Err(Error::Io(e)),
        };

        let config: Self = serde_json::from_str(&data)
            .map_err(|e| Error::config(&format!("Invalid config {}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    /// Check value constraints that serde cannot express
    ///
    /// # Errors
    /// Returns error if `batch_size` is zero
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(Error::config("batch_size must be greater than zero"));
        }
        Ok(())
    }

    /// Search input debounce as a duration
    #[must_use]
    pub const fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}
