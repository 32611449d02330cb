//! Error types for `gachaview`

use arrayvec::ArrayString;
use thiserror::Error;

/// Maximum length of error messages
pub const MAX_ERROR_LENGTH: usize = 256;

/// Custom result type for `gachaview` operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for `gachaview`
///
/// # Design
/// - Free-form messages live in fixed-size `MAX_ERROR_LENGTH` buffers
/// - Catalog failures (`Http`, `Status`, `MalformedListing`) are terminal for a
///   fetch and never retried automatically
/// - `ShareNotFound` is kept apart from network failures so a viewer can show
///   "not found" instead of "could not load"
#[derive(Debug, Error)]
pub enum Error {
    /// Transport-level failure while fetching the catalog
    #[error("Error: {0}")]
    Http(#[from] reqwest::Error),

    /// The listing endpoint answered with a non-2xx status
    #[error("Error: Listing request failed with status {0}")]
    Status(u16),

    /// The listing body was not the expected JSON document
    #[error("Error: Malformed listing: {0}")]
    MalformedListing(#[from] serde_json::Error),

    /// The fetch was discarded through its abort handle
    #[error("Error: Catalog fetch aborted")]
    Aborted,

    /// A roll was requested against an empty catalog
    #[error("Error: Catalog has no images to roll")]
    EmptyCatalog,

    /// A share link did not carry a decodable image path
    #[error("Error: {0}")]
    ShareNotFound(Box<ArrayString<MAX_ERROR_LENGTH>>),

    /// A URL could not be parsed
    #[error("Error: {0}")]
    Url(#[from] url::ParseError),

    /// IO operation failed
    #[error("Error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file was invalid
    #[error("Error: {0}")]
    Config(Box<ArrayString<MAX_ERROR_LENGTH>>),
}

/// Append `msg` to `buf`, truncating on a char boundary
fn push_truncated(buf: &mut ArrayString<MAX_ERROR_LENGTH>, msg: &str) {
    for c in msg.chars() {
        if buf.try_push(c).is_err() {
            break;
        }
    }
}

/// Copy `msg` into a fixed-size buffer
fn bounded(msg: &str) -> Box<ArrayString<MAX_ERROR_LENGTH>> {
    let mut buf = ArrayString::new();
    push_truncated(&mut buf, msg);
    Box::new(buf)
}

impl Error {
    /// Create a new share-link error
    #[must_use]
    pub fn share_not_found(msg: &str) -> Self {
        Self::ShareNotFound(bounded(msg))
    }

    /// Create a new configuration error
    #[must_use]
    pub fn config(msg: &str) -> Self {
        Self::Config(bounded(msg))
    }

    /// Returns true if this error means "the shared image does not exist"
    /// rather than "the catalog could not be loaded"
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::ShareNotFound(_))
    }

    /// Get a user-friendly error message with action items
    #[must_use]
    pub fn user_message(&self) -> ArrayString<MAX_ERROR_LENGTH> {
        let mut msg = ArrayString::new();
        match self {
            Self::Http(e) => {
                push_truncated(&mut msg, &format!(
                    "Error: Could not load the catalog ({e})\nTip: Check your connection and try \
                     again"
                ));
            },
            Self::Status(code) => {
                let _ = msg.try_push_str(&format!(
                    "Error: Could not load the catalog (HTTP {code})\nTip: The listing endpoint \
                     may be rate limited, try again later"
                ));
            },
            Self::MalformedListing(_) => {
                let _ = msg.try_push_str(
                    "Error: Could not load the catalog (unexpected listing format)\nTip: Check \
                     the configured listing URL",
                );
            },
            Self::Aborted => {
                let _ = msg.try_push_str("Error: Catalog fetch was cancelled");
            },
            Self::EmptyCatalog => {
                let _ = msg.try_push_str(
                    "Error: No images to roll\nTip: Wait for the catalog to finish loading",
                );
            },
            Self::ShareNotFound(reason) => {
                let _ = msg.try_push_str("404: Could not find the shared image (");
                push_truncated(&mut msg, reason);
                push_truncated(&mut msg, ")");
            },
            Self::Url(e) => {
                push_truncated(&mut msg, &format!("Error: Invalid URL: {e}"));
            },
            Self::Io(e) => {
                push_truncated(&mut msg, &format!(
                    "Error: {e}\nTip: Check file permissions and try again"
                ));
            },
            Self::Config(reason) => {
                let _ = msg.try_push_str("Error: ");
                push_truncated(&mut msg, reason);
                push_truncated(&mut msg, "\nTip: Fix or remove the config file");
            },
        }
        msg
    }
}
