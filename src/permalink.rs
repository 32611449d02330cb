//! Shareable links and URL-mirrored view state

use base64::engine::general_purpose::STANDARD;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::{Engine, alphabet};
use url::Url;

use crate::error::{Error, Result};

/// Query parameter carrying the encoded image path of a shared roll
pub const SHARE_PARAM: &str = "i";

/// Query parameter mirroring the search text
pub const QUERY_PARAM: &str = "q";

/// Query parameter asking the home page to roll on load
pub const ROLL_PARAM: &str = "roll";

/// Decoding accepts padded and unpadded input alike
const LENIENT_DECODE: GeneralPurposeConfig =
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent);

/// Standard alphabet decoder, padding optional
const STANDARD_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::STANDARD, LENIENT_DECODE);

/// URL-safe alphabet decoder, padding optional
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::URL_SAFE, LENIENT_DECODE);

/// Encode an image path for the `i` parameter
#[must_use]
pub fn encode_path(path: &str) -> String {
    STANDARD.encode(path.as_bytes())
}

/// Decode the `i` parameter back into the image path.
///
/// Standard and URL-safe alphabets are both accepted, with or without
/// padding. A `+` turned into a space by form decoding of an unescaped link is
/// restored.
///
/// # Errors
/// Returns error if the text is not base64 or not UTF-8
pub fn decode_path(encoded: &str) -> Result<String> {
    let restored = encoded.replace(' ', "+");
    let encoded = restored.trim();
    let bytes = STANDARD_LENIENT
        .decode(encoded)
        .or_else(|_| URL_SAFE_LENIENT.decode(encoded))
        .map_err(|e| Error::share_not_found(&format!("malformed image parameter: {e}")))?;
    let path = String::from_utf8(bytes)
        .map_err(|_| Error::share_not_found("image parameter is not UTF-8"))?;
    if path.is_empty() {
        return Err(Error::share_not_found("empty image parameter"));
    }
    Ok(path)
}

/// Value of the first query parameter named `key`
fn param(url: &Url, key: &str) -> Option<String> {
    url.query_pairs().find(|(k, _)| k == key).map(|(_, v)| v.into_owned())
}

/// Copy of `url` with `key` set to `value`, or removed when `value` is `None`.
/// Other parameters keep their order.
fn with_param(url: &Url, key: &str, value: Option<&str>) -> Url {
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != key)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    let mut out = url.clone();
    if kept.is_empty() && value.is_none() {
        out.set_query(None);
        return out;
    }
    {
        let mut pairs = out.query_pairs_mut();
        pairs.clear();
        pairs.extend_pairs(kept.iter());
        if let Some(value) = value {
            pairs.append_pair(key, value);
        }
    }
    out
}

/// Build the share link of an image path on the share page
#[must_use]
pub fn share_link(share_page: &Url, path: &str) -> Url {
    with_param(share_page, SHARE_PARAM, Some(&encode_path(path)))
}

/// Extract the image path from a share link
///
/// # Errors
/// Returns `ShareNotFound` if `i` is missing or cannot be decoded
pub fn shared_path(link: &Url) -> Result<String> {
    let encoded =
        param(link, SHARE_PARAM).ok_or_else(|| Error::share_not_found("missing image parameter"))?;
    decode_path(&encoded)
}

/// Mirror the search text into `q`: set when non-blank, removed otherwise.
///
/// The result is meant for a history replace, not a new history entry.
#[must_use]
pub fn mirror_query(page: &Url, query: &str) -> Url {
    let value = (!query.trim().is_empty()).then_some(query);
    with_param(page, QUERY_PARAM, value)
}

/// Search text restored from `q`, empty when absent
#[must_use]
pub fn initial_query(page: &Url) -> String {
    param(page, QUERY_PARAM).unwrap_or_default()
}

/// Home page link that rolls as soon as it loads
#[must_use]
pub fn roll_request(home: &Url) -> Url {
    with_param(home, ROLL_PARAM, Some("true"))
}

/// Returns true if the page was opened with `roll=true`
#[must_use]
pub fn wants_roll(page: &Url) -> bool {
    param(page, ROLL_PARAM).is_some_and(|v| v == "true")
}
