//! Sender address normalization.
//!
//! Messages are filed under a folder named after the sender, so the folder
//! name must be stable across runs. The `From` header is free-form
//! (`"Jane" <jane@example.com>`, bare addresses, group syntax, garbage),
//! and only the first `local@domain.tld` substring is kept.

use std::sync::LazyLock;

use regex::Regex;

static ADDRESS: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r"([a-zA-Z0-9._%+\-]+)@([a-zA-Z0-9.\-]+)\.([a-zA-Z]{2,5})").unwrap()
});

/// Extracts the first `local-part@domain.tld` address found in `raw`.
///
/// Returns an empty string when `raw` contains nothing address-shaped. A
/// malformed sender is not an error: such messages are still downloaded,
/// they just land directly under the base directory.
///
/// ```
/// use mailwatcher_core::normalize;
///
/// assert_eq!(normalize("John Doe <john.doe@example.co>"), "john.doe@example.co");
/// assert_eq!(normalize("not-an-address"), "");
/// ```
#[must_use]
pub fn normalize(raw: &str) -> &str {
    ADDRESS.find(raw).map_or("", |m| m.as_str())
}
