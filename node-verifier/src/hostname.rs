//! Hostname normalization.
//!
//! Operators paste node addresses in every shape: uppercase, wrapped in a
//! scheme, with trailing slashes, with stray whitespace. Everything
//! downstream (DNS, metrics URLs, log lines) wants one canonical form, so
//! normalization happens once, up front, as a pure function.

/// Canonicalizes a user-supplied hostname.
///
/// Trims surrounding whitespace, lowercases, strips a leading `http://` or
/// `https://` scheme, and strips trailing slashes. The result contains no
/// scheme and no trailing slash, so normalizing an already-normalized
/// hostname returns it unchanged.
pub fn normalize(hostname: &str) -> String {
    let trimmed = hostname.trim().to_lowercase();
    let stripped = trimmed.strip_prefix("http://").unwrap_or(&trimmed);
    let stripped = stripped.strip_prefix("https://").unwrap_or(stripped);
    stripped.trim_end_matches('/').to_string()
}
