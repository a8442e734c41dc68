//! Extraction of canonical arXiv identifiers from article metadata.
//!
//! An arXiv identifier is either new-style (`2401.12345`) or old-style
//! (`cs/0112017`, `math.GT/0309136`), optionally carrying a revision
//! suffix (`v2`). The identifier with the suffix stripped is stable
//! across revisions of the same article and is the key every
//! deduplication pass groups on.

use regex::Regex;
use std::sync::LazyLock;

/// Matches an arXiv identifier wherever it appears in a guid, link, or
/// title, e.g. `oai:arXiv.org:2401.12345v2`, `https://arxiv.org/abs/cs/0112017`,
/// or `(arXiv:2401.12345v1 [cs.CV])`.
static ARXIV_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{4}\.\d{4,5}|[a-z][a-z-]*(?:\.[A-Z]{2})?/\d{7})(?:v(\d+))?")
        .expect("valid regex")
});

/// A canonical article identity: the revision-independent identifier
/// plus the revision marker of this particular posting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Stable identifier with any revision suffix stripped.
    pub id: String,
    /// Revision number; 0 means the original posting (no suffix).
    pub revision: u32,
}

/// Extracts `(identifier, revision)` from a raw metadata string.
///
/// Returns `None` when no arXiv identifier can be found. A suffix too
/// large for `u32` saturates to the maximum, so an absurdly high
/// revision still outranks every plausible one.
pub fn extract(raw: &str) -> Option<Identity> {
    let caps = ARXIV_ID_RE.captures(raw)?;
    let id = caps.get(1)?.as_str().to_string();
    let revision = caps
        .get(2)
        .map(|m| m.as_str().parse().unwrap_or(u32::MAX))
        .unwrap_or(0);
    Some(Identity { id, revision })
}

/// Tries each candidate string in order and returns the first identity
/// that extracts. The caller passes guid, then link, then title.
pub fn extract_first<'a, I>(candidates: I) -> Option<Identity>
where
    I: IntoIterator<Item = &'a str>,
{
    candidates.into_iter().find_map(extract)
}
