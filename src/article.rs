//! The pooled article record that deduplication operates on.
//!
//! The verbatim XML of each entry stays inside its [`FeedDocument`];
//! an `Article` carries only the typed fields the classification passes
//! need, plus `(subject, item_index)` to locate the entry again when the
//! surviving feeds are written out.
//!
//! [`FeedDocument`]: crate::feed::FeedDocument

use crate::feed::FeedItem;
use crate::ident;

/// One entry of a source feed, keyed for deduplication.
///
/// `id` uniquely determines the logical article regardless of revision
/// or subject; `(id, revision)` identifies a single parsed instance
/// within one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Article {
    /// Output feed the article is currently assigned to. Starts as the
    /// feed it was fetched under; cross-post resolution may reassign it
    /// to its primary requested subject.
    pub subject: String,
    /// Subject code of the feed this entry was fetched under; together
    /// with `item_index` this locates the verbatim XML item.
    pub fetched_under: String,
    /// Canonical identifier, revision suffix stripped.
    pub id: String,
    /// Revision of this posting; 0 is the original.
    pub revision: u32,
    /// Entry title, for log lines.
    pub title: String,
    /// Subject codes declared in the entry's own metadata, in document
    /// order. May differ from `subject` when the article is cross-posted.
    pub subjects_listed: Vec<String>,
    /// Index of the backing `<item>` within its feed document.
    pub item_index: usize,
}

impl Article {
    /// Builds an article from a parsed feed item, extracting its
    /// identity from the guid, link, or title (first that matches).
    ///
    /// Returns `None` when no identifier can be extracted; the caller
    /// logs the rejection and drops the entry from the batch.
    pub fn from_item(subject: &str, item_index: usize, item: &FeedItem) -> Option<Self> {
        let fields = &item.fields;
        let identity = ident::extract_first(
            [
                fields.guid.as_deref(),
                fields.link.as_deref(),
                fields.title.as_deref(),
            ]
            .into_iter()
            .flatten(),
        )?;

        Some(Article {
            subject: subject.to_string(),
            fetched_under: subject.to_string(),
            id: identity.id,
            revision: identity.revision,
            title: fields.title.clone().unwrap_or_default(),
            subjects_listed: fields.categories.clone(),
            item_index,
        })
    }

    /// The first subject in `ordering` that appears in this article's
    /// own subject list. This is the feed the article belongs to when it
    /// is cross-posted under several requested subjects.
    pub fn primary_subject<'a>(&self, ordering: &'a [String]) -> Option<&'a str> {
        ordering
            .iter()
            .find(|s| self.subjects_listed.iter().any(|listed| listed == *s))
            .map(String::as_str)
    }
}
