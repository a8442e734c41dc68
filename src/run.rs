//! One full run: fetch, pool, classify, write.
//!
//! Subjects are fetched sequentially in caller order, pooled into one
//! batch, classified once, and only then partitioned back into
//! per-subject output feeds. Per-subject failures (fetch, parse, write)
//! are logged and skip that subject; the run fails only when no subject
//! produced a parsed feed at all.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use crate::article::Article;
use crate::dedup;
use crate::feed::{self, FeedDocument};
use crate::report::RunReport;

/// Options for one processing run, straight from the CLI surface.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Feed endpoint, templated on the subject code.
    pub base_url: String,
    /// Directory receiving one `<subject>.xml` per fetched subject.
    pub output_dir: PathBuf,
    /// Subject codes in caller order; the order decides which feed a
    /// cross-posted article belongs to.
    pub subjects: Vec<String>,
    /// Rewrite surviving items with direct PDF links.
    pub pdf_links: bool,
}

/// Downloads, cleans, and re-exports the requested feeds.
///
/// Returns the per-subject reduction report. Errors only when zero
/// subjects produced a parsed feed.
pub async fn process_feeds(opts: &RunOptions) -> Result<RunReport> {
    let client = reqwest::Client::builder()
        .user_agent(concat!("arxivtidy/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to build HTTP client")?;

    // A repeated subject would be fetched, pooled, and reported twice,
    // with the later render clobbering the earlier output file. Only
    // the first occurrence counts.
    let mut seen = HashSet::new();
    let subjects: Vec<&String> = opts
        .subjects
        .iter()
        .filter(|s| {
            let fresh = seen.insert(s.as_str());
            if !fresh {
                tracing::warn!(subject = %s, "Ignoring repeated subject");
            }
            fresh
        })
        .collect();

    let mut docs: Vec<FeedDocument> = Vec::new();
    for subject in subjects {
        match feed::fetch_subject(&client, &opts.base_url, subject).await {
            Ok(body) => match feed::parse_feed(subject, &body) {
                Ok(doc) => docs.push(doc),
                Err(e) => {
                    tracing::warn!(subject = %subject, error = %e, "Skipping subject: feed failed to parse");
                }
            },
            Err(e) => {
                tracing::warn!(subject = %subject, error = %e, "Skipping subject: fetch failed");
            }
        }
    }

    if docs.is_empty() {
        bail!("no subjects could be fetched");
    }

    // Cross-post resolution is ordering-dependent: the caller ordering,
    // restricted to the subjects that actually produced a feed.
    let ordering: Vec<String> = docs.iter().map(|d| d.subject().to_string()).collect();

    let mut report = RunReport::new();
    let mut pool: Vec<Article> = Vec::new();
    for doc in &docs {
        let mut pre = 0;
        for (idx, item) in doc.items().iter().enumerate() {
            match Article::from_item(doc.subject(), idx, item) {
                Some(article) => {
                    pool.push(article);
                    pre += 1;
                }
                None => {
                    // Rejected entries count in neither pre nor post totals.
                    tracing::warn!(
                        subject = %doc.subject(),
                        title = %item.fields.title.as_deref().unwrap_or("<untitled>"),
                        "Dropping article with no extractable identifier"
                    );
                }
            }
        }
        report.add_subject(doc.subject(), pre);
    }

    let survivors = dedup::deduplicate(pool, &ordering, &mut report);

    let docs_by_subject: HashMap<&str, &FeedDocument> =
        docs.iter().map(|d| (d.subject(), d)).collect();

    // Articles still in the feed they were fetched under stay in place;
    // reassigned ones are carried over as incoming items of their new
    // subject, with the item looked up in its source document.
    let mut by_subject: HashMap<&str, HashMap<usize, &Article>> = HashMap::new();
    let mut incoming: HashMap<&str, Vec<(&feed::FeedItem, &Article)>> = HashMap::new();
    for article in &survivors {
        if article.subject == article.fetched_under {
            by_subject
                .entry(article.subject.as_str())
                .or_default()
                .insert(article.item_index, article);
        } else if let Some(source) = docs_by_subject.get(article.fetched_under.as_str()) {
            incoming
                .entry(article.subject.as_str())
                .or_default()
                .push((&source.items()[article.item_index], article));
        }
    }

    for doc in &docs {
        let keep = by_subject.remove(doc.subject()).unwrap_or_default();
        let moved = incoming.remove(doc.subject()).unwrap_or_default();
        let path = opts.output_dir.join(format!("{}.xml", doc.subject()));
        let rendered = match feed::render_feed(doc, &keep, &moved, opts.pdf_links) {
            Ok(xml) => xml,
            Err(e) => {
                tracing::error!(subject = %doc.subject(), error = %e, "Failed to render feed");
                continue;
            }
        };
        tracing::info!(subject = %doc.subject(), path = %path.display(), "Writing feed");
        if let Err(e) = tokio::fs::write(&path, rendered).await {
            tracing::error!(
                subject = %doc.subject(),
                path = %path.display(),
                error = %e,
                "Failed to write feed"
            );
        }
    }

    report.log_summary();
    Ok(report)
}
