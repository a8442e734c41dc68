//! Re-serialization of parsed feed documents.
//!
//! The writer walks the document's parts in original order, emitting
//! passthrough events verbatim and item slots only for articles that
//! survived deduplication. Output therefore has the same element names
//! and nesting as the input, minus the removed items. Articles
//! reassigned into this feed from another subject are appended after
//! the original items, just before the channel closes.

use std::collections::HashMap;
use std::io::Cursor;

use anyhow::{Context, Result};
use quick_xml::events::Event;
use quick_xml::Writer;

use crate::article::Article;
use crate::feed::parser::{DocPart, FeedDocument, FeedItem};
use crate::feed::rewrite;

/// Renders the feed with only the surviving items, keyed by item index.
///
/// `incoming` holds cross-posted items moved into this feed, paired
/// with their reassigned article records; they are written at the end
/// of the channel. With `pdf_links` set, every emitted item is
/// rewritten for direct PDF links and `[subject]`-prefixed titles.
pub fn render_feed(
    doc: &FeedDocument,
    survivors: &HashMap<usize, &Article>,
    incoming: &[(&FeedItem, &Article)],
    pdf_links: bool,
) -> Result<String> {
    let mut writer = Writer::new(Cursor::new(Vec::new()));
    let mut injected = incoming.is_empty();

    for part in doc.parts() {
        match part {
            DocPart::Events(events) => {
                for ev in events {
                    if !injected {
                        if let Event::End(end) = ev {
                            if end.name().as_ref() == b"channel" {
                                for (item, article) in incoming {
                                    write_item(&mut writer, item, article, pdf_links)?;
                                }
                                injected = true;
                            }
                        }
                    }
                    writer
                        .write_event(ev.clone())
                        .context("Failed to write feed event")?;
                }
            }
            DocPart::Item(idx) => {
                let Some(article) = survivors.get(idx) else {
                    continue;
                };
                write_item(&mut writer, &doc.items()[*idx], article, pdf_links)?;
            }
        }
    }

    String::from_utf8(writer.into_inner().into_inner())
        .context("Rendered feed contains invalid UTF-8")
}

fn write_item(
    writer: &mut Writer<Cursor<Vec<u8>>>,
    item: &FeedItem,
    article: &Article,
    pdf_links: bool,
) -> Result<()> {
    if pdf_links {
        for ev in rewrite::rewrite_item(item, article) {
            writer
                .write_event(ev)
                .context("Failed to write feed item")?;
        }
    } else {
        for ev in &item.events {
            writer
                .write_event(ev.clone())
                .context("Failed to write feed item")?;
        }
    }
    Ok(())
}
