//! Optional rewriting of surviving items for nicer feed readers.
//!
//! Mirrors the tidy-up the tool has always offered: links point
//! straight at the PDF over https, titles carry a `[subject]` prefix,
//! and descriptions gain a link back to the abstract page. Applied only
//! behind `--pdf-links`; the default output keeps every field verbatim.

use quick_xml::events::{BytesText, Event};

use crate::article::Article;
use crate::feed::parser::FeedItem;

/// Produces a rewritten copy of the item's event run.
///
/// The replaced elements (`link`, `title`, `description`) keep their
/// position; their text content is swapped for the rewritten form.
/// Everything else is copied through unchanged.
pub fn rewrite_item(item: &FeedItem, article: &Article) -> Vec<Event<'static>> {
    let label = article
        .subjects_listed
        .first()
        .map(String::as_str)
        .unwrap_or(&article.subject);

    let mut out = Vec::with_capacity(item.events.len());
    // 1 while directly inside <item>; the first event is its Start.
    let mut depth = 0usize;
    let mut skip_until: Option<Vec<u8>> = None;

    for ev in &item.events {
        if let Some(name) = &skip_until {
            if let Event::End(e) = ev {
                if e.name().as_ref() == name.as_slice() {
                    skip_until = None;
                    out.push(ev.clone());
                }
            }
            continue;
        }

        match ev {
            Event::Start(e) => {
                if depth == 1 {
                    let replacement = match e.name().as_ref() {
                        b"link" => item.fields.link.as_deref().map(pdf_link),
                        b"title" => item
                            .fields
                            .title
                            .as_deref()
                            .map(|t| format!("[{label}] {t}")),
                        b"description" => item
                            .fields
                            .description
                            .as_deref()
                            .map(|d| abstract_header(&article.id, d)),
                        _ => None,
                    };
                    if let Some(text) = replacement {
                        skip_until = Some(e.name().as_ref().to_vec());
                        out.push(ev.clone());
                        out.push(Event::Text(BytesText::new(&text).into_owned()));
                        continue;
                    }
                }
                depth += 1;
                out.push(ev.clone());
            }
            Event::End(_) => {
                depth = depth.saturating_sub(1);
                out.push(ev.clone());
            }
            _ => out.push(ev.clone()),
        }
    }

    out
}

/// `http://host/abs/<id>` becomes `https://host/pdf/<id>.pdf`.
fn pdf_link(link: &str) -> String {
    let link = link.replace("http://", "https://");
    if link.contains("/abs/") {
        format!("{}.pdf", link.replace("/abs/", "/pdf/"))
    } else {
        link
    }
}

fn abstract_header(id: &str, description: &str) -> String {
    format!(
        "\n<p><a href=\"https://arxiv.org/abs/{id}\">arXiv abstract page</a></p>\n\n{description}"
    )
}
