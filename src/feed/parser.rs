//! Event-level RSS 2.0 parsing.
//!
//! The parser keeps the whole document as a sequence of owned XML
//! events so the writer can reproduce the input dialect exactly:
//! feed-level metadata, namespace declarations, and extension elements
//! the tool does not interpret (`arxiv:announce_type`, `dc:creator`,
//! ...) all round-trip verbatim. Each `<item>` is buffered as its own
//! event run with the fields the deduplicator needs extracted alongside.

use quick_xml::events::{BytesText, Event};
use quick_xml::Reader;
use thiserror::Error;

/// Errors that can occur while parsing a feed document. A whole-feed
/// parse failure is treated like a fetch failure for that subject.
#[derive(Debug, Error)]
pub enum ParseError {
    /// XML is malformed.
    #[error("XML parse error: {0}")]
    Xml(#[from] quick_xml::Error),
    /// Root element is not `<rss>`; only the RSS 2.0 dialect is handled.
    #[error("not an RSS document (root element is not <rss>)")]
    NotRss,
    /// Document ended inside an `<item>` element.
    #[error("feed document ended inside an <item> element")]
    Truncated,
}

/// Typed fields extracted from one `<item>`, used for classification
/// and (optionally) rewriting. Everything else stays event-only.
#[derive(Debug, Clone, Default)]
pub struct ItemFields {
    pub title: Option<String>,
    pub link: Option<String>,
    pub guid: Option<String>,
    pub description: Option<String>,
    /// `<category>` values in document order, deduped.
    pub categories: Vec<String>,
}

impl ItemFields {
    fn record(&mut self, name: &str, text: &str) {
        let text = text.trim();
        match name {
            "title" => self.title = Some(text.to_string()),
            "link" => self.link = Some(text.to_string()),
            "guid" => self.guid = Some(text.to_string()),
            "description" => self.description = Some(text.to_string()),
            "category" => {
                if !text.is_empty() && !self.categories.iter().any(|c| c == text) {
                    self.categories.push(text.to_string());
                }
            }
            // Unknown elements pass through untouched.
            _ => {}
        }
    }
}

/// One `<item>`: its verbatim event run plus the extracted fields.
#[derive(Debug, Clone)]
pub struct FeedItem {
    pub events: Vec<Event<'static>>,
    pub fields: ItemFields,
}

/// A slice of the document: either a run of passthrough events or a
/// slot holding the index of an item (which may be dropped on output).
#[derive(Debug)]
pub(crate) enum DocPart {
    Events(Vec<Event<'static>>),
    Item(usize),
}

/// A parsed feed document for one subject. Holds everything needed to
/// re-emit the feed with an arbitrary subset of its items.
#[derive(Debug)]
pub struct FeedDocument {
    subject: String,
    parts: Vec<DocPart>,
    items: Vec<FeedItem>,
}

impl FeedDocument {
    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn items(&self) -> &[FeedItem] {
        &self.items
    }

    pub(crate) fn parts(&self) -> &[DocPart] {
        &self.parts
    }
}

/// Accumulates one item's events and fields while it is open.
#[derive(Default)]
struct ItemState {
    events: Vec<Event<'static>>,
    fields: ItemFields,
    /// Nesting below `<item>`; direct children sit at depth 1.
    depth: usize,
    /// Name of the direct child element currently open.
    current: Option<String>,
    text: String,
}

impl ItemState {
    fn new(start: Event<'static>) -> Self {
        ItemState {
            events: vec![start],
            ..ItemState::default()
        }
    }

    /// Consumes one event; returns true when the closing `</item>` was
    /// seen (the state then holds the complete item).
    fn consume(&mut self, ev: Event<'static>) -> bool {
        match &ev {
            Event::Start(e) => {
                if self.depth == 0 {
                    self.current = Some(String::from_utf8_lossy(e.name().as_ref()).into_owned());
                    self.text.clear();
                }
                self.depth += 1;
            }
            Event::End(e) => {
                if self.depth == 0 && e.name().as_ref() == b"item" {
                    self.events.push(ev);
                    return true;
                }
                self.depth = self.depth.saturating_sub(1);
                if self.depth == 0 {
                    if let Some(name) = self.current.take() {
                        self.fields.record(&name, &self.text);
                    }
                    self.text.clear();
                }
            }
            Event::Text(t) if self.depth == 1 && self.current.is_some() => {
                self.text.push_str(&text_of(t));
            }
            Event::CData(t) if self.depth == 1 && self.current.is_some() => {
                self.text.push_str(&String::from_utf8_lossy(t.as_ref()));
            }
            _ => {}
        }
        self.events.push(ev);
        false
    }
}

fn text_of(t: &BytesText) -> String {
    match t.unescape() {
        Ok(cow) => cow.into_owned(),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to unescape text node, keeping raw bytes");
            String::from_utf8_lossy(t.as_ref()).into_owned()
        }
    }
}

/// Parses one raw feed document fetched under `subject`.
///
/// Only `<item>` boundaries and the handful of fields in [`ItemFields`]
/// are interpreted; every event is retained so the writer can reproduce
/// the document structure exactly.
pub fn parse_feed(subject: &str, content: &str) -> Result<FeedDocument, ParseError> {
    let mut reader = Reader::from_str(content);
    let mut buf = Vec::new();

    let mut parts: Vec<DocPart> = Vec::new();
    let mut items: Vec<FeedItem> = Vec::new();
    let mut outside: Vec<Event<'static>> = Vec::new();
    let mut open_item: Option<ItemState> = None;
    let mut root_seen = false;

    loop {
        let ev = reader.read_event_into(&mut buf)?.into_owned();
        if matches!(ev, Event::Eof) {
            break;
        }

        match open_item.as_mut() {
            Some(state) => {
                if state.consume(ev) {
                    if let Some(state) = open_item.take() {
                        let idx = items.len();
                        items.push(FeedItem {
                            events: state.events,
                            fields: state.fields,
                        });
                        parts.push(DocPart::Item(idx));
                    }
                }
            }
            None => match ev {
                Event::Start(e) if e.name().as_ref() == b"item" => {
                    if !outside.is_empty() {
                        parts.push(DocPart::Events(std::mem::take(&mut outside)));
                    }
                    open_item = Some(ItemState::new(Event::Start(e)));
                }
                Event::Start(e) => {
                    if !root_seen {
                        if e.name().as_ref() != b"rss" {
                            return Err(ParseError::NotRss);
                        }
                        root_seen = true;
                    }
                    outside.push(Event::Start(e));
                }
                other => outside.push(other),
            },
        }
        buf.clear();
    }

    if open_item.is_some() {
        return Err(ParseError::Truncated);
    }
    if !root_seen {
        return Err(ParseError::NotRss);
    }
    if !outside.is_empty() {
        parts.push(DocPart::Events(outside));
    }

    Ok(FeedDocument {
        subject: subject.to_string(),
        parts,
        items,
    })
}
