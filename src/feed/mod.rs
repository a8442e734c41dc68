//! Feed handling: fetching, parsing, rewriting, and re-serialization.
//!
//! The module keeps a strict split between interpretation and
//! representation: [`parser`] extracts only the fields the dedup passes
//! need, while the document itself is carried as verbatim XML events
//! that [`writer`] re-emits in the input's own dialect.
//!
//! - [`fetcher`] - HTTP retrieval of one feed per subject
//! - [`parser`] - event-level RSS 2.0 parsing with passthrough
//! - [`rewrite`] - optional PDF-link/title tidy-up of surviving items
//! - [`writer`] - order-preserving serialization of surviving items

mod fetcher;
mod parser;
mod rewrite;
mod writer;

pub use fetcher::{fetch_subject, subject_url, FetchError};
pub use parser::{parse_feed, FeedDocument, FeedItem, ItemFields, ParseError};
pub use writer::render_feed;
