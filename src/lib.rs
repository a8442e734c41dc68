//! Deduplicate and tidy a collection of arXiv RSS feeds.
//!
//! One run downloads a feed per requested subject, pools every entry,
//! removes superseded revisions, cross-posted entries, and residual
//! duplicates, then re-exports one cleaned feed per subject in the
//! source's own RSS dialect.

pub mod article;
pub mod dedup;
pub mod feed;
pub mod ident;
pub mod report;
pub mod run;
