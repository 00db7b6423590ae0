//! mdpeek — a live Markdown previewer with incremental in-document search.
//!
//! The library is the previewer core: Markdown goes in, a document tree
//! comes out, and the search engine re-tags that tree with match markers
//! as the query changes, without re-parsing the source. The binary wraps
//! it in a small terminal front end.

pub mod config;
pub mod debounce;
pub mod markdown;
pub mod render;
pub mod search;
pub mod tree;
pub mod viewport;
pub mod watcher;
