//! xpathcut - data-parallel evaluator for a single absolute XPath child path
//!
//! Given a path like `/bib/book/title` and an XML document, splits the
//! document into chunks, drives a small automaton over each chunk
//! independently (optionally in parallel via `rayon`), then stitches the
//! per-chunk results back together to recover the text under every matching
//! element, in document order.

pub mod automaton;
pub mod config;
pub mod core;
pub mod engine;
pub mod error;
pub mod merge;
pub mod split;

#[cfg(feature = "mimalloc")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;
