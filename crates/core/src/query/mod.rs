//! Free-text search input parsing.
//!
//! Turns a line like `inception year:2010 genre:sci-fi` into a structured
//! [`SearchQuery`] with the catalog's "no filter" sentinels applied.

mod parser;
mod types;

pub use parser::FilterParser;
pub use types::*;
