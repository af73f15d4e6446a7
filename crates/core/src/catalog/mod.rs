//! Movie catalog search.
//!
//! [`CatalogSearchClient`] turns a [`SearchQuery`](crate::query::SearchQuery)
//! into a request for a [`CatalogSource`] backend and assembles the raw
//! records it returns into [`ResultItem`]s with a resolved preferred variant.

mod client;
mod types;
mod yts;

pub use client::{select_variant, CatalogSearchClient};
pub use types::*;
pub use yts::YtsCatalogSource;
