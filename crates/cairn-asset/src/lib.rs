//! Cairn Asset - Content-addressed asset store
//!
//! Fetches remote artifacts into a hash-named cache, expands `.tar.gz`
//! archives, and records provenance for every registered file so later
//! lookups by key (plus an optional path suffix) resolve to verified bytes.

mod asset;
pub mod config;
mod extract;
mod fetch;
mod source;
mod store;

pub use asset::{Asset, AssetResource, HasSource};
pub use config::StoreConfig;
pub use extract::{Extractor, TarExtractor};
pub use fetch::{hash_from_etag, hash_from_http_header, Fetcher, HttpFetcher};
pub use source::{Origin, Source};
pub use store::AssetStore;
