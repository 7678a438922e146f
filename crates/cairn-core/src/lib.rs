//! Cairn Core - Foundational types for the Cairn asset store
//!
//! This crate provides the collaborators the asset store orchestrates:
//! - `Hash`, `HashAlgorithm` - Content digests (MD5, SHA-1, SHA-256)
//! - `Resource`, `FileResource` - Seekable byte-stream accessors
//! - `sanitize_string` - Filesystem-safe names for cache entries
//! - Error types and Result alias

mod error;
mod hash;
mod resource;
mod sanitize;

pub use error::{CairnError, Result};
pub use hash::{Hash, HashAlgorithm};
pub use resource::{FileResource, ReadSeek, Resource};
pub use sanitize::sanitize_string;
