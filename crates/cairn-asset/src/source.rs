//! Provenance records for cached assets

use cairn_core::Hash;
use std::fmt;
use std::sync::Arc;

/// Where a source's bytes came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    /// Fetched directly from a network location
    Url(String),
    /// Extracted from the parent archive, at this path relative to its root
    ExtractFromArchive(String),
}

impl Origin {
    pub fn as_str(&self) -> &str {
        match self {
            Origin::Url(url) => url,
            Origin::ExtractFromArchive(path) => path,
        }
    }
}

/// How an asset was obtained.
///
/// Sources form a tree through `parent`: every file extracted from an
/// archive shares the archive's `Source`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    parent: Option<Arc<Source>>,
    origin: Origin,
    hash: Option<Hash>,
}

impl Source {
    pub fn new(parent: Option<Arc<Source>>, origin: Origin, hash: Option<Hash>) -> Self {
        Self {
            parent,
            origin,
            hash,
        }
    }

    /// A top-level source downloaded from `url`
    pub fn from_url(url: impl Into<String>, hash: Option<Hash>) -> Self {
        Self::new(None, Origin::Url(url.into()), hash)
    }

    /// A file at `path` inside the archive described by `parent`
    pub fn extracted(parent: Arc<Source>, path: impl Into<String>) -> Self {
        Self::new(Some(parent), Origin::ExtractFromArchive(path.into()), None)
    }

    /// Unique key for this provenance chain, e.g.
    /// `https://example.com/foo.tar.gz/bin/foo`
    pub fn key(&self) -> String {
        match &self.parent {
            Some(parent) => format!("{}/{}", parent.key(), self.origin.as_str()),
            None => self.origin.as_str().to_string(),
        }
    }

    pub fn parent(&self) -> Option<&Arc<Source>> {
        self.parent.as_ref()
    }

    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    pub fn url(&self) -> Option<&str> {
        match &self.origin {
            Origin::Url(url) => Some(url),
            Origin::ExtractFromArchive(_) => None,
        }
    }

    pub fn extract_from_archive(&self) -> Option<&str> {
        match &self.origin {
            Origin::ExtractFromArchive(path) => Some(path),
            Origin::Url(_) => None,
        }
    }

    pub fn hash(&self) -> Option<&Hash> {
        self.hash.as_ref()
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Source[{}]", self.key())
    }
}
