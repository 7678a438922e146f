//! Registry entries and the resource handed back by lookups

use crate::source::Source;
use cairn_core::{ReadSeek, Resource, Result};
use std::sync::Arc;

/// A registered, resolvable cached item
#[derive(Debug)]
pub struct Asset {
    key: String,
    asset_path: String,
    resource: Box<dyn Resource>,
    source: Arc<Source>,
}

impl Asset {
    pub(crate) fn new(
        key: impl Into<String>,
        asset_path: impl Into<String>,
        resource: Box<dyn Resource>,
        source: Arc<Source>,
    ) -> Self {
        Self {
            key: key.into(),
            asset_path: asset_path.into(),
            resource,
            source,
        }
    }

    /// Short lookup token, e.g. the file name
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Full disambiguating path: the URL, or the path inside the archive
    pub fn asset_path(&self) -> &str {
        &self.asset_path
    }

    pub fn resource(&self) -> &dyn Resource {
        self.resource.as_ref()
    }

    pub fn source(&self) -> &Arc<Source> {
        &self.source
    }
}

/// Anything that can report the provenance of its bytes
pub trait HasSource {
    fn source(&self) -> &Arc<Source>;
}

/// An asset's content together with its provenance
#[derive(Debug, Clone, Copy)]
pub struct AssetResource<'a> {
    asset: &'a Asset,
}

impl<'a> AssetResource<'a> {
    pub(crate) fn new(asset: &'a Asset) -> Self {
        Self { asset }
    }

    pub fn asset(&self) -> &'a Asset {
        self.asset
    }
}

impl Resource for AssetResource<'_> {
    fn open(&self) -> Result<Box<dyn ReadSeek>> {
        self.asset.resource.open()
    }
}

impl HasSource for AssetResource<'_> {
    fn source(&self) -> &Arc<Source> {
        &self.asset.source
    }
}
