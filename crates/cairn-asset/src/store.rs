//! The asset registry: ingestion, archive expansion, and lookup
//!
//! Downloads land at `<cache_root>/<hash>_<sanitized-url>` and archives
//! expand under `<cache_root>/extracted/<archive file name>/`.

use crate::asset::{Asset, AssetResource};
use crate::config::StoreConfig;
use crate::extract::{Extractor, TarExtractor};
use crate::fetch::{hash_from_http_header, Fetcher, HttpFetcher};
use crate::source::Source;
use cairn_core::{sanitize_string, CairnError, FileResource, Hash, Result};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::Dispatch;
use walkdir::WalkDir;

const ARCHIVE_SUFFIX: &str = ".tar.gz";
const EXTRACTED_DIR: &str = "extracted";

/// Content-addressed store of fetched assets.
///
/// Ingestion takes `&mut self` and runs to completion on the calling
/// thread; lookups take `&self`.
pub struct AssetStore {
    cache_root: PathBuf,
    assets: Vec<Asset>,
    /// Extraction directories already walked by this store
    expanded: HashSet<PathBuf>,
    fetcher: Box<dyn Fetcher>,
    extractor: Box<dyn Extractor>,
    dispatch: Dispatch,
}

impl AssetStore {
    /// Create a store over `cache_root` using HTTP and the system `tar`
    pub fn new<P: AsRef<Path>>(cache_root: P) -> Self {
        Self {
            cache_root: cache_root.as_ref().to_path_buf(),
            assets: Vec::new(),
            expanded: HashSet::new(),
            fetcher: Box::new(HttpFetcher::default()),
            extractor: Box::new(TarExtractor::default()),
            dispatch: tracing::dispatcher::get_default(|d| d.clone()),
        }
    }

    /// Create a store from resolved configuration
    pub fn from_config(config: &StoreConfig) -> Self {
        Self::new(&config.cache_root)
            .with_fetcher(HttpFetcher::new(config.http_timeout_secs))
            .with_extractor(TarExtractor::new(config.tar_program.clone()))
    }

    pub fn with_fetcher(mut self, fetcher: impl Fetcher + 'static) -> Self {
        self.fetcher = Box::new(fetcher);
        self
    }

    pub fn with_extractor(mut self, extractor: impl Extractor + 'static) -> Self {
        self.extractor = Box::new(extractor);
        self
    }

    /// Route this store's diagnostics to `dispatch` instead of the
    /// dispatcher that was current at construction
    pub fn with_dispatch(mut self, dispatch: Dispatch) -> Self {
        self.dispatch = dispatch;
        self
    }

    pub fn cache_root(&self) -> &Path {
        &self.cache_root
    }

    /// All registered assets, in registration order
    pub fn assets(&self) -> &[Asset] {
        &self.assets
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    /// Resolve `key`, optionally narrowed to assets whose path ends with
    /// `asset_path`.
    ///
    /// Returns `Ok(None)` when nothing matches and `AmbiguousMatch` when
    /// more than one asset does.
    pub fn find(&self, key: &str, asset_path: &str) -> Result<Option<AssetResource<'_>>> {
        tracing::dispatcher::with_default(&self.dispatch, || {
            let matches: Vec<&Asset> = self
                .assets
                .iter()
                .filter(|a| a.key() == key)
                .filter(|a| asset_path.is_empty() || a.asset_path().ends_with(asset_path))
                .collect();

            match matches.as_slice() {
                [] => Ok(None),
                [only] => {
                    tracing::info!(
                        "Resolved asset {}:{} to {}",
                        key,
                        asset_path,
                        only.asset_path()
                    );
                    Ok(Some(AssetResource::new(*only)))
                }
                many => {
                    tracing::info!("Matching assets:");
                    for m in many {
                        tracing::info!("    {} {}", m.key(), m.asset_path());
                    }
                    Err(CairnError::AmbiguousMatch {
                        key: key.to_string(),
                        candidates: many
                            .iter()
                            .map(|m| (m.key().to_string(), m.asset_path().to_string()))
                            .collect(),
                    })
                }
            }
        })
    }

    /// Ingest an asset by identifier. Only `http://` and `https://` URLs
    /// are supported.
    pub fn add(&mut self, id: &str) -> Result<()> {
        if id.starts_with("http://") || id.starts_with("https://") {
            return self.add_url(id, None);
        }
        Err(CairnError::UnsupportedFormat(id.to_string()))
    }

    /// Download `url` into the cache and register it, expanding it if it
    /// is an archive. Without an explicit `hash` one is taken from the
    /// server's `ETag`.
    pub fn add_url(&mut self, url: &str, hash: Option<Hash>) -> Result<()> {
        let dispatch = self.dispatch.clone();
        tracing::dispatcher::with_default(&dispatch, || self.ingest_url(url, hash))
    }

    /// Expand `archive_file` and register every file inside it as a child
    /// of `archive_source`
    pub fn add_archive(&mut self, archive_source: Arc<Source>, archive_file: &Path) -> Result<()> {
        let dispatch = self.dispatch.clone();
        tracing::dispatcher::with_default(&dispatch, || {
            self.expand_archive(archive_source, archive_file)
        })
    }

    fn ingest_url(&mut self, url: &str, hash: Option<Hash>) -> Result<()> {
        let hash = match hash {
            Some(hash) => hash,
            None => hash_from_http_header(self.fetcher.as_ref(), url)?,
        };

        if self.is_registered(url, &hash) {
            tracing::debug!("Asset {:?} with hash {} already registered", url, hash);
            return Ok(());
        }

        let local_file = self.cache_path(url, &hash);
        self.fetcher.download(url, &local_file, &hash)?;

        let source = Arc::new(Source::from_url(url, Some(hash)));
        self.register(Asset::new(
            url_basename(url),
            url,
            Box::new(FileResource::new(&local_file)),
            source.clone(),
        ));

        if url.ends_with(ARCHIVE_SUFFIX) {
            self.expand_archive(source, &local_file)?;
        }

        Ok(())
    }

    fn expand_archive(&mut self, archive_source: Arc<Source>, archive_file: &Path) -> Result<()> {
        let file_name = archive_file.file_name().ok_or_else(|| CairnError::Extraction {
            path: archive_file.to_path_buf(),
            reason: "archive path has no file name".to_string(),
        })?;
        let extracted = self.cache_root.join(EXTRACTED_DIR).join(file_name);

        if self.expanded.contains(&extracted) {
            tracing::debug!("Archive {} already expanded", archive_file.display());
            return Ok(());
        }

        // TODO: extract into a temp dir and rename so a crash mid-extract
        // does not leave a directory that looks complete
        if !extracted.exists() {
            fs::create_dir_all(&extracted).map_err(|e| CairnError::Extraction {
                path: extracted.clone(),
                reason: format!("error creating directory: {}", e),
            })?;
            self.extractor.extract(archive_file, &extracted)?;
        }

        // A failed walk still counts as expanded; its files stay registered once
        self.expanded.insert(extracted.clone());

        for entry in WalkDir::new(&extracted).sort_by_file_name() {
            let entry = entry.map_err(|e| CairnError::Extraction {
                path: e
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| extracted.clone()),
                reason: format!("error descending into path: {}", e),
            })?;

            if entry.file_type().is_dir() {
                continue;
            }

            let relative = entry
                .path()
                .strip_prefix(&extracted)
                .map_err(|e| CairnError::Extraction {
                    path: entry.path().to_path_buf(),
                    reason: format!("error finding relative path: {}", e),
                })?;
            let asset_path = slash_path(relative);
            let key = entry.file_name().to_string_lossy().into_owned();

            self.register(Asset::new(
                key,
                asset_path.clone(),
                Box::new(FileResource::new(entry.path())),
                Arc::new(Source::extracted(archive_source.clone(), asset_path)),
            ));
        }

        Ok(())
    }

    fn register(&mut self, asset: Asset) {
        tracing::debug!(
            "Added asset {:?} for {:?} from {}",
            asset.key(),
            asset.asset_path(),
            asset.source()
        );
        self.assets.push(asset);
    }

    fn is_registered(&self, url: &str, hash: &Hash) -> bool {
        self.assets.iter().any(|a| {
            a.source().parent().is_none()
                && a.source().url() == Some(url)
                && a.source().hash() == Some(hash)
        })
    }

    fn cache_path(&self, url: &str, hash: &Hash) -> PathBuf {
        self.cache_root
            .join(format!("{}_{}", hash.hex(), sanitize_string(url)))
    }
}

/// Last path segment of a URL, ignoring trailing slashes
fn url_basename(url: &str) -> &str {
    let trimmed = url.trim_end_matches('/');
    trimmed.rsplit('/').next().unwrap_or(trimmed)
}

/// Render a relative path with `/` separators on every platform
fn slash_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
