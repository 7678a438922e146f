//! Layered store configuration
//!
//! Config is loaded with three layers of precedence (highest wins):
//! 1. Environment variables: `CAIRN_CACHE_ROOT`, `CAIRN_TAR`, `CAIRN_HTTP_TIMEOUT_SECS`
//! 2. Project-local: `.cairn/config.toml`
//! 3. Global: `~/.cairn/config.toml`

use cairn_core::{CairnError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

const ENV_CACHE_ROOT: &str = "CAIRN_CACHE_ROOT";
const ENV_TAR: &str = "CAIRN_TAR";
const ENV_HTTP_TIMEOUT: &str = "CAIRN_HTTP_TIMEOUT_SECS";

const DEFAULT_TAR: &str = "tar";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 300;

/// The `[store]` table; unset fields fall through to lower layers
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StoreSection {
    #[serde(default)]
    pub cache_root: Option<PathBuf>,
    #[serde(default)]
    pub tar_program: Option<String>,
    #[serde(default)]
    pub http_timeout_secs: Option<u64>,
}

/// Top-level config file structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StoreConfigFile {
    #[serde(default)]
    pub store: StoreSection,
}

/// Resolved configuration with environment variable overrides applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub cache_root: PathBuf,
    pub tar_program: String,
    pub http_timeout_secs: u64,
}

impl StoreConfig {
    /// Load config with layered precedence: global < project < env vars
    pub fn load() -> Result<Self> {
        let mut config = StoreConfigFile::default();

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                let global = Self::load_file(&global_path)?;
                Self::merge_into(&mut config, global);
            }
        }

        let local_path = PathBuf::from(".cairn/config.toml");
        if local_path.exists() {
            let local = Self::load_file(&local_path)?;
            Self::merge_into(&mut config, local);
        }

        Self::apply_env_overrides(&mut config, |k| std::env::var(k).ok())?;
        Ok(Self::resolve(config))
    }

    /// Load config from a specific file path only
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let mut config = Self::load_file(path)?;
        Self::apply_env_overrides(&mut config, |k| std::env::var(k).ok())?;
        Ok(Self::resolve(config))
    }

    /// Default cache location: the platform cache dir, else `.cairn/cache`
    pub fn default_cache_root() -> PathBuf {
        dirs::cache_dir()
            .map(|d| d.join("cairn"))
            .unwrap_or_else(|| PathBuf::from(".cairn/cache"))
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".cairn").join("config.toml"))
    }

    fn load_file(path: &Path) -> Result<StoreConfigFile> {
        let content = std::fs::read_to_string(path)?;
        let file: StoreConfigFile = toml::from_str(&content)?;
        Ok(file)
    }

    fn merge_into(base: &mut StoreConfigFile, overlay: StoreConfigFile) {
        let overlay = overlay.store;
        if overlay.cache_root.is_some() {
            base.store.cache_root = overlay.cache_root;
        }
        if overlay.tar_program.is_some() {
            base.store.tar_program = overlay.tar_program;
        }
        if overlay.http_timeout_secs.is_some() {
            base.store.http_timeout_secs = overlay.http_timeout_secs;
        }
    }

    fn apply_env_overrides(
        config: &mut StoreConfigFile,
        var: impl Fn(&str) -> Option<String>,
    ) -> Result<()> {
        if let Some(root) = var(ENV_CACHE_ROOT) {
            config.store.cache_root = Some(PathBuf::from(root));
        }
        if let Some(tar) = var(ENV_TAR) {
            config.store.tar_program = Some(tar);
        }
        if let Some(timeout) = var(ENV_HTTP_TIMEOUT) {
            let secs = timeout.trim().parse().map_err(|_| {
                CairnError::Config(format!(
                    "{} must be a whole number of seconds, got {:?}",
                    ENV_HTTP_TIMEOUT, timeout
                ))
            })?;
            config.store.http_timeout_secs = Some(secs);
        }
        Ok(())
    }

    fn resolve(file: StoreConfigFile) -> Self {
        let store = file.store;
        StoreConfig {
            cache_root: store.cache_root.unwrap_or_else(Self::default_cache_root),
            tar_program: store.tar_program.unwrap_or_else(|| DEFAULT_TAR.to_string()),
            http_timeout_secs: store.http_timeout_secs.unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn temp_config(content: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("cairn_config_test_{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        path
    }

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k: &str| map.get(k).cloned()
    }

    #[test]
    fn test_parse_store_section() {
        let path = temp_config(
            r#"
[store]
cache_root = "/var/cache/cairn"
tar_program = "gtar"
http_timeout_secs = 30
"#,
        );
        let file = StoreConfig::load_file(&path).unwrap();
        let config = StoreConfig::resolve(file);

        assert_eq!(config.cache_root, PathBuf::from("/var/cache/cairn"));
        assert_eq!(config.tar_program, "gtar");
        assert_eq!(config.http_timeout_secs, 30);

        std::fs::remove_dir_all(path.parent().unwrap()).ok();
    }

    #[test]
    fn test_defaults_for_empty_file() {
        let config = StoreConfig::resolve(StoreConfigFile::default());
        assert_eq!(config.tar_program, "tar");
        assert_eq!(config.http_timeout_secs, 300);
        assert_eq!(config.cache_root, StoreConfig::default_cache_root());
    }

    #[test]
    fn test_project_overrides_global() {
        let mut base: StoreConfigFile =
            toml::from_str("[store]\ncache_root = \"/global\"\ntar_program = \"gtar\"").unwrap();
        let overlay: StoreConfigFile = toml::from_str("[store]\ncache_root = \"/project\"").unwrap();
        StoreConfig::merge_into(&mut base, overlay);

        let config = StoreConfig::resolve(base);
        assert_eq!(config.cache_root, PathBuf::from("/project"));
        assert_eq!(config.tar_program, "gtar");
    }

    #[test]
    fn test_env_var_override() {
        let mut file: StoreConfigFile =
            toml::from_str("[store]\ncache_root = \"/from-file\"").unwrap();
        StoreConfig::apply_env_overrides(
            &mut file,
            env(&[(ENV_CACHE_ROOT, "/from-env"), (ENV_HTTP_TIMEOUT, " 12 ")]),
        )
        .unwrap();

        let config = StoreConfig::resolve(file);
        assert_eq!(config.cache_root, PathBuf::from("/from-env"));
        assert_eq!(config.http_timeout_secs, 12);
    }

    #[test]
    fn test_invalid_timeout_env() {
        let mut file = StoreConfigFile::default();
        let err = StoreConfig::apply_env_overrides(&mut file, env(&[(ENV_HTTP_TIMEOUT, "soon")]))
            .unwrap_err();
        assert!(matches!(err, CairnError::Config(_)));
    }

    #[test]
    fn test_malformed_file() {
        let path = temp_config("[store\ncache_root = 1");
        let err = StoreConfig::load_file(&path).unwrap_err();
        assert!(matches!(err, CairnError::TomlParseError(_)));
        std::fs::remove_dir_all(path.parent().unwrap()).ok();
    }
}
