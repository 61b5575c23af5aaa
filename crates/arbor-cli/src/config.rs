use std::path::{Path, PathBuf};

use anyhow::Context;
use arbor_value::ValueStoreConfig;
use serde::{Deserialize, Serialize};

/// Store directory used when neither a flag, the config file, nor the
/// object spelling names one.
pub const DEFAULT_STORE_DIR: &str = ".arbor";

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArborConfig {
    pub store: StoreSection,
    pub value_store: ValueStoreConfig,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSection {
    pub path: Option<PathBuf>,
}

impl ArborConfig {
    /// Read `path`, or return the defaults when no file is given.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn parse(text: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Store directory chosen by precedence: explicit override, then the
    /// config file, then [`DEFAULT_STORE_DIR`].
    pub fn store_dir(&self, flag: Option<&Path>) -> PathBuf {
        flag.map(Path::to_path_buf)
            .or_else(|| self.store.path.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STORE_DIR))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = ArborConfig::default();
        assert!(c.store.path.is_none());
        assert_eq!(c.value_store, ValueStoreConfig::default());
        assert_eq!(c.store_dir(None), PathBuf::from(DEFAULT_STORE_DIR));
    }

    #[test]
    fn parse_partial_toml() {
        let c = ArborConfig::parse(
            r#"
            [store]
            path = "/data/arbor"

            [value_store]
            cache_capacity = 10

            [value_store.chunker]
            boundary_bits = 8
            "#,
        )
        .unwrap();
        assert_eq!(c.store.path, Some(PathBuf::from("/data/arbor")));
        assert_eq!(c.value_store.cache_capacity, 10);
        assert_eq!(c.value_store.chunker.boundary_bits, 8);
        assert_eq!(c.value_store.chunker.window, 64);
    }

    #[test]
    fn flag_overrides_file() {
        let c = ArborConfig::parse("[store]\npath = \"from-file\"\n").unwrap();
        assert_eq!(c.store_dir(None), PathBuf::from("from-file"));
        assert_eq!(c.store_dir(Some(Path::new("from-flag"))), PathBuf::from("from-flag"));
    }

    #[test]
    fn load_from_disk() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("arbor.toml");
        std::fs::write(&path, "[value_store]\ncache_capacity = 0\n").unwrap();
        let c = ArborConfig::load(Some(&path)).unwrap();
        assert_eq!(c.value_store.cache_capacity, 0);
        assert!(ArborConfig::load(Some(&dir.path().join("missing.toml"))).is_err());
    }

    #[test]
    fn malformed_toml_is_an_error() {
        assert!(ArborConfig::parse("[store\npath = 1").is_err());
    }
}
