use crate::error::{IndexerError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

/// Environment override for [`IndexerConfig::concurrency`]
pub const CONCURRENCY_ENV: &str = "CONTEXT_GRAPH_INDEX_CONCURRENCY";

const MAX_CONCURRENCY: usize = 32;

/// 1 MiB
pub const DEFAULT_MAX_FILE_SIZE_BYTES: u64 = 1_048_576;

/// Which files the source walker yields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkerConfig {
    /// Directory names pruned anywhere below the root (case-insensitive)
    pub denylist_dirs: BTreeSet<String>,

    /// File base names never yielded
    pub denylist_filenames: BTreeSet<String>,

    /// Lower-case extensions without the leading dot
    pub extensions: BTreeSet<String>,

    /// Larger files are skipped with a warning. `None` disables the check.
    pub max_file_size_bytes: Option<u64>,

    pub skip_hidden: bool,
    pub respect_gitignore: bool,
}

impl Default for WalkerConfig {
    fn default() -> Self {
        Self {
            denylist_dirs: to_set(&[
                ".git",
                ".hg",
                ".svn",
                ".venv",
                "venv",
                "env",
                "__pycache__",
                ".mypy_cache",
                ".pytest_cache",
                ".tox",
                "node_modules",
                "build",
                "dist",
                "site-packages",
            ]),
            denylist_filenames: to_set(&["__init__.py"]),
            extensions: to_set(&["py", "pyi", "js", "mjs", "cjs", "jsx", "ts", "mts", "cts", "tsx"]),
            max_file_size_bytes: Some(DEFAULT_MAX_FILE_SIZE_BYTES),
            skip_hidden: false,
            respect_gitignore: false,
        }
    }
}

impl WalkerConfig {
    /// Only Python sources, as the reference grammar
    pub fn python_only() -> Self {
        Self {
            extensions: to_set(&["py"]),
            ..Self::default()
        }
    }

    pub fn with_extensions(mut self, extensions: &[&str]) -> Self {
        self.extensions = extensions.iter().map(|e| e.to_lowercase()).collect();
        self
    }

    pub fn with_denylist_dirs(mut self, dirs: &[&str]) -> Self {
        self.denylist_dirs = to_set(dirs);
        self
    }

    pub fn with_denylist_filenames(mut self, names: &[&str]) -> Self {
        self.denylist_filenames = to_set(names);
        self
    }

    pub(crate) fn is_denied_dir(&self, name: &str) -> bool {
        self.denylist_dirs
            .iter()
            .any(|denied| denied.eq_ignore_ascii_case(name))
    }

    pub(crate) fn is_denied_filename(&self, name: &str) -> bool {
        self.denylist_filenames.contains(name)
    }

    pub(crate) fn accepts_extension(&self, ext: &str) -> bool {
        let ext = ext.to_lowercase();
        self.extensions.contains(&ext)
    }
}

/// Analysis session settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexerConfig {
    pub walker: WalkerConfig,

    /// Files read and extracted per batch
    pub concurrency: usize,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            walker: WalkerConfig::default(),
            concurrency: concurrency_from_env(),
        }
    }
}

impl IndexerConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        log::debug!("Loaded indexer config from {}", path.display());
        Self::from_toml_str(&raw)
    }

    pub fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            return Err(IndexerError::ConfigError(
                "concurrency must be at least 1".to_string(),
            ));
        }
        if self.walker.extensions.is_empty() {
            return Err(IndexerError::ConfigError(
                "walker.extensions must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn with_walker(mut self, walker: WalkerConfig) -> Self {
        self.walker = walker;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }
}

fn to_set(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

fn default_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .clamp(2, 8)
}

fn parse_concurrency(raw: Option<&str>, default_value: usize) -> usize {
    raw.map(str::trim)
        .filter(|v| !v.is_empty())
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(default_value)
        .clamp(1, MAX_CONCURRENCY)
}

fn concurrency_from_env() -> usize {
    let raw = std::env::var(CONCURRENCY_ENV).ok();
    parse_concurrency(raw.as_deref(), default_concurrency())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parse_concurrency_clamps_and_falls_back() {
        assert_eq!(parse_concurrency(None, 4), 4);
        assert_eq!(parse_concurrency(Some(" 6 "), 4), 6);
        assert_eq!(parse_concurrency(Some(""), 4), 4);
        assert_eq!(parse_concurrency(Some("lots"), 4), 4);
        assert_eq!(parse_concurrency(Some("0"), 4), 1);
        assert_eq!(parse_concurrency(Some("1000"), 4), MAX_CONCURRENCY);
    }

    #[test]
    fn default_config_is_valid() {
        let config = IndexerConfig::default();
        assert!(config.concurrency >= 1);
        config.validate().unwrap();
        assert!(config.walker.is_denied_filename("__init__.py"));
        assert!(config.walker.accepts_extension("PY"));
    }

    #[test]
    fn toml_overrides_keep_defaults_for_missing_keys() {
        let config = IndexerConfig::from_toml_str(
            r#"
concurrency = 3

[walker]
extensions = ["py"]
denylist_dirs = ["Generated"]
max_file_size_bytes = 2048
"#,
        )
        .unwrap();

        assert_eq!(config.concurrency, 3);
        assert_eq!(config.walker.extensions, to_set(&["py"]));
        assert!(config.walker.is_denied_dir("generated"));
        assert_eq!(config.walker.max_file_size_bytes, Some(2048));
        assert!(config.walker.is_denied_filename("__init__.py"));
        assert!(!config.walker.skip_hidden);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let err = IndexerConfig::from_toml_str("concurrency = 0").unwrap_err();
        assert!(matches!(err, IndexerError::ConfigError(_)), "{err}");

        let err = IndexerConfig::from_toml_str("[walker]\nextensions = []").unwrap_err();
        assert!(matches!(err, IndexerError::ConfigError(_)), "{err}");

        let err = IndexerConfig::from_toml_str("concurrency = \"many\"").unwrap_err();
        assert!(matches!(err, IndexerError::ConfigParseError(_)), "{err}");
    }
}
