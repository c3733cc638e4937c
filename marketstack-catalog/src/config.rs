use crate::CatalogResult;
use marketstack_audit::SqliteMirror;
use std::path::PathBuf;

/// Default catalog location, relative to the working directory.
pub const DEFAULT_CATALOG_PATH: &str = "data/Sellers.txt";

/// Overrides the catalog path.
pub const ENV_CATALOG: &str = "MARKETSTACK_CATALOG";
/// Enables the mirror at the given database path.
pub const ENV_MIRROR: &str = "MARKETSTACK_MIRROR";
/// Older catalog location copied into place on first open.
pub const ENV_LEGACY_CATALOG: &str = "MARKETSTACK_LEGACY_CATALOG";

/// Where the catalog lives and how it is opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogConfig {
    /// The flat catalog file.
    pub catalog_path: PathBuf,
    /// SQLite database for the mirror. No mirror when `None`.
    pub mirror_path: Option<PathBuf>,
    /// Create an empty catalog file (and its directory) when none exists.
    pub create_if_missing: bool,
    /// Copied to `catalog_path` when the latter does not exist yet.
    pub legacy_catalog_path: Option<PathBuf>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            catalog_path: PathBuf::from(DEFAULT_CATALOG_PATH),
            mirror_path: None,
            create_if_missing: true,
            legacy_catalog_path: None,
        }
    }
}

impl CatalogConfig {
    /// Default configuration pointed at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            catalog_path: path.into(),
            ..Self::default()
        }
    }

    /// Defaults overridden from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by `lookup`, which maps variable names to values.
    /// Blank values are ignored.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
        };
        let mut config = Self::default();
        if let Some(path) = get(ENV_CATALOG) {
            config.catalog_path = path;
        }
        config.mirror_path = get(ENV_MIRROR);
        config.legacy_catalog_path = get(ENV_LEGACY_CATALOG);
        config
    }

    #[must_use]
    pub fn with_mirror(mut self, path: impl Into<PathBuf>) -> Self {
        self.mirror_path = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_legacy_catalog(mut self, path: impl Into<PathBuf>) -> Self {
        self.legacy_catalog_path = Some(path.into());
        self
    }

    #[must_use]
    pub fn create_if_missing(mut self, create: bool) -> Self {
        self.create_if_missing = create;
        self
    }

    /// Opens the configured mirror, if any.
    pub fn open_mirror(&self) -> CatalogResult<Option<SqliteMirror>> {
        match &self.mirror_path {
            Some(path) => Ok(Some(SqliteMirror::open(path)?)),
            None => Ok(None),
        }
    }
}
