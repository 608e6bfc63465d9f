//! Resolver configuration.
//!
//! Layering, lowest precedence first: built-in defaults, a TOML file,
//! `PINHASH_*` environment variables. Callers (the CLI) may override fields
//! afterwards; [`ResolverConfig::clamped`] applies the floors last.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default checksum cache TTL (12 hours).
pub const DEFAULT_CACHE_TTL_SECS: u64 = 43_200;
/// Lowest accepted checksum cache TTL.
pub const MIN_CACHE_TTL_SECS: u64 = 60;
/// Default checksum cache capacity.
pub const DEFAULT_MAX_CACHE_ENTRIES: usize = 2_000;
/// Lowest accepted checksum cache capacity.
pub const MIN_MAX_CACHE_ENTRIES: usize = 100;
/// Default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;
/// Lowest accepted per-request timeout.
pub const MIN_REQUEST_TIMEOUT_MS: u64 = 1_500;
/// Default artifact download ceiling (80 MiB).
pub const DEFAULT_MAX_DOWNLOAD_BYTES: u64 = 80 * 1024 * 1024;
/// Lowest accepted artifact download ceiling.
pub const MIN_MAX_DOWNLOAD_BYTES: u64 = 1_000_000;
/// Default refresh interval for the Homebrew name indexes (6 hours).
pub const DEFAULT_INDEX_TTL_SECS: u64 = 21_600;
/// Lowest accepted name index refresh interval.
pub const MIN_INDEX_TTL_SECS: u64 = 60;

/// Base URLs of every upstream the resolvers talk to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    /// Homebrew JSON API (`<base>/formula/<name>.json`).
    pub homebrew_api: String,
    /// GitHub REST API, used for tap default branches.
    pub github_api: String,
    /// GitHub raw file host, used for tap sources.
    pub github_raw: String,
    /// npm-compatible registry.
    pub npm_registry: String,
    /// PyPI JSON API (`<base>/<name>/json`).
    pub pypi: String,
    /// crates.io API (`<base>/crates/<name>/versions`).
    pub crates_io: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            homebrew_api: "https://formulae.brew.sh/api".to_string(),
            github_api: "https://api.github.com".to_string(),
            github_raw: "https://raw.githubusercontent.com".to_string(),
            npm_registry: "https://registry.npmjs.org".to_string(),
            pypi: "https://pypi.org/pypi".to_string(),
            crates_io: "https://crates.io/api/v1".to_string(),
        }
    }
}

impl Endpoints {
    /// Route every upstream under one base URL, each on its own path prefix.
    ///
    /// Used for mirrors and for pointing tests at a single mock server.
    pub fn with_base(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            homebrew_api: format!("{base}/brew"),
            github_api: format!("{base}/github-api"),
            github_raw: format!("{base}/raw"),
            npm_registry: format!("{base}/npm"),
            pypi: format!("{base}/pypi"),
            crates_io: format!("{base}/crates-api"),
        }
    }
}

/// Tunables for [`crate::ChecksumResolver`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Checksum cache TTL in seconds.
    pub cache_ttl_secs: u64,
    /// Checksum cache capacity.
    pub max_cache_entries: usize,
    /// Per-request timeout in milliseconds.
    pub request_timeout_ms: u64,
    /// Maximum bytes read from any single response.
    pub max_download_bytes: u64,
    /// Refresh interval for the Homebrew name indexes.
    pub index_ttl_secs: u64,
    /// Upstream base URLs.
    pub endpoints: Endpoints,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            max_cache_entries: DEFAULT_MAX_CACHE_ENTRIES,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            max_download_bytes: DEFAULT_MAX_DOWNLOAD_BYTES,
            index_ttl_secs: DEFAULT_INDEX_TTL_SECS,
            endpoints: Endpoints::default(),
        }
    }
}

impl ResolverConfig {
    /// Load configuration from `path`, or from the default location when
    /// `path` is `None`, then apply environment overrides.
    ///
    /// A missing default file is not an error; a missing explicit file is.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid TOML.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => match crate::default_config_path() {
                Some(default) if default.exists() => Self::from_file(&default)?,
                _ => Self::default(),
            },
        };
        Ok(config.apply_env())
    }

    /// Parse a TOML config file. Unset fields keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config {}", path.display()))
    }

    /// Override fields from `PINHASH_*` environment variables.
    ///
    /// Unparseable values are ignored with a warning.
    pub fn apply_env(self) -> Self {
        self.apply_vars(|key| std::env::var(key).ok())
    }

    fn apply_vars(mut self, var: impl Fn(&str) -> Option<String>) -> Self {
        fn parsed<T: std::str::FromStr>(
            var: &impl Fn(&str) -> Option<String>,
            key: &str,
        ) -> Option<T> {
            let raw = var(key)?;
            match raw.trim().parse() {
                Ok(v) => Some(v),
                Err(_) => {
                    tracing::warn!("Ignoring {key}={raw}: not a number");
                    None
                }
            }
        }

        if let Some(v) = parsed(&var, "PINHASH_CACHE_TTL_SECS") {
            self.cache_ttl_secs = v;
        }
        if let Some(v) = parsed(&var, "PINHASH_MAX_CACHE_ENTRIES") {
            self.max_cache_entries = v;
        }
        if let Some(v) = parsed(&var, "PINHASH_REQUEST_TIMEOUT_MS") {
            self.request_timeout_ms = v;
        }
        if let Some(v) = parsed(&var, "PINHASH_MAX_DOWNLOAD_BYTES") {
            self.max_download_bytes = v;
        }
        if let Some(v) = parsed(&var, "PINHASH_INDEX_TTL_SECS") {
            self.index_ttl_secs = v;
        }
        self
    }

    /// Raise every tunable to its floor.
    pub fn clamped(self) -> Self {
        Self {
            cache_ttl_secs: self.cache_ttl_secs.max(MIN_CACHE_TTL_SECS),
            max_cache_entries: self.max_cache_entries.max(MIN_MAX_CACHE_ENTRIES),
            request_timeout_ms: self.request_timeout_ms.max(MIN_REQUEST_TIMEOUT_MS),
            max_download_bytes: self.max_download_bytes.max(MIN_MAX_DOWNLOAD_BYTES),
            index_ttl_secs: self.index_ttl_secs.max(MIN_INDEX_TTL_SECS),
            endpoints: self.endpoints,
        }
    }

    /// Checksum cache TTL.
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs.max(MIN_CACHE_TTL_SECS))
    }

    /// Per-request timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms.max(MIN_REQUEST_TIMEOUT_MS))
    }

    /// Name index refresh interval.
    pub fn index_ttl(&self) -> Duration {
        Duration::from_secs(self.index_ttl_secs.max(MIN_INDEX_TTL_SECS))
    }
}
