//! Homebrew name indexes.
//!
//! A [`NameIndex`] maps every canonical formula or cask name to the names it
//! is also known by (full tap name, aliases, historical names). Resolvers get
//! indexes through a [`NameIndexSource`] so the live, periodically refreshed
//! snapshot can be swapped for a fixed one in tests.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::http::Fetcher;

/// One canonical entry and its alternate names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexEntry {
    /// Canonical name, as used by the per-item metadata endpoint.
    pub name: String,
    /// Tap-qualified name (`homebrew/core/jq`).
    pub full_name: Option<String>,
    /// Current aliases.
    pub aliases: Vec<String>,
    /// Former names the item was renamed from.
    pub old_names: Vec<String>,
}

impl IndexEntry {
    fn all_names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str())
            .chain(self.full_name.as_deref())
            .chain(self.aliases.iter().map(String::as_str))
            .chain(self.old_names.iter().map(String::as_str))
    }
}

/// Read-only snapshot of an ecosystem's names.
#[derive(Debug, Default)]
pub struct NameIndex {
    entries: Vec<IndexEntry>,
    // Lowercased alternate name -> entry positions.
    lookup: HashMap<String, Vec<usize>>,
}

impl NameIndex {
    /// Build an index, precomputing the case-insensitive lookup table.
    pub fn new(entries: Vec<IndexEntry>) -> Self {
        let mut lookup: HashMap<String, Vec<usize>> = HashMap::new();
        for (i, entry) in entries.iter().enumerate() {
            for name in entry.all_names() {
                let slot = lookup.entry(name.to_lowercase()).or_default();
                if !slot.contains(&i) {
                    slot.push(i);
                }
            }
        }
        Self { entries, lookup }
    }

    /// Number of canonical entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Canonical names whose name set contains `candidate`, ignoring case.
    pub fn canonical_matches(&self, candidate: &str) -> Vec<&str> {
        self.lookup
            .get(&candidate.to_lowercase())
            .map(|positions| {
                positions
                    .iter()
                    .map(|&i| self.entries[i].name.as_str())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// The highest-versioned `base@X.Y` sibling of `candidate`'s family.
    ///
    /// Versions compare numerically component by component, so `@3.12`
    /// outranks `@3.9`. Siblings with non-numeric suffixes are ignored.
    pub fn highest_versioned_sibling(&self, candidate: &str) -> Option<&str> {
        let base = candidate.split('@').next()?.to_lowercase();
        let prefix = format!("{base}@");

        self.entries
            .iter()
            .filter_map(|entry| {
                let suffix = entry.name.to_lowercase().strip_prefix(&prefix)?.to_string();
                let version = numeric_version(&suffix)?;
                Some((version, entry.name.as_str()))
            })
            .max_by(|a, b| a.0.cmp(&b.0))
            .map(|(_, name)| name)
    }
}

fn numeric_version(s: &str) -> Option<Vec<u64>> {
    s.split('.').map(|part| part.parse().ok()).collect()
}

#[derive(Debug, Deserialize)]
struct FormulaIndexEntry {
    name: String,
    full_name: Option<String>,
    #[serde(default)]
    aliases: Vec<String>,
    #[serde(default)]
    oldnames: Vec<String>,
    oldname: Option<String>,
}

impl From<FormulaIndexEntry> for IndexEntry {
    fn from(raw: FormulaIndexEntry) -> Self {
        let mut old_names = raw.oldnames;
        old_names.extend(raw.oldname);
        Self {
            name: raw.name,
            full_name: raw.full_name,
            aliases: raw.aliases,
            old_names,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CaskIndexEntry {
    token: String,
    full_token: Option<String>,
    #[serde(default)]
    old_tokens: Vec<String>,
}

impl From<CaskIndexEntry> for IndexEntry {
    fn from(raw: CaskIndexEntry) -> Self {
        Self {
            name: raw.token,
            full_name: raw.full_token,
            aliases: Vec::new(),
            old_names: raw.old_tokens,
        }
    }
}

/// Supplies the formula and cask name indexes.
///
/// `None` means no index is loaded; resolvers then work from the literal
/// target alone.
#[async_trait]
pub trait NameIndexSource: Send + Sync {
    /// Current formula index.
    async fn formula_index(&self) -> Option<Arc<NameIndex>>;

    /// Current cask index.
    async fn cask_index(&self) -> Option<Arc<NameIndex>>;
}

/// Fixed in-memory indexes.
#[derive(Debug, Default, Clone)]
pub struct StaticNameIndex {
    formula: Option<Arc<NameIndex>>,
    cask: Option<Arc<NameIndex>>,
}

impl StaticNameIndex {
    /// Serve the given indexes forever.
    pub fn new(formula: Option<NameIndex>, cask: Option<NameIndex>) -> Self {
        Self {
            formula: formula.map(Arc::new),
            cask: cask.map(Arc::new),
        }
    }

    /// No index loaded.
    pub fn empty() -> Self {
        Self::default()
    }
}

#[async_trait]
impl NameIndexSource for StaticNameIndex {
    async fn formula_index(&self) -> Option<Arc<NameIndex>> {
        self.formula.clone()
    }

    async fn cask_index(&self) -> Option<Arc<NameIndex>> {
        self.cask.clone()
    }
}

#[derive(Debug, Default)]
struct Snapshot {
    index: Option<Arc<NameIndex>>,
    checked_at: Option<Instant>,
}

/// Indexes loaded from the Homebrew API on first use and refreshed once
/// their TTL lapses.
///
/// A refresh replaces the snapshot wholesale. A failed refresh keeps the
/// previous snapshot and is not retried until another TTL has passed.
#[derive(Debug)]
pub struct RemoteNameIndex {
    fetcher: Fetcher,
    api_base: String,
    ttl: Duration,
    formula: Mutex<Snapshot>,
    cask: Mutex<Snapshot>,
}

impl RemoteNameIndex {
    /// Create an index source backed by `<api_base>/formula.json` and
    /// `<api_base>/cask.json`.
    pub fn new(fetcher: Fetcher, api_base: impl Into<String>, ttl: Duration) -> Self {
        Self {
            fetcher,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            ttl,
            formula: Mutex::new(Snapshot::default()),
            cask: Mutex::new(Snapshot::default()),
        }
    }

    async fn fetch_formulae(&self) -> Option<NameIndex> {
        let url = format!("{}/formula.json", self.api_base);
        match self.fetcher.get_json::<Vec<FormulaIndexEntry>>(&url).await {
            Ok(raw) => Some(NameIndex::new(raw.into_iter().map(Into::into).collect())),
            Err(e) => {
                tracing::warn!("Formula index refresh failed: {e}");
                None
            }
        }
    }

    async fn fetch_casks(&self) -> Option<NameIndex> {
        let url = format!("{}/cask.json", self.api_base);
        match self.fetcher.get_json::<Vec<CaskIndexEntry>>(&url).await {
            Ok(raw) => Some(NameIndex::new(raw.into_iter().map(Into::into).collect())),
            Err(e) => {
                tracing::warn!("Cask index refresh failed: {e}");
                None
            }
        }
    }

    fn is_stale(&self, snapshot: &Snapshot) -> bool {
        snapshot
            .checked_at
            .is_none_or(|checked| checked.elapsed() >= self.ttl)
    }
}

#[async_trait]
impl NameIndexSource for RemoteNameIndex {
    async fn formula_index(&self) -> Option<Arc<NameIndex>> {
        let mut snapshot = self.formula.lock().await;
        if self.is_stale(&snapshot) {
            snapshot.checked_at = Some(Instant::now());
            if let Some(fresh) = self.fetch_formulae().await {
                tracing::debug!("Loaded formula index ({} entries)", fresh.len());
                snapshot.index = Some(Arc::new(fresh));
            }
        }
        snapshot.index.clone()
    }

    async fn cask_index(&self) -> Option<Arc<NameIndex>> {
        let mut snapshot = self.cask.lock().await;
        if self.is_stale(&snapshot) {
            snapshot.checked_at = Some(Instant::now());
            if let Some(fresh) = self.fetch_casks().await {
                tracing::debug!("Loaded cask index ({} entries)", fresh.len());
                snapshot.index = Some(Arc::new(fresh));
            }
        }
        snapshot.index.clone()
    }
}
