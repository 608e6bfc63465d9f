use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use pinhash_schema::Sha256Digest;
use regex::Regex;
use serde::Deserialize;

use super::{Resolver, published_digest};
use crate::command::{Manager, PackageSpec};
use crate::config::Endpoints;
use crate::http::{FetchError, Fetcher};
use crate::index::{NameIndex, NameIndexSource};

#[derive(Debug, Default, Deserialize)]
struct FormulaInfo {
    urls: Option<FormulaUrls>,
    ruby_source_checksum: Option<SourceChecksum>,
    bottle: Option<Bottle>,
}

#[derive(Debug, Default, Deserialize)]
struct FormulaUrls {
    stable: Option<StableUrl>,
}

#[derive(Debug, Deserialize)]
struct StableUrl {
    checksum: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SourceChecksum {
    sha256: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Bottle {
    stable: Option<BottleStable>,
}

#[derive(Debug, Deserialize)]
struct BottleStable {
    files: Option<BTreeMap<String, BottleFile>>,
}

#[derive(Debug, Deserialize)]
struct BottleFile {
    sha256: Option<String>,
}

/// Cask metadata. Deliberately has no `urls`/`bottle` fields: those are
/// formula-only and must never feed a cask checksum.
#[derive(Debug, Default, Deserialize)]
struct CaskInfo {
    sha256: Option<String>,
    ruby_source_checksum: Option<SourceChecksum>,
}

#[derive(Debug, Deserialize)]
struct RepoInfo {
    default_branch: String,
}

/// Stable source checksum, then formula source checksum, then any bottle.
fn formula_checksum(info: &FormulaInfo) -> Option<Sha256Digest> {
    let stable = info
        .urls
        .as_ref()
        .and_then(|u| u.stable.as_ref())
        .and_then(|s| s.checksum.as_deref());
    let source = info
        .ruby_source_checksum
        .as_ref()
        .and_then(|c| c.sha256.as_deref());

    published_digest(stable)
        .or_else(|| published_digest(source))
        .or_else(|| {
            info.bottle
                .as_ref()
                .and_then(|b| b.stable.as_ref())
                .and_then(|s| s.files.as_ref())
                .and_then(|files| {
                    files
                        .values()
                        .find_map(|f| published_digest(f.sha256.as_deref()))
                })
        })
}

/// Direct cask digest (`no_check` is rejected), then source checksum.
fn cask_checksum(info: &CaskInfo) -> Option<Sha256Digest> {
    published_digest(info.sha256.as_deref()).or_else(|| {
        published_digest(
            info.ruby_source_checksum
                .as_ref()
                .and_then(|c| c.sha256.as_deref()),
        )
    })
}

/// Final `/`-separated segment, e.g. `widget` for `acme/tap/widget`.
fn last_segment(target: &str) -> &str {
    target.rsplit('/').next().unwrap_or(target)
}

fn push_unique(out: &mut Vec<String>, name: &str) {
    if !name.is_empty() && !out.iter().any(|n| n.eq_ignore_ascii_case(name)) {
        out.push(name.to_string());
    }
}

/// Ordered, de-duplicated metadata lookups for `target`.
///
/// The literal target comes first, then its final path segment. With an
/// index loaded, canonical names matching either by name, full name, alias
/// or old name follow, and finally the highest `name@X.Y` sibling of each.
pub fn candidate_names(target: &str, index: Option<&NameIndex>) -> Vec<String> {
    let mut out = Vec::new();
    push_unique(&mut out, target);
    push_unique(&mut out, last_segment(target));

    if let Some(index) = index {
        let literal = out.clone();
        for candidate in &literal {
            for canonical in index.canonical_matches(candidate) {
                push_unique(&mut out, canonical);
            }
        }
        let known = out.clone();
        for candidate in &known {
            if let Some(sibling) = index.highest_versioned_sibling(candidate) {
                push_unique(&mut out, sibling);
            }
        }
    }
    out
}

/// A tap-qualified target, `owner/tap/name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TapRef {
    pub owner: String,
    pub tap: String,
    pub name: String,
}

impl TapRef {
    pub fn parse(target: &str) -> Option<Self> {
        let mut parts = target.split('/');
        let (owner, tap, name) = (parts.next()?, parts.next()?, parts.next()?);
        if parts.next().is_some() || owner.is_empty() || tap.is_empty() || name.is_empty() {
            return None;
        }
        Some(Self {
            owner: owner.to_string(),
            tap: tap.to_string(),
            name: name.to_string(),
        })
    }

    /// GitHub repository backing the tap (`acme/tap` lives in `acme/homebrew-tap`).
    pub fn repo(&self) -> String {
        if self.tap.starts_with("homebrew-") {
            self.tap.clone()
        } else {
            format!("homebrew-{}", self.tap)
        }
    }
}

/// Where a tap may keep the definition of `name`, most likely first.
pub fn tap_source_paths(name: &str, cask: bool) -> Vec<String> {
    if cask {
        vec![format!("Casks/{name}.rb"), format!("{name}.rb")]
    } else {
        vec![
            format!("Formula/{name}.rb"),
            format!("HomebrewFormula/{name}.rb"),
            format!("{name}.rb"),
        ]
    }
}

/// First quoted 64-hex literal in a formula or cask source.
pub fn find_inline_digest(source: &str) -> Option<Sha256Digest> {
    static INLINE_DIGEST: OnceLock<Regex> = OnceLock::new();
    let re = INLINE_DIGEST
        .get_or_init(|| Regex::new(r#"["']([0-9a-fA-F]{64})["']"#).expect("valid digest pattern"));
    re.captures(source)
        .and_then(|caps| Sha256Digest::new(&caps[1]).ok())
}

pub struct HomebrewResolver {
    fetcher: Fetcher,
    api_base: String,
    github_api: String,
    github_raw: String,
    names: Arc<dyn NameIndexSource>,
}

impl std::fmt::Debug for HomebrewResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HomebrewResolver")
            .field("api_base", &self.api_base)
            .finish_non_exhaustive()
    }
}

impl HomebrewResolver {
    pub fn new(fetcher: Fetcher, endpoints: &Endpoints, names: Arc<dyn NameIndexSource>) -> Self {
        Self {
            fetcher,
            api_base: endpoints.homebrew_api.trim_end_matches('/').to_string(),
            github_api: endpoints.github_api.trim_end_matches('/').to_string(),
            github_raw: endpoints.github_raw.trim_end_matches('/').to_string(),
            names,
        }
    }

    async fn lookup(&self, candidate: &str, cask: bool) -> Result<Option<Sha256Digest>, FetchError> {
        if cask {
            let url = format!("{}/cask/{candidate}.json", self.api_base);
            let info: CaskInfo = self.fetcher.get_json(&url).await?;
            Ok(cask_checksum(&info))
        } else {
            let url = format!("{}/formula/{candidate}.json", self.api_base);
            let info: FormulaInfo = self.fetcher.get_json(&url).await?;
            Ok(formula_checksum(&info))
        }
    }

    async fn default_branch(&self, owner: &str, repo: &str) -> Option<String> {
        let url = format!("{}/repos/{owner}/{repo}", self.github_api);
        match self.fetcher.get_json::<RepoInfo>(&url).await {
            Ok(info) if !info.default_branch.is_empty() => Some(info.default_branch),
            Ok(_) => None,
            Err(e) => {
                tracing::debug!("Default branch lookup for {owner}/{repo} failed: {e}");
                None
            }
        }
    }

    async fn tap_fallback(&self, tap: &TapRef, cask: bool) -> Option<Sha256Digest> {
        let repo = tap.repo();
        let branches = match self.default_branch(&tap.owner, &repo).await {
            Some(branch) => vec![branch],
            None => vec!["main".to_string(), "master".to_string()],
        };

        for branch in &branches {
            for path in tap_source_paths(&tap.name, cask) {
                let url = format!("{}/{}/{repo}/{branch}/{path}", self.github_raw, tap.owner);
                match self.fetcher.get_text(&url).await {
                    Ok(source) => {
                        if let Some(digest) = find_inline_digest(&source) {
                            tracing::debug!("Found inline digest in {url}");
                            return Some(digest);
                        }
                    }
                    Err(e) => tracing::debug!("Tap source {url}: {e}"),
                }
            }
        }
        None
    }
}

#[async_trait]
impl Resolver for HomebrewResolver {
    fn name(&self) -> &'static str {
        "homebrew"
    }

    fn accepts(&self, spec: &PackageSpec) -> bool {
        spec.manager == Manager::Homebrew
    }

    async fn resolve(&self, spec: &PackageSpec) -> Result<Option<Sha256Digest>, FetchError> {
        let index = if spec.cask {
            self.names.cask_index().await
        } else {
            self.names.formula_index().await
        };

        for candidate in candidate_names(&spec.name, index.as_deref()) {
            match self.lookup(&candidate, spec.cask).await {
                Ok(Some(digest)) => return Ok(Some(digest)),
                Ok(None) => tracing::debug!("{candidate}: no usable checksum"),
                Err(e) if e.is_oversized() => tracing::warn!("{candidate}: {e}"),
                Err(e) => tracing::debug!("{candidate}: {e}"),
            }
        }

        match TapRef::parse(&spec.name) {
            Some(tap) => Ok(self.tap_fallback(&tap, spec.cask).await),
            None => Ok(None),
        }
    }
}
