use async_trait::async_trait;
use pinhash_schema::Sha256Digest;
use serde::Deserialize;

use super::Resolver;
use crate::command::PackageSpec;
use crate::http::{FetchError, Fetcher};

#[derive(Debug, Deserialize)]
struct VersionDoc {
    dist: Option<Dist>,
}

#[derive(Debug, Deserialize)]
struct Dist {
    tarball: Option<String>,
}

/// Resolves npm-registry packages by hashing the published tarball.
///
/// The registry's own `integrity` field is SHA-512 and `shasum` is SHA-1, so
/// the SHA256 has to be computed locally.
#[derive(Debug)]
pub struct NpmResolver {
    fetcher: Fetcher,
    registry: String,
}

impl NpmResolver {
    pub fn new(fetcher: Fetcher, registry: &str) -> Self {
        Self {
            fetcher,
            registry: registry.trim_end_matches('/').to_string(),
        }
    }

    /// Per-version document URL. Scoped names keep the `@` but escape the slash.
    pub fn version_url(&self, name: &str, version: &str) -> String {
        let encoded = name.replacen('/', "%2F", 1);
        format!("{}/{encoded}/{version}", self.registry)
    }
}

/// Exact versions and dist-tags are addressable; ranges are not.
fn is_addressable(version: &str) -> bool {
    !version.is_empty()
        && version
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '+' | '_'))
}

#[async_trait]
impl Resolver for NpmResolver {
    fn name(&self) -> &'static str {
        "npm"
    }

    fn accepts(&self, spec: &PackageSpec) -> bool {
        spec.manager.uses_npm_registry()
    }

    async fn resolve(&self, spec: &PackageSpec) -> Result<Option<Sha256Digest>, FetchError> {
        let version = spec.version.as_deref().unwrap_or("latest");
        if !is_addressable(version) {
            tracing::debug!("{}@{version}: version range has no single artifact", spec.name);
            return Ok(None);
        }

        let doc: VersionDoc = self
            .fetcher
            .get_json(&self.version_url(&spec.name, version))
            .await?;
        let Some(tarball) = doc.dist.and_then(|d| d.tarball) else {
            tracing::debug!("{}@{version}: no dist.tarball", spec.name);
            return Ok(None);
        };
        if !tarball.starts_with("https://") && !tarball.starts_with("http://") {
            return Ok(None);
        }

        self.fetcher.download_digest(&tarball).await.map(Some)
    }
}
