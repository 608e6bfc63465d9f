use async_trait::async_trait;
use pinhash_schema::Sha256Digest;
use serde::Deserialize;

use super::{Resolver, published_digest};
use crate::command::{Manager, PackageSpec};
use crate::http::{FetchError, Fetcher};

#[derive(Debug, Deserialize)]
struct VersionList {
    #[serde(default)]
    versions: Vec<CrateVersion>,
}

#[derive(Debug, Deserialize)]
struct CrateVersion {
    num: String,
    #[serde(default)]
    yanked: bool,
    checksum: Option<String>,
}

/// Exact match for a pin, else the first non-yanked version as listed.
fn select_version<'a>(versions: &'a [CrateVersion], pin: Option<&str>) -> Option<&'a CrateVersion> {
    match pin {
        Some(pin) => versions.iter().find(|v| v.num == pin),
        None => versions.iter().find(|v| !v.yanked),
    }
}

/// Resolves crates from the crates.io version list, whose `checksum` field
/// is the SHA256 of the `.crate` file.
#[derive(Debug)]
pub struct CratesIoResolver {
    fetcher: Fetcher,
    base: String,
}

impl CratesIoResolver {
    pub fn new(fetcher: Fetcher, base: &str) -> Self {
        Self {
            fetcher,
            base: base.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl Resolver for CratesIoResolver {
    fn name(&self) -> &'static str {
        "crates.io"
    }

    fn accepts(&self, spec: &PackageSpec) -> bool {
        spec.manager == Manager::Cargo
    }

    async fn resolve(&self, spec: &PackageSpec) -> Result<Option<Sha256Digest>, FetchError> {
        let url = format!("{}/crates/{}/versions", self.base, spec.name);
        let list: VersionList = self.fetcher.get_json(&url).await?;

        let Some(selected) = select_version(&list.versions, spec.version.as_deref()) else {
            tracing::debug!("{}: no matching version", spec.name);
            return Ok(None);
        };
        Ok(published_digest(selected.checksum.as_deref()))
    }
}
