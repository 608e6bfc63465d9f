use std::collections::HashMap;

use async_trait::async_trait;
use pinhash_schema::Sha256Digest;
use serde::Deserialize;

use super::{Resolver, published_digest};
use crate::command::PackageSpec;
use crate::http::{FetchError, Fetcher};

#[derive(Debug, Deserialize)]
struct ProjectDoc {
    info: Option<ProjectInfo>,
    #[serde(default)]
    releases: HashMap<String, Vec<ReleaseFile>>,
    #[serde(default)]
    urls: Vec<ReleaseFile>,
}

#[derive(Debug, Deserialize)]
struct ProjectInfo {
    version: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ReleaseFile {
    #[serde(default)]
    packagetype: String,
    digests: Option<FileDigests>,
}

#[derive(Debug, Deserialize)]
struct FileDigests {
    sha256: Option<String>,
}

impl ReleaseFile {
    fn digest(&self) -> Option<Sha256Digest> {
        published_digest(self.digests.as_ref().and_then(|d| d.sha256.as_deref()))
    }
}

/// Prefer the sdist's published digest, else any file that has one.
fn pick_release_digest(files: &[ReleaseFile]) -> Option<Sha256Digest> {
    files
        .iter()
        .filter(|f| f.packagetype == "sdist")
        .find_map(ReleaseFile::digest)
        .or_else(|| files.iter().find_map(ReleaseFile::digest))
}

/// Resolves PyPI projects from the JSON API's published file digests.
#[derive(Debug)]
pub struct PypiResolver {
    fetcher: Fetcher,
    base: String,
}

impl PypiResolver {
    pub fn new(fetcher: Fetcher, base: &str) -> Self {
        Self {
            fetcher,
            base: base.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl Resolver for PypiResolver {
    fn name(&self) -> &'static str {
        "pypi"
    }

    fn accepts(&self, spec: &PackageSpec) -> bool {
        spec.manager.uses_python_index()
    }

    async fn resolve(&self, spec: &PackageSpec) -> Result<Option<Sha256Digest>, FetchError> {
        let url = format!("{}/{}/json", self.base, spec.name);
        let doc: ProjectDoc = self.fetcher.get_json(&url).await?;

        let current = doc.info.and_then(|i| i.version);
        let Some(version) = spec.version.clone().or_else(|| current.clone()) else {
            tracing::debug!("{}: index reports no current version", spec.name);
            return Ok(None);
        };

        let files = match doc.releases.get(&version) {
            Some(files) => files.as_slice(),
            // Newer API responses may omit `releases`; `urls` covers the current version.
            None if current.as_deref() == Some(version.as_str()) => doc.urls.as_slice(),
            None => {
                tracing::debug!("{}: version {version} not in index", spec.name);
                return Ok(None);
            }
        };
        Ok(pick_release_digest(files))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Manager;
    use mockito::Server;
    use std::time::Duration;

    const SDIST: &str = "1111111111111111111111111111111111111111111111111111111111111111";
    const WHEEL: &str = "2222222222222222222222222222222222222222222222222222222222222222";
    const OLD: &str = "3333333333333333333333333333333333333333333333333333333333333333";

    fn pip(name: &str, version: Option<&str>) -> PackageSpec {
        PackageSpec {
            manager: Manager::Pip,
            name: name.to_string(),
            version: version.map(str::to_string),
            cask: false,
        }
    }

    fn body() -> String {
        format!(
            r#"{{
                "info": {{"version": "2.0.0"}},
                "releases": {{
                    "1.0.0": [{{"packagetype": "bdist_wheel", "digests": {{"sha256": "{OLD}"}}}}],
                    "2.0.0": [
                        {{"packagetype": "bdist_wheel", "digests": {{"sha256": "{WHEEL}"}}}},
                        {{"packagetype": "sdist", "digests": {{"sha256": "{SDIST}"}}}}
                    ]
                }},
                "urls": []
            }}"#
        )
    }

    async fn resolve(spec: PackageSpec, body: String) -> Option<Sha256Digest> {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", format!("/pypi/{}/json", spec.name).as_str())
            .with_status(200)
            .with_body(body)
            .create_async()
            .await;
        let fetcher = Fetcher::with_client(reqwest::Client::new(), Duration::from_secs(5), 1 << 20);
        PypiResolver::new(fetcher, &format!("{}/pypi", server.url()))
            .resolve(&spec)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn current_version_prefers_sdist() {
        let digest = resolve(pip("demo", None), body()).await.unwrap();
        assert_eq!(digest.as_hex(), SDIST);
    }

    #[tokio::test]
    async fn pinned_version_falls_back_to_any_digest() {
        let digest = resolve(pip("demo", Some("1.0.0")), body()).await.unwrap();
        assert_eq!(digest.as_hex(), OLD);
    }

    #[tokio::test]
    async fn unknown_pin_is_unresolved() {
        assert!(resolve(pip("demo", Some("9.9.9")), body()).await.is_none());
    }

    #[tokio::test]
    async fn urls_cover_current_version_without_releases() {
        let body = format!(
            r#"{{"info":{{"version":"0.3.0"}},"urls":[{{"packagetype":"sdist","digests":{{"sha256":"{SDIST}"}}}}]}}"#
        );
        let digest = resolve(pip("slim", None), body).await.unwrap();
        assert_eq!(digest.as_hex(), SDIST);
    }
}
