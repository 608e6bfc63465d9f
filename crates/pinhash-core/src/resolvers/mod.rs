//! Per-ecosystem checksum resolvers.
//!
//! Each resolver pairs a predicate ([`Resolver::accepts`]) with a lookup
//! ([`Resolver::resolve`]). The orchestrator walks them in table order and
//! stops at the first digest.

use std::sync::Arc;

use async_trait::async_trait;
use pinhash_schema::Sha256Digest;

use crate::command::PackageSpec;
use crate::config::Endpoints;
use crate::http::{FetchError, Fetcher};
use crate::index::NameIndexSource;

/// crates.io version API resolver.
pub mod crates_io;
/// Homebrew formula and cask resolver.
pub mod homebrew;
/// npm-registry resolver (npm, pnpm, yarn, bun).
pub mod npm;
/// PyPI resolver (pip, pipx, uv).
pub mod pypi;

pub use crates_io::CratesIoResolver;
pub use homebrew::HomebrewResolver;
pub use npm::NpmResolver;
pub use pypi::PypiResolver;

#[async_trait]
pub trait Resolver: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Whether this resolver handles `spec`'s ecosystem.
    fn accepts(&self, spec: &PackageSpec) -> bool;

    /// Look up the artifact digest for `spec`.
    ///
    /// `Ok(None)` means the upstream answered but offered nothing usable.
    /// Errors are reported to the caller so it can log them by kind; they
    /// are never fatal.
    async fn resolve(&self, spec: &PackageSpec) -> Result<Option<Sha256Digest>, FetchError>;
}

/// The standard strategy table, in priority order: Homebrew, npm registry,
/// PyPI, crates.io.
pub fn default_resolvers(
    fetcher: &Fetcher,
    endpoints: &Endpoints,
    names: Arc<dyn NameIndexSource>,
) -> Vec<Box<dyn Resolver>> {
    vec![
        Box::new(HomebrewResolver::new(fetcher.clone(), endpoints, names)),
        Box::new(NpmResolver::new(fetcher.clone(), &endpoints.npm_registry)),
        Box::new(PypiResolver::new(fetcher.clone(), &endpoints.pypi)),
        Box::new(CratesIoResolver::new(fetcher.clone(), &endpoints.crates_io)),
    ]
}

/// Accept an upstream checksum string only if it is a well-formed SHA256.
pub(crate) fn published_digest(raw: Option<&str>) -> Option<Sha256Digest> {
    let raw = raw?;
    match Sha256Digest::new(raw) {
        Ok(digest) => Some(digest),
        Err(e) => {
            tracing::debug!("Ignoring published checksum: {e}");
            None
        }
    }
}
