//! Batch checksum enrichment.
//!
//! [`ChecksumResolver`] takes install instructions, leaves any that already
//! carry a canonical checksum alone, and for the rest walks the command's
//! segments through the resolver table. Every outcome, including "nothing
//! found", is cached so repeat lookups inside the TTL stay offline.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use pinhash_schema::{InstallInstruction, Sha256Digest};

use crate::cache::{CacheKey, ChecksumCache};
use crate::command::{parse_segment, split_segments};
use crate::config::ResolverConfig;
use crate::http::{FetchError, Fetcher};
use crate::index::{NameIndexSource, RemoteNameIndex};
use crate::resolvers::{Resolver, default_resolvers};

/// How one instruction's checksum was settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Already carried a canonical checksum; untouched.
    PassedThrough,
    /// Resolved from upstream on this call.
    Resolved,
    /// Answered from the cache (`found` is false for a negative entry).
    CacheHit { found: bool },
    /// No resolver produced a digest.
    Unresolved,
}

/// Per-batch tallies. A negative cache hit counts as both a cache hit and
/// unresolved.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ResolveReport {
    pub total: usize,
    pub passed_through: usize,
    pub resolved: usize,
    pub cache_hits: usize,
    pub unresolved: usize,
}

impl ResolveReport {
    fn record(&mut self, outcome: Outcome) {
        self.total += 1;
        match outcome {
            Outcome::PassedThrough => self.passed_through += 1,
            Outcome::Resolved => self.resolved += 1,
            Outcome::CacheHit { found } => {
                self.cache_hits += 1;
                if !found {
                    self.unresolved += 1;
                }
            }
            Outcome::Unresolved => self.unresolved += 1,
        }
    }
}

impl fmt::Display for ResolveReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} instructions: {} resolved, {} passed through, {} from cache, {} unresolved",
            self.total, self.resolved, self.passed_through, self.cache_hits, self.unresolved
        )
    }
}

/// Resolves and caches install-artifact checksums.
pub struct ChecksumResolver {
    resolvers: Vec<Box<dyn Resolver>>,
    cache: Mutex<ChecksumCache>,
}

impl fmt::Debug for ChecksumResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.resolvers.iter().map(|r| r.name()).collect();
        f.debug_struct("ChecksumResolver")
            .field("resolvers", &names)
            .finish_non_exhaustive()
    }
}

impl ChecksumResolver {
    /// Build the standard resolver stack with live Homebrew name indexes.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &ResolverConfig) -> Result<Self, FetchError> {
        let config = config.clone().clamped();
        let fetcher = Fetcher::new(&config)?;
        let names = Arc::new(RemoteNameIndex::new(
            fetcher.clone(),
            config.endpoints.homebrew_api.clone(),
            config.index_ttl(),
        ));
        Ok(Self::with_name_index(&config, &fetcher, names))
    }

    /// Build the standard resolver stack around an injected name index.
    pub fn with_name_index(
        config: &ResolverConfig,
        fetcher: &Fetcher,
        names: Arc<dyn NameIndexSource>,
    ) -> Self {
        let resolvers = default_resolvers(fetcher, &config.endpoints, names);
        Self::with_resolvers(resolvers, config.cache_ttl(), config.max_cache_entries)
    }

    /// Use an explicit strategy table, tried in order for every segment.
    pub fn with_resolvers(resolvers: Vec<Box<dyn Resolver>>, ttl: Duration, capacity: usize) -> Self {
        Self {
            resolvers,
            cache: Mutex::new(ChecksumCache::new(ttl, capacity)),
        }
    }

    fn cache(&self) -> MutexGuard<'_, ChecksumCache> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Enrich every instruction, returning new instances in input order.
    pub async fn resolve_all(
        &self,
        tool: &str,
        instructions: &[InstallInstruction],
    ) -> Vec<InstallInstruction> {
        self.resolve_batch(tool, instructions).await.0
    }

    /// Like [`ChecksumResolver::resolve_all`], also returning tallies.
    pub async fn resolve_batch(
        &self,
        tool: &str,
        instructions: &[InstallInstruction],
    ) -> (Vec<InstallInstruction>, ResolveReport) {
        let mut report = ResolveReport::default();
        let mut out = Vec::with_capacity(instructions.len());
        for instruction in instructions {
            let (enriched, outcome) = self.resolve_instruction(tool, instruction).await;
            report.record(outcome);
            out.push(enriched);
        }
        (out, report)
    }

    /// Enrich a single instruction.
    ///
    /// A present but non-canonical checksum is treated as absent, and is
    /// dropped if nothing better is found.
    pub async fn resolve_instruction(
        &self,
        tool: &str,
        instruction: &InstallInstruction,
    ) -> (InstallInstruction, Outcome) {
        if instruction.valid_checksum().is_some() {
            return (instruction.clone(), Outcome::PassedThrough);
        }

        let key = CacheKey::new(
            tool,
            &instruction.os,
            &instruction.package_manager,
            &instruction.command,
        );
        let cached = self.cache().get(&key).cloned();
        if let Some(cached) = cached {
            tracing::debug!("Cache hit for `{}`", key.command);
            let found = cached.is_some();
            return (
                instruction.with_checksum(cached.as_ref()),
                Outcome::CacheHit { found },
            );
        }

        let digest = self.resolve_command(&instruction.command).await;
        self.cache().insert(key, digest.clone());

        let outcome = if digest.is_some() {
            Outcome::Resolved
        } else {
            Outcome::Unresolved
        };
        (instruction.with_checksum(digest.as_ref()), outcome)
    }

    /// Walk segments in order, resolvers in table order; first digest wins.
    async fn resolve_command(&self, command: &str) -> Option<Sha256Digest> {
        for segment in split_segments(command) {
            let Some(spec) = parse_segment(&segment) else {
                continue;
            };

            for resolver in self.resolvers.iter().filter(|r| r.accepts(&spec)) {
                match resolver.resolve(&spec).await {
                    Ok(Some(digest)) => {
                        tracing::info!("{spec} -> {digest} (via {})", resolver.name());
                        return Some(digest);
                    }
                    Ok(None) => tracing::debug!("{}: nothing for {spec}", resolver.name()),
                    Err(e) if e.is_oversized() => {
                        tracing::warn!("{}: artifact for {spec} rejected: {e}", resolver.name());
                    }
                    Err(e) if e.is_timeout() => {
                        tracing::debug!("{}: {spec} timed out", resolver.name());
                    }
                    Err(e) => tracing::debug!("{}: {spec} unavailable: {e}", resolver.name()),
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{Manager, PackageSpec};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Resolver that answers every spec of one manager with a fixed result.
    struct Fixed {
        manager: Manager,
        answer: Option<Sha256Digest>,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Resolver for Fixed {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn accepts(&self, spec: &PackageSpec) -> bool {
            spec.manager == self.manager
        }

        async fn resolve(&self, _: &PackageSpec) -> Result<Option<Sha256Digest>, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.answer.clone())
        }
    }

    fn fixed(manager: Manager, answer: Option<Sha256Digest>) -> (Box<dyn Resolver>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let resolver = Fixed {
            manager,
            answer,
            calls: calls.clone(),
        };
        (Box::new(resolver), calls)
    }

    fn orchestrator(resolvers: Vec<Box<dyn Resolver>>) -> ChecksumResolver {
        ChecksumResolver::with_resolvers(resolvers, Duration::from_secs(600), 100)
    }

    #[tokio::test]
    async fn valid_checksum_passes_through_without_lookup() {
        let (r, calls) = fixed(Manager::Homebrew, Some(Sha256Digest::compute(b"other")));
        let resolver = orchestrator(vec![r]);

        let mut inst = InstallInstruction::new("macos", "brew", "brew install jq");
        inst.checksum = Some(Sha256Digest::compute(b"jq").to_prefixed());

        let (out, outcome) = resolver.resolve_instruction("jq", &inst).await;
        assert_eq!(out, inst);
        assert_eq!(outcome, Outcome::PassedThrough);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn invalid_checksum_is_replaced_or_dropped() {
        let (r, _) = fixed(Manager::Homebrew, None);
        let resolver = orchestrator(vec![r]);

        let mut inst = InstallInstruction::new("macos", "brew", "brew install jq");
        inst.checksum = Some("sha256:<fill me in>".to_string());

        let (out, outcome) = resolver.resolve_instruction("jq", &inst).await;
        assert_eq!(outcome, Outcome::Unresolved);
        assert!(out.checksum.is_none());
        assert_eq!(inst.checksum.as_deref(), Some("sha256:<fill me in>"));
    }

    #[tokio::test]
    async fn first_resolving_segment_wins() {
        let npm_digest = Sha256Digest::compute(b"npm");
        let (brew, brew_calls) = fixed(Manager::Homebrew, None);
        let (npm, npm_calls) = fixed(Manager::Npm, Some(npm_digest.clone()));
        let (cargo, cargo_calls) = fixed(Manager::Cargo, Some(Sha256Digest::compute(b"cargo")));
        let resolver = orchestrator(vec![brew, npm, cargo]);

        let inst = InstallInstruction::new(
            "linux",
            "npm",
            "brew install node && npm install -g pnpm && cargo install just",
        );
        let (out, outcome) = resolver.resolve_instruction("pnpm", &inst).await;

        assert_eq!(outcome, Outcome::Resolved);
        assert_eq!(out.checksum, Some(npm_digest.to_prefixed()));
        assert_eq!(brew_calls.load(Ordering::SeqCst), 1);
        assert_eq!(npm_calls.load(Ordering::SeqCst), 1);
        assert_eq!(cargo_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn outcomes_are_cached_per_tool() {
        let (r, calls) = fixed(Manager::Cargo, Some(Sha256Digest::compute(b"rg")));
        let resolver = orchestrator(vec![r]);
        let inst = InstallInstruction::new("any", "cargo", "cargo install ripgrep");

        let (_, first) = resolver.resolve_instruction("rg", &inst).await;
        let (_, second) = resolver.resolve_instruction("rg", &inst).await;
        let (_, other_tool) = resolver.resolve_instruction("ripgrep-fork", &inst).await;

        assert_eq!(first, Outcome::Resolved);
        assert_eq!(second, Outcome::CacheHit { found: true });
        assert_eq!(other_tool, Outcome::Resolved);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn unparseable_commands_are_cached_negatively() {
        let (r, calls) = fixed(Manager::Npm, Some(Sha256Digest::compute(b"x")));
        let resolver = orchestrator(vec![r]);
        let inst = InstallInstruction::new("linux", "curl", "curl -fsSL https://x.sh | sh");

        let (batch, report) = resolver
            .resolve_batch("x", &[inst.clone(), inst.clone()])
            .await;

        assert!(batch.iter().all(|i| i.checksum.is_none()));
        assert_eq!(report.total, 2);
        assert_eq!(report.unresolved, 2);
        assert_eq!(report.cache_hits, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
