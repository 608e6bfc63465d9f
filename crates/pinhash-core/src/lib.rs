//! Install-checksum resolution for package manager commands.
//!
//! Given install instructions such as `brew install jq` or
//! `npm install -g typescript`, [`ChecksumResolver`] queries the matching
//! upstream index and attaches a `sha256:<hex>` digest for the artifact the
//! command would install. Anything it cannot pin down is left without a
//! checksum, which downstream clients must read as "do not auto-run".

pub mod cache;
pub mod command;
pub mod config;
pub mod http;
pub mod index;
pub mod orchestrator;
pub mod paths;
pub mod resolvers;

pub use cache::{CacheKey, ChecksumCache, TtlCache};
pub use command::{Manager, PackageSpec};
pub use config::{Endpoints, ResolverConfig};
pub use http::{FetchError, Fetcher};
pub use index::{NameIndex, NameIndexSource, RemoteNameIndex, StaticNameIndex};
pub use orchestrator::{ChecksumResolver, Outcome, ResolveReport};
pub use paths::*;
pub use resolvers::Resolver;

pub use pinhash_schema::{InstallInstruction, Sha256Digest};

/// User Agent string for upstream requests
pub const USER_AGENT: &str = concat!("pinhash-core/", env!("CARGO_PKG_VERSION"));
