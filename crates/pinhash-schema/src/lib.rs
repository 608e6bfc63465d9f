//! Shared types and wire format for pinhash.
//!
//! The schema crate is the contract between the listing pipeline that
//! produces [`InstallInstruction`]s and the resolver that enriches them.

/// SHA256 digest newtype and validation errors.
pub mod hash;
/// Install instruction records.
pub mod types;

// Re-exports
pub use hash::*;
pub use types::*;

/// Algorithm prefix carried by every normalized checksum string.
pub const SHA256_PREFIX: &str = "sha256:";
