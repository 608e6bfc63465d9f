use serde::{Deserialize, Serialize};

use crate::hash::Sha256Digest;

/// A single install instruction attached to a tool listing.
///
/// Instructions are produced upstream by the listing pipeline. The resolver
/// treats them as immutable values: enrichment always yields a new instance
/// via [`InstallInstruction::with_checksum`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallInstruction {
    /// Target operating system (e.g. "macos", "linux", "any").
    pub os: String,

    /// Package manager named by the listing (e.g. "brew", "npm").
    #[serde(alias = "packageManager")]
    pub package_manager: String,

    /// Raw shell command, possibly compound (`brew tap x && brew install y`).
    pub command: String,

    /// Normalized `sha256:<64-hex>` checksum, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,

    /// Detached signature, passed through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,

    /// Names of prerequisite tools, passed through untouched.
    #[serde(default)]
    pub dependencies: Vec<String>,
}

impl InstallInstruction {
    /// Create an instruction with no checksum, signature, or dependencies.
    pub fn new(
        os: impl Into<String>,
        package_manager: impl Into<String>,
        command: impl Into<String>,
    ) -> Self {
        Self {
            os: os.into(),
            package_manager: package_manager.into(),
            command: command.into(),
            checksum: None,
            signature: None,
            dependencies: Vec::new(),
        }
    }

    /// The existing checksum, if it is already in canonical form.
    pub fn valid_checksum(&self) -> Option<Sha256Digest> {
        self.checksum
            .as_deref()
            .and_then(Sha256Digest::parse_canonical)
    }

    /// Return a copy of this instruction carrying `checksum` (or none).
    pub fn with_checksum(&self, checksum: Option<&Sha256Digest>) -> Self {
        Self {
            checksum: checksum.map(Sha256Digest::to_prefixed),
            ..self.clone()
        }
    }
}
