//! pinhash - checksum resolution for install commands
//!
//! Reads install instructions (an OS, a package manager, and a shell
//! command), works out which package each command installs, and fills in the
//! `sha256:` checksum of the artifact from the authoritative upstream.
//!
//! # Configuration
//!
//! Settings are layered, later layers winning:
//!
//! ```text
//! defaults
//!   -> $PINHASH_HOME/config.toml  (or --config <path>)
//!   -> PINHASH_* environment variables
//!   -> command-line flags
//! ```

pub mod cmd;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use pinhash_core::ResolverConfig;

/// Command-line arguments.
#[derive(Debug, Parser)]
#[command(name = "pinhash")]
#[command(author, version, about = "Resolve SHA256 checksums for package-manager install commands")]
pub struct Cli {
    /// Log resolver activity to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file (defaults to $PINHASH_HOME/config.toml)
    #[arg(long, global = true, env = "PINHASH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Checksum cache TTL in seconds
    #[arg(long, global = true)]
    pub cache_ttl: Option<u64>,

    /// Maximum cached checksum entries
    #[arg(long, global = true)]
    pub max_entries: Option<usize>,

    /// Per-request timeout in milliseconds
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,

    /// Largest artifact that will be downloaded and hashed, in bytes
    #[arg(long, global = true)]
    pub max_download_bytes: Option<u64>,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// pinhash subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Fill in checksums for a JSON array of install instructions
    Resolve {
        /// Tool identifier the instructions belong to
        #[arg(long)]
        tool: String,
        /// Input file, or `-` for stdin
        #[arg(long, short, default_value = "-")]
        input: String,
    },
    /// Show how a command is split and which package each segment installs
    Parse {
        /// Shell command to parse
        #[arg(required = true, num_args = 1.., trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,
    },
}

impl Cli {
    /// Build the resolver configuration from file, environment, and flags.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicit config file is missing or any config
    /// file fails to parse.
    pub fn resolver_config(&self) -> Result<ResolverConfig> {
        let base = ResolverConfig::load(self.config.as_deref())?;
        Ok(self.apply_flags(base).clamped())
    }

    fn apply_flags(&self, mut config: ResolverConfig) -> ResolverConfig {
        if let Some(v) = self.cache_ttl {
            config.cache_ttl_secs = v;
        }
        if let Some(v) = self.max_entries {
            config.max_cache_entries = v;
        }
        if let Some(v) = self.timeout_ms {
            config.request_timeout_ms = v;
        }
        if let Some(v) = self.max_download_bytes {
            config.max_download_bytes = v;
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "cache_ttl_secs = 120\nmax_cache_entries = 500\n").unwrap();

        let cli = Cli::parse_from([
            "pinhash",
            "--config",
            path.to_str().unwrap(),
            "--max-entries",
            "900",
            "resolve",
            "--tool",
            "jq",
        ]);
        let config = cli.apply_flags(ResolverConfig::from_file(&path).unwrap());

        assert_eq!(config.cache_ttl_secs, 120);
        assert_eq!(config.max_cache_entries, 900);
    }

    #[test]
    fn flags_are_clamped() {
        let cli = Cli::parse_from(["pinhash", "--timeout-ms", "10", "resolve", "--tool", "x"]);
        let config = cli.apply_flags(ResolverConfig::default()).clamped();
        assert_eq!(config.request_timeout_ms, 1_500);
    }

    #[test]
    fn parse_accepts_raw_command_words() {
        let cli = Cli::parse_from(["pinhash", "parse", "npm", "install", "-g", "pnpm"]);
        match cli.command {
            Commands::Parse { command } => assert_eq!(command.join(" "), "npm install -g pnpm"),
            Commands::Resolve { .. } => panic!("expected parse"),
        }
    }
}
