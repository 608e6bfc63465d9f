//! Resolve command

use std::io::Read;

use anyhow::{Context, Result};
use pinhash_core::{ChecksumResolver, ResolverConfig};
use pinhash_schema::InstallInstruction;

/// Read instructions from `input` (`-` for stdin), print the enriched JSON
/// array to stdout and a summary line to stderr.
///
/// # Errors
///
/// Returns an error if the input cannot be read or is not a JSON array of
/// instructions, or if the HTTP client cannot be created.
pub async fn resolve(config: &ResolverConfig, tool: &str, input: &str) -> Result<()> {
    let raw = read_input(input)?;
    let instructions: Vec<InstallInstruction> =
        serde_json::from_str(&raw).context("Input is not a JSON array of install instructions")?;

    let resolver = ChecksumResolver::new(config).context("Failed to create HTTP client")?;
    let (enriched, report) = resolver.resolve_batch(tool, &instructions).await;

    println!("{}", serde_json::to_string_pretty(&enriched)?);
    eprintln!("{tool}: {report}");
    Ok(())
}

fn read_input(input: &str) -> Result<String> {
    if input == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read stdin")?;
        Ok(buf)
    } else {
        std::fs::read_to_string(input).with_context(|| format!("Failed to read {input}"))
    }
}
