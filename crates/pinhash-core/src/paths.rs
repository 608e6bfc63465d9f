use dirs::home_dir;
use std::path::PathBuf;

/// Returns the pinhash home directory, or None if the user's home cannot be resolved.
pub fn try_pinhash_home() -> Option<PathBuf> {
    if let Ok(val) = std::env::var("PINHASH_HOME") {
        return Some(PathBuf::from(val));
    }
    home_dir().map(|h| h.join(".pinhash"))
}

/// Default config file: ~/.pinhash/config.toml
pub fn default_config_path() -> Option<PathBuf> {
    try_pinhash_home().map(|home| home.join("config.toml"))
}
