use anyhow::{Result, anyhow};
use std::path::{Path, PathBuf};

/// The invoking user's home directory, taken from `$HOME`. Every stage
/// inherits the same environment so this is stable across re-execs.
pub fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .filter(|home| !home.is_empty())
        .map(PathBuf::from)
}

/// Expands a path that starts with ~ to use the user's home directory
pub fn expand_tilde_path(path: &Path) -> Result<PathBuf> {
    let Some(path_str) = path.to_str() else {
        return Ok(path.to_path_buf());
    };
    if path_str == "~" || path_str.starts_with("~/") {
        let home = home_dir()
            .ok_or_else(|| anyhow!("Cannot expand {}: HOME is not set", path_str))?;
        if let Some(rest) = path_str.strip_prefix("~/") {
            return Ok(home.join(rest));
        }
        return Ok(home);
    }
    Ok(path.to_path_buf())
}
