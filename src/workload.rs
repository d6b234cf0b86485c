use crate::config::Config;
use crate::launch::LaunchState;
use anyhow::{Context, Result};
use log::{info, warn};
use std::os::unix::fs::MetadataExt;

/// Exit code for a workload that ran and failed, as opposed to a launcher
/// failure (1).
pub const WORKLOAD_FAILURE_EXIT_CODE: i32 = 2;

/// Prepares the image store root. Loading images into it is done by the
/// store tooling that runs afterwards; none of this knows about namespaces.
pub fn run(config: &Config, state: LaunchState) -> Result<()> {
    if !state.runs_workload() {
        return Err(anyhow::anyhow!("the image store is not prepared in the {} stage", state));
    }

    // Create imagestore location if it doesn't exist
    std::fs::create_dir_all(&config.path).context(format!(
        "unable to create image store directory {}",
        config.path.display()
    ))?;

    let metadata = std::fs::metadata(&config.path).context(format!(
        "unable to stat image store directory {}",
        config.path.display()
    ))?;
    if !metadata.is_dir() {
        return Err(anyhow::anyhow!(
            "image store path {} is not a directory",
            config.path.display()
        ));
    }

    info!(
        "Image store ready at {} (owner {}:{}, stage {})",
        config.path.display(),
        metadata.uid(),
        metadata.gid(),
        state
    );
    if state == LaunchState::Ready && metadata.uid() != 0 {
        warn!(
            "Image store {} is not owned by namespace root, file ownership inside it may be wrong",
            config.path.display()
        );
    }

    Ok(())
}
