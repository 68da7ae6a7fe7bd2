//! JSON sidecar persistence for estimated transforms.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

use petra_registration::EstimatedTransform;

/// Save an estimated transform next to its registered volume.
pub fn save_transform<P: AsRef<Path>>(path: P, transform: &EstimatedTransform) -> Result<()> {
    let path = path.as_ref();
    let json = serde_json::to_string_pretty(transform).context("failed to encode transform")?;
    std::fs::write(path, json)
        .with_context(|| format!("failed to write transform sidecar {}", path.display()))?;
    debug!(path = %path.display(), "saved transform sidecar");
    Ok(())
}

/// Load a transform sidecar written by [`save_transform`].
pub fn load_transform<P: AsRef<Path>>(path: P) -> Result<EstimatedTransform> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read transform sidecar {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("malformed transform sidecar {}", path.display()))
}
