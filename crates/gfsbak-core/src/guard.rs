use std::path::Path;

use tracing::debug;

use crate::engine::DiskUsage;
use crate::error::{GfsbakError, Result};

/// Abort before any destructive or space-consuming operation when the
/// storage partition is too full. Nothing in the store is touched when
/// this fails.
pub fn check(usage: &dyn DiskUsage, path: &Path, threshold: u8) -> Result<()> {
    let used = usage.usage_percent(path)?;
    if used >= threshold {
        return Err(GfsbakError::UsageGuard { used, threshold });
    }
    debug!(used, threshold, "disk usage below threshold");
    Ok(())
}
