use std::path::PathBuf;

use gfsbak_core::audit::AuditLog;
use gfsbak_core::config::GfsbakConfig;
use gfsbak_core::engine::ExecEngine;
use gfsbak_core::error::{GfsbakError, Result};
use gfsbak_core::restore::Restorer;
use gfsbak_core::store::{BackupStore, Namespace};
use gfsbak_core::tier::Tier;

/// Resolve the restore target: an absolute payload path, or the shorthand
/// `<tier>/<name>` relative to the node's payload tree.
fn resolve_target(store: &BackupStore, raw: &str) -> Result<PathBuf> {
    let path = PathBuf::from(raw);
    if path.is_absolute() {
        // Validates that the path belongs to this node's payload tree.
        store.parse_payload_path(&path)?;
        return Ok(path);
    }
    let (tier, name) = raw.split_once('/').ok_or_else(|| {
        GfsbakError::Config(format!(
            "restore target '{raw}' must be an absolute payload path or <tier>/<name>"
        ))
    })?;
    let tier: Tier = tier.parse()?;
    Ok(store.instance_dir(Namespace::Payloads, tier, name))
}

pub(crate) fn run(config: &GfsbakConfig, target: &str) -> Result<()> {
    let store = BackupStore::new(&config.storage_root, &config.node);
    let target = resolve_target(&store, target)?;
    let engine = ExecEngine::from_config(config)?;
    let audit = AuditLog::new(&store, &config.node);

    let restorer = Restorer::new(config, &store, &engine, &engine, &engine, &audit);
    restorer.run(&target)?;

    eprintln!(
        "Restore of '{}' complete. Start the database service to finish.",
        target.display()
    );
    Ok(())
}
