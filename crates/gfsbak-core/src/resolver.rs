use std::path::PathBuf;

use tracing::debug;

use crate::error::Result;
use crate::store::{BackupStore, Namespace};
use crate::tier::Tier;

/// A resolved reference to an existing backup instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceRef {
    pub tier: Tier,
    pub name: String,
    pub payload: PathBuf,
    pub checkpoint: PathBuf,
}

impl InstanceRef {
    fn new(store: &BackupStore, tier: Tier, name: String) -> Self {
        let payload = store.instance_dir(Namespace::Payloads, tier, &name);
        let checkpoint = store.instance_dir(Namespace::Checkpoints, tier, &name);
        Self {
            tier,
            name,
            payload,
            checkpoint,
        }
    }
}

/// Find the most recent backup instance for a tier.
///
/// The checkpoint namespace is preferred: chain records survive even when
/// payload directories are pruned independently. The raw payload namespace
/// is the fallback. `None` means no instance of this tier exists yet, which
/// is the normal first-run condition rather than an error.
pub fn find_latest(store: &BackupStore, tier: Tier) -> Result<Option<InstanceRef>> {
    if let Some(name) = store.latest(Namespace::Checkpoints, tier)? {
        debug!(%tier, %name, "resolved latest instance from checkpoints");
        return Ok(Some(InstanceRef::new(store, tier, name)));
    }
    if let Some(name) = store.latest(Namespace::Payloads, tier)? {
        debug!(%tier, %name, "resolved latest instance from payloads");
        return Ok(Some(InstanceRef::new(store, tier, name)));
    }
    Ok(None)
}
