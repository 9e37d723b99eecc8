use chrono::{DateTime, Utc};

use crate::config::GfsbakConfig;
use crate::error::Result;
use crate::plan::{BackupKind, BackupPlan};
use crate::resolver::InstanceRef;
use crate::store::{BackupStore, Namespace};
use crate::tier::Tier;

/// Translate a resolved chain parent, tier and timestamp into the exact
/// invocation parameters for the backup-producing operation.
///
/// The instance name is de-duplicated against existing entries so two runs
/// within the same timestamp window never overwrite each other. The target
/// directory (and the checkpoint directory when the tier is compressed) is
/// created before the plan is returned, so it exists even if the produce
/// operation later fails.
pub fn build(
    store: &BackupStore,
    config: &GfsbakConfig,
    tier: Tier,
    now: DateTime<Utc>,
    parent: Option<&InstanceRef>,
) -> Result<BackupPlan> {
    let label = tier.label(now);
    let name = store.allocate_name(tier, &label)?;
    let compressed = config.compression.enabled(tier);
    let kind = kind_for(tier, parent);

    store.create_instance_dirs(tier, &name, compressed)?;

    Ok(BackupPlan {
        target: store.instance_dir(Namespace::Payloads, tier, &name),
        checkpoint: store.instance_dir(Namespace::Checkpoints, tier, &name),
        parent: parent.map(|p| p.payload.clone()),
        tier,
        name,
        kind,
        compressed,
        workers: config.effective_workers(),
        credential: config.credential.clone(),
    })
}

/// Incremental only for daily-on-daily; differential for any other chained
/// backup; full when self-contained.
fn kind_for(tier: Tier, parent: Option<&InstanceRef>) -> BackupKind {
    match parent {
        None => BackupKind::Full,
        Some(p) if tier == Tier::Daily && p.tier == Tier::Daily => BackupKind::Incremental,
        Some(_) => BackupKind::Differential,
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn instance(tier: Tier) -> InstanceRef {
        InstanceRef {
            tier,
            name: "x".into(),
            payload: PathBuf::from("/p"),
            checkpoint: PathBuf::from("/c"),
        }
    }

    #[test]
    fn kind_is_full_without_parent() {
        assert_eq!(kind_for(Tier::Monthly, None), BackupKind::Full);
        assert_eq!(kind_for(Tier::Annually, None), BackupKind::Full);
    }

    #[test]
    fn kind_is_incremental_only_for_daily_on_daily() {
        let daily = instance(Tier::Daily);
        let weekly = instance(Tier::Weekly);
        assert_eq!(
            kind_for(Tier::Daily, Some(&daily)),
            BackupKind::Incremental
        );
        assert_eq!(
            kind_for(Tier::Daily, Some(&weekly)),
            BackupKind::Differential
        );
        let monthly = instance(Tier::Monthly);
        assert_eq!(
            kind_for(Tier::Weekly, Some(&monthly)),
            BackupKind::Differential
        );
    }
}
