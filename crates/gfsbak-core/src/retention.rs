use tracing::{info, warn};

use crate::error::{GfsbakError, Result};
use crate::store::{BackupStore, Namespace};
use crate::tier::Tier;

/// Enforce a tier's retention ahead of producing a new instance of it.
///
/// `keep` is the tier's configured retention count, counting the instance
/// about to be created: existing instances are trimmed to the newest
/// `keep - 1` so the tier holds exactly `keep` once production completes,
/// and the new instance is never itself a deletion candidate. `None` means
/// unbounded — no pruning. A count of zero would rotate away every backup
/// and is rejected before anything is deleted.
///
/// Payload and checkpoint namespaces are trimmed independently, keeping
/// them in lockstep. Deletion is best-effort per entry: an already-absent
/// entry is not an error.
pub fn enforce(store: &BackupStore, tier: Tier, keep: Option<usize>) -> Result<usize> {
    let Some(keep) = keep else {
        return Ok(0);
    };
    if keep == 0 {
        return Err(GfsbakError::Config(format!(
            "retention count for tier '{tier}' is 0, which would rotate away every backup"
        )));
    }
    let survivors = keep - 1;

    let mut removed = 0usize;
    for ns in [Namespace::Payloads, Namespace::Checkpoints] {
        let names = store.list(ns, tier)?;
        if names.len() <= survivors {
            continue;
        }
        // Names sort ascending, so the surplus prefix is the oldest.
        for name in &names[..names.len() - survivors] {
            if let Err(e) = store.remove_instance(tier, name) {
                warn!(%tier, %name, error = %e, "failed to prune instance");
            } else {
                removed += 1;
            }
        }
    }

    if removed > 0 {
        info!(%tier, removed, keep, "retention enforced");
    }
    Ok(removed)
}
