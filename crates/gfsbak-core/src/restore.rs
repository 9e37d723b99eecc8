//! Restore-time chain reconstruction and replay.
//!
//! A target instance is restored by walking its chain metadata backward to
//! the chain root, then replaying the stack forward: the root is staged
//! into a scratch workspace, prepared as a base, and each increment is
//! applied oldest-to-newest before the base is promoted into the live data
//! directory. All work happens in scratch until the final move, so a
//! failure at any stage leaves the live data directory untouched.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::info;

use crate::audit::AuditLog;
use crate::checkpoint::ChainRecord;
use crate::config::GfsbakConfig;
use crate::engine::{DiskUsage, RestoreEngine, ServiceControl};
use crate::error::{GfsbakError, Result};
use crate::store::BackupStore;

/// Walk chain metadata backward from `target`, returning the dependency
/// stack with the target first and the chain root last.
///
/// Every link must have a readable chain record; a missing record means the
/// chain cannot be proven complete and is fatal. The walk terminates at a
/// record with no parent pointer (a full backup).
pub fn resolve_chain(store: &BackupStore, target: &Path) -> Result<Vec<PathBuf>> {
    let mut stack = Vec::new();
    let mut seen: HashSet<PathBuf> = HashSet::new();
    let mut cursor = target.to_path_buf();

    loop {
        if !seen.insert(cursor.clone()) {
            return Err(GfsbakError::ChainUnresolvable(format!(
                "chain metadata cycles back to '{}'",
                cursor.display()
            )));
        }
        let checkpoint = store.checkpoint_for_payload(&cursor)?;
        let record = ChainRecord::load(&checkpoint)?.ok_or_else(|| {
            GfsbakError::ChainUnresolvable(format!(
                "chain record missing for '{}'; the chain cannot be proven complete",
                cursor.display()
            ))
        })?;
        stack.push(cursor);
        match record.parent {
            Some(parent) => cursor = PathBuf::from(parent),
            None => return Ok(stack),
        }
    }
}

pub struct Restorer<'a> {
    config: &'a GfsbakConfig,
    store: &'a BackupStore,
    engine: &'a dyn RestoreEngine,
    service: &'a dyn ServiceControl,
    usage: &'a dyn DiskUsage,
    audit: &'a AuditLog,
}

impl<'a> Restorer<'a> {
    pub fn new(
        config: &'a GfsbakConfig,
        store: &'a BackupStore,
        engine: &'a dyn RestoreEngine,
        service: &'a dyn ServiceControl,
        usage: &'a dyn DiskUsage,
        audit: &'a AuditLog,
    ) -> Self {
        Self {
            config,
            store,
            engine,
            service,
            usage,
            audit,
        }
    }

    /// Restore `target` into the configured data directory. The database
    /// service is stopped before staging; restarting it after a successful
    /// move is left to the operator.
    pub fn run(&self, target: &Path) -> Result<()> {
        let data_dir = self
            .config
            .restore
            .data_dir
            .as_deref()
            .ok_or_else(|| {
                GfsbakError::Config("restore.data_dir must be set to restore a backup".into())
            })
            .map(PathBuf::from)?;

        // Pre-flight, before the service is touched or anything is staged.
        crate::guard::check(
            self.usage,
            Path::new(&self.config.storage_root),
            self.config.usage_threshold_percent,
        )?;

        self.audit
            .info(&format!("starting restore of '{}'", target.display()));
        match self.replay(target, &data_dir) {
            Ok(()) => {
                self.audit.info(&format!(
                    "restore of '{}' complete; service can be restarted",
                    target.display()
                ));
                Ok(())
            }
            Err(e) => {
                self.audit.error(&format!(
                    "restore of '{}' aborted, live data directory untouched: {e}",
                    target.display()
                ));
                Err(e)
            }
        }
    }

    fn replay(&self, target: &Path, data_dir: &Path) -> Result<()> {
        self.service.stop()?;

        let stack = resolve_chain(self.store, target)?;
        info!(links = stack.len(), "backup chain resolved");

        let base = self.scratch_base()?;
        let root = stack.last().ok_or_else(|| {
            GfsbakError::ChainUnresolvable("resolved chain is empty".to_string())
        })?;

        self.engine.stage_base(root, &base)?;
        info!(root = %root.display(), "chain root staged");
        self.engine.prepare_base(&base)?;

        // Replay increments oldest-to-newest; the order is load-bearing.
        for increment in stack.iter().rev().skip(1) {
            self.engine.apply_increment(&base, increment)?;
            info!(increment = %increment.display(), "increment applied");
        }

        self.engine.move_into_place(&base, data_dir)?;
        info!(data_dir = %data_dir.display(), "restore moved into place");
        Ok(())
    }

    /// Fresh, empty base directory inside the scratch workspace.
    fn scratch_base(&self) -> Result<PathBuf> {
        let scratch = match self.config.restore.scratch_dir {
            Some(ref dir) => PathBuf::from(dir),
            None => self.store.node_root().join("restore"),
        };
        let base = scratch.join(format!("base-{}", Utc::now().format("%Y%m%dT%H%M%S")));
        fs::create_dir_all(&base)?;
        Ok(base)
    }
}
