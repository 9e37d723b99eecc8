//! The GFS policy engine.
//!
//! Maps a requested tier to the sequence of backups that must be produced,
//! cascading through missing coarser tiers first, enforcing retention ahead
//! of each new instance, and recording every attempt in the audit log.

use chrono::Utc;
use tracing::info;

use crate::audit::AuditLog;
use crate::builder;
use crate::checkpoint::ChainRecord;
use crate::config::GfsbakConfig;
use crate::engine::{BackupEngine, DiskUsage};
use crate::error::{GfsbakError, Result};
use crate::plan::BackupKind;
use crate::resolver::{self, InstanceRef};
use crate::retention;
use crate::store::BackupStore;
use crate::tier::Tier;

/// Outcome of one scheduled invocation, for operator-facing output.
#[derive(Debug, Clone)]
pub struct TierReport {
    pub tier: Tier,
    pub name: String,
    pub kind: BackupKind,
    pub parent: Option<String>,
    /// Instances produced on the way, coarse-to-fine, including this one.
    pub produced: Vec<(Tier, String)>,
}

pub struct Scheduler<'a> {
    config: &'a GfsbakConfig,
    store: &'a BackupStore,
    engine: &'a dyn BackupEngine,
    usage: &'a dyn DiskUsage,
    audit: &'a AuditLog,
}

impl<'a> Scheduler<'a> {
    pub fn new(
        config: &'a GfsbakConfig,
        store: &'a BackupStore,
        engine: &'a dyn BackupEngine,
        usage: &'a dyn DiskUsage,
        audit: &'a AuditLog,
    ) -> Self {
        Self {
            config,
            store,
            engine,
            usage,
            audit,
        }
    }

    /// Schedule and produce one backup of the requested tier, producing any
    /// missing coarser-tier prerequisites first.
    pub fn run(&self, tier: Tier) -> Result<TierReport> {
        // Pre-flight: both checks reject before anything is mutated.
        self.config.retention.validate()?;
        crate::guard::check(
            self.usage,
            std::path::Path::new(&self.config.storage_root),
            self.config.usage_threshold_percent,
        )?;

        let mut produced = Vec::new();
        let instance = self.produce(tier, &mut produced)?;

        let record = ChainRecord::load(&instance.checkpoint)?;
        Ok(TierReport {
            tier,
            name: instance.name.clone(),
            kind: record.as_ref().map(|r| r.kind).unwrap_or(BackupKind::Full),
            parent: record.and_then(|r| r.parent),
            produced,
        })
    }

    /// Produce one instance of `tier`, recursing into coarser tiers when
    /// their latest instance is missing. Recursion depth is bounded by the
    /// fixed tier ordering (daily → weekly → monthly), so at most three
    /// instances are produced per invocation.
    fn produce(&self, tier: Tier, produced: &mut Vec<(Tier, String)>) -> Result<InstanceRef> {
        let keep = self.config.retention.keep(tier);

        let parent = match tier {
            Tier::Monthly | Tier::Annually => {
                retention::enforce(self.store, tier, keep)?;
                None
            }
            Tier::Weekly => {
                let monthly = self.require_parent(Tier::Monthly, produced)?;
                retention::enforce(self.store, tier, keep)?;
                Some(monthly)
            }
            Tier::Daily => {
                // Enforce first: the chain parent must be the most recent
                // *surviving* daily, never an instance about to be pruned.
                retention::enforce(self.store, tier, keep)?;
                match resolver::find_latest(self.store, Tier::Daily)? {
                    Some(previous) => Some(previous),
                    None => Some(self.require_parent(Tier::Weekly, produced)?),
                }
            }
        };

        let plan = builder::build(self.store, self.config, tier, Utc::now(), parent.as_ref())?;
        self.audit.info(&format!(
            "starting {} {} backup {}{}",
            plan.kind,
            plan.tier,
            plan.name,
            plan.parent
                .as_deref()
                .map(|p| format!(" (parent {})", p.display()))
                .unwrap_or_default(),
        ));

        if let Err(e) = self.engine.produce(&plan) {
            self.audit
                .error(&format!("{} backup {} failed: {e}", plan.tier, plan.name));
            return Err(e);
        }

        ChainRecord::for_plan(&plan, Utc::now()).write(&plan.checkpoint)?;
        self.audit.info(&format!(
            "completed {} {} backup {}",
            plan.kind, plan.tier, plan.name
        ));
        info!(tier = %plan.tier, name = %plan.name, kind = %plan.kind, "backup produced");

        produced.push((plan.tier, plan.name.clone()));
        Ok(InstanceRef {
            tier: plan.tier,
            name: plan.name,
            payload: plan.target,
            checkpoint: plan.checkpoint,
        })
    }

    /// Resolve the latest instance of a coarser tier, producing it first
    /// when none exists yet. A parent still missing after its cascade
    /// completed is an invariant violation, not a retryable condition.
    fn require_parent(
        &self,
        tier: Tier,
        produced: &mut Vec<(Tier, String)>,
    ) -> Result<InstanceRef> {
        if let Some(instance) = resolver::find_latest(self.store, tier)? {
            return Ok(instance);
        }
        info!(%tier, "no backup of parent tier exists yet, cascading");
        self.produce(tier, produced)?;
        resolver::find_latest(self.store, tier)?.ok_or_else(|| {
            GfsbakError::ChainUnresolvable(format!(
                "no {tier} backup found even after producing one"
            ))
        })
    }
}
