use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::defaults::*;
use crate::error::{GfsbakError, Result};
use crate::tier::Tier;

/// Immutable configuration for one node's backup tree, constructed once at
/// startup and passed explicitly into the scheduler, enforcer and builder.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GfsbakConfig {
    /// Node name; all store paths are scoped under `<storage_root>/<node>/`.
    pub node: String,
    pub storage_root: String,
    /// Abort any backup or restore once partition usage reaches this.
    #[serde(default = "default_usage_threshold_percent")]
    pub usage_threshold_percent: u8,
    #[serde(default)]
    pub retention: RetentionConfig,
    #[serde(default)]
    pub compression: CompressionConfig,
    /// I/O worker count passed through to the engine.
    /// Default: host parallelism, clamped to 1..=16.
    #[serde(default)]
    pub workers: Option<usize>,
    /// Opaque credential reference handed to the engine via environment.
    #[serde(default)]
    pub credential: Option<String>,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub restore: RestoreConfig,
}

impl GfsbakConfig {
    /// Validation runs pre-flight, before any store mutation.
    pub fn validate(&self) -> Result<()> {
        if self.node.trim().is_empty() {
            return Err(GfsbakError::Config("node name must not be empty".into()));
        }
        if self.storage_root.trim().is_empty() {
            return Err(GfsbakError::Config("storage_root must not be empty".into()));
        }
        if !(1..=100).contains(&self.usage_threshold_percent) {
            return Err(GfsbakError::Config(format!(
                "usage_threshold_percent must be within 1..=100, got {}",
                self.usage_threshold_percent
            )));
        }
        if self.workers == Some(0) {
            return Err(GfsbakError::Config("workers must be at least 1".into()));
        }
        self.retention.validate()?;
        self.engine.timeout()?;
        Ok(())
    }

    pub fn effective_workers(&self) -> usize {
        let host = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(2);
        self.workers.unwrap_or(host).clamp(1, 16)
    }
}

/// Per-tier retention counts. An absent tier is unbounded (never pruned).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetentionConfig {
    pub daily: Option<usize>,
    pub weekly: Option<usize>,
    pub monthly: Option<usize>,
    pub annually: Option<usize>,
}

impl RetentionConfig {
    pub fn keep(&self, tier: Tier) -> Option<usize> {
        match tier {
            Tier::Daily => self.daily,
            Tier::Weekly => self.weekly,
            Tier::Monthly => self.monthly,
            Tier::Annually => self.annually,
        }
    }

    /// A retention count of zero would rotate away every backup of a tier;
    /// reject it before any destructive action.
    pub fn validate(&self) -> Result<()> {
        for tier in Tier::ALL {
            if self.keep(tier) == Some(0) {
                return Err(GfsbakError::Config(format!(
                    "retention count for tier '{tier}' is 0, which would rotate away every backup"
                )));
            }
        }
        Ok(())
    }
}

/// Per-tier compression flags. Defaults compress the self-contained tiers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompressionConfig {
    #[serde(default)]
    pub daily: bool,
    #[serde(default)]
    pub weekly: bool,
    #[serde(default = "default_true")]
    pub monthly: bool,
    #[serde(default = "default_true")]
    pub annually: bool,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            daily: false,
            weekly: false,
            monthly: true,
            annually: true,
        }
    }
}

impl CompressionConfig {
    pub fn enabled(&self, tier: Tier) -> bool {
        match tier {
            Tier::Daily => self.daily,
            Tier::Weekly => self.weekly,
            Tier::Monthly => self.monthly,
            Tier::Annually => self.annually,
        }
    }
}

/// Command templates for the external collaborators. Placeholders in
/// `{braces}` are substituted shell-escaped; the credential is passed via
/// the `GFSBAK_CREDENTIAL` environment variable, never on the command line.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Self-contained backup. Placeholders: {target} {compress} {workers}.
    #[serde(default = "default_backup_full")]
    pub backup_full: String,
    /// Delta backup. Placeholders: {target} {parent} {checkpoint} {compress} {workers}.
    #[serde(default = "default_backup_delta")]
    pub backup_delta: String,
    /// Copy a chain root into the restore workspace. Placeholders: {source} {base}.
    #[serde(default = "default_stage")]
    pub stage: String,
    /// Prepare the staged base in place. Placeholders: {base} {workers}.
    #[serde(default = "default_prepare_base")]
    pub prepare_base: String,
    /// Apply one incremental fragment to the base. Placeholders: {base} {increment} {workers}.
    #[serde(default = "default_apply_increment")]
    pub apply_increment: String,
    /// Promote the prepared base into the live data directory. Placeholders: {base} {datadir}.
    #[serde(default = "default_move_into_place")]
    pub move_into_place: String,
    #[serde(default = "default_service_stop")]
    pub service_stop: String,
    #[serde(default = "default_service_start")]
    pub service_start: String,
    /// Override for the disk usage probe; stdout must be a bare percentage.
    /// Placeholders: {path}. Default probes with `df -P`.
    #[serde(default)]
    pub disk_usage: Option<String>,
    /// Per-command timeout, e.g. "30m", "2h".
    #[serde(default = "default_engine_timeout")]
    pub timeout: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            backup_full: default_backup_full(),
            backup_delta: default_backup_delta(),
            stage: default_stage(),
            prepare_base: default_prepare_base(),
            apply_increment: default_apply_increment(),
            move_into_place: default_move_into_place(),
            service_stop: default_service_stop(),
            service_start: default_service_start(),
            disk_usage: None,
            timeout: default_engine_timeout(),
        }
    }
}

impl EngineConfig {
    pub fn timeout(&self) -> Result<Duration> {
        parse_human_duration(&self.timeout)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RestoreConfig {
    /// Live data directory a restore is promoted into.
    #[serde(default)]
    pub data_dir: Option<String>,
    /// Scratch workspace; default is `<storage_root>/<node>/restore`.
    #[serde(default)]
    pub scratch_dir: Option<String>,
}
