//! Chain-metadata records.
//!
//! One record per backup instance, persisted as a small structured file in
//! the instance's checkpoint directory. The record is the canonical source
//! of a backup's chain-parent pointer; it is written once the producing
//! operation reports success and is immutable thereafter.

use std::fs;
use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{GfsbakError, Result};
use crate::plan::{BackupKind, BackupPlan};
use crate::tier::Tier;

pub const CHAIN_RECORD_FILE: &str = "chain.yaml";
pub const CHAIN_RECORD_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainRecord {
    pub schema_version: u32,
    pub tier: Tier,
    pub name: String,
    pub kind: BackupKind,
    /// Payload path of the chain parent, absent for self-contained backups.
    pub parent: Option<String>,
    pub compressed: bool,
    pub created_at: DateTime<Utc>,
}

impl ChainRecord {
    pub fn for_plan(plan: &BackupPlan, created_at: DateTime<Utc>) -> Self {
        Self {
            schema_version: CHAIN_RECORD_VERSION,
            tier: plan.tier,
            name: plan.name.clone(),
            kind: plan.kind,
            parent: plan
                .parent
                .as_ref()
                .map(|p| p.to_string_lossy().into_owned()),
            compressed: plan.compressed,
            created_at,
        }
    }

    /// Write the record into `checkpoint_dir`, creating the directory if
    /// needed. Write-then-rename so readers never see a torn record.
    pub fn write(&self, checkpoint_dir: &Path) -> Result<()> {
        fs::create_dir_all(checkpoint_dir)?;
        let body = serde_yaml::to_string(self)?;
        let mut tmp = tempfile::NamedTempFile::new_in(checkpoint_dir)?;
        tmp.write_all(body.as_bytes())?;
        tmp.persist(checkpoint_dir.join(CHAIN_RECORD_FILE))
            .map_err(|e| e.error)?;
        Ok(())
    }

    /// Load the record from `checkpoint_dir`. A missing file is `None`
    /// (callers decide whether that is fatal); an unreadable or
    /// incompatible record is an error.
    pub fn load(checkpoint_dir: &Path) -> Result<Option<ChainRecord>> {
        let path = checkpoint_dir.join(CHAIN_RECORD_FILE);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let record: ChainRecord = serde_yaml::from_str(&raw).map_err(|e| {
            GfsbakError::ChainUnresolvable(format!(
                "malformed chain record at '{}': {e}",
                path.display()
            ))
        })?;
        if record.schema_version != CHAIN_RECORD_VERSION {
            return Err(GfsbakError::ChainUnresolvable(format!(
                "unsupported chain record version {} at '{}'",
                record.schema_version,
                path.display()
            )));
        }
        Ok(Some(record))
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn sample_plan(parent: Option<&str>) -> BackupPlan {
        BackupPlan {
            tier: Tier::Weekly,
            name: "2024-W10".into(),
            kind: BackupKind::Differential,
            target: PathBuf::from("/srv/backups/db1/backups/weekly/2024-W10"),
            parent: parent.map(PathBuf::from),
            checkpoint: PathBuf::from("/srv/backups/db1/checkpoints/weekly/2024-W10"),
            compressed: false,
            workers: 4,
            credential: None,
        }
    }

    #[test]
    fn record_round_trips_through_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let record = ChainRecord::for_plan(
            &sample_plan(Some("/srv/backups/db1/backups/monthly/2024-03")),
            Utc::now(),
        );
        record.write(dir.path()).unwrap();

        let loaded = ChainRecord::load(dir.path()).unwrap().unwrap();
        assert_eq!(loaded.schema_version, CHAIN_RECORD_VERSION);
        assert_eq!(loaded.tier, Tier::Weekly);
        assert_eq!(loaded.name, "2024-W10");
        assert_eq!(loaded.kind, BackupKind::Differential);
        assert_eq!(
            loaded.parent.as_deref(),
            Some("/srv/backups/db1/backups/monthly/2024-03")
        );
    }

    #[test]
    fn missing_record_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ChainRecord::load(dir.path()).unwrap().is_none());
    }

    #[test]
    fn absent_parent_survives_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut plan = sample_plan(None);
        plan.kind = BackupKind::Full;
        ChainRecord::for_plan(&plan, Utc::now())
            .write(dir.path())
            .unwrap();
        let loaded = ChainRecord::load(dir.path()).unwrap().unwrap();
        assert!(loaded.parent.is_none());
        assert_eq!(loaded.kind, BackupKind::Full);
    }

    #[test]
    fn unknown_version_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut record = ChainRecord::for_plan(&sample_plan(None), Utc::now());
        record.schema_version = 99;
        let body = serde_yaml::to_string(&record).unwrap();
        fs::write(dir.path().join(CHAIN_RECORD_FILE), body).unwrap();

        let err = ChainRecord::load(dir.path()).unwrap_err().to_string();
        assert!(err.contains("unsupported chain record version"));
    }

    #[test]
    fn garbage_record_is_an_error_not_none() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CHAIN_RECORD_FILE), ":: not yaml ::").unwrap();
        assert!(ChainRecord::load(dir.path()).is_err());
    }
}
