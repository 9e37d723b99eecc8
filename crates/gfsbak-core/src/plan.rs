use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::tier::Tier;

/// How a backup instance relates to its chain parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackupKind {
    /// Self-contained; terminates a chain.
    Full,
    /// Delta against a coarser-tier instance.
    Differential,
    /// Delta against the previous instance of the same tier.
    Incremental,
}

impl BackupKind {
    pub fn as_str(self) -> &'static str {
        match self {
            BackupKind::Full => "full",
            BackupKind::Differential => "differential",
            BackupKind::Incremental => "incremental",
        }
    }
}

impl fmt::Display for BackupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fully resolved invocation parameters for one backup-producing operation.
///
/// Built by the command builder; the target directory (and the checkpoint
/// directory, for compressed instances) already exists by the time the plan
/// is handed to the engine.
#[derive(Debug, Clone)]
pub struct BackupPlan {
    pub tier: Tier,
    pub name: String,
    pub kind: BackupKind,
    /// Payload directory the engine writes into.
    pub target: PathBuf,
    /// Payload directory of the chain parent; absent for full backups.
    pub parent: Option<PathBuf>,
    /// Checkpoint directory where the chain record is persisted.
    pub checkpoint: PathBuf,
    pub compressed: bool,
    /// Bounded I/O parallelism within this one backup.
    pub workers: usize,
    /// Opaque credential reference passed through to the engine.
    pub credential: Option<String>,
}
