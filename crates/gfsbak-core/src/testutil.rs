use std::fs;
use std::path::Path;
use std::sync::Mutex;

use crate::audit::AuditLog;
use crate::config::{CompressionConfig, GfsbakConfig, RetentionConfig};
use crate::engine::{BackupEngine, DiskUsage, RestoreEngine, ServiceControl};
use crate::error::{GfsbakError, Result};
use crate::plan::{BackupKind, BackupPlan};
use crate::store::BackupStore;

pub const TEST_NODE: &str = "db1";

/// Config matching the documented defaults: retention {7, 5, 12, unbounded},
/// compression {false, false, true, true}.
pub fn test_config(storage_root: &Path) -> GfsbakConfig {
    GfsbakConfig {
        node: TEST_NODE.to_string(),
        storage_root: storage_root.to_string_lossy().into_owned(),
        usage_threshold_percent: 90,
        retention: RetentionConfig {
            daily: Some(7),
            weekly: Some(5),
            monthly: Some(12),
            annually: None,
        },
        compression: CompressionConfig::default(),
        workers: Some(2),
        credential: None,
        engine: Default::default(),
        restore: Default::default(),
    }
}

pub fn test_store(config: &GfsbakConfig) -> BackupStore {
    BackupStore::new(&config.storage_root, &config.node)
}

pub fn test_audit(store: &BackupStore) -> AuditLog {
    AuditLog::new(store, TEST_NODE)
}

/// Summary of one recorded produce call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProducedBackup {
    pub tier: crate::tier::Tier,
    pub name: String,
    pub kind: BackupKind,
    pub parent: Option<String>,
    pub compressed: bool,
}

/// Backup engine stand-in: records every plan it is handed and drops a
/// payload marker file into the target directory, like the real tool would
/// populate it. Can be told to fail.
pub struct RecordingEngine {
    plans: Mutex<Vec<ProducedBackup>>,
    fail: bool,
}

impl RecordingEngine {
    pub fn new() -> Self {
        Self {
            plans: Mutex::new(Vec::new()),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            plans: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn produced(&self) -> Vec<ProducedBackup> {
        self.plans.lock().unwrap().clone()
    }
}

impl BackupEngine for RecordingEngine {
    fn produce(&self, plan: &BackupPlan) -> Result<()> {
        if self.fail {
            return Err(GfsbakError::engine("backup", "simulated engine failure"));
        }
        fs::write(plan.target.join("payload.marker"), plan.name.as_bytes())?;
        self.plans.lock().unwrap().push(ProducedBackup {
            tier: plan.tier,
            name: plan.name.clone(),
            kind: plan.kind,
            parent: plan
                .parent
                .as_ref()
                .map(|p| p.to_string_lossy().into_owned()),
            compressed: plan.compressed,
        });
        Ok(())
    }
}

/// Restore engine stand-in: records the call sequence as printable steps,
/// optionally failing at a named step.
pub struct ScriptedRestore {
    pub calls: Mutex<Vec<String>>,
    fail_at: Option<&'static str>,
}

impl ScriptedRestore {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail_at: None,
        }
    }

    pub fn failing_at(step: &'static str) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail_at: Some(step),
        }
    }

    pub fn steps(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, step: &str, detail: String) -> Result<()> {
        self.calls.lock().unwrap().push(format!("{step} {detail}"));
        if self.fail_at == Some(step) {
            return Err(GfsbakError::engine(step, "simulated restore failure"));
        }
        Ok(())
    }
}

impl RestoreEngine for ScriptedRestore {
    fn stage_base(&self, source: &Path, _base: &Path) -> Result<()> {
        self.record("stage", source.display().to_string())
    }

    fn prepare_base(&self, _base: &Path) -> Result<()> {
        self.record("prepare", "base".to_string())
    }

    fn apply_increment(&self, _base: &Path, increment: &Path) -> Result<()> {
        self.record("apply", increment.display().to_string())
    }

    fn move_into_place(&self, _base: &Path, data_dir: &Path) -> Result<()> {
        self.record("move", data_dir.display().to_string())
    }
}

/// Service control stand-in recording stop/start calls.
pub struct RecordingService {
    pub calls: Mutex<Vec<&'static str>>,
}

impl RecordingService {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl ServiceControl for RecordingService {
    fn stop(&self) -> Result<()> {
        self.calls.lock().unwrap().push("stop");
        Ok(())
    }

    fn start(&self) -> Result<()> {
        self.calls.lock().unwrap().push("start");
        Ok(())
    }
}

/// Disk usage stand-in reporting a fixed percentage.
pub struct StaticUsage(pub u8);

impl DiskUsage for StaticUsage {
    fn usage_percent(&self, _path: &Path) -> Result<u8> {
        Ok(self.0)
    }
}
