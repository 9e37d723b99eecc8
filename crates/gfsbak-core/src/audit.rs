//! Operator-facing audit trail.
//!
//! One line per attempted operation, appended to a log file at the root of
//! the node's backup tree. Audit writes are best-effort: a failure to
//! append is reported through tracing but never masks the outcome of the
//! operation being audited.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use chrono::{SecondsFormat, Utc};
use tracing::warn;

use crate::store::BackupStore;

#[derive(Debug, Clone, Copy)]
pub enum AuditLevel {
    Info,
    Error,
}

impl AuditLevel {
    fn as_str(self) -> &'static str {
        match self {
            AuditLevel::Info => "INFO",
            AuditLevel::Error => "ERROR",
        }
    }
}

pub struct AuditLog {
    path: PathBuf,
    node: String,
}

impl AuditLog {
    pub fn new(store: &BackupStore, node: &str) -> Self {
        Self {
            path: store.audit_log_path(),
            node: node.to_string(),
        }
    }

    pub fn info(&self, message: &str) {
        self.record(AuditLevel::Info, message);
    }

    pub fn error(&self, message: &str) {
        self.record(AuditLevel::Error, message);
    }

    pub fn record(&self, level: AuditLevel, message: &str) {
        let line = format!(
            "{} [{}] node={} {}\n",
            Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            level.as_str(),
            self.node,
            message
        );
        if let Err(e) = self.append(&line) {
            warn!(path = %self.path.display(), error = %e, "failed to append audit line");
        }
    }

    fn append(&self, line: &str) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_carry_timestamp_node_level_and_message() {
        let dir = tempfile::tempdir().unwrap();
        let store = BackupStore::new(dir.path(), "db1");
        let audit = AuditLog::new(&store, "db1");

        audit.info("starting daily backup 2024-03-05");
        audit.error("backup 2024-03-05 failed: engine exited with 1");

        let body = std::fs::read_to_string(store.audit_log_path()).unwrap();
        let lines: Vec<&str> = body.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("[INFO] node=db1 starting daily backup 2024-03-05"));
        assert!(lines[1].contains("[ERROR] node=db1 backup 2024-03-05 failed"));
        // RFC3339 timestamp up front.
        assert!(lines[0].chars().take(4).all(|c| c.is_ascii_digit()));
        assert!(lines[0].contains('T'));
    }

    #[test]
    fn append_accumulates_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let store = BackupStore::new(dir.path(), "db1");
        AuditLog::new(&store, "db1").info("first");
        AuditLog::new(&store, "db1").info("second");

        let body = std::fs::read_to_string(store.audit_log_path()).unwrap();
        assert_eq!(body.lines().count(), 2);
    }
}
