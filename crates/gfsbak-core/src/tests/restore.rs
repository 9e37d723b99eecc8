use std::path::PathBuf;

use chrono::Utc;

use crate::checkpoint::ChainRecord;
use crate::plan::BackupKind;
use crate::restore::{resolve_chain, Restorer};
use crate::store::{BackupStore, Namespace};
use crate::testutil::*;
use crate::tier::Tier;

/// Create an instance with a chain record pointing at `parent`.
fn chain_instance(
    store: &BackupStore,
    tier: Tier,
    name: &str,
    kind: BackupKind,
    parent: Option<&PathBuf>,
) -> PathBuf {
    store.create_instance_dirs(tier, name, true).unwrap();
    let payload = store.instance_dir(Namespace::Payloads, tier, name);
    let record = ChainRecord {
        schema_version: crate::checkpoint::CHAIN_RECORD_VERSION,
        tier,
        name: name.to_string(),
        kind,
        parent: parent.map(|p| p.to_string_lossy().into_owned()),
        compressed: false,
        created_at: Utc::now(),
    };
    record
        .write(&store.instance_dir(Namespace::Checkpoints, tier, name))
        .unwrap();
    payload
}

/// Monthly full → weekly differential → two daily increments.
fn seeded_chain(store: &BackupStore) -> (PathBuf, PathBuf, PathBuf, PathBuf) {
    let monthly = chain_instance(store, Tier::Monthly, "2024-03", BackupKind::Full, None);
    let weekly = chain_instance(
        store,
        Tier::Weekly,
        "2024-W10",
        BackupKind::Differential,
        Some(&monthly),
    );
    let daily1 = chain_instance(
        store,
        Tier::Daily,
        "2024-03-05",
        BackupKind::Differential,
        Some(&weekly),
    );
    let daily2 = chain_instance(
        store,
        Tier::Daily,
        "2024-03-06",
        BackupKind::Incremental,
        Some(&daily1),
    );
    (monthly, weekly, daily1, daily2)
}

#[test]
fn chain_walk_terminates_at_parentless_root() {
    let dir = tempfile::tempdir().unwrap();
    let store = test_store(&test_config(dir.path()));
    let (monthly, weekly, daily1, daily2) = seeded_chain(&store);

    let stack = resolve_chain(&store, &daily2).unwrap();
    assert_eq!(stack, vec![daily2, daily1, weekly, monthly]);
}

#[test]
fn replay_order_is_root_first() {
    let dir = tempfile::tempdir().unwrap();
    let store = test_store(&test_config(dir.path()));
    let (monthly, weekly, daily1, daily2) = seeded_chain(&store);

    let stack = resolve_chain(&store, &daily2).unwrap();
    let replay: Vec<&PathBuf> = stack.iter().rev().collect();
    assert_eq!(replay, vec![&monthly, &weekly, &daily1, &daily2]);
}

#[test]
fn deleted_root_makes_resolution_fail_fatally() {
    let dir = tempfile::tempdir().unwrap();
    let store = test_store(&test_config(dir.path()));
    let (_, _, _, daily2) = seeded_chain(&store);

    // Direct manipulation: the chain root vanishes entirely.
    store.remove_instance(Tier::Monthly, "2024-03").unwrap();

    let err = resolve_chain(&store, &daily2).unwrap_err();
    assert!(err.to_string().contains("chain record missing"));
}

#[test]
fn cyclic_metadata_is_detected() {
    let dir = tempfile::tempdir().unwrap();
    let store = test_store(&test_config(dir.path()));
    let a = store.instance_dir(Namespace::Payloads, Tier::Daily, "2024-03-05");
    let b = store.instance_dir(Namespace::Payloads, Tier::Daily, "2024-03-06");
    chain_instance(&store, Tier::Daily, "2024-03-05", BackupKind::Incremental, Some(&b));
    chain_instance(&store, Tier::Daily, "2024-03-06", BackupKind::Incremental, Some(&a));

    let err = resolve_chain(&store, &b).unwrap_err();
    assert!(err.to_string().contains("cycle"));
}

#[test]
fn restore_replays_the_whole_chain_then_moves_into_place() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(dir.path());
    config.restore.data_dir = Some(dir.path().join("datadir").to_string_lossy().into_owned());
    let store = test_store(&config);
    let (monthly, weekly, daily1, daily2) = seeded_chain(&store);

    let engine = ScriptedRestore::new();
    let service = RecordingService::new();
    let usage = StaticUsage(10);
    let audit = test_audit(&store);
    let restorer = Restorer::new(&config, &store, &engine, &service, &usage, &audit);

    restorer.run(&daily2).unwrap();

    assert_eq!(*service.calls.lock().unwrap(), vec!["stop"]);
    let steps = engine.steps();
    assert_eq!(
        steps,
        vec![
            format!("stage {}", monthly.display()),
            "prepare base".to_string(),
            format!("apply {}", weekly.display()),
            format!("apply {}", daily1.display()),
            format!("apply {}", daily2.display()),
            format!("move {}", config.restore.data_dir.as_deref().unwrap()),
        ]
    );
}

#[test]
fn restore_aborts_on_prepare_failure_without_moving() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(dir.path());
    config.restore.data_dir = Some("/var/lib/mysql".into());
    let store = test_store(&config);
    let (_, _, _, daily2) = seeded_chain(&store);

    let engine = ScriptedRestore::failing_at("apply");
    let service = RecordingService::new();
    let usage = StaticUsage(10);
    let audit = test_audit(&store);
    let restorer = Restorer::new(&config, &store, &engine, &service, &usage, &audit);

    let err = restorer.run(&daily2).unwrap_err();
    assert!(!err.is_preflight());

    // The live data directory was never touched.
    let steps = engine.steps();
    assert!(steps.iter().all(|s| !s.starts_with("move ")));

    let log = std::fs::read_to_string(store.audit_log_path()).unwrap();
    assert!(log.contains("live data directory untouched"));
}

#[test]
fn restore_requires_a_configured_data_dir() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let store = test_store(&config);
    let (_, _, _, daily2) = seeded_chain(&store);

    let engine = ScriptedRestore::new();
    let service = RecordingService::new();
    let usage = StaticUsage(10);
    let audit = test_audit(&store);
    let restorer = Restorer::new(&config, &store, &engine, &service, &usage, &audit);

    let err = restorer.run(&daily2).unwrap_err();
    assert!(err.is_preflight());
    assert!(service.calls.lock().unwrap().is_empty());
}

#[test]
fn restore_guard_blocks_before_stopping_the_service() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(dir.path());
    config.restore.data_dir = Some("/var/lib/mysql".into());
    let store = test_store(&config);
    let (_, _, _, daily2) = seeded_chain(&store);

    let engine = ScriptedRestore::new();
    let service = RecordingService::new();
    let usage = StaticUsage(99);
    let audit = test_audit(&store);
    let restorer = Restorer::new(&config, &store, &engine, &service, &usage, &audit);

    let err = restorer.run(&daily2).unwrap_err();
    assert!(err.is_preflight());
    assert!(service.calls.lock().unwrap().is_empty());
    assert!(engine.steps().is_empty());
}

#[test]
fn restore_of_a_full_backup_has_no_increments() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(dir.path());
    config.restore.data_dir = Some("/var/lib/mysql".into());
    let store = test_store(&config);
    let monthly = chain_instance(&store, Tier::Monthly, "2024-03", BackupKind::Full, None);

    let engine = ScriptedRestore::new();
    let service = RecordingService::new();
    let usage = StaticUsage(10);
    let audit = test_audit(&store);
    let restorer = Restorer::new(&config, &store, &engine, &service, &usage, &audit);

    restorer.run(&monthly).unwrap();
    let steps = engine.steps();
    assert_eq!(steps.len(), 3); // stage, prepare, move
    assert!(steps[0].starts_with("stage "));
    assert!(steps[2].starts_with("move "));
}
