use crate::retention::enforce;
use crate::store::Namespace;
use crate::testutil::{test_config, test_store};
use crate::tier::Tier;

#[test]
fn unbounded_tier_is_never_pruned() {
    let dir = tempfile::tempdir().unwrap();
    let store = test_store(&test_config(dir.path()));
    for i in 1..=20 {
        store
            .create_instance_dirs(Tier::Annually, &format!("{:04}", 2000 + i), true)
            .unwrap();
    }

    let removed = enforce(&store, Tier::Annually, None).unwrap();
    assert_eq!(removed, 0);
    assert_eq!(store.list(Namespace::Payloads, Tier::Annually).unwrap().len(), 20);
}

#[test]
fn keep_count_zero_is_rejected_before_any_deletion() {
    let dir = tempfile::tempdir().unwrap();
    let store = test_store(&test_config(dir.path()));
    store
        .create_instance_dirs(Tier::Daily, "2024-03-05", false)
        .unwrap();

    let err = enforce(&store, Tier::Daily, Some(0)).unwrap_err();
    assert!(err.is_preflight());
    // Nothing was deleted.
    assert_eq!(store.list(Namespace::Payloads, Tier::Daily).unwrap().len(), 1);
}

#[test]
fn trims_to_one_slot_below_keep_count() {
    let dir = tempfile::tempdir().unwrap();
    let store = test_store(&test_config(dir.path()));
    for day in 1..=5 {
        store
            .create_instance_dirs(Tier::Daily, &format!("2024-03-{day:02}"), true)
            .unwrap();
    }

    // keep counts the instance about to be produced: 5 existing, keep 3
    // leaves the 2 newest.
    enforce(&store, Tier::Daily, Some(3)).unwrap();
    let names = store.list(Namespace::Payloads, Tier::Daily).unwrap();
    assert_eq!(names, vec!["2024-03-04", "2024-03-05"]);
    // Checkpoints stay in lockstep.
    let checkpoints = store.list(Namespace::Checkpoints, Tier::Daily).unwrap();
    assert_eq!(checkpoints, vec!["2024-03-04", "2024-03-05"]);
}

#[test]
fn oldest_are_removed_never_the_newest() {
    let dir = tempfile::tempdir().unwrap();
    let store = test_store(&test_config(dir.path()));
    for day in 1..=4 {
        store
            .create_instance_dirs(Tier::Weekly, &format!("2024-W{day:02}"), false)
            .unwrap();
    }

    enforce(&store, Tier::Weekly, Some(2)).unwrap();
    assert_eq!(
        store.list(Namespace::Payloads, Tier::Weekly).unwrap(),
        vec!["2024-W04"]
    );
}

#[test]
fn under_populated_tier_is_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let store = test_store(&test_config(dir.path()));
    store
        .create_instance_dirs(Tier::Monthly, "2024-03", true)
        .unwrap();

    let removed = enforce(&store, Tier::Monthly, Some(12)).unwrap();
    assert_eq!(removed, 0);
    assert_eq!(store.list(Namespace::Payloads, Tier::Monthly).unwrap().len(), 1);
}

#[test]
fn orphaned_checkpoints_are_trimmed_in_lockstep() {
    let dir = tempfile::tempdir().unwrap();
    let store = test_store(&test_config(dir.path()));
    // Checkpoints exist for instances whose payloads are already gone.
    for day in 1..=4 {
        std::fs::create_dir_all(store.instance_dir(
            Namespace::Checkpoints,
            Tier::Daily,
            &format!("2024-03-{day:02}"),
        ))
        .unwrap();
    }

    enforce(&store, Tier::Daily, Some(3)).unwrap();
    assert_eq!(
        store.list(Namespace::Checkpoints, Tier::Daily).unwrap(),
        vec!["2024-03-03", "2024-03-04"]
    );
}

#[test]
fn suffixed_instances_count_individually() {
    let dir = tempfile::tempdir().unwrap();
    let store = test_store(&test_config(dir.path()));
    store.create_instance_dirs(Tier::Daily, "2024-03-05", false).unwrap();
    store.create_instance_dirs(Tier::Daily, "2024-03-05&1", false).unwrap();
    store.create_instance_dirs(Tier::Daily, "2024-03-05&2", false).unwrap();

    enforce(&store, Tier::Daily, Some(2)).unwrap();
    assert_eq!(
        store.list(Namespace::Payloads, Tier::Daily).unwrap(),
        vec!["2024-03-05&2"]
    );
}
