// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde_json::json;

struct AddTotalArchived;

impl Migration for AddTotalArchived {
    fn source_version(&self) -> u32 {
        1
    }

    fn target_version(&self) -> u32 {
        2
    }

    fn migrate(&self, snapshot: &mut Value) -> Result<(), MigrationError> {
        let state = snapshot
            .get_mut("state")
            .and_then(|s| s.as_object_mut())
            .ok_or_else(|| MigrationError::Failed {
                from: 1,
                to: 2,
                reason: "missing state object".to_string(),
            })?;
        state
            .entry("total_archived")
            .or_insert_with(|| json!(0));
        Ok(())
    }
}

fn registry_with(migrations: Vec<Box<dyn Migration>>) -> MigrationRegistry {
    let mut registry = MigrationRegistry::new();
    registry.migrations = migrations;
    registry
}

#[test]
fn same_version_is_a_no_op() {
    let registry = MigrationRegistry::new();
    let snapshot = json!({"v": 1, "state": {}});
    let migrated = registry.migrate_to(snapshot.clone(), 1).unwrap();
    assert_eq!(migrated, snapshot);
}

#[test]
fn current_greater_than_target_is_too_new() {
    let registry = MigrationRegistry::new();
    let snapshot = json!({"v": 5, "state": {}});
    let err = registry.migrate_to(snapshot, 1).unwrap_err();
    assert!(matches!(err, MigrationError::TooNew(5, 1)));
}

#[test]
fn missing_path_is_reported() {
    let registry = MigrationRegistry::new();
    let snapshot = json!({"v": 1, "state": {}});
    let err = registry.migrate_to(snapshot, 2).unwrap_err();
    assert!(matches!(err, MigrationError::NoPath(1, 2)));
}

#[test]
fn single_migration_chains_and_bumps_version() {
    let registry = registry_with(vec![Box::new(AddTotalArchived)]);
    let snapshot = json!({"v": 1, "state": {}});
    let migrated = registry.migrate_to(snapshot, 2).unwrap();
    assert_eq!(migrated["v"], 2);
    assert_eq!(migrated["state"]["total_archived"], 0);
}

#[test]
fn defaults_missing_version_field_to_one() {
    let registry = registry_with(vec![Box::new(AddTotalArchived)]);
    let snapshot = json!({"state": {}});
    let migrated = registry.migrate_to(snapshot, 2).unwrap();
    assert_eq!(migrated["v"], 2);
}
