//! End-to-end ledger scenarios: hierarchy creation, attendance, snapshot
//! semantics under later parent appends, soft delete, tamper detection and
//! snapshot round-trips.

use std::path::PathBuf;

use attendance_ledger::chain::{AttendanceStatus, Attributes, Difficulty, Transaction};
use attendance_ledger::config::LedgerConfig;
use attendance_ledger::ledger::{project_meta, LedgerService};
use attendance_ledger::storage::SnapshotStore;
use attendance_ledger::validation::validate_chain;
use attendance_ledger::LedgerError;
use serde_json::json;
use tempfile::tempdir;

fn test_config(path: PathBuf) -> LedgerConfig {
    LedgerConfig {
        data_path: path,
        difficulty: 1,
        mining_budget: 1_000_000,
    }
}

#[tokio::test]
async fn happy_path_links_all_three_levels() {
    let dir = tempdir().unwrap();
    let config = test_config(dir.path().join("ledger.json"));
    let mut service = LedgerService::open(&config).unwrap();

    let dept_id = service.create_department("D".to_string()).await.unwrap();
    let dept_genesis_hash = service.ledger().department(&dept_id).unwrap().chain[0]
        .hash
        .clone();

    let class_id = service
        .create_class(dept_id.clone(), Some("C".to_string()))
        .await
        .unwrap();
    let class_genesis = service.ledger().class(&class_id).unwrap().chain[0].clone();
    assert_eq!(class_genesis.prev_hash, dept_genesis_hash);

    let student_id = service
        .create_student(
            dept_id.clone(),
            class_id.clone(),
            Some("S".to_string()),
            Some("1001".to_string()),
        )
        .await
        .unwrap();
    let student = service.ledger().student(&student_id).unwrap();
    assert_eq!(student.chain[0].prev_hash, class_genesis.hash);

    let block = service
        .mark_attendance(student_id.clone(), AttendanceStatus::Present)
        .await
        .unwrap();
    assert_eq!(block.index, 1);

    let student = service.ledger().student(&student_id).unwrap();
    assert_eq!(block.prev_hash, student.chain[0].hash);
    assert!(validate_chain(&student.chain, Difficulty(1)).valid);

    let report = service.validate();
    assert!(report.valid, "issues: {:?}", report.issues);
}

#[tokio::test]
async fn later_parent_blocks_do_not_invalidate_children() {
    let dir = tempdir().unwrap();
    let config = test_config(dir.path().join("ledger.json"));
    let mut service = LedgerService::open(&config).unwrap();

    let dept_id = service.create_department("D".to_string()).await.unwrap();
    let class_id = service
        .create_class(dept_id.clone(), Some("C".to_string()))
        .await
        .unwrap();
    service
        .create_student(dept_id.clone(), class_id.clone(), None, None)
        .await
        .unwrap();

    // unrelated later appends on both ancestors
    let mut update = Attributes::new();
    update.insert("name".into(), json!("D renamed"));
    service
        .update_department(dept_id.clone(), update)
        .await
        .unwrap();
    service.delete_class(class_id.clone()).await.unwrap();

    // the child linkage was snapshotted at creation time and must hold
    let report = service.validate();
    assert!(report.valid, "issues: {:?}", report.issues);
}

#[tokio::test]
async fn soft_delete_preserves_history_and_validity() {
    let dir = tempdir().unwrap();
    let config = test_config(dir.path().join("ledger.json"));
    let mut service = LedgerService::open(&config).unwrap();

    let dept_id = service.create_department("D".to_string()).await.unwrap();
    let class_id = service
        .create_class(dept_id.clone(), None)
        .await
        .unwrap();
    let student_id = service
        .create_student(dept_id, class_id, Some("S".to_string()), None)
        .await
        .unwrap();
    service
        .mark_attendance(student_id.clone(), AttendanceStatus::Absent)
        .await
        .unwrap();
    service.delete_student(student_id.clone()).await.unwrap();

    let student = service.ledger().student(&student_id).unwrap();
    let meta = project_meta(&student.chain);
    assert_eq!(meta["status"], "deleted");
    assert_eq!(meta["name"], "S");

    // all prior blocks remain queryable and the chain still validates
    assert_eq!(student.chain.len(), 3);
    assert!(matches!(
        student.chain[1].transaction,
        Transaction::Attendance(_)
    ));
    assert!(validate_chain(&student.chain, Difficulty(1)).valid);
}

#[tokio::test]
async fn snapshot_round_trip_preserves_validation_result() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("ledger.json");
    let mut service = LedgerService::open(&test_config(path.clone())).unwrap();

    let dept_id = service.create_department("D".to_string()).await.unwrap();
    let class_id = service.create_class(dept_id.clone(), None).await.unwrap();
    let student_id = service
        .create_student(dept_id, class_id, None, None)
        .await
        .unwrap();
    service
        .mark_attendance(student_id, AttendanceStatus::Leave)
        .await
        .unwrap();
    let before = service.validate();

    let reopened = LedgerService::open(&test_config(path)).unwrap();
    assert_eq!(reopened.ledger(), service.ledger());
    assert_eq!(reopened.validate(), before);
    assert!(before.valid);
}

#[tokio::test]
async fn tampering_with_snapshot_is_detected_on_reload() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("ledger.json");
    let mut service = LedgerService::open(&test_config(path.clone())).unwrap();

    let dept_id = service.create_department("D".to_string()).await.unwrap();
    let mut update = Attributes::new();
    update.insert("name".into(), json!("D v2"));
    service
        .update_department(dept_id.clone(), update)
        .await
        .unwrap();

    // rewrite one committed transaction directly in the snapshot
    let store = SnapshotStore::new(&path);
    let mut ledger = store.load().unwrap().unwrap();
    let dept = ledger
        .departments
        .iter_mut()
        .find(|d| d.id == dept_id)
        .unwrap();
    dept.chain[1].transaction = Transaction::DepartmentUpdate {
        update: {
            let mut forged = Attributes::new();
            forged.insert("name".into(), json!("forged"));
            forged
        },
        timestamp: "2026-01-01T00:00:00.000Z".into(),
    };
    store.save(&ledger).unwrap();

    let reopened = LedgerService::open(&test_config(path)).unwrap();
    let report = reopened.validate();
    assert!(!report.valid);
    assert_eq!(report.issues.len(), 1);
    assert!(report.issues[0].reason.contains("block 1 hash mismatch"));

    // the untouched genesis prefix still validates on its own
    let chain = &reopened.ledger().department(&dept_id).unwrap().chain;
    assert!(validate_chain(&chain[..1], Difficulty(1)).valid);
}

#[tokio::test]
async fn exhausted_mining_budget_surfaces_as_retryable() {
    let dir = tempdir().unwrap();
    let config = LedgerConfig {
        data_path: dir.path().join("ledger.json"),
        difficulty: 16,
        mining_budget: 10,
    };
    let mut service = LedgerService::open(&config).unwrap();

    let err = service
        .create_department("D".to_string())
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::MiningExhausted { attempts: 10 }));
    assert!(err.is_retryable());
    assert!(service.ledger().departments.is_empty());
}

#[tokio::test]
async fn attendance_queries_filter_by_scope() {
    let dir = tempdir().unwrap();
    let config = test_config(dir.path().join("ledger.json"));
    let mut service = LedgerService::open(&config).unwrap();

    let dept_id = service.create_department("D".to_string()).await.unwrap();
    let class_a = service.create_class(dept_id.clone(), None).await.unwrap();
    let class_b = service.create_class(dept_id.clone(), None).await.unwrap();
    let stu_a = service
        .create_student(dept_id.clone(), class_a.clone(), None, None)
        .await
        .unwrap();
    let stu_b = service
        .create_student(dept_id.clone(), class_b.clone(), None, None)
        .await
        .unwrap();

    service
        .mark_attendance(stu_a, AttendanceStatus::Present)
        .await
        .unwrap();
    service
        .mark_attendance(stu_b, AttendanceStatus::Absent)
        .await
        .unwrap();

    let ledger = service.ledger();
    assert_eq!(ledger.attendance_for_department(&dept_id).len(), 2);
    assert_eq!(ledger.attendance_for_class(&class_a).len(), 1);
    assert_eq!(ledger.attendance_for_class(&class_b).len(), 1);
    assert_eq!(
        ledger
            .attendance_on(chrono::Utc::now().date_naive())
            .len(),
        2
    );
}
