use std::sync::Arc;
use std::time::Duration;

use chit_ledger_backend::config::CONFIG_FILE;
use chit_ledger_backend::domain::commands::allotment::ConfirmAllotmentCommand;
use chit_ledger_backend::domain::commands::chit::CreateChitGroupCommand;
use chit_ledger_backend::domain::commands::member::CreateMemberCommand;
use chit_ledger_backend::domain::commands::payment::RecordPaymentCommand;
use chit_ledger_backend::domain::ChitLedger;
use chit_ledger_backend::initialize_backend;
use chit_ledger_backend::storage::{GitMirrorRemote, JsonConnection, RemoteStore, SnapshotRepository};
use chrono::NaiveDate;
use shared::PaymentStatus;
use tempfile::TempDir;

fn open(dir: &TempDir, remote: Option<Arc<dyn RemoteStore>>) -> ChitLedger {
    let connection = JsonConnection::new(dir.path()).unwrap();
    ChitLedger::open(Arc::new(SnapshotRepository::new(connection)), remote, Duration::from_secs(10))
}

#[tokio::test]
async fn ledger_survives_restart_and_sync() {
    let data_dir = TempDir::new().unwrap();
    let mirror_dir = TempDir::new().unwrap();
    let remote: Arc<dyn RemoteStore> = Arc::new(GitMirrorRemote::new(mirror_dir.path().join("mirror")));

    let ledger = open(&data_dir, Some(remote.clone()));
    let group = ledger
        .create_chit_group(CreateChitGroupCommand {
            name: "Family Chit".to_string(),
            chit_value: 3000.0,
            total_months: 3,
            installment_regular: 1000.0,
            installment_allotted: 1200.0,
            start_month: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            upi_id: "family@upi".to_string(),
        })
        .unwrap();
    let member = ledger
        .create_member(CreateMemberCommand {
            name: "Lakshmi".to_string(),
            mobile: "98400 12345".to_string(),
            address: "Madurai".to_string(),
            id_proof_type: None,
            id_proof_number: String::new(),
            chit_group_id: Some(group.id.clone()),
        })
        .unwrap()
        .member;
    ledger
        .record_payment(RecordPaymentCommand {
            chit_group_id: group.id.clone(),
            member_id: member.id.clone(),
            month_no: 1,
            paid_amount: 1000.0,
            payment_date: NaiveDate::from_ymd_opt(2025, 1, 5),
        })
        .unwrap();
    ledger
        .confirm_allotment(ConfirmAllotmentCommand {
            chit_group_id: group.id.clone(),
            member_id: member.id.clone(),
            month_no: 2,
            allotted_amount: 2800.0,
            created_by: "u1".to_string(),
        })
        .unwrap();
    assert!(ledger.is_dirty());

    let synced_at = ledger.sync().await.unwrap();
    assert!(!ledger.is_dirty());
    assert!(mirror_dir.path().join("mirror").join("ledger_snapshot.json").exists());
    drop(ledger);

    let reopened = open(&data_dir, Some(remote));
    assert!(!reopened.is_dirty());
    assert_eq!(reopened.last_synced_at(), Some(synced_at));
    assert_eq!(reopened.chit_groups(), vec![group.clone()]);

    let schedule = reopened.schedule_for(&group.id, &member.id);
    assert_eq!(schedule.len(), 3);
    assert_eq!(schedule[0].status, PaymentStatus::Paid);
    assert!(schedule[1].is_prize_month);
    assert_eq!(schedule[2].due_amount, 1200.0);
    assert_eq!(reopened.allotment_register(&group.id).len(), 1);
}

#[test]
fn corrupt_snapshot_is_replaced_by_seeded_default() {
    let data_dir = TempDir::new().unwrap();
    std::fs::write(data_dir.path().join("ledger_snapshot.json"), "{ not json").unwrap();

    let ledger = open(&data_dir, None);
    assert!(ledger.is_ready());
    assert!(!ledger.users().is_empty());
    assert!(ledger.chit_groups().is_empty());

    let rewritten = std::fs::read_to_string(data_dir.path().join("ledger_snapshot.json")).unwrap();
    assert!(serde_json::from_str::<serde_json::Value>(&rewritten).is_ok());
}

#[test]
fn initialize_backend_writes_config_and_seed() {
    let data_dir = TempDir::new().unwrap();

    let (config, state) = initialize_backend(data_dir.path()).unwrap();

    assert!(data_dir.path().join(CONFIG_FILE).exists());
    assert!(data_dir.path().join(&config.snapshot_file).exists());
    assert!(!state.ledger.users().is_empty());
    assert!(!state.ledger.has_remote());
}
