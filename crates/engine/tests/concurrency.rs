use std::{path::PathBuf, sync::Arc};

use chrono::NaiveDate;
use sea_orm::Database;
use tokio::task::JoinSet;

use engine::{
    AccountKind, Caller, Engine, EngineError, EquipmentStatus, Location, LocationKind,
    MaintenanceStatus, Money, NewBankAccountCmd, NewEquipmentCmd, NewTransactionCmd,
    OpenMaintenanceCmd, TimelineItem, TransactionKind,
};
use migration::MigratorTrait;
use uuid::Uuid;

/// A SQLite file shared by every connection of the pool, removed on drop.
struct DbFile(PathBuf);

impl DbFile {
    fn new() -> Self {
        Self(std::env::temp_dir().join(format!("echo_shop_{}.db", Uuid::new_v4().simple())))
    }

    fn url(&self) -> String {
        format!("sqlite:{}?mode=rwc", self.0.display())
    }
}

impl Drop for DbFile {
    fn drop(&mut self) {
        for suffix in ["", "-wal", "-shm"] {
            let mut path = self.0.clone().into_os_string();
            path.push(suffix);
            let _ = std::fs::remove_file(path);
        }
    }
}

async fn file_engine(file: &DbFile) -> Arc<Engine> {
    let db = Database::connect(file.url()).await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    Arc::new(Engine::builder().database(db).build().await.unwrap())
}

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 5, 1).unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_writes_on_one_account_stay_recomputable() {
    let file = DbFile::new();
    let engine = file_engine(&file).await;
    let company = engine.new_company("Echo Shop", None).await.unwrap();
    let caller = Caller::operator(company.id);
    let main = engine
        .new_bank_account(
            &caller,
            NewBankAccountCmd::new(company.id, "Main", AccountKind::Checking)
                .opening_balance(Money::new(10_000)),
        )
        .await
        .unwrap()
        .id;

    // Half of the writers delete what they created.
    let company_id = company.id;
    let mut writers = JoinSet::new();
    for i in 0..24_i64 {
        let engine = Arc::clone(&engine);
        let caller = caller.clone();
        writers.spawn(async move {
            let (kind, signed) = if i % 2 == 0 {
                (TransactionKind::Income, 100 + i)
            } else {
                (TransactionKind::Expense, -(100 + i))
            };
            let tx = engine
                .create_transaction(
                    &caller,
                    NewTransactionCmd::new(company_id, kind, Money::new(100 + i), day(), main),
                )
                .await
                .unwrap();
            if i % 4 < 2 {
                let ack = engine.delete_transaction(&caller, tx.id).await.unwrap();
                assert!(ack.balance_reversed);
                0
            } else {
                signed
            }
        });
    }
    let mut expected = 10_000;
    while let Some(kept) = writers.join_next().await {
        expected += kept.unwrap();
    }

    let balance = engine.bank_account(&caller, main).await.unwrap().current_balance;
    assert_eq!(balance, Money::new(expected));
    assert!(engine.recompute(&caller, company.id).await.unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_deletes_reverse_each_transaction_once() {
    let file = DbFile::new();
    let engine = file_engine(&file).await;
    let company = engine.new_company("Echo Shop", None).await.unwrap();
    let caller = Caller::operator(company.id);
    let main = engine
        .new_bank_account(
            &caller,
            NewBankAccountCmd::new(company.id, "Main", AccountKind::Checking),
        )
        .await
        .unwrap()
        .id;

    let mut ids = Vec::new();
    for i in 1..=8_i64 {
        let tx = engine
            .create_transaction(
                &caller,
                NewTransactionCmd::new(
                    company.id,
                    TransactionKind::Income,
                    Money::new(i * 1_000),
                    day(),
                    main,
                ),
            )
            .await
            .unwrap();
        ids.push(tx.id);
    }

    let mut deleters = JoinSet::new();
    for id in ids.iter().copied().chain(ids.iter().copied()) {
        let engine = Arc::clone(&engine);
        let caller = caller.clone();
        deleters.spawn(async move { (id, engine.delete_transaction(&caller, id).await) });
    }
    let mut reversed = Vec::new();
    while let Some(joined) = deleters.join_next().await {
        match joined.unwrap() {
            (id, Ok(ack)) if ack.balance_reversed => reversed.push(id),
            // the loser saw the claimed document or nothing at all
            (_, Ok(_)) | (_, Err(EngineError::StateConflict(_))) => {}
            (id, Err(err)) => panic!("delete of {id} failed: {err}"),
        }
    }
    reversed.sort();
    ids.sort();
    assert_eq!(reversed, ids);

    let balance = engine.bank_account(&caller, main).await.unwrap().current_balance;
    assert_eq!(balance, Money::ZERO);
    assert!(engine.recompute(&caller, company.id).await.unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_maintenance_opens_admit_exactly_one() {
    let file = DbFile::new();
    let engine = file_engine(&file).await;
    let company = engine.new_company("Echo Shop", None).await.unwrap();
    let caller = Caller::operator(company.id);
    let item = engine
        .new_equipment(
            &caller,
            NewEquipmentCmd::new(
                company.id,
                "SN-RACE",
                "printer",
                Location {
                    kind: LocationKind::Warehouse,
                    ref_id: None,
                    name: "Depósito".to_string(),
                },
            ),
        )
        .await
        .unwrap();

    let item_id = item.id;
    let open = |fault: &'static str| {
        let engine = Arc::clone(&engine);
        let caller = caller.clone();
        tokio::spawn(async move {
            engine
                .open_maintenance(&caller, item_id, OpenMaintenanceCmd::new(fault))
                .await
        })
    };
    let (first, second) = tokio::join!(open("paper jam"), open("no power"));
    let outcomes = [first.unwrap(), second.unwrap()];

    let opened: Vec<_> = outcomes.iter().filter_map(|r| r.as_ref().ok()).collect();
    assert_eq!(opened.len(), 1);
    assert_eq!(
        outcomes
            .iter()
            .filter(|r| matches!(r, Err(EngineError::StateConflict(_))))
            .count(),
        1
    );

    let history = engine.lifetime_history(&caller, item.id).await.unwrap();
    assert_eq!(history.equipment.status, EquipmentStatus::InMaintenance);
    assert_eq!(history.total_maintenances, 1);
    assert_eq!(history.total_events, 1);
    let in_progress: Vec<_> = history
        .timeline
        .iter()
        .filter_map(|entry| match &entry.item {
            TimelineItem::MaintenanceOpened(record)
                if record.status == MaintenanceStatus::InProgress =>
            {
                Some(record.id)
            }
            _ => None,
        })
        .collect();
    assert_eq!(in_progress, vec![opened[0].id]);
}
