use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};

use engine::{
    Caller, CloseMaintenanceCmd, Engine, EngineError, Equipment, EquipmentStatus, EventKind,
    Location, LocationKind, Money, NewEquipmentCmd, NewServiceOrderCmd, OpenMaintenanceCmd,
    RegisterEventCmd, TimelineItem, TransferEquipmentCmd,
};
use migration::MigratorTrait;
use uuid::Uuid;

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db)
}

fn warehouse() -> Location {
    Location {
        kind: LocationKind::Warehouse,
        ref_id: None,
        name: "Depósito".to_string(),
    }
}

async fn setup(engine: &Engine) -> (Caller, Equipment) {
    let company = engine.new_company("Echo Shop", None).await.unwrap();
    let caller = Caller::operator(company.id);
    let item = engine
        .new_equipment(
            &caller,
            NewEquipmentCmd::new(company.id, "SN-001", "printer", warehouse())
                .brand("Epson")
                .model("L3250"),
        )
        .await
        .unwrap();
    (caller, item)
}

async fn event_kinds(engine: &Engine, caller: &Caller, id: Uuid) -> Vec<EventKind> {
    engine
        .lifetime_history(caller, id)
        .await
        .unwrap()
        .timeline
        .into_iter()
        .filter_map(|entry| match entry.item {
            TimelineItem::Event(event) => Some(event.kind),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn maintenance_cycle() {
    let (engine, _db) = engine_with_db().await;
    let (caller, item) = setup(&engine).await;
    assert_eq!(item.status, EquipmentStatus::Available);

    let record = engine
        .open_maintenance(&caller, item.id, OpenMaintenanceCmd::new("noise"))
        .await
        .unwrap();
    let current = engine.equipment(&caller, item.id).await.unwrap();
    assert_eq!(current.status, EquipmentStatus::InMaintenance);
    assert_eq!(
        event_kinds(&engine, &caller, item.id).await,
        vec![EventKind::MaintenanceOpened]
    );

    let closed = engine
        .close_maintenance(
            &caller,
            record.id,
            CloseMaintenanceCmd::default()
                .new_status(EquipmentStatus::Available)
                .service_performed("bearing replaced")
                .final_cost(Money::new(12_000)),
        )
        .await
        .unwrap();
    assert!(closed.closed_at.is_some());
    assert_eq!(closed.final_cost, Some(Money::new(12_000)));

    let history = engine.lifetime_history(&caller, item.id).await.unwrap();
    assert_eq!(history.equipment.status, EquipmentStatus::Available);
    assert_eq!(history.total_events, 2);
    assert_eq!(history.total_maintenances, 1);
    assert_eq!(history.total_service_orders, 0);
    // two events plus the opened/closed pair
    assert_eq!(history.timeline.len(), 4);
    assert!(history.timeline.windows(2).all(|w| w[0].at >= w[1].at));
    assert_eq!(
        event_kinds(&engine, &caller, item.id).await,
        vec![EventKind::MaintenanceClosed, EventKind::MaintenanceOpened]
    );
}

#[tokio::test]
async fn closing_twice_is_a_conflict() {
    let (engine, _db) = engine_with_db().await;
    let (caller, item) = setup(&engine).await;
    let record = engine
        .open_maintenance(&caller, item.id, OpenMaintenanceCmd::new("jam"))
        .await
        .unwrap();
    engine
        .close_maintenance(&caller, record.id, CloseMaintenanceCmd::default())
        .await
        .unwrap();

    let err = engine
        .close_maintenance(&caller, record.id, CloseMaintenanceCmd::default())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::StateConflict(_)));
}

#[tokio::test]
async fn close_rejects_an_unreachable_status() {
    let (engine, _db) = engine_with_db().await;
    let (caller, item) = setup(&engine).await;
    let record = engine
        .open_maintenance(&caller, item.id, OpenMaintenanceCmd::new("jam"))
        .await
        .unwrap();

    let err = engine
        .close_maintenance(
            &caller,
            record.id,
            CloseMaintenanceCmd::default().new_status(EquipmentStatus::InTransit),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidTransition(_)));
    let current = engine.equipment(&caller, item.id).await.unwrap();
    assert_eq!(current.status, EquipmentStatus::InMaintenance);
}

#[tokio::test]
async fn transfer_during_maintenance_is_rejected_without_side_effects() {
    let (engine, _db) = engine_with_db().await;
    let (caller, item) = setup(&engine).await;
    engine
        .open_maintenance(&caller, item.id, OpenMaintenanceCmd::new("noise"))
        .await
        .unwrap();

    let destination = Location {
        kind: LocationKind::Customer,
        ref_id: Some(Uuid::new_v4()),
        name: "Cliente Alfa".to_string(),
    };
    let err = engine
        .transfer(&caller, item.id, TransferEquipmentCmd::new(destination))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::StateConflict(_)));

    let current = engine.equipment(&caller, item.id).await.unwrap();
    assert_eq!(current.status, EquipmentStatus::InMaintenance);
    assert_eq!(current.current_location, warehouse());
    assert_eq!(
        event_kinds(&engine, &caller, item.id).await,
        vec![EventKind::MaintenanceOpened]
    );
}

#[tokio::test]
async fn transfer_then_arrival() {
    let (engine, _db) = engine_with_db().await;
    let (caller, item) = setup(&engine).await;
    let destination = Location {
        kind: LocationKind::Technician,
        ref_id: None,
        name: "João".to_string(),
    };

    let moving = engine
        .transfer(
            &caller,
            item.id,
            TransferEquipmentCmd::new(destination.clone()).reason("field repair"),
        )
        .await
        .unwrap();
    assert_eq!(moving.status, EquipmentStatus::InTransit);
    assert_eq!(moving.current_location, destination);

    let err = engine
        .arrive(&caller, item.id, EquipmentStatus::Decommissioned)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidTransition(_)));

    let arrived = engine
        .arrive(&caller, item.id, EquipmentStatus::InUse)
        .await
        .unwrap();
    assert_eq!(arrived.status, EquipmentStatus::InUse);
    assert_eq!(
        engine.equipment(&caller, item.id).await.unwrap().status,
        EquipmentStatus::InUse
    );
    assert_eq!(
        event_kinds(&engine, &caller, item.id).await,
        vec![EventKind::Transfer, EventKind::Transfer]
    );

    let err = engine
        .arrive(&caller, item.id, EquipmentStatus::Available)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::StateConflict(_)));
}

#[tokio::test]
async fn decommissioned_equipment_is_sealed() {
    let (engine, _db) = engine_with_db().await;
    let (caller, item) = setup(&engine).await;
    engine
        .register_event(
            &caller,
            item.id,
            RegisterEventCmd::new(EventKind::Inspection, "ok"),
        )
        .await
        .unwrap();
    let retired = engine
        .decommission(&caller, item.id, "end of life")
        .await
        .unwrap();
    assert_eq!(retired.status, EquipmentStatus::Decommissioned);

    let err = engine
        .register_event(
            &caller,
            item.id,
            RegisterEventCmd::new(EventKind::Observation, "still here"),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::StateConflict(_)));
    let err = engine
        .open_maintenance(&caller, item.id, OpenMaintenanceCmd::new("noise"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::StateConflict(_)));
    let err = engine
        .transfer(&caller, item.id, TransferEquipmentCmd::new(warehouse()))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::StateConflict(_)));
    let err = engine
        .new_service_order(
            &caller,
            NewServiceOrderCmd::new(item.company_id, "repair").equipment_id(item.id),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::StateConflict(_)));

    let outcome = engine.reconcile(&caller, item.id).await.unwrap();
    assert!(!outcome.changed);
    assert_eq!(outcome.current, EquipmentStatus::Decommissioned);
    assert_eq!(
        event_kinds(&engine, &caller, item.id).await,
        vec![EventKind::Other, EventKind::Inspection]
    );
}

#[tokio::test]
async fn engine_written_kinds_cannot_be_registered() {
    let (engine, _db) = engine_with_db().await;
    let (caller, item) = setup(&engine).await;

    let err = engine
        .register_event(
            &caller,
            item.id,
            RegisterEventCmd::new(EventKind::MaintenanceOpened, "fake"),
        )
        .await
        .unwrap_err();
    assert!(err.is_validation());
    assert!(event_kinds(&engine, &caller, item.id).await.is_empty());
}

#[tokio::test]
async fn service_orders_are_numbered_and_linked() {
    let (engine, _db) = engine_with_db().await;
    let (caller, item) = setup(&engine).await;

    let first = engine
        .new_service_order(
            &caller,
            NewServiceOrderCmd::new(item.company_id, "repair")
                .equipment_id(item.id)
                .description("paper jam"),
        )
        .await
        .unwrap();
    let second = engine
        .new_service_order(&caller, NewServiceOrderCmd::new(item.company_id, "install"))
        .await
        .unwrap();
    assert_eq!(first.number, 1);
    assert_eq!(second.number, 2);

    let history = engine.lifetime_history(&caller, item.id).await.unwrap();
    assert_eq!(history.total_service_orders, 1);
    assert_eq!(history.total_events, 1);
    assert_eq!(history.timeline.len(), 2);
    assert!(history.timeline.iter().any(|entry| matches!(
        &entry.item,
        TimelineItem::ServiceOrder(order) if order.number == 1
    )));
}

#[tokio::test]
async fn timeline_counts_open_and_closed_maintenances() {
    let (engine, _db) = engine_with_db().await;
    let (caller, item) = setup(&engine).await;

    let record = engine
        .open_maintenance(&caller, item.id, OpenMaintenanceCmd::new("first"))
        .await
        .unwrap();
    engine
        .close_maintenance(&caller, record.id, CloseMaintenanceCmd::default())
        .await
        .unwrap();
    engine
        .open_maintenance(&caller, item.id, OpenMaintenanceCmd::new("second"))
        .await
        .unwrap();
    engine
        .register_event(
            &caller,
            item.id,
            RegisterEventCmd::new(EventKind::Cleaning, "cleaned while waiting"),
        )
        .await
        .unwrap();

    let history = engine.lifetime_history(&caller, item.id).await.unwrap();
    let completed = 1;
    let open = 1;
    assert_eq!(history.total_maintenances, 2);
    assert_eq!(
        history.timeline.len(),
        history.total_events + 2 * completed + open + history.total_service_orders
    );
    assert!(history.timeline.windows(2).all(|w| w[0].at >= w[1].at));
}

#[tokio::test]
async fn reconcile_restores_a_lost_status_write() {
    let (engine, db) = engine_with_db().await;
    let (caller, item) = setup(&engine).await;
    engine
        .open_maintenance(&caller, item.id, OpenMaintenanceCmd::new("noise"))
        .await
        .unwrap();

    let backend = db.get_database_backend();
    db.execute(Statement::from_sql_and_values(
        backend,
        "UPDATE equipment SET status = 'available' WHERE id = ?",
        vec![item.id.to_string().into()],
    ))
    .await
    .unwrap();

    let outcome = engine.reconcile(&caller, item.id).await.unwrap();
    assert!(outcome.changed);
    assert_eq!(outcome.previous, EquipmentStatus::Available);
    assert_eq!(outcome.current, EquipmentStatus::InMaintenance);
    assert_eq!(
        engine.equipment(&caller, item.id).await.unwrap().status,
        EquipmentStatus::InMaintenance
    );

    let again = engine.reconcile(&caller, item.id).await.unwrap();
    assert!(!again.changed);
}

#[tokio::test]
async fn equipment_of_other_tenants_is_not_found() {
    let (engine, _db) = engine_with_db().await;
    let (_, item) = setup(&engine).await;
    let other = engine.new_company("Other", None).await.unwrap();
    let intruder = Caller::operator(other.id);

    assert!(matches!(
        engine.equipment(&intruder, item.id).await,
        Err(EngineError::KeyNotFound(_))
    ));
    assert!(matches!(
        engine.lifetime_history(&intruder, item.id).await,
        Err(EngineError::KeyNotFound(_))
    ));
    assert!(matches!(
        engine
            .open_maintenance(&intruder, item.id, OpenMaintenanceCmd::new("x"))
            .await,
        Err(EngineError::KeyNotFound(_))
    ));
    assert!(engine.equipment_list(&intruder, other.id, None).await.unwrap().is_empty());
}

#[tokio::test]
async fn serials_are_unique_per_company() {
    let (engine, _db) = engine_with_db().await;
    let (caller, item) = setup(&engine).await;

    let err = engine
        .new_equipment(
            &caller,
            NewEquipmentCmd::new(item.company_id, " SN-001 ", "printer", warehouse()),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ExistingKey(_)));

    let listed = engine
        .equipment_list(&caller, item.company_id, Some(EquipmentStatus::Available))
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);
}
