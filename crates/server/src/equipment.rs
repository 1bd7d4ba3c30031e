//! Equipment registry, maintenance, transfers and lifetime history.
//!
//! Responses are the engine's own serializable records.

use api_types::equipment::{
    ArrivalRequest, DecommissionRequest, EquipmentListQuery, EquipmentNew,
    EquipmentStatus as ApiStatus, EventNew, LocationBody, LocationKind as ApiLocationKind,
    MaintenanceClose, MaintenanceOpen, ManualEventKind, ServiceOrderNew, TransferRequest,
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use engine::{
    Caller, CloseMaintenanceCmd, Equipment, EquipmentEvent, EquipmentStatus, EventKind,
    LifetimeHistory, Location, LocationKind, MaintenanceRecord, NewEquipmentCmd,
    NewServiceOrderCmd, OpenMaintenanceCmd, ReconcileOutcome, RegisterEventCmd, ServiceOrder,
    TransferEquipmentCmd,
};
use uuid::Uuid;

use crate::{ServerError, parse_optional_money, server::ServerState};

fn map_api_status(status: ApiStatus) -> EquipmentStatus {
    match status {
        ApiStatus::Available => EquipmentStatus::Available,
        ApiStatus::InUse => EquipmentStatus::InUse,
        ApiStatus::InMaintenance => EquipmentStatus::InMaintenance,
        ApiStatus::InTransit => EquipmentStatus::InTransit,
        ApiStatus::Decommissioned => EquipmentStatus::Decommissioned,
    }
}

fn map_api_location_kind(kind: ApiLocationKind) -> LocationKind {
    match kind {
        ApiLocationKind::Warehouse => LocationKind::Warehouse,
        ApiLocationKind::Customer => LocationKind::Customer,
        ApiLocationKind::Technician => LocationKind::Technician,
    }
}

fn map_event_kind(kind: ManualEventKind) -> EventKind {
    match kind {
        ManualEventKind::Observation => EventKind::Observation,
        ManualEventKind::Inspection => EventKind::Inspection,
        ManualEventKind::Adjustment => EventKind::Adjustment,
        ManualEventKind::PartSwap => EventKind::PartSwap,
        ManualEventKind::Cleaning => EventKind::Cleaning,
        ManualEventKind::Warranty => EventKind::Warranty,
        ManualEventKind::Other => EventKind::Other,
    }
}

fn location(body: LocationBody) -> Location {
    Location {
        kind: map_api_location_kind(body.kind),
        ref_id: body.ref_id,
        name: body.name,
    }
}

pub async fn list(
    Extension(caller): Extension<Caller>,
    State(state): State<ServerState>,
    Path(company_id): Path<Uuid>,
    Query(query): Query<EquipmentListQuery>,
) -> Result<Json<Vec<Equipment>>, ServerError> {
    let items = state
        .engine
        .equipment_list(&caller, company_id, query.status.map(map_api_status))
        .await?;
    Ok(Json(items))
}

pub async fn create(
    Extension(caller): Extension<Caller>,
    State(state): State<ServerState>,
    Path(company_id): Path<Uuid>,
    Json(payload): Json<EquipmentNew>,
) -> Result<(StatusCode, Json<Equipment>), ServerError> {
    let cmd = NewEquipmentCmd::new(
        company_id,
        payload.serial,
        payload.equipment_type,
        location(payload.location),
    )
    .brand(payload.brand)
    .model(payload.model);

    let item = state.engine.new_equipment(&caller, cmd).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

pub async fn get(
    Extension(caller): Extension<Caller>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Equipment>, ServerError> {
    Ok(Json(state.engine.equipment(&caller, id).await?))
}

pub async fn open_maintenance(
    Extension(caller): Extension<Caller>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<MaintenanceOpen>,
) -> Result<(StatusCode, Json<MaintenanceRecord>), ServerError> {
    let cmd = OpenMaintenanceCmd {
        reported_fault: payload.reported_fault,
        diagnosis: payload.diagnosis,
        estimated_cost: parse_optional_money(payload.estimated_cost.as_deref())?,
        notes: payload.notes,
    };

    let record = state.engine.open_maintenance(&caller, id, cmd).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn close_maintenance(
    Extension(caller): Extension<Caller>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    payload: Option<Json<MaintenanceClose>>,
) -> Result<Json<MaintenanceRecord>, ServerError> {
    let payload = payload.map(|Json(payload)| payload).unwrap_or_default();
    let cmd = CloseMaintenanceCmd {
        service_performed: payload.service_performed,
        final_cost: parse_optional_money(payload.final_cost.as_deref())?,
        notes: payload.notes,
        new_status: payload.new_status.map(map_api_status),
    };

    let record = state.engine.close_maintenance(&caller, id, cmd).await?;
    Ok(Json(record))
}

pub async fn register_event(
    Extension(caller): Extension<Caller>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<EventNew>,
) -> Result<(StatusCode, Json<EquipmentEvent>), ServerError> {
    let cmd = RegisterEventCmd::new(map_event_kind(payload.kind), payload.description);
    let event = state.engine.register_event(&caller, id, cmd).await?;
    Ok((StatusCode::CREATED, Json(event)))
}

pub async fn transfer(
    Extension(caller): Extension<Caller>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<TransferRequest>,
) -> Result<Json<Equipment>, ServerError> {
    let mut cmd = TransferEquipmentCmd::new(Location {
        kind: map_api_location_kind(payload.destination_kind),
        ref_id: payload.destination_ref,
        name: payload.destination_name,
    });
    if let Some(reason) = payload.reason {
        cmd = cmd.reason(reason);
    }

    Ok(Json(state.engine.transfer(&caller, id, cmd).await?))
}

pub async fn arrive(
    Extension(caller): Extension<Caller>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ArrivalRequest>,
) -> Result<Json<Equipment>, ServerError> {
    let item = state
        .engine
        .arrive(&caller, id, map_api_status(payload.status))
        .await?;
    Ok(Json(item))
}

pub async fn decommission(
    Extension(caller): Extension<Caller>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    payload: Option<Json<DecommissionRequest>>,
) -> Result<Json<Equipment>, ServerError> {
    let payload = payload.map(|Json(payload)| payload).unwrap_or_default();
    let item = state
        .engine
        .decommission(&caller, id, &payload.reason)
        .await?;
    Ok(Json(item))
}

pub async fn reconcile(
    Extension(caller): Extension<Caller>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ReconcileOutcome>, ServerError> {
    Ok(Json(state.engine.reconcile(&caller, id).await?))
}

pub async fn history(
    Extension(caller): Extension<Caller>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<LifetimeHistory>, ServerError> {
    Ok(Json(state.engine.lifetime_history(&caller, id).await?))
}

pub async fn new_service_order(
    Extension(caller): Extension<Caller>,
    State(state): State<ServerState>,
    Path(company_id): Path<Uuid>,
    Json(payload): Json<ServiceOrderNew>,
) -> Result<(StatusCode, Json<ServiceOrder>), ServerError> {
    let mut cmd = NewServiceOrderCmd::new(company_id, payload.service_type);
    cmd.equipment_id = payload.equipment_id;
    cmd.description = payload.description;

    let order = state.engine.new_service_order(&caller, cmd).await?;
    Ok((StatusCode::CREATED, Json(order)))
}
