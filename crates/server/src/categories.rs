//! Category and cost center endpoints.

use api_types::category::{CategoryKind as ApiKind, CategoryNew, CostCenterNew};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use engine::{Caller, Category, CategoryKind, CostCenter};
use uuid::Uuid;

use crate::{ServerError, server::ServerState};

fn map_api_kind(kind: ApiKind) -> CategoryKind {
    match kind {
        ApiKind::Income => CategoryKind::Income,
        ApiKind::Expense => CategoryKind::Expense,
        ApiKind::Transfer => CategoryKind::Transfer,
    }
}

pub async fn list_categories(
    Extension(caller): Extension<Caller>,
    State(state): State<ServerState>,
    Path(company_id): Path<Uuid>,
) -> Result<Json<Vec<Category>>, ServerError> {
    Ok(Json(state.engine.categories(&caller, company_id).await?))
}

pub async fn create_category(
    Extension(caller): Extension<Caller>,
    State(state): State<ServerState>,
    Path(company_id): Path<Uuid>,
    Json(payload): Json<CategoryNew>,
) -> Result<(StatusCode, Json<Category>), ServerError> {
    let category = state
        .engine
        .new_category(&caller, company_id, &payload.name, map_api_kind(payload.kind))
        .await?;
    Ok((StatusCode::CREATED, Json(category)))
}

pub async fn remove_category(
    Extension(caller): Extension<Caller>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_category(&caller, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_cost_centers(
    Extension(caller): Extension<Caller>,
    State(state): State<ServerState>,
    Path(company_id): Path<Uuid>,
) -> Result<Json<Vec<CostCenter>>, ServerError> {
    Ok(Json(state.engine.cost_centers(&caller, company_id).await?))
}

pub async fn create_cost_center(
    Extension(caller): Extension<Caller>,
    State(state): State<ServerState>,
    Path(company_id): Path<Uuid>,
    Json(payload): Json<CostCenterNew>,
) -> Result<(StatusCode, Json<CostCenter>), ServerError> {
    let center = state
        .engine
        .new_cost_center(&caller, company_id, &payload.name)
        .await?;
    Ok((StatusCode::CREATED, Json(center)))
}

pub async fn remove_cost_center(
    Extension(caller): Extension<Caller>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_cost_center(&caller, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
