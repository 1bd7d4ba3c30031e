use api_types::dashboard::{DashboardQuery, DashboardView};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use engine::{Caller, DashboardWindow};
use uuid::Uuid;

use crate::{ServerError, server::ServerState};

pub async fn get(
    Extension(caller): Extension<Caller>,
    State(state): State<ServerState>,
    Path(company_id): Path<Uuid>,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<DashboardView>, ServerError> {
    let window = DashboardWindow {
        from: query.from,
        to: query.to,
    };
    let dashboard = state.engine.dashboard(&caller, company_id, window).await?;

    Ok(Json(DashboardView {
        total_income: dashboard.total_income.to_string(),
        total_expense: dashboard.total_expense.to_string(),
        net: dashboard.net.to_string(),
        sum_account_balances: dashboard.sum_account_balances.to_string(),
    }))
}
