//! Transactions API endpoints

use api_types::transaction::{
    TransactionDeleted, TransactionKind as ApiKind, TransactionListQuery,
    TransactionListResponse, TransactionNew, TransactionOrigin as ApiOrigin,
    TransactionState as ApiState, TransactionUpdate, TransactionView,
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use engine::{
    Caller, NewTransactionCmd, Transaction, TransactionKind, TransactionListFilter,
    TransactionOrigin, TransactionPatch, TransactionState,
};
use uuid::Uuid;

use crate::{ServerError, parse_money, parse_optional_money, server::ServerState};

const DEFAULT_PAGE: u64 = 50;

fn map_kind(kind: TransactionKind) -> ApiKind {
    match kind {
        TransactionKind::Income => ApiKind::Income,
        TransactionKind::Expense => ApiKind::Expense,
        TransactionKind::Transfer => ApiKind::Transfer,
    }
}

fn map_api_kind(kind: ApiKind) -> TransactionKind {
    match kind {
        ApiKind::Income => TransactionKind::Income,
        ApiKind::Expense => TransactionKind::Expense,
        ApiKind::Transfer => TransactionKind::Transfer,
    }
}

fn map_state(state: TransactionState) -> ApiState {
    match state {
        TransactionState::Pending => ApiState::Pending,
        TransactionState::Posted => ApiState::Posted,
        TransactionState::Void => ApiState::Void,
    }
}

fn map_api_state(state: ApiState) -> TransactionState {
    match state {
        ApiState::Pending => TransactionState::Pending,
        ApiState::Posted => TransactionState::Posted,
        ApiState::Void => TransactionState::Void,
    }
}

fn map_origin(origin: TransactionOrigin) -> ApiOrigin {
    match origin {
        TransactionOrigin::Manual => ApiOrigin::Manual,
        TransactionOrigin::Import => ApiOrigin::Import,
        TransactionOrigin::Messaging => ApiOrigin::Messaging,
        TransactionOrigin::Extraction => ApiOrigin::Extraction,
    }
}

fn map_api_origin(origin: ApiOrigin) -> TransactionOrigin {
    match origin {
        ApiOrigin::Manual => TransactionOrigin::Manual,
        ApiOrigin::Import => TransactionOrigin::Import,
        ApiOrigin::Messaging => TransactionOrigin::Messaging,
        ApiOrigin::Extraction => TransactionOrigin::Extraction,
    }
}

fn view(tx: Transaction) -> TransactionView {
    TransactionView {
        id: tx.id,
        company_id: tx.company_id,
        kind: map_kind(tx.kind),
        state: map_state(tx.state),
        origin: map_origin(tx.origin),
        gross_amount: tx.gross_amount.to_string(),
        competence_date: tx.competence_date,
        posting_date: tx.posting_date,
        account_id: tx.account_id,
        target_account_id: tx.target_account_id,
        category_id: tx.category_id,
        cost_center_id: tx.cost_center_id,
        supplier_or_payer: tx.supplier_or_payer,
        description: tx.description,
        revision: tx.revision,
    }
}

pub async fn list(
    Extension(caller): Extension<Caller>,
    State(state): State<ServerState>,
    Path(company_id): Path<Uuid>,
    Query(query): Query<TransactionListQuery>,
) -> Result<Json<TransactionListResponse>, ServerError> {
    let filter = TransactionListFilter {
        from: query.from,
        to: query.to,
        account_id: query.account_id,
        category_id: query.category_id,
        state: query.state.map(map_api_state),
        kind: query.kind.map(map_api_kind),
    };

    let (txs, next_cursor) = state
        .engine
        .list_transactions(
            &caller,
            company_id,
            &filter,
            query.limit.unwrap_or(DEFAULT_PAGE),
            query.cursor.as_deref(),
        )
        .await?;

    Ok(Json(TransactionListResponse {
        transactions: txs.into_iter().map(view).collect(),
        next_cursor,
    }))
}

pub async fn create(
    Extension(caller): Extension<Caller>,
    State(state): State<ServerState>,
    Path(company_id): Path<Uuid>,
    Json(payload): Json<TransactionNew>,
) -> Result<(StatusCode, Json<TransactionView>), ServerError> {
    let mut cmd = NewTransactionCmd::new(
        company_id,
        map_api_kind(payload.kind),
        parse_money(&payload.gross_amount)?,
        payload.competence_date,
        payload.account_id,
    );
    cmd.target_account_id = payload.target_account_id;
    cmd.posting_date = payload.posting_date;
    cmd.category_id = payload.category_id;
    cmd.cost_center_id = payload.cost_center_id;
    cmd.supplier_or_payer = payload.supplier_or_payer;
    cmd.description = payload.description;
    if let Some(origin) = payload.origin {
        cmd = cmd.origin(map_api_origin(origin));
    }

    let tx = state.engine.create_transaction(&caller, cmd).await?;
    Ok((StatusCode::CREATED, Json(view(tx))))
}

pub async fn update(
    Extension(caller): Extension<Caller>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<TransactionUpdate>,
) -> Result<Json<TransactionView>, ServerError> {
    let patch = TransactionPatch {
        kind: payload.kind.map(map_api_kind),
        gross_amount: parse_optional_money(payload.gross_amount.as_deref())?,
        competence_date: payload.competence_date,
        posting_date: payload.posting_date,
        account_id: payload.account_id,
        target_account_id: payload.target_account_id,
        category_id: payload.category_id,
        cost_center_id: payload.cost_center_id,
        supplier_or_payer: payload.supplier_or_payer,
        description: payload.description,
    };

    let tx = state.engine.update_transaction(&caller, id, patch).await?;
    Ok(Json(view(tx)))
}

pub async fn remove(
    Extension(caller): Extension<Caller>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TransactionDeleted>, ServerError> {
    let ack = state.engine.delete_transaction(&caller, id).await?;
    Ok(Json(TransactionDeleted {
        ok: true,
        balance_reversed: ack.balance_reversed,
    }))
}

pub async fn void_tx(
    Extension(caller): Extension<Caller>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TransactionView>, ServerError> {
    let tx = state.engine.void_transaction(&caller, id).await?;
    Ok(Json(view(tx)))
}
