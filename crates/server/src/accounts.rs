//! Bank account endpoints and balance recomputation.

use api_types::account::{
    AccountKind as ApiKind, BalanceCorrectionView, BankAccountList, BankAccountNew,
    BankAccountView, RecomputeResponse,
};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use engine::{AccountKind, BankAccount, BalanceCorrection, Caller, NewBankAccountCmd};
use uuid::Uuid;

use crate::{ServerError, parse_optional_money, server::ServerState};

fn map_kind(kind: AccountKind) -> ApiKind {
    match kind {
        AccountKind::Checking => ApiKind::Checking,
        AccountKind::Savings => ApiKind::Savings,
        AccountKind::Cash => ApiKind::Cash,
        AccountKind::Credit => ApiKind::Credit,
    }
}

fn map_api_kind(kind: ApiKind) -> AccountKind {
    match kind {
        ApiKind::Checking => AccountKind::Checking,
        ApiKind::Savings => AccountKind::Savings,
        ApiKind::Cash => AccountKind::Cash,
        ApiKind::Credit => AccountKind::Credit,
    }
}

fn view(account: BankAccount) -> BankAccountView {
    BankAccountView {
        id: account.id,
        company_id: account.company_id,
        name: account.name,
        kind: map_kind(account.kind),
        opening_balance: account.opening_balance.to_string(),
        current_balance: account.current_balance.to_string(),
    }
}

fn correction_view(correction: BalanceCorrection) -> BalanceCorrectionView {
    BalanceCorrectionView {
        account_id: correction.account_id,
        before: correction.before.to_string(),
        after: correction.after.to_string(),
    }
}

pub async fn list(
    Extension(caller): Extension<Caller>,
    State(state): State<ServerState>,
    Path(company_id): Path<Uuid>,
) -> Result<Json<BankAccountList>, ServerError> {
    let accounts = state.engine.bank_accounts(&caller, company_id).await?;
    Ok(Json(BankAccountList {
        accounts: accounts.into_iter().map(view).collect(),
    }))
}

pub async fn create(
    Extension(caller): Extension<Caller>,
    State(state): State<ServerState>,
    Path(company_id): Path<Uuid>,
    Json(payload): Json<BankAccountNew>,
) -> Result<(StatusCode, Json<BankAccountView>), ServerError> {
    let mut cmd = NewBankAccountCmd::new(company_id, payload.name, map_api_kind(payload.kind));
    if let Some(opening) = parse_optional_money(payload.opening_balance.as_deref())? {
        cmd = cmd.opening_balance(opening);
    }

    let account = state.engine.new_bank_account(&caller, cmd).await?;
    Ok((StatusCode::CREATED, Json(view(account))))
}

pub async fn remove(
    Extension(caller): Extension<Caller>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_bank_account(&caller, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn recompute(
    Extension(caller): Extension<Caller>,
    State(state): State<ServerState>,
    Path(company_id): Path<Uuid>,
) -> Result<Json<RecomputeResponse>, ServerError> {
    let corrections = state.engine.recompute(&caller, company_id).await?;
    Ok(Json(RecomputeResponse {
        corrections: corrections.into_iter().map(correction_view).collect(),
    }))
}
