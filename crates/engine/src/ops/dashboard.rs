use chrono::NaiveDate;
use sea_orm::{QueryFilter, QuerySelect, prelude::*, sea_query::Expr};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    Caller, EngineError, Money, ResultEngine, TransactionKind, TransactionState, bank_accounts,
    transactions,
};

use super::Engine;

/// Inclusive competence-date window. Open ends are unbounded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DashboardWindow {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Dashboard {
    pub total_income: Money,
    pub total_expense: Money,
    /// `total_income - total_expense`.
    pub net: Money,
    /// Sum of every account's `current_balance`, window ignored.
    pub sum_account_balances: Money,
}

impl Engine {
    /// Aggregates posted income and expense inside `window` plus the sum of
    /// the company's account balances. Transfers move money between accounts
    /// and count as neither.
    pub async fn dashboard(
        &self,
        caller: &Caller,
        company_id: Uuid,
        window: DashboardWindow,
    ) -> ResultEngine<Dashboard> {
        self.require_company(caller, company_id).await?;
        if let (Some(from), Some(to)) = (window.from, window.to)
            && from > to
        {
            return Err(EngineError::InvalidReference(
                "invalid range: from must be <= to".to_string(),
            ));
        }

        let mut query = transactions::Entity::find()
            .select_only()
            .column(transactions::Column::Kind)
            .column_as(Expr::col(transactions::Column::GrossAmount).sum(), "total")
            .filter(transactions::Column::CompanyId.eq(company_id.to_string()))
            .filter(transactions::Column::State.eq(TransactionState::Posted.as_str()))
            .filter(transactions::Column::Kind.is_in([
                TransactionKind::Income.as_str(),
                TransactionKind::Expense.as_str(),
            ]));
        if let Some(from) = window.from {
            query = query.filter(transactions::Column::CompetenceDate.gte(from));
        }
        if let Some(to) = window.to {
            query = query.filter(transactions::Column::CompetenceDate.lte(to));
        }
        let totals = query
            .group_by(transactions::Column::Kind)
            .into_tuple::<(String, Option<i64>)>()
            .all(self.store.connection())
            .await?;

        let mut total_income = Money::ZERO;
        let mut total_expense = Money::ZERO;
        for (kind, total) in totals {
            let total = Money::new(total.unwrap_or(0));
            match TransactionKind::try_from(kind.as_str())? {
                TransactionKind::Income => total_income = total,
                TransactionKind::Expense => total_expense = total,
                TransactionKind::Transfer => {}
            }
        }

        let sum_account_balances = bank_accounts::Entity::find()
            .select_only()
            .column_as(
                Expr::col(bank_accounts::Column::CurrentBalance).sum(),
                "total",
            )
            .filter(bank_accounts::Column::CompanyId.eq(company_id.to_string()))
            .into_tuple::<Option<i64>>()
            .one(self.store.connection())
            .await?
            .flatten()
            .map(Money::new)
            .unwrap_or(Money::ZERO);

        Ok(Dashboard {
            total_income,
            total_expense,
            net: total_income.try_sub(total_expense)?,
            sum_account_balances,
        })
    }
}
