use base64::Engine as _;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use sea_orm::{Condition, QueryFilter, QueryOrder, QuerySelect, prelude::*};

use crate::{
    Caller, EngineError, ResultEngine, Transaction, TransactionKind, TransactionState,
    transactions,
};

use super::super::Engine;

const MAX_PAGE: u64 = 500;

/// Filters for listing transactions.
///
/// `from` and `to` are inclusive competence dates.
#[derive(Clone, Debug, Default)]
pub struct TransactionListFilter {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    /// Matches the source or the target account.
    pub account_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub state: Option<TransactionState>,
    pub kind: Option<TransactionKind>,
}

fn validate_list_filter(filter: &TransactionListFilter) -> ResultEngine<()> {
    if let (Some(from), Some(to)) = (filter.from, filter.to)
        && from > to
    {
        return Err(EngineError::InvalidReference(
            "invalid range: from must be <= to".to_string(),
        ));
    }
    Ok(())
}

trait ApplyTxFilters: QueryFilter + Sized {
    fn apply_tx_filters(self, filter: &TransactionListFilter) -> Self;
}

impl<T> ApplyTxFilters for T
where
    T: QueryFilter + Sized,
{
    fn apply_tx_filters(mut self, filter: &TransactionListFilter) -> Self {
        if let Some(from) = filter.from {
            self = self.filter(transactions::Column::CompetenceDate.gte(from));
        }
        if let Some(to) = filter.to {
            self = self.filter(transactions::Column::CompetenceDate.lte(to));
        }
        if let Some(account_id) = filter.account_id {
            self = self.filter(
                Condition::any()
                    .add(transactions::Column::AccountId.eq(account_id.to_string()))
                    .add(transactions::Column::TargetAccountId.eq(account_id.to_string())),
            );
        }
        if let Some(category_id) = filter.category_id {
            self = self.filter(transactions::Column::CategoryId.eq(category_id.to_string()));
        }
        if let Some(state) = filter.state {
            self = self.filter(transactions::Column::State.eq(state.as_str()));
        }
        if let Some(kind) = filter.kind {
            self = self.filter(transactions::Column::Kind.eq(kind.as_str()));
        }
        self
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct TransactionsCursor {
    competence_date: NaiveDate,
    transaction_id: String,
}

impl TransactionsCursor {
    fn encode(&self) -> ResultEngine<String> {
        let bytes = serde_json::to_vec(self)
            .map_err(|_| EngineError::InvalidCursor("invalid transactions cursor".to_string()))?;
        Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes))
    }

    fn decode(input: &str) -> ResultEngine<Self> {
        let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(input.as_bytes())
            .map_err(|_| EngineError::InvalidCursor("invalid transactions cursor".to_string()))?;
        serde_json::from_slice::<Self>(&bytes)
            .map_err(|_| EngineError::InvalidCursor("invalid transactions cursor".to_string()))
    }
}

impl Engine {
    /// Lists a company's transactions with cursor-based pagination.
    ///
    /// Pagination is newest → older by `(competence_date DESC, id DESC)`.
    /// Returns the page and the cursor of the next one, if any.
    pub async fn list_transactions(
        &self,
        caller: &Caller,
        company_id: Uuid,
        filter: &TransactionListFilter,
        limit: u64,
        cursor: Option<&str>,
    ) -> ResultEngine<(Vec<Transaction>, Option<String>)> {
        self.require_company(caller, company_id).await?;
        validate_list_filter(filter)?;

        let limit = limit.clamp(1, MAX_PAGE);
        let mut query = transactions::Entity::find()
            .filter(transactions::Column::CompanyId.eq(company_id.to_string()))
            .apply_tx_filters(filter);

        if let Some(cursor) = cursor {
            let cursor = TransactionsCursor::decode(cursor)?;
            query = query.filter(
                Condition::any()
                    .add(transactions::Column::CompetenceDate.lt(cursor.competence_date))
                    .add(
                        Condition::all()
                            .add(transactions::Column::CompetenceDate.eq(cursor.competence_date))
                            .add(transactions::Column::Id.lt(cursor.transaction_id)),
                    ),
            );
        }

        let mut models = query
            .order_by_desc(transactions::Column::CompetenceDate)
            .order_by_desc(transactions::Column::Id)
            .limit(limit.saturating_add(1))
            .all(self.store.connection())
            .await?;

        let has_more = models.len() as u64 > limit;
        models.truncate(limit as usize);

        let next = match (has_more, models.last()) {
            (true, Some(last)) => Some(
                TransactionsCursor {
                    competence_date: last.competence_date,
                    transaction_id: last.id.clone(),
                }
                .encode()?,
            ),
            _ => None,
        };

        let items = models
            .into_iter()
            .map(Transaction::try_from)
            .collect::<ResultEngine<Vec<_>>>()?;
        Ok((items, next))
    }
}
