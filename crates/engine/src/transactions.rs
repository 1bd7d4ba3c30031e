//! Transaction primitives.
//!
//! A `Transaction` is one income, expense or transfer document. Its direction
//! is encoded by [`TransactionKind`]; `gross_amount` is never negative. While
//! the transaction is [`TransactionState::Posted`] its [signed
//! effects](Transaction::effects) are included in the referenced accounts'
//! `current_balance`.

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    EngineError, Money, ResultEngine,
    util::{parse_optional_uuid, parse_uuid},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Income,
    Expense,
    Transfer,
}

impl TransactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
            Self::Transfer => "transfer",
        }
    }
}

impl TryFrom<&str> for TransactionKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            "transfer" => Ok(Self::Transfer),
            other => Err(EngineError::InvalidReference(format!(
                "invalid transaction kind: {other}"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionState {
    Pending,
    Posted,
    Void,
}

impl TransactionState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Posted => "posted",
            Self::Void => "void",
        }
    }
}

impl TryFrom<&str> for TransactionState {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "pending" => Ok(Self::Pending),
            "posted" => Ok(Self::Posted),
            "void" => Ok(Self::Void),
            other => Err(EngineError::InvalidReference(format!(
                "invalid transaction state: {other}"
            ))),
        }
    }
}

/// Where a transaction was entered from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionOrigin {
    #[default]
    Manual,
    Import,
    Messaging,
    Extraction,
}

impl TransactionOrigin {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Import => "import",
            Self::Messaging => "messaging",
            Self::Extraction => "extraction",
        }
    }
}

impl TryFrom<&str> for TransactionOrigin {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "manual" => Ok(Self::Manual),
            "import" => Ok(Self::Import),
            "messaging" => Ok(Self::Messaging),
            "extraction" => Ok(Self::Extraction),
            other => Err(EngineError::InvalidReference(format!(
                "invalid transaction origin: {other}"
            ))),
        }
    }
}

/// The contribution of a transaction to one account balance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AccountEffect {
    pub account_id: Uuid,
    pub delta: Money,
}

/// Signed effects of a transaction of `kind` moving `amount`.
///
/// Income credits `account_id`, expense debits it, a transfer debits the
/// source and credits `target_account_id`.
pub fn signed_effects(
    kind: TransactionKind,
    amount: Money,
    account_id: Uuid,
    target_account_id: Option<Uuid>,
) -> Vec<AccountEffect> {
    match kind {
        TransactionKind::Income => vec![AccountEffect {
            account_id,
            delta: amount,
        }],
        TransactionKind::Expense => vec![AccountEffect {
            account_id,
            delta: -amount,
        }],
        TransactionKind::Transfer => {
            let mut out = vec![AccountEffect {
                account_id,
                delta: -amount,
            }];
            if let Some(target) = target_account_id {
                out.push(AccountEffect {
                    account_id: target,
                    delta: amount,
                });
            }
            out
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub company_id: Uuid,
    pub kind: TransactionKind,
    pub supplier_or_payer: Option<String>,
    pub description: Option<String>,
    pub gross_amount: Money,
    pub competence_date: NaiveDate,
    pub posting_date: Option<NaiveDate>,
    pub category_id: Option<Uuid>,
    pub cost_center_id: Option<Uuid>,
    pub account_id: Uuid,
    pub target_account_id: Option<Uuid>,
    pub origin: TransactionOrigin,
    pub state: TransactionState,
    pub revision: i64,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    pub fn is_posted(&self) -> bool {
        self.state == TransactionState::Posted
    }

    /// Signed effects this transaction contributes while posted.
    pub fn effects(&self) -> Vec<AccountEffect> {
        signed_effects(
            self.kind,
            self.gross_amount,
            self.account_id,
            self.target_account_id,
        )
    }

    /// Accounts referenced by this transaction (source first).
    pub fn account_ids(&self) -> Vec<Uuid> {
        let mut out = vec![self.account_id];
        out.extend(self.target_account_id);
        out
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub company_id: String,
    pub kind: String,
    pub supplier_or_payer: Option<String>,
    pub description: Option<String>,
    pub gross_amount: i64,
    pub competence_date: Date,
    pub posting_date: Option<Date>,
    pub category_id: Option<String>,
    pub cost_center_id: Option<String>,
    pub account_id: String,
    pub target_account_id: Option<String>,
    pub origin: String,
    pub state: String,
    pub revision: i64,
    pub created_by: String,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Transaction> for ActiveModel {
    fn from(tx: &Transaction) -> Self {
        Self {
            id: ActiveValue::Set(tx.id.to_string()),
            company_id: ActiveValue::Set(tx.company_id.to_string()),
            kind: ActiveValue::Set(tx.kind.as_str().to_string()),
            supplier_or_payer: ActiveValue::Set(tx.supplier_or_payer.clone()),
            description: ActiveValue::Set(tx.description.clone()),
            gross_amount: ActiveValue::Set(tx.gross_amount.minor()),
            competence_date: ActiveValue::Set(tx.competence_date),
            posting_date: ActiveValue::Set(tx.posting_date),
            category_id: ActiveValue::Set(tx.category_id.map(|id| id.to_string())),
            cost_center_id: ActiveValue::Set(tx.cost_center_id.map(|id| id.to_string())),
            account_id: ActiveValue::Set(tx.account_id.to_string()),
            target_account_id: ActiveValue::Set(tx.target_account_id.map(|id| id.to_string())),
            origin: ActiveValue::Set(tx.origin.as_str().to_string()),
            state: ActiveValue::Set(tx.state.as_str().to_string()),
            revision: ActiveValue::Set(tx.revision),
            created_by: ActiveValue::Set(tx.created_by.clone()),
            created_at: ActiveValue::Set(tx.created_at),
            updated_at: ActiveValue::Set(tx.updated_at),
        }
    }
}

impl TryFrom<Model> for Transaction {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        Ok(Self {
            id: parse_uuid(&model.id, "transaction")?,
            company_id: parse_uuid(&model.company_id, "company")?,
            kind: TransactionKind::try_from(model.kind.as_str())?,
            supplier_or_payer: model.supplier_or_payer,
            description: model.description,
            gross_amount: Money::new(model.gross_amount),
            competence_date: model.competence_date,
            posting_date: model.posting_date,
            category_id: parse_optional_uuid(model.category_id.as_deref(), "category")?,
            cost_center_id: parse_optional_uuid(model.cost_center_id.as_deref(), "cost center")?,
            account_id: parse_uuid(&model.account_id, "bank account")?,
            target_account_id: parse_optional_uuid(
                model.target_account_id.as_deref(),
                "bank account",
            )?,
            origin: TransactionOrigin::try_from(model.origin.as_str())?,
            state: TransactionState::try_from(model.state.as_str())?,
            revision: model.revision,
            created_by: model.created_by,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn income_and_expense_touch_one_account() {
        let a = Uuid::new_v4();
        assert_eq!(
            signed_effects(TransactionKind::Income, Money::new(50_000), a, None),
            vec![AccountEffect {
                account_id: a,
                delta: Money::new(50_000)
            }]
        );
        assert_eq!(
            signed_effects(TransactionKind::Expense, Money::new(30_000), a, None),
            vec![AccountEffect {
                account_id: a,
                delta: Money::new(-30_000)
            }]
        );
    }

    #[test]
    fn transfer_effects_are_equal_and_opposite() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let effects = signed_effects(TransactionKind::Transfer, Money::new(25_000), a, Some(b));
        assert_eq!(effects.len(), 2);
        assert_eq!(effects[0].account_id, a);
        assert_eq!(effects[1].account_id, b);
        assert_eq!(effects[0].delta.try_add(effects[1].delta).unwrap(), Money::ZERO);
    }

    #[test]
    fn kinds_round_trip_through_str() {
        for kind in [
            TransactionKind::Income,
            TransactionKind::Expense,
            TransactionKind::Transfer,
        ] {
            assert_eq!(TransactionKind::try_from(kind.as_str()).unwrap(), kind);
        }
        assert!(TransactionState::try_from("deleted").is_err());
        assert!(TransactionOrigin::try_from("fax").is_err());
    }
}
