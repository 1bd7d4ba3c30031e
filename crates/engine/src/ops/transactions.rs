//! Transaction writes and the balance effects they carry.
//!
//! Writes are ordered so that an interruption leaves a state `recompute` can
//! repair:
//! - create: insert the document, then apply its effects;
//! - update: apply the net deltas, then persist conditionally on `revision`
//!   (compensating the deltas when the race is lost);
//! - delete/void: claim `posted → void`, reverse the effects, then (delete
//!   only) remove the document.

use std::collections::BTreeMap;

use chrono::Utc;
use sea_orm::{ActiveValue, ColumnTrait, Condition};
use uuid::Uuid;

use crate::{
    AccountEffect, EngineError, Money, ResultEngine, Transaction, TransactionKind,
    TransactionState, bank_accounts, transactions,
};

use super::Engine;

mod create;
mod delete;
mod list;
mod update;

pub use delete::DeleteAck;
pub use list::TransactionListFilter;

/// Per-account sum of `add - remove`, zero entries dropped.
///
/// An amount that no longer fits is [`EngineError::InvalidAmount`].
fn net_deltas(remove: &[AccountEffect], add: &[AccountEffect]) -> ResultEngine<Vec<AccountEffect>> {
    let mut acc: BTreeMap<Uuid, Money> = BTreeMap::new();
    for effect in remove {
        let slot = acc.entry(effect.account_id).or_default();
        *slot = slot.try_sub(effect.delta)?;
    }
    for effect in add {
        let slot = acc.entry(effect.account_id).or_default();
        *slot = slot.try_add(effect.delta)?;
    }
    Ok(acc
        .into_iter()
        .filter(|(_, delta)| !delta.is_zero())
        .map(|(account_id, delta)| AccountEffect { account_id, delta })
        .collect())
}

fn inverse(effects: &[AccountEffect]) -> Vec<AccountEffect> {
    effects
        .iter()
        .map(|e| AccountEffect {
            account_id: e.account_id,
            delta: -e.delta,
        })
        .collect()
}

impl Engine {
    /// Validates the references and amount of a (new or patched) transaction.
    async fn validate_transaction(&self, tx: &Transaction) -> ResultEngine<()> {
        if !tx.gross_amount.is_positive() {
            return Err(EngineError::InvalidAmount(
                "gross_amount must be > 0".to_string(),
            ));
        }
        tx.gross_amount.bounded("gross_amount")?;
        self.require_account_in_company(tx.company_id, tx.account_id)
            .await?;
        match (tx.kind, tx.target_account_id) {
            (TransactionKind::Transfer, None) => {
                return Err(EngineError::InvalidReference(
                    "transfer requires target_account_id".to_string(),
                ));
            }
            (TransactionKind::Transfer, Some(target)) => {
                if target == tx.account_id {
                    return Err(EngineError::InvalidReference(
                        "transfer source and target must differ".to_string(),
                    ));
                }
                self.require_account_in_company(tx.company_id, target)
                    .await?;
            }
            (_, Some(_)) => {
                return Err(EngineError::InvalidReference(
                    "target_account_id is only valid for transfers".to_string(),
                ));
            }
            (_, None) => {}
        }
        if let Some(category_id) = tx.category_id {
            self.require_category_in_company(tx.company_id, category_id)
                .await?;
        }
        if let Some(cost_center_id) = tx.cost_center_id {
            self.require_cost_center_in_company(tx.company_id, cost_center_id)
                .await?;
        }
        Ok(())
    }

    /// Atomically adds `effect.delta` to the account balance.
    ///
    /// Returns `false` when the account does not exist (any more).
    async fn apply_delta(&self, company_id: Uuid, effect: AccountEffect) -> ResultEngine<bool> {
        let matched = self
            .store
            .increment::<bank_accounts::Entity, _>(
                Condition::all()
                    .add(bank_accounts::Column::Id.eq(effect.account_id.to_string()))
                    .add(bank_accounts::Column::CompanyId.eq(company_id.to_string())),
                bank_accounts::Column::CurrentBalance,
                effect.delta.minor(),
            )
            .await?;
        Ok(matched > 0)
    }

    /// Applies effects one by one, logging (never returning) what could not
    /// be applied. Returns `true` when every effect landed.
    async fn apply_effects_logged(
        &self,
        operation: &'static str,
        company_id: Uuid,
        effects: &[AccountEffect],
    ) -> bool {
        let mut all = true;
        for effect in effects {
            match self.apply_delta(company_id, *effect).await {
                Ok(true) => {}
                Ok(false) => {
                    all = false;
                    self.ledger_lag(
                        operation,
                        &format!("bank account {} missing", effect.account_id),
                    );
                }
                Err(err) => {
                    all = false;
                    self.ledger_lag(
                        operation,
                        &format!("bank account {}: {err}", effect.account_id),
                    );
                }
            }
        }
        all
    }

    /// Moves a posted transaction to `void` if nobody else touched it since
    /// it was loaded. `false` means the race was lost.
    async fn claim_posted(&self, tx: &Transaction) -> ResultEngine<bool> {
        let values = transactions::ActiveModel {
            state: ActiveValue::Set(TransactionState::Void.as_str().to_string()),
            revision: ActiveValue::Set(tx.revision + 1),
            updated_at: ActiveValue::Set(Utc::now()),
            ..Default::default()
        };
        let matched = self
            .store
            .conditional_update::<transactions::Entity, _>(
                Condition::all()
                    .add(transactions::Column::Id.eq(tx.id.to_string()))
                    .add(transactions::Column::State.eq(TransactionState::Posted.as_str()))
                    .add(transactions::Column::Revision.eq(tx.revision)),
                values,
            )
            .await?;
        Ok(matched > 0)
    }

    /// Reverses the effects of a claimed transaction.
    ///
    /// Returns `true` only if every referenced account exists and received
    /// its reversal. A zero-amount effect counts as reversed when the account
    /// exists.
    async fn reverse_effects(&self, operation: &'static str, tx: &Transaction) -> bool {
        let mut all = true;
        for effect in inverse(&tx.effects()) {
            let outcome = if effect.delta.is_zero() {
                self.require_account_in_company(tx.company_id, effect.account_id)
                    .await
                    .map(|_| true)
                    .or_else(|err| match err {
                        EngineError::InvalidReference(_) => Ok(false),
                        other => Err(other),
                    })
            } else {
                self.apply_delta(tx.company_id, effect).await
            };
            match outcome {
                Ok(true) => {}
                Ok(false) => {
                    all = false;
                    tracing::warn!(
                        transaction_id = %tx.id,
                        account_id = %effect.account_id,
                        "account gone, reversal skipped"
                    );
                }
                Err(err) => {
                    all = false;
                    self.ledger_lag(
                        operation,
                        &format!(
                            "reversal of {} on {} failed: {err}",
                            tx.id, effect.account_id
                        ),
                    );
                }
            }
        }
        all
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn effect(account_id: Uuid, minor: i64) -> AccountEffect {
        AccountEffect {
            account_id,
            delta: Money::new(minor),
        }
    }

    #[test]
    fn kind_flip_doubles_the_delta() {
        let a = Uuid::new_v4();
        let deltas = net_deltas(&[effect(a, 10_000)], &[effect(a, -10_000)]).unwrap();
        assert_eq!(deltas, vec![effect(a, -20_000)]);
    }

    #[test]
    fn account_move_reverses_old_and_applies_new() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let mut deltas = net_deltas(&[effect(a, 5_000)], &[effect(b, 5_000)]).unwrap();
        deltas.sort_by_key(|e| e.account_id);
        let mut expected = vec![effect(a, -5_000), effect(b, 5_000)];
        expected.sort_by_key(|e| e.account_id);
        assert_eq!(deltas, expected);
    }

    #[test]
    fn unchanged_effects_cancel_out() {
        let a = Uuid::new_v4();
        assert!(net_deltas(&[effect(a, 700)], &[effect(a, 700)]).unwrap().is_empty());
    }

    #[test]
    fn inverse_negates_every_effect() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert_eq!(
            inverse(&[effect(a, -250), effect(b, 250)]),
            vec![effect(a, 250), effect(b, -250)]
        );
    }

    #[test]
    fn kind_flip_beyond_i64_is_rejected() {
        let a = Uuid::new_v4();
        let huge = i64::MAX / 2 + 1;
        let err = net_deltas(&[effect(a, huge)], &[effect(a, -huge)]).unwrap_err();
        assert!(matches!(err, EngineError::InvalidAmount(_)));
    }

    #[test]
    fn kind_flip_at_the_amount_limit_fits() {
        let a = Uuid::new_v4();
        let max = Money::MAX_AMOUNT.minor();
        let deltas = net_deltas(&[effect(a, max)], &[effect(a, -max)]).unwrap();
        assert_eq!(deltas, vec![effect(a, -2 * max)]);
    }
}
