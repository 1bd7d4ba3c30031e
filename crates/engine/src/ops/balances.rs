use std::collections::HashMap;

use sea_orm::{ActiveValue, ColumnTrait, Condition};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    AuditEvent, BankAccount, Caller, EngineError, Money, ResultEngine, Transaction,
    TransactionState, bank_accounts, transactions,
};

use super::Engine;

/// A balance rewritten by [`Engine::recompute`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct BalanceCorrection {
    pub account_id: Uuid,
    pub before: Money,
    pub after: Money,
}

impl Engine {
    /// Rebuilds every account balance of a company from the transaction log:
    /// `current_balance := opening_balance + Σ signed effects of posted
    /// transactions`.
    ///
    /// Only accounts whose stored balance differs are written, each with a
    /// compare-and-swap on the balance that was read. On a healthy company
    /// the result is empty.
    pub async fn recompute(
        &self,
        caller: &Caller,
        company_id: Uuid,
    ) -> ResultEngine<Vec<BalanceCorrection>> {
        self.require_company_write(caller, company_id).await?;

        let accounts = self
            .store
            .find::<bank_accounts::Entity>(
                Condition::all().add(bank_accounts::Column::CompanyId.eq(company_id.to_string())),
            )
            .await?
            .into_iter()
            .map(BankAccount::try_from)
            .collect::<ResultEngine<Vec<_>>>()?;

        let posted = self
            .store
            .find::<transactions::Entity>(
                Condition::all()
                    .add(transactions::Column::CompanyId.eq(company_id.to_string()))
                    .add(transactions::Column::State.eq(TransactionState::Posted.as_str())),
            )
            .await?;

        let mut expected: HashMap<Uuid, Money> = accounts
            .iter()
            .map(|account| (account.id, account.opening_balance))
            .collect();
        for model in posted {
            let tx = Transaction::try_from(model)?;
            for effect in tx.effects() {
                match expected.get_mut(&effect.account_id) {
                    Some(balance) => {
                        *balance = balance.try_add(effect.delta)?;
                    }
                    None => tracing::warn!(
                        transaction_id = %tx.id,
                        account_id = %effect.account_id,
                        "posted transaction references a missing account"
                    ),
                }
            }
        }

        let mut corrections = Vec::new();
        for account in accounts {
            let after = expected
                .get(&account.id)
                .copied()
                .unwrap_or(account.opening_balance);
            if after == account.current_balance {
                continue;
            }

            let values = bank_accounts::ActiveModel {
                current_balance: ActiveValue::Set(after.minor()),
                ..Default::default()
            };
            let matched = self
                .store
                .conditional_update::<bank_accounts::Entity, _>(
                    Condition::all()
                        .add(bank_accounts::Column::Id.eq(account.id.to_string()))
                        .add(bank_accounts::Column::CurrentBalance.eq(account.current_balance.minor())),
                    values,
                )
                .await?;
            if matched == 0 {
                return Err(EngineError::StateConflict(format!(
                    "bank account {} changed during recompute",
                    account.id
                )));
            }

            tracing::warn!(
                account_id = %account.id,
                before = %account.current_balance,
                after = %after,
                "balance corrected"
            );
            corrections.push(BalanceCorrection {
                account_id: account.id,
                before: account.current_balance,
                after,
            });
        }

        self.emit(
            AuditEvent::new(
                "balances.recomputed",
                caller.user_id.clone(),
                company_id,
                "company",
                company_id,
            )
            .details(serde_json::json!({ "corrections": corrections })),
        );
        Ok(corrections)
    }
}
