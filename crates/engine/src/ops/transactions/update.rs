use chrono::Utc;
use sea_orm::{ActiveValue, ColumnTrait, Condition};
use uuid::Uuid;

use crate::{
    AccountEffect, AuditEvent, Caller, EngineError, ResultEngine, Transaction, TransactionKind,
    TransactionPatch, TransactionState, transactions, util::normalize_optional_text,
};

use super::super::Engine;
use super::{inverse, net_deltas};

fn apply_patch(tx: &mut Transaction, patch: TransactionPatch) {
    if let Some(kind) = patch.kind {
        tx.kind = kind;
    }
    if let Some(amount) = patch.gross_amount {
        tx.gross_amount = amount;
    }
    if let Some(date) = patch.competence_date {
        tx.competence_date = date;
    }
    if let Some(date) = patch.posting_date {
        tx.posting_date = Some(date);
    }
    if let Some(account_id) = patch.account_id {
        tx.account_id = account_id;
    }
    if let Some(target) = patch.target_account_id {
        tx.target_account_id = Some(target);
    }
    if tx.kind != TransactionKind::Transfer {
        tx.target_account_id = None;
    }
    if let Some(category_id) = patch.category_id {
        tx.category_id = Some(category_id);
    }
    if let Some(cost_center_id) = patch.cost_center_id {
        tx.cost_center_id = Some(cost_center_id);
    }
    if let Some(value) = patch.supplier_or_payer {
        tx.supplier_or_payer = normalize_optional_text(Some(&value));
    }
    if let Some(value) = patch.description {
        tx.description = normalize_optional_text(Some(&value));
    }
}

impl Engine {
    /// Applies a partial update.
    ///
    /// For a posted transaction the per-account difference between the old
    /// and new signed effects is applied first; the document is then written
    /// only if its `revision` is still the one loaded. A lost race undoes the
    /// deltas and returns [`EngineError::StateConflict`].
    pub async fn update_transaction(
        &self,
        caller: &Caller,
        id: Uuid,
        patch: TransactionPatch,
    ) -> ResultEngine<Transaction> {
        let model = self.load_transaction(caller, id).await?;
        caller.require_write()?;
        let old = Transaction::try_from(model)?;
        if old.state == TransactionState::Void {
            return Err(EngineError::StateConflict(
                "void transaction cannot be updated".to_string(),
            ));
        }

        let mut new = old.clone();
        apply_patch(&mut new, patch);
        self.validate_transaction(&new).await?;
        new.revision = old.revision + 1;
        new.updated_at = Utc::now();

        let deltas = if old.is_posted() {
            net_deltas(&old.effects(), &new.effects())?
        } else {
            Vec::new()
        };

        let mut applied: Vec<AccountEffect> = Vec::with_capacity(deltas.len());
        for delta in &deltas {
            match self.apply_delta(new.company_id, *delta).await {
                Ok(true) => applied.push(*delta),
                Ok(false) => {
                    self.undo_deltas(new.company_id, &applied).await;
                    return Err(EngineError::InvalidReference(format!(
                        "bank account {} not in company",
                        delta.account_id
                    )));
                }
                Err(err) => {
                    self.undo_deltas(new.company_id, &applied).await;
                    return Err(err);
                }
            }
        }

        let mut values = transactions::ActiveModel::from(&new);
        values.id = ActiveValue::NotSet;
        let persisted = self
            .store
            .conditional_update::<transactions::Entity, _>(
                Condition::all()
                    .add(transactions::Column::Id.eq(id.to_string()))
                    .add(transactions::Column::Revision.eq(old.revision)),
                values,
            )
            .await;

        match persisted {
            Ok(0) => {
                self.undo_deltas(new.company_id, &applied).await;
                return Err(EngineError::StateConflict(
                    "transaction was modified concurrently".to_string(),
                ));
            }
            Ok(_) => {}
            Err(err) => {
                self.undo_deltas(new.company_id, &applied).await;
                return Err(err);
            }
        }

        self.emit(
            AuditEvent::new(
                "transaction.updated",
                caller.user_id.clone(),
                new.company_id,
                "transaction",
                new.id,
            )
            .details(serde_json::json!({
                "revision": new.revision,
                "deltas": applied
                    .iter()
                    .map(|d| serde_json::json!({"account_id": d.account_id, "delta": d.delta}))
                    .collect::<Vec<_>>(),
            })),
        );
        Ok(new)
    }

    /// Best-effort compensation of deltas applied by an aborted update.
    async fn undo_deltas(&self, company_id: Uuid, applied: &[AccountEffect]) {
        if applied.is_empty() {
            return;
        }
        self.apply_effects_logged("update.compensate", company_id, &inverse(applied))
            .await;
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::{Money, TransactionOrigin};

    fn income() -> Transaction {
        let now = Utc::now();
        Transaction {
            id: Uuid::now_v7(),
            company_id: Uuid::new_v4(),
            kind: TransactionKind::Income,
            supplier_or_payer: Some("ACME".to_string()),
            description: None,
            gross_amount: Money::new(10_000),
            competence_date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            posting_date: None,
            category_id: None,
            cost_center_id: None,
            account_id: Uuid::new_v4(),
            target_account_id: None,
            origin: TransactionOrigin::Manual,
            state: TransactionState::Posted,
            revision: 0,
            created_by: "u1".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn absent_fields_are_unchanged() {
        let mut tx = income();
        let before = tx.clone();
        apply_patch(&mut tx, TransactionPatch::default());
        assert_eq!(tx, before);
    }

    #[test]
    fn leaving_transfer_clears_the_target() {
        let mut tx = income();
        let target = Uuid::new_v4();
        apply_patch(
            &mut tx,
            TransactionPatch::default()
                .kind(TransactionKind::Transfer)
                .target_account_id(target),
        );
        assert_eq!(tx.target_account_id, Some(target));
        apply_patch(&mut tx, TransactionPatch::default().kind(TransactionKind::Expense));
        assert_eq!(tx.target_account_id, None);
    }

    #[test]
    fn blank_description_clears_it() {
        let mut tx = income();
        apply_patch(&mut tx, TransactionPatch::default().description("  "));
        assert_eq!(tx.description, None);
    }
}
