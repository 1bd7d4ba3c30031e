use chrono::Utc;
use uuid::Uuid;

use crate::{
    AuditEvent, Caller, NewTransactionCmd, ResultEngine, Transaction, TransactionState,
    transactions, util::normalize_optional_text,
};

use super::super::Engine;

impl Engine {
    /// Records a transaction as `posted` and applies its signed effects.
    ///
    /// Nothing is written when validation fails. If an effect cannot be
    /// applied after the insert, the transaction is still returned and the
    /// gap is reported as integrity lag.
    pub async fn create_transaction(
        &self,
        caller: &Caller,
        cmd: NewTransactionCmd,
    ) -> ResultEngine<Transaction> {
        self.require_company_write(caller, cmd.company_id).await?;

        let now = Utc::now();
        let tx = Transaction {
            id: Uuid::now_v7(),
            company_id: cmd.company_id,
            kind: cmd.kind,
            supplier_or_payer: normalize_optional_text(cmd.supplier_or_payer.as_deref()),
            description: normalize_optional_text(cmd.description.as_deref()),
            gross_amount: cmd.gross_amount,
            competence_date: cmd.competence_date,
            posting_date: cmd.posting_date,
            category_id: cmd.category_id,
            cost_center_id: cmd.cost_center_id,
            account_id: cmd.account_id,
            target_account_id: cmd.target_account_id,
            origin: cmd.origin,
            state: TransactionState::Posted,
            revision: 0,
            created_by: caller.user_id.clone(),
            created_at: now,
            updated_at: now,
        };
        self.validate_transaction(&tx).await?;

        self.store
            .insert(transactions::ActiveModel::from(&tx))
            .await?;
        self.apply_effects_logged("create", tx.company_id, &tx.effects())
            .await;

        tracing::debug!(transaction_id = %tx.id, kind = tx.kind.as_str(), "transaction created");
        self.emit(
            AuditEvent::new(
                "transaction.created",
                caller.user_id.clone(),
                tx.company_id,
                "transaction",
                tx.id,
            )
            .details(serde_json::json!({
                "kind": tx.kind.as_str(),
                "gross_amount": tx.gross_amount,
                "account_id": tx.account_id,
                "target_account_id": tx.target_account_id,
            })),
        );
        Ok(tx)
    }

    /// Loads one transaction.
    pub async fn transaction(&self, caller: &Caller, id: Uuid) -> ResultEngine<Transaction> {
        Transaction::try_from(self.load_transaction(caller, id).await?)
    }
}
