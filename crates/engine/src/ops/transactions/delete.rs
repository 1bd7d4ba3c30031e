use serde::Serialize;
use uuid::Uuid;

use crate::{
    AuditEvent, Caller, EngineError, ResultEngine, Transaction, transactions, util::parse_uuid,
};

use super::super::Engine;

/// Acknowledgement of a transaction deletion.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct DeleteAck {
    /// `true` when the transaction was posted and every referenced account
    /// received its reversal (a zero amount still counts). `false` for
    /// non-posted transactions, which are not touched, and for orphaned
    /// effects.
    pub balance_reversed: bool,
}

impl Engine {
    /// Deletes a posted transaction, reversing its balance effects first.
    ///
    /// A non-posted transaction is left in place and acknowledged with
    /// `balance_reversed: false`. An unknown id is a
    /// [`EngineError::StateConflict`]; an id owned by another tenant is
    /// [`EngineError::KeyNotFound`].
    pub async fn delete_transaction(&self, caller: &Caller, id: Uuid) -> ResultEngine<DeleteAck> {
        let Some(model) = self
            .store
            .find_by_id::<transactions::Entity>(id)
            .await?
        else {
            return Err(EngineError::StateConflict(
                "transaction not exists".to_string(),
            ));
        };
        caller.require_company(parse_uuid(&model.company_id, "company")?, "transaction")?;
        caller.require_write()?;
        let tx = Transaction::try_from(model)?;

        if !tx.is_posted() {
            tracing::debug!(
                transaction_id = %id,
                state = tx.state.as_str(),
                "delete of non-posted transaction acknowledged"
            );
            return Ok(DeleteAck {
                balance_reversed: false,
            });
        }

        if !self.claim_posted(&tx).await? {
            return Err(EngineError::StateConflict(
                "transaction was modified concurrently".to_string(),
            ));
        }
        let balance_reversed = self.reverse_effects("delete", &tx).await;

        self.store.delete_by_id::<transactions::Entity>(id).await?;

        tracing::debug!(transaction_id = %id, balance_reversed, "transaction deleted");
        self.emit(
            AuditEvent::new(
                "transaction.deleted",
                caller.user_id.clone(),
                tx.company_id,
                "transaction",
                tx.id,
            )
            .details(serde_json::json!({
                "state": tx.state.as_str(),
                "gross_amount": tx.gross_amount,
                "balance_reversed": balance_reversed,
            })),
        );
        Ok(DeleteAck { balance_reversed })
    }

    /// Voids a posted transaction: its effects are reversed and the document
    /// is kept with `state = void`.
    pub async fn void_transaction(&self, caller: &Caller, id: Uuid) -> ResultEngine<Transaction> {
        let model = self.load_transaction(caller, id).await?;
        caller.require_write()?;
        let tx = Transaction::try_from(model)?;
        if !tx.is_posted() {
            return Err(EngineError::StateConflict(format!(
                "cannot void a {} transaction",
                tx.state.as_str()
            )));
        }
        if !self.claim_posted(&tx).await? {
            return Err(EngineError::StateConflict(
                "transaction was modified concurrently".to_string(),
            ));
        }
        let reversed = self.reverse_effects("void", &tx).await;

        let tx = Transaction::try_from(self.load_transaction(caller, id).await?)?;
        self.emit(
            AuditEvent::new(
                "transaction.voided",
                caller.user_id.clone(),
                tx.company_id,
                "transaction",
                tx.id,
            )
            .details(serde_json::json!({ "balance_reversed": reversed })),
        );
        Ok(tx)
    }
}
