use chrono::Utc;
use sea_orm::{ColumnTrait, Condition, Order};
use uuid::Uuid;

use crate::{
    AuditEvent, BankAccount, Caller, EngineError, NewBankAccountCmd, ResultEngine, bank_accounts,
    transactions, util::normalize_required_name,
};

use super::Engine;

impl Engine {
    /// Opens a bank account. `current_balance` starts at `opening_balance`.
    pub async fn new_bank_account(
        &self,
        caller: &Caller,
        cmd: NewBankAccountCmd,
    ) -> ResultEngine<BankAccount> {
        self.require_company_write(caller, cmd.company_id).await?;
        let name = normalize_required_name(&cmd.name, "bank account")?;
        cmd.opening_balance.bounded("opening_balance")?;

        let duplicate = self
            .store
            .find_one::<bank_accounts::Entity>(
                Condition::all()
                    .add(bank_accounts::Column::CompanyId.eq(cmd.company_id.to_string()))
                    .add(bank_accounts::Column::Name.eq(name.as_str())),
            )
            .await?;
        if duplicate.is_some() {
            return Err(EngineError::ExistingKey(name));
        }

        let account = BankAccount {
            id: Uuid::new_v4(),
            company_id: cmd.company_id,
            name,
            kind: cmd.kind,
            opening_balance: cmd.opening_balance,
            current_balance: cmd.opening_balance,
            created_at: Utc::now(),
        };
        self.store
            .insert(bank_accounts::ActiveModel::from(&account))
            .await?;
        self.emit(
            AuditEvent::new(
                "bank_account.created",
                caller.user_id.clone(),
                account.company_id,
                "bank_account",
                account.id,
            )
            .details(serde_json::json!({
                "name": account.name,
                "opening_balance": account.opening_balance,
            })),
        );
        Ok(account)
    }

    /// Accounts of a company, by name.
    pub async fn bank_accounts(
        &self,
        caller: &Caller,
        company_id: Uuid,
    ) -> ResultEngine<Vec<BankAccount>> {
        self.require_company(caller, company_id).await?;
        self.store
            .find_sorted::<bank_accounts::Entity, _>(
                Condition::all().add(bank_accounts::Column::CompanyId.eq(company_id.to_string())),
                bank_accounts::Column::Name,
                Order::Asc,
            )
            .await?
            .into_iter()
            .map(BankAccount::try_from)
            .collect()
    }

    pub async fn bank_account(&self, caller: &Caller, id: Uuid) -> ResultEngine<BankAccount> {
        BankAccount::try_from(self.load_account(caller, id).await?)
    }

    /// Deletes an account nothing references any more.
    ///
    /// Any transaction (any state) naming the account as source or target
    /// blocks the deletion.
    pub async fn delete_bank_account(&self, caller: &Caller, id: Uuid) -> ResultEngine<()> {
        let model = self.load_account(caller, id).await?;
        caller.require_write()?;

        let referencing = self
            .store
            .count::<transactions::Entity>(
                Condition::all()
                    .add(transactions::Column::CompanyId.eq(model.company_id.as_str()))
                    .add(
                        Condition::any()
                            .add(transactions::Column::AccountId.eq(id.to_string()))
                            .add(transactions::Column::TargetAccountId.eq(id.to_string())),
                    ),
            )
            .await?;
        if referencing > 0 {
            return Err(EngineError::StateConflict(format!(
                "bank account is referenced by {referencing} transaction(s)"
            )));
        }

        self.store.delete_by_id::<bank_accounts::Entity>(id).await?;
        let account = BankAccount::try_from(model)?;
        self.emit(AuditEvent::new(
            "bank_account.deleted",
            caller.user_id.clone(),
            account.company_id,
            "bank_account",
            account.id,
        ));
        Ok(())
    }
}
