use sea_orm::{ColumnTrait, Condition};
use uuid::Uuid;

use crate::{
    Caller, EngineError, ResultEngine, bank_accounts, categories, companies, cost_centers,
    equipment, maintenance, transactions, util::parse_uuid,
};

use super::Engine;

/// Generates a loader returning the document `id` when it belongs to one of
/// the caller's companies. Foreign documents are reported as missing.
macro_rules! impl_caller_scoped {
    ($load_fn:ident, $module:ident, $label:literal) => {
        pub(super) async fn $load_fn(
            &self,
            caller: &Caller,
            id: Uuid,
        ) -> ResultEngine<$module::Model> {
            let model = self
                .store
                .find_by_id::<$module::Entity>(id)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound(format!("{} not exists", $label)))?;
            let company_id = parse_uuid(&model.company_id, "company")?;
            caller.require_company(company_id, $label)?;
            Ok(model)
        }
    };
}

/// Generates a check that a referenced document exists inside a company.
/// References across companies are rejected as invalid input.
macro_rules! impl_reference_in_company {
    ($require_fn:ident, $module:ident, $label:literal) => {
        pub(super) async fn $require_fn(
            &self,
            company_id: Uuid,
            target_id: Uuid,
        ) -> ResultEngine<$module::Model> {
            self.store
                .find_one::<$module::Entity>(
                    Condition::all()
                        .add($module::Column::Id.eq(target_id.to_string()))
                        .add($module::Column::CompanyId.eq(company_id.to_string())),
                )
                .await?
                .ok_or_else(|| {
                    EngineError::InvalidReference(format!(
                        "{} {target_id} not in company",
                        $label
                    ))
                })
        }
    };
}

impl Engine {
    impl_caller_scoped!(load_account, bank_accounts, "bank account");
    impl_caller_scoped!(load_category, categories, "category");
    impl_caller_scoped!(load_cost_center, cost_centers, "cost center");
    impl_caller_scoped!(load_transaction, transactions, "transaction");
    impl_caller_scoped!(load_equipment, equipment, "equipment");
    impl_caller_scoped!(load_maintenance, maintenance, "maintenance");

    impl_reference_in_company!(require_account_in_company, bank_accounts, "bank account");
    impl_reference_in_company!(require_category_in_company, categories, "category");
    impl_reference_in_company!(require_cost_center_in_company, cost_centers, "cost center");
    impl_reference_in_company!(require_equipment_in_company, equipment, "equipment");

    /// The company must exist and be one of the caller's.
    pub(super) async fn require_company(
        &self,
        caller: &Caller,
        company_id: Uuid,
    ) -> ResultEngine<companies::Model> {
        caller.require_company(company_id, "company")?;
        self.store
            .find_by_id::<companies::Entity>(company_id)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("company not exists".to_string()))
    }

    /// Same as [`Engine::require_company`], plus write permission.
    pub(super) async fn require_company_write(
        &self,
        caller: &Caller,
        company_id: Uuid,
    ) -> ResultEngine<companies::Model> {
        let company = self.require_company(caller, company_id).await?;
        caller.require_write()?;
        Ok(company)
    }
}
