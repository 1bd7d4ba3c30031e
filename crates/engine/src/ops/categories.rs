//! Category and cost-center registries.
//!
//! Display names keep the user's casing with whitespace collapsed; uniqueness
//! is enforced on the accent-folded key (`name_norm`).

use sea_orm::{ColumnTrait, Condition, Order};
use uuid::Uuid;

use crate::{
    AuditEvent, Caller, Category, CategoryKind, CostCenter, EngineError, ResultEngine, categories,
    cost_centers, transactions,
    util::{normalize_name_key, normalize_required_name},
};

use super::Engine;

fn name_and_key(name: &str, label: &str) -> ResultEngine<(String, String)> {
    let name = normalize_required_name(name, label)?;
    let key = normalize_name_key(&name);
    if key.is_empty() {
        return Err(EngineError::InvalidName(format!(
            "{label} name must contain letters or digits"
        )));
    }
    Ok((name, key))
}

impl Engine {
    pub async fn new_category(
        &self,
        caller: &Caller,
        company_id: Uuid,
        name: &str,
        kind: CategoryKind,
    ) -> ResultEngine<Category> {
        self.require_company_write(caller, company_id).await?;
        let (name, key) = name_and_key(name, "category")?;

        let duplicate = self
            .store
            .find_one::<categories::Entity>(
                Condition::all()
                    .add(categories::Column::CompanyId.eq(company_id.to_string()))
                    .add(categories::Column::NameNorm.eq(key.as_str())),
            )
            .await?;
        if duplicate.is_some() {
            return Err(EngineError::ExistingKey(name));
        }

        let category = Category {
            id: Uuid::new_v4(),
            company_id,
            name,
            kind,
        };
        self.store
            .insert(categories::ActiveModel::with_name_key(&category, key))
            .await?;
        self.emit(AuditEvent::new(
            "category.created",
            caller.user_id.clone(),
            company_id,
            "category",
            category.id,
        ));
        Ok(category)
    }

    pub async fn categories(&self, caller: &Caller, company_id: Uuid) -> ResultEngine<Vec<Category>> {
        self.require_company(caller, company_id).await?;
        self.store
            .find_sorted::<categories::Entity, _>(
                Condition::all().add(categories::Column::CompanyId.eq(company_id.to_string())),
                categories::Column::NameNorm,
                Order::Asc,
            )
            .await?
            .into_iter()
            .map(Category::try_from)
            .collect()
    }

    /// Rejected while any transaction references the category.
    pub async fn delete_category(&self, caller: &Caller, id: Uuid) -> ResultEngine<()> {
        let model = self.load_category(caller, id).await?;
        caller.require_write()?;
        let referencing = self
            .store
            .count::<transactions::Entity>(
                Condition::all().add(transactions::Column::CategoryId.eq(id.to_string())),
            )
            .await?;
        if referencing > 0 {
            return Err(EngineError::StateConflict(format!(
                "category is referenced by {referencing} transaction(s)"
            )));
        }
        self.store.delete_by_id::<categories::Entity>(id).await?;
        let category = Category::try_from(model)?;
        self.emit(AuditEvent::new(
            "category.deleted",
            caller.user_id.clone(),
            category.company_id,
            "category",
            id,
        ));
        Ok(())
    }

    pub async fn new_cost_center(
        &self,
        caller: &Caller,
        company_id: Uuid,
        name: &str,
    ) -> ResultEngine<CostCenter> {
        self.require_company_write(caller, company_id).await?;
        let (name, key) = name_and_key(name, "cost center")?;

        let duplicate = self
            .store
            .find_one::<cost_centers::Entity>(
                Condition::all()
                    .add(cost_centers::Column::CompanyId.eq(company_id.to_string()))
                    .add(cost_centers::Column::NameNorm.eq(key.as_str())),
            )
            .await?;
        if duplicate.is_some() {
            return Err(EngineError::ExistingKey(name));
        }

        let cost_center = CostCenter {
            id: Uuid::new_v4(),
            company_id,
            name,
        };
        self.store
            .insert(cost_centers::ActiveModel::with_name_key(&cost_center, key))
            .await?;
        self.emit(AuditEvent::new(
            "cost_center.created",
            caller.user_id.clone(),
            company_id,
            "cost_center",
            cost_center.id,
        ));
        Ok(cost_center)
    }

    pub async fn cost_centers(
        &self,
        caller: &Caller,
        company_id: Uuid,
    ) -> ResultEngine<Vec<CostCenter>> {
        self.require_company(caller, company_id).await?;
        self.store
            .find_sorted::<cost_centers::Entity, _>(
                Condition::all().add(cost_centers::Column::CompanyId.eq(company_id.to_string())),
                cost_centers::Column::NameNorm,
                Order::Asc,
            )
            .await?
            .into_iter()
            .map(CostCenter::try_from)
            .collect()
    }

    /// Rejected while any transaction references the cost center.
    pub async fn delete_cost_center(&self, caller: &Caller, id: Uuid) -> ResultEngine<()> {
        let model = self.load_cost_center(caller, id).await?;
        caller.require_write()?;
        let referencing = self
            .store
            .count::<transactions::Entity>(
                Condition::all().add(transactions::Column::CostCenterId.eq(id.to_string())),
            )
            .await?;
        if referencing > 0 {
            return Err(EngineError::StateConflict(format!(
                "cost center is referenced by {referencing} transaction(s)"
            )));
        }
        self.store.delete_by_id::<cost_centers::Entity>(id).await?;
        let cost_center = CostCenter::try_from(model)?;
        self.emit(AuditEvent::new(
            "cost_center.deleted",
            caller.user_id.clone(),
            cost_center.company_id,
            "cost_center",
            id,
        ));
        Ok(())
    }
}
