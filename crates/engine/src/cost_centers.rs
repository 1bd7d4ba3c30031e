//! Cost center registry per company.

use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, util::parse_uuid};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostCenter {
    pub id: Uuid,
    pub company_id: Uuid,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "cost_centers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub company_id: String,
    pub name: String,
    pub name_norm: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl ActiveModel {
    pub(crate) fn with_name_key(cost_center: &CostCenter, name_norm: String) -> Self {
        Self {
            id: ActiveValue::Set(cost_center.id.to_string()),
            company_id: ActiveValue::Set(cost_center.company_id.to_string()),
            name: ActiveValue::Set(cost_center.name.clone()),
            name_norm: ActiveValue::Set(name_norm),
        }
    }
}

impl TryFrom<Model> for CostCenter {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        Ok(Self {
            id: parse_uuid(&model.id, "cost center")?,
            company_id: parse_uuid(&model.company_id, "company")?,
            name: model.name,
        })
    }
}
