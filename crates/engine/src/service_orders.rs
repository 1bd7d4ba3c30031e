//! Service orders ("OS"), numbered sequentially per company.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    EngineError, ResultEngine,
    util::{parse_optional_uuid, parse_uuid},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceOrderStatus {
    Open,
    InProgress,
    Completed,
    Cancelled,
}

impl ServiceOrderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl TryFrom<&str> for ServiceOrderStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "open" => Ok(Self::Open),
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(EngineError::InvalidReference(format!(
                "invalid service order status: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceOrder {
    pub id: Uuid,
    pub company_id: Uuid,
    pub number: i64,
    pub equipment_id: Option<Uuid>,
    pub service_type: String,
    pub status: ServiceOrderStatus,
    pub description: Option<String>,
    pub opened_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "service_orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub company_id: String,
    pub number: i64,
    pub equipment_id: Option<String>,
    pub service_type: String,
    pub status: String,
    pub description: Option<String>,
    pub opened_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&ServiceOrder> for ActiveModel {
    fn from(order: &ServiceOrder) -> Self {
        Self {
            id: ActiveValue::Set(order.id.to_string()),
            company_id: ActiveValue::Set(order.company_id.to_string()),
            number: ActiveValue::Set(order.number),
            equipment_id: ActiveValue::Set(order.equipment_id.map(|id| id.to_string())),
            service_type: ActiveValue::Set(order.service_type.clone()),
            status: ActiveValue::Set(order.status.as_str().to_string()),
            description: ActiveValue::Set(order.description.clone()),
            opened_at: ActiveValue::Set(order.opened_at),
        }
    }
}

impl TryFrom<Model> for ServiceOrder {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        Ok(Self {
            id: parse_uuid(&model.id, "service order")?,
            company_id: parse_uuid(&model.company_id, "company")?,
            number: model.number,
            equipment_id: parse_optional_uuid(model.equipment_id.as_deref(), "equipment")?,
            service_type: model.service_type,
            status: ServiceOrderStatus::try_from(model.status.as_str())?,
            description: model.description,
            opened_at: model.opened_at,
        })
    }
}
