//! Maintenance records: one span per repair, at most one `in_progress` per
//! equipment.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, Money, ResultEngine, util::parse_uuid};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaintenanceStatus {
    InProgress,
    Completed,
    Cancelled,
}

impl MaintenanceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl TryFrom<&str> for MaintenanceStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(EngineError::InvalidTransition(format!(
                "invalid maintenance status: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaintenanceRecord {
    pub id: Uuid,
    pub company_id: Uuid,
    pub equipment_id: Uuid,
    pub opened_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    pub reported_fault: String,
    pub diagnosis: Option<String>,
    pub service_performed: Option<String>,
    pub estimated_cost: Option<Money>,
    pub final_cost: Option<Money>,
    pub status: MaintenanceStatus,
    pub notes: Option<String>,
    pub opened_by: String,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "maintenance_records")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub company_id: String,
    pub equipment_id: String,
    pub opened_at: DateTimeUtc,
    pub closed_at: Option<DateTimeUtc>,
    pub reported_fault: String,
    pub diagnosis: Option<String>,
    pub service_performed: Option<String>,
    pub estimated_cost: Option<i64>,
    pub final_cost: Option<i64>,
    pub status: String,
    pub notes: Option<String>,
    pub opened_by: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&MaintenanceRecord> for ActiveModel {
    fn from(record: &MaintenanceRecord) -> Self {
        Self {
            id: ActiveValue::Set(record.id.to_string()),
            company_id: ActiveValue::Set(record.company_id.to_string()),
            equipment_id: ActiveValue::Set(record.equipment_id.to_string()),
            opened_at: ActiveValue::Set(record.opened_at),
            closed_at: ActiveValue::Set(record.closed_at),
            reported_fault: ActiveValue::Set(record.reported_fault.clone()),
            diagnosis: ActiveValue::Set(record.diagnosis.clone()),
            service_performed: ActiveValue::Set(record.service_performed.clone()),
            estimated_cost: ActiveValue::Set(record.estimated_cost.map(Money::minor)),
            final_cost: ActiveValue::Set(record.final_cost.map(Money::minor)),
            status: ActiveValue::Set(record.status.as_str().to_string()),
            notes: ActiveValue::Set(record.notes.clone()),
            opened_by: ActiveValue::Set(record.opened_by.clone()),
        }
    }
}

impl TryFrom<Model> for MaintenanceRecord {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        Ok(Self {
            id: parse_uuid(&model.id, "maintenance")?,
            company_id: parse_uuid(&model.company_id, "company")?,
            equipment_id: parse_uuid(&model.equipment_id, "equipment")?,
            opened_at: model.opened_at,
            closed_at: model.closed_at,
            reported_fault: model.reported_fault,
            diagnosis: model.diagnosis,
            service_performed: model.service_performed,
            estimated_cost: model.estimated_cost.map(Money::new),
            final_cost: model.final_cost.map(Money::new),
            status: MaintenanceStatus::try_from(model.status.as_str())?,
            notes: model.notes,
            opened_by: model.opened_by,
        })
    }
}
