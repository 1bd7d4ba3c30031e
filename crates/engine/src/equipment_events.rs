//! Append-only equipment event log.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, EquipmentStatus, Location, ResultEngine, util::parse_uuid};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Observation,
    Inspection,
    Adjustment,
    PartSwap,
    Cleaning,
    Warranty,
    Transfer,
    MaintenanceOpened,
    MaintenanceClosed,
    ServiceOrderLinked,
    Other,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Observation => "observation",
            Self::Inspection => "inspection",
            Self::Adjustment => "adjustment",
            Self::PartSwap => "part_swap",
            Self::Cleaning => "cleaning",
            Self::Warranty => "warranty",
            Self::Transfer => "transfer",
            Self::MaintenanceOpened => "maintenance_opened",
            Self::MaintenanceClosed => "maintenance_closed",
            Self::ServiceOrderLinked => "service_order_linked",
            Self::Other => "other",
        }
    }

    /// Kinds a user may register by hand. The rest are written by the engine
    /// alongside a state change.
    pub fn is_manual(self) -> bool {
        matches!(
            self,
            Self::Observation
                | Self::Inspection
                | Self::Adjustment
                | Self::PartSwap
                | Self::Cleaning
                | Self::Warranty
                | Self::Other
        )
    }
}

impl TryFrom<&str> for EventKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "observation" => Ok(Self::Observation),
            "inspection" => Ok(Self::Inspection),
            "adjustment" => Ok(Self::Adjustment),
            "part_swap" => Ok(Self::PartSwap),
            "cleaning" => Ok(Self::Cleaning),
            "warranty" => Ok(Self::Warranty),
            "transfer" => Ok(Self::Transfer),
            "maintenance_opened" => Ok(Self::MaintenanceOpened),
            "maintenance_closed" => Ok(Self::MaintenanceClosed),
            "service_order_linked" => Ok(Self::ServiceOrderLinked),
            "other" => Ok(Self::Other),
            other => Err(EngineError::InvalidReference(format!(
                "invalid event kind: {other}"
            ))),
        }
    }
}

/// Cross references carried by an event.
///
/// `status` is the equipment status the event's transition produced; the
/// reconcile pass reads it back.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRefs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_order_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maintenance_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<EquipmentStatus>,
}

impl EventRefs {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    #[must_use]
    pub fn service_order(mut self, id: Uuid) -> Self {
        self.service_order_id = Some(id);
        self
    }

    #[must_use]
    pub fn maintenance(mut self, id: Uuid) -> Self {
        self.maintenance_id = Some(id);
        self
    }

    #[must_use]
    pub fn location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    #[must_use]
    pub fn status(mut self, status: EquipmentStatus) -> Self {
        self.status = Some(status);
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquipmentEvent {
    pub id: Uuid,
    pub company_id: Uuid,
    pub equipment_id: Uuid,
    pub kind: EventKind,
    pub at: DateTime<Utc>,
    pub actor: String,
    pub description: String,
    pub refs: Option<EventRefs>,
}

impl EquipmentEvent {
    pub fn new(
        company_id: Uuid,
        equipment_id: Uuid,
        kind: EventKind,
        actor: impl Into<String>,
        description: impl Into<String>,
        refs: EventRefs,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            company_id,
            equipment_id,
            kind,
            at: Utc::now(),
            actor: actor.into(),
            description: description.into(),
            refs: (!refs.is_empty()).then_some(refs),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "equipment_events")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub company_id: String,
    pub equipment_id: String,
    pub kind: String,
    pub at: DateTimeUtc,
    pub actor: String,
    pub description: String,
    pub refs: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<&EquipmentEvent> for ActiveModel {
    type Error = EngineError;

    fn try_from(event: &EquipmentEvent) -> ResultEngine<Self> {
        let refs = event
            .refs
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|err| EngineError::InvalidReference(format!("invalid event refs: {err}")))?;
        Ok(Self {
            id: ActiveValue::Set(event.id.to_string()),
            company_id: ActiveValue::Set(event.company_id.to_string()),
            equipment_id: ActiveValue::Set(event.equipment_id.to_string()),
            kind: ActiveValue::Set(event.kind.as_str().to_string()),
            at: ActiveValue::Set(event.at),
            actor: ActiveValue::Set(event.actor.clone()),
            description: ActiveValue::Set(event.description.clone()),
            refs: ActiveValue::Set(refs),
        })
    }
}

impl TryFrom<Model> for EquipmentEvent {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        let refs = model
            .refs
            .as_deref()
            .map(serde_json::from_str::<EventRefs>)
            .transpose()
            .map_err(|err| EngineError::InvalidReference(format!("invalid event refs: {err}")))?;
        Ok(Self {
            id: parse_uuid(&model.id, "event")?,
            company_id: parse_uuid(&model.company_id, "company")?,
            equipment_id: parse_uuid(&model.equipment_id, "equipment")?,
            kind: EventKind::try_from(model.kind.as_str())?,
            at: model.at,
            actor: model.actor,
            description: model.description,
            refs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_written_kinds_are_not_manual() {
        for kind in [
            EventKind::Transfer,
            EventKind::MaintenanceOpened,
            EventKind::MaintenanceClosed,
            EventKind::ServiceOrderLinked,
        ] {
            assert!(!kind.is_manual());
        }
        assert!(EventKind::PartSwap.is_manual());
    }

    #[test]
    fn empty_refs_are_not_stored() {
        let event = EquipmentEvent::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            EventKind::Observation,
            "u1",
            "dusty",
            EventRefs::default(),
        );
        assert_eq!(event.refs, None);
    }

    #[test]
    fn refs_skip_missing_fields() {
        let id = Uuid::nil();
        let json = serde_json::to_string(&EventRefs::default().maintenance(id)).unwrap();
        assert_eq!(
            json,
            "{\"maintenance_id\":\"00000000-0000-0000-0000-000000000000\"}"
        );
    }
}
