//! Serialized equipment and its status state machine.
//!
//! ```text
//! available|in_use|in_transit ──open_maintenance──▶ in_maintenance
//! in_maintenance ──close_maintenance──▶ available|in_use|decommissioned
//! available|in_use|in_transit ──transfer──▶ in_transit ──arrive──▶ available|in_use
//! available|in_use ──decommission──▶ decommissioned
//! ```
//!
//! `decommissioned` is terminal and `in_maintenance` is left only by closing
//! the maintenance.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    EngineError, ResultEngine,
    util::{parse_optional_uuid, parse_uuid},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EquipmentStatus {
    Available,
    InUse,
    InMaintenance,
    InTransit,
    Decommissioned,
}

impl EquipmentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::InUse => "in_use",
            Self::InMaintenance => "in_maintenance",
            Self::InTransit => "in_transit",
            Self::Decommissioned => "decommissioned",
        }
    }

    /// Status reached by applying `transition`, or why it is illegal.
    ///
    /// A target status outside the edge's allowed set is a validation error;
    /// a transition not allowed from `self` is a state conflict.
    pub fn next(self, transition: Transition) -> ResultEngine<EquipmentStatus> {
        match transition {
            Transition::CloseMaintenance(target)
                if !matches!(target, Self::Available | Self::InUse | Self::Decommissioned) =>
            {
                return Err(EngineError::InvalidTransition(format!(
                    "maintenance cannot close into {}",
                    target.as_str()
                )));
            }
            Transition::Arrive(target) if !matches!(target, Self::Available | Self::InUse) => {
                return Err(EngineError::InvalidTransition(format!(
                    "arrival cannot end in {}",
                    target.as_str()
                )));
            }
            _ => {}
        }

        let conflict = || {
            EngineError::StateConflict(format!(
                "cannot {} equipment in status {}",
                transition.verb(),
                self.as_str()
            ))
        };

        match (self, transition) {
            (Self::Decommissioned, _) => Err(conflict()),
            (Self::InMaintenance, Transition::CloseMaintenance(target)) => Ok(target),
            (_, Transition::CloseMaintenance(_)) => Err(conflict()),
            (Self::InMaintenance, _) => Err(conflict()),
            (_, Transition::OpenMaintenance) => Ok(Self::InMaintenance),
            (_, Transition::Transfer) => Ok(Self::InTransit),
            (Self::InTransit, Transition::Arrive(target)) => Ok(target),
            (_, Transition::Arrive(_)) => Err(conflict()),
            (Self::Available | Self::InUse, Transition::Decommission) => Ok(Self::Decommissioned),
            (_, Transition::Decommission) => Err(conflict()),
        }
    }
}

impl TryFrom<&str> for EquipmentStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "available" => Ok(Self::Available),
            "in_use" => Ok(Self::InUse),
            "in_maintenance" => Ok(Self::InMaintenance),
            "in_transit" => Ok(Self::InTransit),
            "decommissioned" => Ok(Self::Decommissioned),
            other => Err(EngineError::InvalidTransition(format!(
                "invalid equipment status: {other}"
            ))),
        }
    }
}

/// Edges of the equipment state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
    OpenMaintenance,
    CloseMaintenance(EquipmentStatus),
    Transfer,
    Arrive(EquipmentStatus),
    Decommission,
}

impl Transition {
    fn verb(self) -> &'static str {
        match self {
            Self::OpenMaintenance => "open maintenance on",
            Self::CloseMaintenance(_) => "close maintenance on",
            Self::Transfer => "transfer",
            Self::Arrive(_) => "receive",
            Self::Decommission => "decommission",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationKind {
    Warehouse,
    Customer,
    Technician,
}

impl LocationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Warehouse => "warehouse",
            Self::Customer => "customer",
            Self::Technician => "technician",
        }
    }
}

impl TryFrom<&str> for LocationKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "warehouse" => Ok(Self::Warehouse),
            "customer" => Ok(Self::Customer),
            "technician" => Ok(Self::Technician),
            other => Err(EngineError::InvalidReference(format!(
                "invalid location kind: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub kind: LocationKind,
    pub ref_id: Option<Uuid>,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Equipment {
    pub id: Uuid,
    pub company_id: Uuid,
    pub serial: String,
    pub equipment_type: String,
    pub brand: String,
    pub model: String,
    pub status: EquipmentStatus,
    pub current_location: Location,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "equipment")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub company_id: String,
    pub serial: String,
    pub equipment_type: String,
    pub brand: String,
    pub model: String,
    pub status: String,
    pub location_kind: String,
    pub location_ref_id: Option<String>,
    pub location_name: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Equipment> for ActiveModel {
    fn from(equipment: &Equipment) -> Self {
        Self {
            id: ActiveValue::Set(equipment.id.to_string()),
            company_id: ActiveValue::Set(equipment.company_id.to_string()),
            serial: ActiveValue::Set(equipment.serial.clone()),
            equipment_type: ActiveValue::Set(equipment.equipment_type.clone()),
            brand: ActiveValue::Set(equipment.brand.clone()),
            model: ActiveValue::Set(equipment.model.clone()),
            status: ActiveValue::Set(equipment.status.as_str().to_string()),
            location_kind: ActiveValue::Set(equipment.current_location.kind.as_str().to_string()),
            location_ref_id: ActiveValue::Set(
                equipment.current_location.ref_id.map(|id| id.to_string()),
            ),
            location_name: ActiveValue::Set(equipment.current_location.name.clone()),
            created_at: ActiveValue::Set(equipment.created_at),
        }
    }
}

impl TryFrom<Model> for Equipment {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        Ok(Self {
            id: parse_uuid(&model.id, "equipment")?,
            company_id: parse_uuid(&model.company_id, "company")?,
            serial: model.serial,
            equipment_type: model.equipment_type,
            brand: model.brand,
            model: model.model,
            status: EquipmentStatus::try_from(model.status.as_str())?,
            current_location: Location {
                kind: LocationKind::try_from(model.location_kind.as_str())?,
                ref_id: parse_optional_uuid(model.location_ref_id.as_deref(), "location")?,
                name: model.location_name,
            },
            created_at: model.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use EquipmentStatus::*;

    const ALL: [EquipmentStatus; 5] = [Available, InUse, InMaintenance, InTransit, Decommissioned];

    fn transitions() -> Vec<Transition> {
        let mut out = vec![
            Transition::OpenMaintenance,
            Transition::Transfer,
            Transition::Decommission,
        ];
        for target in ALL {
            out.push(Transition::CloseMaintenance(target));
            out.push(Transition::Arrive(target));
        }
        out
    }

    #[test]
    fn decommissioned_is_terminal() {
        for t in transitions() {
            assert!(Decommissioned.next(t).is_err(), "{t:?}");
        }
    }

    #[test]
    fn maintenance_is_entered_and_left_only_through_its_edges() {
        for from in ALL {
            for t in transitions() {
                let Ok(to) = from.next(t) else { continue };
                if to == InMaintenance {
                    assert_eq!(t, Transition::OpenMaintenance);
                }
                if from == InMaintenance {
                    assert!(matches!(t, Transition::CloseMaintenance(_)), "{t:?}");
                }
            }
        }
    }

    #[test]
    fn open_maintenance_rejects_busy_equipment() {
        assert_eq!(Available.next(Transition::OpenMaintenance).unwrap(), InMaintenance);
        assert!(matches!(
            InMaintenance.next(Transition::OpenMaintenance),
            Err(EngineError::StateConflict(_))
        ));
    }

    #[test]
    fn close_target_is_validated_before_state() {
        assert!(matches!(
            Available.next(Transition::CloseMaintenance(InTransit)),
            Err(EngineError::InvalidTransition(_))
        ));
        assert!(matches!(
            Available.next(Transition::CloseMaintenance(Available)),
            Err(EngineError::StateConflict(_))
        ));
        assert_eq!(
            InMaintenance
                .next(Transition::CloseMaintenance(Decommissioned))
                .unwrap(),
            Decommissioned
        );
    }

    #[test]
    fn transfer_then_arrive() {
        let moving = InUse.next(Transition::Transfer).unwrap();
        assert_eq!(moving, InTransit);
        assert_eq!(moving.next(Transition::Arrive(InUse)).unwrap(), InUse);
        assert!(Available.next(Transition::Arrive(Available)).is_err());
        assert!(InMaintenance.next(Transition::Transfer).is_err());
        assert!(InTransit.next(Transition::Decommission).is_err());
    }
}
