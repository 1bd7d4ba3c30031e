use sea_orm::{ColumnTrait, Condition};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    AuditEvent, Caller, Equipment, EquipmentEvent, EquipmentStatus, EventKind, EventRefs,
    LifetimeHistory, Location, MaintenanceRecord, MaintenanceStatus, ResultEngine, maintenance,
};

use super::Engine;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ReconcileOutcome {
    pub previous: EquipmentStatus,
    pub current: EquipmentStatus,
    pub changed: bool,
}

/// Status (and location, when the deciding event carried one) the equipment
/// should be in according to its records.
fn expected_state<'a>(
    in_progress: bool,
    events: &'a [EquipmentEvent],
) -> (EquipmentStatus, Option<&'a Location>) {
    if in_progress {
        return (EquipmentStatus::InMaintenance, None);
    }
    let latest = events
        .iter()
        .rev()
        .find_map(|event| event.refs.as_ref().and_then(|refs| refs.status.map(|s| (s, refs))));
    match latest {
        // A maintenance event with no maintenance in progress lost its close.
        Some((EquipmentStatus::InMaintenance, _)) | None => (EquipmentStatus::Available, None),
        Some((status, refs)) => (status, refs.location.as_ref()),
    }
}

impl Engine {
    /// Everything that ever happened to one equipment, newest first.
    pub async fn lifetime_history(
        &self,
        caller: &Caller,
        equipment_id: Uuid,
    ) -> ResultEngine<LifetimeHistory> {
        let item = Equipment::try_from(self.load_equipment(caller, equipment_id).await?)?;
        let events = self.events_of(item.id).await?;
        let maintenances = self.maintenance_of(item.id).await?;
        let orders = self.service_orders_of(item.id).await?;
        Ok(LifetimeHistory::build(item, events, maintenances, orders))
    }

    /// Operator repair of an equipment status left behind by an interrupted
    /// operation.
    ///
    /// An in-progress maintenance means `in_maintenance`; otherwise the status
    /// recorded on the latest status-carrying event wins, `available` when
    /// there is none. Decommissioned equipment is left alone.
    pub async fn reconcile(
        &self,
        caller: &Caller,
        equipment_id: Uuid,
    ) -> ResultEngine<ReconcileOutcome> {
        let item = self.writable_equipment(caller, equipment_id).await?;
        let previous = item.status;
        if previous == EquipmentStatus::Decommissioned {
            return Ok(ReconcileOutcome {
                previous,
                current: previous,
                changed: false,
            });
        }

        let in_progress = self
            .maintenance_of(item.id)
            .await?
            .iter()
            .any(|record| record.status == MaintenanceStatus::InProgress);
        let events = self.events_of(item.id).await?;
        let (current, location) = expected_state(in_progress, &events);
        let location = location.filter(|location| **location != item.current_location);

        if current == previous && location.is_none() {
            return Ok(ReconcileOutcome {
                previous,
                current,
                changed: false,
            });
        }

        let event = EquipmentEvent::new(
            item.company_id,
            item.id,
            EventKind::Other,
            caller.user_id.clone(),
            format!(
                "status reconciled from {} to {}",
                previous.as_str(),
                current.as_str()
            ),
            EventRefs::default().status(current),
        );
        self.commit_transition("reconcile", &item, current, location, &event)
            .await?;

        tracing::warn!(
            equipment_id = %item.id,
            previous = previous.as_str(),
            current = current.as_str(),
            "equipment status reconciled"
        );
        self.emit(
            AuditEvent::new(
                "equipment.reconciled",
                caller.user_id.clone(),
                item.company_id,
                "equipment",
                item.id,
            )
            .details(serde_json::json!({
                "previous": previous.as_str(),
                "current": current.as_str(),
            })),
        );
        Ok(ReconcileOutcome {
            previous,
            current,
            changed: true,
        })
    }

    async fn maintenance_of(&self, equipment_id: Uuid) -> ResultEngine<Vec<MaintenanceRecord>> {
        self.store
            .find::<maintenance::Entity>(
                Condition::all()
                    .add(maintenance::Column::EquipmentId.eq(equipment_id.to_string())),
            )
            .await?
            .into_iter()
            .map(MaintenanceRecord::try_from)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LocationKind;

    fn event(status: Option<EquipmentStatus>) -> EquipmentEvent {
        let refs = status.map_or_else(EventRefs::default, |s| EventRefs::default().status(s));
        EquipmentEvent::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            EventKind::Other,
            "u1",
            "x",
            refs,
        )
    }

    #[test]
    fn open_maintenance_wins() {
        let events = vec![event(Some(EquipmentStatus::InUse))];
        assert_eq!(
            expected_state(true, &events).0,
            EquipmentStatus::InMaintenance
        );
    }

    #[test]
    fn latest_status_event_wins() {
        let events = vec![
            event(Some(EquipmentStatus::InTransit)),
            event(Some(EquipmentStatus::InUse)),
            event(None),
        ];
        assert_eq!(expected_state(false, &events).0, EquipmentStatus::InUse);
    }

    #[test]
    fn no_history_means_available() {
        assert_eq!(expected_state(false, &[]).0, EquipmentStatus::Available);
        let stale = vec![event(Some(EquipmentStatus::InMaintenance))];
        assert_eq!(expected_state(false, &stale).0, EquipmentStatus::Available);
    }

    #[test]
    fn transfer_location_is_carried() {
        let destination = Location {
            kind: LocationKind::Customer,
            ref_id: None,
            name: "Loja Centro".to_string(),
        };
        let events = vec![EquipmentEvent::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            EventKind::Transfer,
            "u1",
            "moving",
            EventRefs::default()
                .location(destination.clone())
                .status(EquipmentStatus::InTransit),
        )];
        assert_eq!(
            expected_state(false, &events),
            (EquipmentStatus::InTransit, Some(&destination))
        );
    }
}
