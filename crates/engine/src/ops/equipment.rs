//! Equipment registry and its status transitions.
//!
//! A transition is written in two steps: the event is appended, then the
//! status moves with a compare-and-swap keyed on the status that was read.
//! Losing the race removes the event again. An interruption in between leaves
//! a trailing event whose `refs.status` tells `reconcile` where the equipment
//! was headed.

use chrono::Utc;
use sea_orm::{ActiveValue, ColumnTrait, Condition, Order};
use uuid::Uuid;

use crate::{
    AuditEvent, Caller, EngineError, Equipment, EquipmentEvent, EquipmentStatus, EventKind,
    EventRefs, Location, NewEquipmentCmd, ResultEngine, TransferEquipmentCmd, Transition,
    equipment, equipment_events,
    util::{normalize_optional_text, normalize_required_name},
};

use super::Engine;

fn normalize_location(location: Location) -> ResultEngine<Location> {
    Ok(Location {
        name: normalize_required_name(&location.name, "location")?,
        ..location
    })
}

impl Engine {
    /// Registers equipment as `available` at its initial location.
    pub async fn new_equipment(
        &self,
        caller: &Caller,
        cmd: NewEquipmentCmd,
    ) -> ResultEngine<Equipment> {
        self.require_company_write(caller, cmd.company_id).await?;
        let serial = normalize_required_name(&cmd.serial, "serial")?;
        let equipment_type = normalize_required_name(&cmd.equipment_type, "equipment type")?;
        let location = normalize_location(cmd.location)?;

        let duplicate = self
            .store
            .find_one::<equipment::Entity>(
                Condition::all()
                    .add(equipment::Column::CompanyId.eq(cmd.company_id.to_string()))
                    .add(equipment::Column::Serial.eq(serial.as_str())),
            )
            .await?;
        if duplicate.is_some() {
            return Err(EngineError::ExistingKey(serial));
        }

        let item = Equipment {
            id: Uuid::new_v4(),
            company_id: cmd.company_id,
            serial,
            equipment_type,
            brand: cmd.brand.trim().to_string(),
            model: cmd.model.trim().to_string(),
            status: EquipmentStatus::Available,
            current_location: location,
            created_at: Utc::now(),
        };
        self.store.insert(equipment::ActiveModel::from(&item)).await?;
        self.emit(
            AuditEvent::new(
                "equipment.created",
                caller.user_id.clone(),
                item.company_id,
                "equipment",
                item.id,
            )
            .details(serde_json::json!({ "serial": item.serial })),
        );
        Ok(item)
    }

    /// Equipment of a company by serial, optionally only in `status`.
    pub async fn equipment_list(
        &self,
        caller: &Caller,
        company_id: Uuid,
        status: Option<EquipmentStatus>,
    ) -> ResultEngine<Vec<Equipment>> {
        self.require_company(caller, company_id).await?;
        let mut filter =
            Condition::all().add(equipment::Column::CompanyId.eq(company_id.to_string()));
        if let Some(status) = status {
            filter = filter.add(equipment::Column::Status.eq(status.as_str()));
        }
        self.store
            .find_sorted::<equipment::Entity, _>(filter, equipment::Column::Serial, Order::Asc)
            .await?
            .into_iter()
            .map(Equipment::try_from)
            .collect()
    }

    pub async fn equipment(&self, caller: &Caller, id: Uuid) -> ResultEngine<Equipment> {
        Equipment::try_from(self.load_equipment(caller, id).await?)
    }

    /// Sends the equipment to a new location; it stays `in_transit` until
    /// [`Engine::arrive`].
    pub async fn transfer(
        &self,
        caller: &Caller,
        id: Uuid,
        cmd: TransferEquipmentCmd,
    ) -> ResultEngine<Equipment> {
        let destination = normalize_location(cmd.destination)?;
        let mut item = self.writable_equipment(caller, id).await?;
        let to = item.status.next(Transition::Transfer)?;

        let description = normalize_optional_text(cmd.reason.as_deref())
            .unwrap_or_else(|| format!("transferred to {}", destination.name));
        let event = EquipmentEvent::new(
            item.company_id,
            item.id,
            EventKind::Transfer,
            caller.user_id.clone(),
            description,
            EventRefs::default()
                .location(destination.clone())
                .status(to),
        );
        self.commit_transition("transfer", &item, to, Some(&destination), &event)
            .await?;

        let from = item.status;
        item.status = to;
        item.current_location = destination;
        self.emit_transition(caller, &item, from, &event);
        Ok(item)
    }

    /// Ends a transfer: `in_transit → available | in_use`.
    pub async fn arrive(
        &self,
        caller: &Caller,
        id: Uuid,
        status: EquipmentStatus,
    ) -> ResultEngine<Equipment> {
        let mut item = self.writable_equipment(caller, id).await?;
        let to = item.status.next(Transition::Arrive(status))?;

        let event = EquipmentEvent::new(
            item.company_id,
            item.id,
            EventKind::Transfer,
            caller.user_id.clone(),
            format!("arrived at {}", item.current_location.name),
            EventRefs::default()
                .location(item.current_location.clone())
                .status(to),
        );
        self.commit_transition("arrive", &item, to, None, &event)
            .await?;

        let from = item.status;
        item.status = to;
        self.emit_transition(caller, &item, from, &event);
        Ok(item)
    }

    /// Retires the equipment for good.
    pub async fn decommission(
        &self,
        caller: &Caller,
        id: Uuid,
        reason: &str,
    ) -> ResultEngine<Equipment> {
        let mut item = self.writable_equipment(caller, id).await?;
        let to = item.status.next(Transition::Decommission)?;

        let description = normalize_optional_text(Some(reason))
            .unwrap_or_else(|| "decommissioned".to_string());
        let event = EquipmentEvent::new(
            item.company_id,
            item.id,
            EventKind::Other,
            caller.user_id.clone(),
            description,
            EventRefs::default().status(to),
        );
        self.commit_transition("decommission", &item, to, None, &event)
            .await?;

        let from = item.status;
        item.status = to;
        self.emit_transition(caller, &item, from, &event);
        Ok(item)
    }

    /// Loads equipment the caller may modify.
    pub(super) async fn writable_equipment(
        &self,
        caller: &Caller,
        id: Uuid,
    ) -> ResultEngine<Equipment> {
        let model = self.load_equipment(caller, id).await?;
        caller.require_write()?;
        Equipment::try_from(model)
    }

    pub(super) async fn append_event(&self, event: &EquipmentEvent) -> ResultEngine<()> {
        self.store
            .insert(equipment_events::ActiveModel::try_from(event)?)
            .await?;
        Ok(())
    }

    /// Removes an event appended by an operation that did not go through.
    pub(super) async fn discard_event(&self, operation: &'static str, event_id: Uuid) {
        if let Err(err) = self
            .store
            .delete_by_id::<equipment_events::Entity>(event_id)
            .await
        {
            self.equipment_lag(operation, &format!("event {event_id} not discarded: {err}"));
        }
    }

    /// Compare-and-swap of the status (and optionally the location), expecting
    /// the status `item` was loaded with.
    pub(super) async fn swap_status(
        &self,
        item: &Equipment,
        to: EquipmentStatus,
        location: Option<&Location>,
    ) -> ResultEngine<bool> {
        let mut values = equipment::ActiveModel {
            status: ActiveValue::Set(to.as_str().to_string()),
            ..Default::default()
        };
        if let Some(location) = location {
            values.location_kind = ActiveValue::Set(location.kind.as_str().to_string());
            values.location_ref_id = ActiveValue::Set(location.ref_id.map(|id| id.to_string()));
            values.location_name = ActiveValue::Set(location.name.clone());
        }
        let matched = self
            .store
            .conditional_update::<equipment::Entity, _>(
                Condition::all()
                    .add(equipment::Column::Id.eq(item.id.to_string()))
                    .add(equipment::Column::Status.eq(item.status.as_str())),
                values,
            )
            .await?;
        Ok(matched > 0)
    }

    /// Appends `event`, then moves the status. Nothing stays behind when the
    /// status already changed under us.
    pub(super) async fn commit_transition(
        &self,
        operation: &'static str,
        item: &Equipment,
        to: EquipmentStatus,
        location: Option<&Location>,
        event: &EquipmentEvent,
    ) -> ResultEngine<()> {
        self.append_event(event).await?;
        match self.swap_status(item, to, location).await {
            Ok(true) => Ok(()),
            Ok(false) => {
                self.discard_event(operation, event.id).await;
                Err(EngineError::StateConflict(
                    "equipment was modified concurrently".to_string(),
                ))
            }
            Err(err) => {
                self.discard_event(operation, event.id).await;
                Err(err)
            }
        }
    }

    pub(super) fn emit_transition(
        &self,
        caller: &Caller,
        item: &Equipment,
        from: EquipmentStatus,
        event: &EquipmentEvent,
    ) {
        tracing::debug!(
            equipment_id = %item.id,
            from = from.as_str(),
            to = item.status.as_str(),
            "equipment status changed"
        );
        self.emit(
            AuditEvent::new(
                "equipment.status_changed",
                caller.user_id.clone(),
                item.company_id,
                "equipment",
                item.id,
            )
            .details(serde_json::json!({
                "from": from.as_str(),
                "to": item.status.as_str(),
                "event_id": event.id,
                "event_kind": event.kind.as_str(),
            })),
        );
    }
}
