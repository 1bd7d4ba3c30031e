use sea_orm::{ColumnTrait, Condition, Order};
use uuid::Uuid;

use crate::{
    AuditEvent, Caller, EngineError, EquipmentEvent, EquipmentStatus, EventRefs, RegisterEventCmd,
    ResultEngine, equipment_events, util::normalize_required_name,
};

use super::Engine;

impl Engine {
    /// Appends a manual event (observation, inspection, …) without touching
    /// the status. The history of decommissioned equipment is sealed.
    pub async fn register_event(
        &self,
        caller: &Caller,
        equipment_id: Uuid,
        cmd: RegisterEventCmd,
    ) -> ResultEngine<EquipmentEvent> {
        if !cmd.kind.is_manual() {
            return Err(EngineError::InvalidReference(format!(
                "event kind {} is written by the engine only",
                cmd.kind.as_str()
            )));
        }
        let description = normalize_required_name(&cmd.description, "event description")?;
        let item = self.writable_equipment(caller, equipment_id).await?;
        if item.status == EquipmentStatus::Decommissioned {
            return Err(EngineError::StateConflict(
                "equipment is decommissioned".to_string(),
            ));
        }

        let event = EquipmentEvent::new(
            item.company_id,
            item.id,
            cmd.kind,
            caller.user_id.clone(),
            description,
            EventRefs::default(),
        );
        self.append_event(&event).await?;
        self.emit(
            AuditEvent::new(
                "equipment.event_registered",
                caller.user_id.clone(),
                item.company_id,
                "equipment",
                item.id,
            )
            .details(serde_json::json!({
                "event_id": event.id,
                "kind": event.kind.as_str(),
            })),
        );
        Ok(event)
    }

    /// Events of one equipment in insertion order.
    pub(super) async fn events_of(&self, equipment_id: Uuid) -> ResultEngine<Vec<EquipmentEvent>> {
        self.store
            .find_sorted::<equipment_events::Entity, _>(
                Condition::all()
                    .add(equipment_events::Column::EquipmentId.eq(equipment_id.to_string())),
                equipment_events::Column::Id,
                Order::Asc,
            )
            .await?
            .into_iter()
            .map(EquipmentEvent::try_from)
            .collect()
    }
}
