use chrono::Utc;
use sea_orm::{ActiveValue, ColumnTrait, Condition};
use uuid::Uuid;

use crate::{
    Caller, CloseMaintenanceCmd, EngineError, Equipment, EquipmentEvent, EquipmentStatus,
    EventKind, EventRefs, MaintenanceRecord, MaintenanceStatus, OpenMaintenanceCmd, ResultEngine,
    Transition, maintenance,
    util::{normalize_optional_text, normalize_required_name},
};

use super::Engine;

impl Engine {
    /// Puts equipment into maintenance.
    ///
    /// Writes, in order: the `in_progress` record, the `maintenance_opened`
    /// event, then the status swap. A lost race removes both again.
    pub async fn open_maintenance(
        &self,
        caller: &Caller,
        equipment_id: Uuid,
        cmd: OpenMaintenanceCmd,
    ) -> ResultEngine<MaintenanceRecord> {
        let reported_fault = normalize_required_name(&cmd.reported_fault, "reported fault")?;
        if let Some(cost) = cmd.estimated_cost
            && cost.is_negative()
        {
            return Err(EngineError::InvalidAmount(
                "estimated_cost must be >= 0".to_string(),
            ));
        }
        if let Some(cost) = cmd.estimated_cost {
            cost.bounded("estimated_cost")?;
        }
        let mut item = self.writable_equipment(caller, equipment_id).await?;
        let to = item.status.next(Transition::OpenMaintenance)?;

        let record = MaintenanceRecord {
            id: Uuid::now_v7(),
            company_id: item.company_id,
            equipment_id: item.id,
            opened_at: Utc::now(),
            closed_at: None,
            reported_fault,
            diagnosis: normalize_optional_text(cmd.diagnosis.as_deref()),
            service_performed: None,
            estimated_cost: cmd.estimated_cost,
            final_cost: None,
            status: MaintenanceStatus::InProgress,
            notes: normalize_optional_text(cmd.notes.as_deref()),
            opened_by: caller.user_id.clone(),
        };
        self.store
            .insert(maintenance::ActiveModel::from(&record))
            .await?;

        let event = EquipmentEvent::new(
            item.company_id,
            item.id,
            EventKind::MaintenanceOpened,
            caller.user_id.clone(),
            record.reported_fault.clone(),
            EventRefs::default().maintenance(record.id).status(to),
        );
        if let Err(err) = self
            .commit_transition("open_maintenance", &item, to, None, &event)
            .await
        {
            self.discard_maintenance(record.id).await;
            return Err(err);
        }

        let from = item.status;
        item.status = to;
        self.emit_transition(caller, &item, from, &event);
        Ok(record)
    }

    /// Completes an in-progress maintenance and releases the equipment into
    /// `new_status` (`available` by default).
    ///
    /// The record is claimed first (`in_progress → completed`), so a
    /// maintenance closes at most once.
    pub async fn close_maintenance(
        &self,
        caller: &Caller,
        maintenance_id: Uuid,
        cmd: CloseMaintenanceCmd,
    ) -> ResultEngine<MaintenanceRecord> {
        let target = cmd.new_status.unwrap_or(EquipmentStatus::Available);
        EquipmentStatus::InMaintenance.next(Transition::CloseMaintenance(target))?;
        if let Some(cost) = cmd.final_cost
            && cost.is_negative()
        {
            return Err(EngineError::InvalidAmount(
                "final_cost must be >= 0".to_string(),
            ));
        }
        if let Some(cost) = cmd.final_cost {
            cost.bounded("final_cost")?;
        }

        let model = self.load_maintenance(caller, maintenance_id).await?;
        caller.require_write()?;
        let mut record = MaintenanceRecord::try_from(model)?;
        if record.status != MaintenanceStatus::InProgress {
            return Err(EngineError::StateConflict(format!(
                "maintenance is {}",
                record.status.as_str()
            )));
        }
        let equipment_model = self
            .require_equipment_in_company(record.company_id, record.equipment_id)
            .await?;
        let mut item = Equipment::try_from(equipment_model)?;
        let to = item.status.next(Transition::CloseMaintenance(target))?;

        let previous = record.clone();
        record.status = MaintenanceStatus::Completed;
        record.closed_at = Some(Utc::now());
        record.service_performed = normalize_optional_text(cmd.service_performed.as_deref());
        record.final_cost = cmd.final_cost;
        if let Some(notes) = normalize_optional_text(cmd.notes.as_deref()) {
            record.notes = Some(notes);
        }

        if !self
            .swap_maintenance(&record, MaintenanceStatus::InProgress)
            .await?
        {
            return Err(EngineError::StateConflict(
                "maintenance was closed concurrently".to_string(),
            ));
        }

        let description = record
            .service_performed
            .clone()
            .unwrap_or_else(|| "maintenance completed".to_string());
        let event = EquipmentEvent::new(
            item.company_id,
            item.id,
            EventKind::MaintenanceClosed,
            caller.user_id.clone(),
            description,
            EventRefs::default().maintenance(record.id).status(to),
        );
        if let Err(err) = self
            .commit_transition("close_maintenance", &item, to, None, &event)
            .await
        {
            self.reopen_maintenance(&previous).await;
            return Err(err);
        }

        let from = item.status;
        item.status = to;
        self.emit_transition(caller, &item, from, &event);
        Ok(record)
    }

    /// Writes `record` only while the stored status is still `expected`.
    async fn swap_maintenance(
        &self,
        record: &MaintenanceRecord,
        expected: MaintenanceStatus,
    ) -> ResultEngine<bool> {
        let mut values = maintenance::ActiveModel::from(record);
        values.id = ActiveValue::NotSet;
        let matched = self
            .store
            .conditional_update::<maintenance::Entity, _>(
                Condition::all()
                    .add(maintenance::Column::Id.eq(record.id.to_string()))
                    .add(maintenance::Column::Status.eq(expected.as_str())),
                values,
            )
            .await?;
        Ok(matched > 0)
    }

    async fn discard_maintenance(&self, id: Uuid) {
        if let Err(err) = self.store.delete_by_id::<maintenance::Entity>(id).await {
            self.equipment_lag(
                "open_maintenance",
                &format!("maintenance {id} not discarded: {err}"),
            );
        }
    }

    async fn reopen_maintenance(&self, previous: &MaintenanceRecord) {
        match self
            .swap_maintenance(previous, MaintenanceStatus::Completed)
            .await
        {
            Ok(true) => {}
            Ok(false) => self.equipment_lag(
                "close_maintenance",
                &format!("maintenance {} changed before reopening", previous.id),
            ),
            Err(err) => self.equipment_lag(
                "close_maintenance",
                &format!("maintenance {} not reopened: {err}", previous.id),
            ),
        }
    }
}
