use chrono::Utc;
use sea_orm::{ColumnTrait, Condition, EntityTrait, QueryFilter, QuerySelect, SqlErr, sea_query::Expr};
use uuid::Uuid;

use crate::{
    AuditEvent, Caller, EngineError, Equipment, EquipmentEvent, EquipmentStatus, EventKind,
    EventRefs, NewServiceOrderCmd, ResultEngine, ServiceOrder, ServiceOrderStatus,
    service_orders,
    util::{normalize_optional_text, normalize_required_name},
};

use super::Engine;

const NUMBER_ATTEMPTS: usize = 5;

impl Engine {
    /// Opens a service order numbered `max + 1` within the company.
    ///
    /// When it names an equipment, a `service_order_linked` event is appended
    /// to that equipment's history.
    pub async fn new_service_order(
        &self,
        caller: &Caller,
        cmd: NewServiceOrderCmd,
    ) -> ResultEngine<ServiceOrder> {
        self.require_company_write(caller, cmd.company_id).await?;
        let service_type = normalize_required_name(&cmd.service_type, "service type")?;

        let equipment = match cmd.equipment_id {
            Some(id) => {
                let item =
                    Equipment::try_from(self.require_equipment_in_company(cmd.company_id, id).await?)?;
                if item.status == EquipmentStatus::Decommissioned {
                    return Err(EngineError::StateConflict(
                        "equipment is decommissioned".to_string(),
                    ));
                }
                Some(item)
            }
            None => None,
        };

        let mut order = ServiceOrder {
            id: Uuid::now_v7(),
            company_id: cmd.company_id,
            number: 0,
            equipment_id: cmd.equipment_id,
            service_type,
            status: ServiceOrderStatus::Open,
            description: normalize_optional_text(cmd.description.as_deref()),
            opened_at: Utc::now(),
        };

        // Numbers race between concurrent writers; the unique index decides.
        let mut attempt = 0;
        loop {
            attempt += 1;
            order.number = self.next_service_order_number(cmd.company_id).await?;
            match self
                .store
                .insert(service_orders::ActiveModel::from(&order))
                .await
            {
                Ok(_) => break,
                Err(EngineError::Database(err))
                    if attempt < NUMBER_ATTEMPTS
                        && matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) =>
                {
                    tracing::debug!(number = order.number, "service order number taken, retrying");
                }
                Err(err) => return Err(err),
            }
        }

        if let Some(item) = equipment {
            let event = EquipmentEvent::new(
                item.company_id,
                item.id,
                EventKind::ServiceOrderLinked,
                caller.user_id.clone(),
                format!("service order #{} ({})", order.number, order.service_type),
                EventRefs::default().service_order(order.id),
            );
            if let Err(err) = self.append_event(&event).await {
                self.equipment_lag(
                    "new_service_order",
                    &format!("link event for order {} not appended: {err}", order.id),
                );
            }
        }

        self.emit(
            AuditEvent::new(
                "service_order.created",
                caller.user_id.clone(),
                order.company_id,
                "service_order",
                order.id,
            )
            .details(serde_json::json!({
                "number": order.number,
                "equipment_id": order.equipment_id,
            })),
        );
        Ok(order)
    }

    /// Service orders referencing one equipment.
    pub(super) async fn service_orders_of(
        &self,
        equipment_id: Uuid,
    ) -> ResultEngine<Vec<ServiceOrder>> {
        self.store
            .find::<service_orders::Entity>(
                Condition::all()
                    .add(service_orders::Column::EquipmentId.eq(equipment_id.to_string())),
            )
            .await?
            .into_iter()
            .map(ServiceOrder::try_from)
            .collect()
    }

    async fn next_service_order_number(&self, company_id: Uuid) -> ResultEngine<i64> {
        let max = service_orders::Entity::find()
            .select_only()
            .column_as(Expr::col(service_orders::Column::Number).max(), "max")
            .filter(service_orders::Column::CompanyId.eq(company_id.to_string()))
            .into_tuple::<Option<i64>>()
            .one(self.store.connection())
            .await?
            .flatten()
            .unwrap_or(0);
        Ok(max + 1)
    }
}
