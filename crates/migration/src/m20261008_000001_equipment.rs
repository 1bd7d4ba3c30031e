//! Equipment lifecycle schema.
//!
//! - `equipment`: serialized units with their current status/location
//! - `maintenance_records`: maintenance spans (at most one in progress)
//! - `equipment_events`: append-only event log
//! - `service_orders`: numbered per company, optionally linked to equipment

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum Companies {
    Table,
    Id,
}

#[derive(Iden)]
enum Equipment {
    Table,
    Id,
    CompanyId,
    Serial,
    EquipmentType,
    Brand,
    Model,
    Status,
    LocationKind,
    LocationRefId,
    LocationName,
    CreatedAt,
}

#[derive(Iden)]
enum MaintenanceRecords {
    Table,
    Id,
    CompanyId,
    EquipmentId,
    OpenedAt,
    ClosedAt,
    ReportedFault,
    Diagnosis,
    ServicePerformed,
    EstimatedCost,
    FinalCost,
    Status,
    Notes,
    OpenedBy,
}

#[derive(Iden)]
enum EquipmentEvents {
    Table,
    Id,
    CompanyId,
    EquipmentId,
    Kind,
    At,
    Actor,
    Description,
    Refs,
}

#[derive(Iden)]
enum ServiceOrders {
    Table,
    Id,
    CompanyId,
    Number,
    EquipmentId,
    ServiceType,
    Status,
    Description,
    OpenedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Equipment::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Equipment::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Equipment::CompanyId).string().not_null())
                    .col(ColumnDef::new(Equipment::Serial).string().not_null())
                    .col(ColumnDef::new(Equipment::EquipmentType).string().not_null())
                    .col(ColumnDef::new(Equipment::Brand).string().not_null())
                    .col(ColumnDef::new(Equipment::Model).string().not_null())
                    .col(ColumnDef::new(Equipment::Status).string().not_null())
                    .col(ColumnDef::new(Equipment::LocationKind).string().not_null())
                    .col(ColumnDef::new(Equipment::LocationRefId).string())
                    .col(ColumnDef::new(Equipment::LocationName).string().not_null())
                    .col(ColumnDef::new(Equipment::CreatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-equipment-company_id")
                            .from(Equipment::Table, Equipment::CompanyId)
                            .to(Companies::Table, Companies::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-equipment-company_id-serial-unique")
                    .table(Equipment::Table)
                    .col(Equipment::CompanyId)
                    .col(Equipment::Serial)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(MaintenanceRecords::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MaintenanceRecords::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(MaintenanceRecords::CompanyId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MaintenanceRecords::EquipmentId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MaintenanceRecords::OpenedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .col(ColumnDef::new(MaintenanceRecords::ClosedAt).timestamp())
                    .col(
                        ColumnDef::new(MaintenanceRecords::ReportedFault)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(MaintenanceRecords::Diagnosis).string())
                    .col(ColumnDef::new(MaintenanceRecords::ServicePerformed).string())
                    .col(ColumnDef::new(MaintenanceRecords::EstimatedCost).big_integer())
                    .col(ColumnDef::new(MaintenanceRecords::FinalCost).big_integer())
                    .col(ColumnDef::new(MaintenanceRecords::Status).string().not_null())
                    .col(ColumnDef::new(MaintenanceRecords::Notes).string())
                    .col(
                        ColumnDef::new(MaintenanceRecords::OpenedBy)
                            .string()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-maintenance_records-equipment_id-status")
                    .table(MaintenanceRecords::Table)
                    .col(MaintenanceRecords::EquipmentId)
                    .col(MaintenanceRecords::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(EquipmentEvents::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(EquipmentEvents::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(EquipmentEvents::CompanyId).string().not_null())
                    .col(
                        ColumnDef::new(EquipmentEvents::EquipmentId)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(EquipmentEvents::Kind).string().not_null())
                    .col(ColumnDef::new(EquipmentEvents::At).timestamp().not_null())
                    .col(ColumnDef::new(EquipmentEvents::Actor).string().not_null())
                    .col(
                        ColumnDef::new(EquipmentEvents::Description)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(EquipmentEvents::Refs).text())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-equipment_events-equipment_id-at")
                    .table(EquipmentEvents::Table)
                    .col(EquipmentEvents::EquipmentId)
                    .col(EquipmentEvents::At)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ServiceOrders::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ServiceOrders::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ServiceOrders::CompanyId).string().not_null())
                    .col(ColumnDef::new(ServiceOrders::Number).big_integer().not_null())
                    .col(ColumnDef::new(ServiceOrders::EquipmentId).string())
                    .col(ColumnDef::new(ServiceOrders::ServiceType).string().not_null())
                    .col(ColumnDef::new(ServiceOrders::Status).string().not_null())
                    .col(ColumnDef::new(ServiceOrders::Description).string())
                    .col(
                        ColumnDef::new(ServiceOrders::OpenedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-service_orders-company_id")
                            .from(ServiceOrders::Table, ServiceOrders::CompanyId)
                            .to(Companies::Table, Companies::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-service_orders-company_id-number-unique")
                    .table(ServiceOrders::Table)
                    .col(ServiceOrders::CompanyId)
                    .col(ServiceOrders::Number)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-service_orders-equipment_id")
                    .table(ServiceOrders::Table)
                    .col(ServiceOrders::EquipmentId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ServiceOrders::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(EquipmentEvents::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(MaintenanceRecords::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Equipment::Table).to_owned())
            .await?;
        Ok(())
    }
}
