//! Ledger schema.
//!
//! - `companies`: tenants, root of every scoped collection
//! - `users` / `company_members`: bearer credentials and tenant membership
//! - `bank_accounts`: materialized `current_balance` per account
//! - `categories` / `cost_centers`: classification registries per company
//! - `transactions`: one document per income/expense/transfer

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum Companies {
    Table,
    Id,
    Name,
    TaxId,
    CreatedAt,
}

#[derive(Iden)]
enum Users {
    Table,
    Id,
    Email,
    Name,
    ApiToken,
    Role,
}

#[derive(Iden)]
enum CompanyMembers {
    Table,
    CompanyId,
    UserId,
}

#[derive(Iden)]
enum BankAccounts {
    Table,
    Id,
    CompanyId,
    Name,
    Kind,
    OpeningBalance,
    CurrentBalance,
    CreatedAt,
}

#[derive(Iden)]
enum Categories {
    Table,
    Id,
    CompanyId,
    Name,
    NameNorm,
    Kind,
}

#[derive(Iden)]
enum CostCenters {
    Table,
    Id,
    CompanyId,
    Name,
    NameNorm,
}

#[derive(Iden)]
enum Transactions {
    Table,
    Id,
    CompanyId,
    Kind,
    SupplierOrPayer,
    Description,
    GrossAmount,
    CompetenceDate,
    PostingDate,
    CategoryId,
    CostCenterId,
    AccountId,
    TargetAccountId,
    Origin,
    State,
    Revision,
    CreatedBy,
    CreatedAt,
    UpdatedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Companies::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Companies::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Companies::Name).string().not_null())
                    .col(ColumnDef::new(Companies::TaxId).string())
                    .col(ColumnDef::new(Companies::CreatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Users::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Users::Email).string().not_null())
                    .col(ColumnDef::new(Users::Name).string().not_null())
                    .col(ColumnDef::new(Users::ApiToken).string().not_null())
                    .col(
                        ColumnDef::new(Users::Role)
                            .string()
                            .not_null()
                            .default("editor"),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-users-email-unique")
                    .table(Users::Table)
                    .col(Users::Email)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-users-api_token-unique")
                    .table(Users::Table)
                    .col(Users::ApiToken)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(CompanyMembers::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(CompanyMembers::CompanyId).string().not_null())
                    .col(ColumnDef::new(CompanyMembers::UserId).string().not_null())
                    .primary_key(
                        Index::create()
                            .col(CompanyMembers::CompanyId)
                            .col(CompanyMembers::UserId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-company_members-company_id")
                            .from(CompanyMembers::Table, CompanyMembers::CompanyId)
                            .to(Companies::Table, Companies::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-company_members-user_id")
                            .from(CompanyMembers::Table, CompanyMembers::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(BankAccounts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BankAccounts::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(BankAccounts::CompanyId).string().not_null())
                    .col(ColumnDef::new(BankAccounts::Name).string().not_null())
                    .col(ColumnDef::new(BankAccounts::Kind).string().not_null())
                    .col(
                        ColumnDef::new(BankAccounts::OpeningBalance)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BankAccounts::CurrentBalance)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BankAccounts::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-bank_accounts-company_id")
                            .from(BankAccounts::Table, BankAccounts::CompanyId)
                            .to(Companies::Table, Companies::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-bank_accounts-company_id-name-unique")
                    .table(BankAccounts::Table)
                    .col(BankAccounts::CompanyId)
                    .col(BankAccounts::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Categories::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Categories::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Categories::CompanyId).string().not_null())
                    .col(ColumnDef::new(Categories::Name).string().not_null())
                    .col(ColumnDef::new(Categories::NameNorm).string().not_null())
                    .col(ColumnDef::new(Categories::Kind).string().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-categories-company_id")
                            .from(Categories::Table, Categories::CompanyId)
                            .to(Companies::Table, Companies::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-categories-company_id-name_norm-unique")
                    .table(Categories::Table)
                    .col(Categories::CompanyId)
                    .col(Categories::NameNorm)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(CostCenters::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CostCenters::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(CostCenters::CompanyId).string().not_null())
                    .col(ColumnDef::new(CostCenters::Name).string().not_null())
                    .col(ColumnDef::new(CostCenters::NameNorm).string().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-cost_centers-company_id")
                            .from(CostCenters::Table, CostCenters::CompanyId)
                            .to(Companies::Table, Companies::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-cost_centers-company_id-name_norm-unique")
                    .table(CostCenters::Table)
                    .col(CostCenters::CompanyId)
                    .col(CostCenters::NameNorm)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Account/category/cost center references are plain ids: a transaction
        // may outlive its account (the orphaned-delete path relies on it).
        manager
            .create_table(
                Table::create()
                    .table(Transactions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Transactions::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Transactions::CompanyId).string().not_null())
                    .col(ColumnDef::new(Transactions::Kind).string().not_null())
                    .col(ColumnDef::new(Transactions::SupplierOrPayer).string())
                    .col(ColumnDef::new(Transactions::Description).string())
                    .col(
                        ColumnDef::new(Transactions::GrossAmount)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Transactions::CompetenceDate)
                            .date()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Transactions::PostingDate).date())
                    .col(ColumnDef::new(Transactions::CategoryId).string())
                    .col(ColumnDef::new(Transactions::CostCenterId).string())
                    .col(ColumnDef::new(Transactions::AccountId).string().not_null())
                    .col(ColumnDef::new(Transactions::TargetAccountId).string())
                    .col(
                        ColumnDef::new(Transactions::Origin)
                            .string()
                            .not_null()
                            .default("manual"),
                    )
                    .col(ColumnDef::new(Transactions::State).string().not_null())
                    .col(
                        ColumnDef::new(Transactions::Revision)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Transactions::CreatedBy).string().not_null())
                    .col(
                        ColumnDef::new(Transactions::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Transactions::UpdatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-transactions-company_id")
                            .from(Transactions::Table, Transactions::CompanyId)
                            .to(Companies::Table, Companies::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transactions-company_id-competence_date-state")
                    .table(Transactions::Table)
                    .col(Transactions::CompanyId)
                    .col(Transactions::CompetenceDate)
                    .col(Transactions::State)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transactions-company_id-account_id")
                    .table(Transactions::Table)
                    .col(Transactions::CompanyId)
                    .col(Transactions::AccountId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transactions-company_id-target_account_id")
                    .table(Transactions::Table)
                    .col(Transactions::CompanyId)
                    .col(Transactions::TargetAccountId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Transactions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CostCenters::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Categories::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(BankAccounts::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CompanyMembers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Companies::Table).to_owned())
            .await?;
        Ok(())
    }
}
