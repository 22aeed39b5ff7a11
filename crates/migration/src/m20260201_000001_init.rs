//! Initial schema migration - creates all tables from scratch.
//!
//! It creates the complete schema for Bottega:
//!
//! - `vendors`, `clients`, `brands`, `categories`: directory records owned
//!   by the CRUD service, read here for lookups
//! - `items`: consigned items with cost/price ranges and derived status
//! - `payments`: client payments (the revenue side of the ledger)
//! - `payouts`: vendor payouts, at most one per item
//! - `expenses`: item-attributed and general business expenses
//! - `installment_plans`: agreed installments towards an item

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum Vendors {
    Table,
    Id,
    Name,
}

#[derive(Iden)]
enum Clients {
    Table,
    Id,
    Name,
}

#[derive(Iden)]
enum Brands {
    Table,
    Id,
    Name,
}

#[derive(Iden)]
enum Categories {
    Table,
    Id,
    Name,
}

#[derive(Iden)]
enum Items {
    Table,
    Id,
    VendorId,
    BrandId,
    CategoryId,
    MinCostMinor,
    MaxCostMinor,
    MinPriceMinor,
    MaxPriceMinor,
    Status,
    AcquiredOn,
    CreatedAt,
}

#[derive(Iden)]
enum Payments {
    Table,
    Id,
    ItemId,
    ClientId,
    AmountMinor,
    Method,
    PaidAt,
}

#[derive(Iden)]
enum Payouts {
    Table,
    Id,
    ItemId,
    VendorId,
    AmountMinor,
    PaidAt,
    BankReference,
    Note,
}

#[derive(Iden)]
enum Expenses {
    Table,
    Id,
    ItemId,
    Kind,
    AmountMinor,
    IncurredOn,
}

#[derive(Iden)]
enum InstallmentPlans {
    Table,
    Id,
    ItemId,
    ClientId,
    AmountMinor,
    DueOn,
    PaidAmountMinor,
    Status,
}

// ─────────────────────────────────────────────────────────────────────────────
// Migration implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Directory tables
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Vendors::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Vendors::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Vendors::Name).string().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Clients::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Clients::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Clients::Name).string().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Brands::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Brands::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Brands::Name).string().not_null())
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
                    .col(ColumnDef::new(Categories::Name).string().not_null())
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Items
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Items::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Items::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Items::VendorId).string().not_null())
                    .col(ColumnDef::new(Items::BrandId).string())
                    .col(ColumnDef::new(Items::CategoryId).string())
                    .col(ColumnDef::new(Items::MinCostMinor).big_integer())
                    .col(ColumnDef::new(Items::MaxCostMinor).big_integer())
                    .col(ColumnDef::new(Items::MinPriceMinor).big_integer())
                    .col(ColumnDef::new(Items::MaxPriceMinor).big_integer())
                    .col(
                        ColumnDef::new(Items::Status)
                            .string()
                            .not_null()
                            .default("in_store"),
                    )
                    .col(ColumnDef::new(Items::AcquiredOn).date().not_null())
                    .col(ColumnDef::new(Items::CreatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-items-vendor_id")
                            .from(Items::Table, Items::VendorId)
                            .to(Vendors::Table, Vendors::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-items-brand_id")
                            .from(Items::Table, Items::BrandId)
                            .to(Brands::Table, Brands::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-items-category_id")
                            .from(Items::Table, Items::CategoryId)
                            .to(Categories::Table, Categories::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-items-status")
                    .table(Items::Table)
                    .col(Items::Status)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Payments
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Payments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Payments::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Payments::ItemId).string().not_null())
                    .col(ColumnDef::new(Payments::ClientId).string().not_null())
                    .col(ColumnDef::new(Payments::AmountMinor).big_integer().not_null())
                    .col(ColumnDef::new(Payments::Method).string().not_null())
                    .col(ColumnDef::new(Payments::PaidAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-payments-item_id")
                            .from(Payments::Table, Payments::ItemId)
                            .to(Items::Table, Items::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-payments-client_id")
                            .from(Payments::Table, Payments::ClientId)
                            .to(Clients::Table, Clients::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-payments-item_id")
                    .table(Payments::Table)
                    .col(Payments::ItemId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-payments-paid_at")
                    .table(Payments::Table)
                    .col(Payments::PaidAt)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 4. Payouts (one per item, enforced by the unique index)
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Payouts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Payouts::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Payouts::ItemId).string().not_null())
                    .col(ColumnDef::new(Payouts::VendorId).string().not_null())
                    .col(ColumnDef::new(Payouts::AmountMinor).big_integer().not_null())
                    .col(ColumnDef::new(Payouts::PaidAt).timestamp().not_null())
                    .col(ColumnDef::new(Payouts::BankReference).string())
                    .col(ColumnDef::new(Payouts::Note).string())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-payouts-item_id")
                            .from(Payouts::Table, Payouts::ItemId)
                            .to(Items::Table, Items::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-payouts-vendor_id")
                            .from(Payouts::Table, Payouts::VendorId)
                            .to(Vendors::Table, Vendors::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-payouts-item_id")
                    .table(Payouts::Table)
                    .col(Payouts::ItemId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 5. Expenses
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Expenses::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Expenses::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Expenses::ItemId).string())
                    .col(ColumnDef::new(Expenses::Kind).string().not_null())
                    .col(ColumnDef::new(Expenses::AmountMinor).big_integer().not_null())
                    .col(ColumnDef::new(Expenses::IncurredOn).date().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-expenses-item_id")
                            .from(Expenses::Table, Expenses::ItemId)
                            .to(Items::Table, Items::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-expenses-item_id")
                    .table(Expenses::Table)
                    .col(Expenses::ItemId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 6. Installment plans
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(InstallmentPlans::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(InstallmentPlans::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(InstallmentPlans::ItemId).string().not_null())
                    .col(
                        ColumnDef::new(InstallmentPlans::ClientId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(InstallmentPlans::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(InstallmentPlans::DueOn).date().not_null())
                    .col(
                        ColumnDef::new(InstallmentPlans::PaidAmountMinor)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(InstallmentPlans::Status)
                            .string()
                            .not_null()
                            .default("pending"),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-installment_plans-item_id")
                            .from(InstallmentPlans::Table, InstallmentPlans::ItemId)
                            .to(Items::Table, Items::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-installment_plans-client_id")
                            .from(InstallmentPlans::Table, InstallmentPlans::ClientId)
                            .to(Clients::Table, Clients::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-installment_plans-status")
                    .table(InstallmentPlans::Table)
                    .col(InstallmentPlans::Status)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(InstallmentPlans::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Expenses::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Payouts::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Payments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Items::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Categories::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Brands::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Clients::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Vendors::Table).to_owned())
            .await?;
        Ok(())
    }
}
