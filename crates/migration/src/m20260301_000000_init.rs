//! Initial schema migration - creates all tables from scratch.
//!
//! The complete schema for ExpenseFlow:
//!
//! - `receipts`: uploaded receipts with extraction facts and the current
//!   conversion state (`converted_total` + `base_currency`, set together)
//! - `reconciliations`: append-only ledger of reconciliation attempts,
//!   one row per attempt, failures included

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum Receipts {
    Table,
    Id,
    FileName,
    UploadTime,
    MerchantName,
    TransactionDate,
    OriginalCurrency,
    OriginalTotal,
    BaseCurrency,
    ConvertedTotal,
}

#[derive(Iden)]
enum Reconciliations {
    Table,
    Id,
    ReceiptId,
    ReconciliationTime,
    TransactionDate,
    OriginalCurrency,
    OriginalTotal,
    BaseCurrency,
    ConvertedTotal,
    ExchangeRate,
    RateSource,
    Status,
    Notes,
    FileName,
    MerchantName,
}

// ─────────────────────────────────────────────────────────────────────────────
// Migration implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Receipts
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Receipts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Receipts::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Receipts::FileName).string().not_null())
                    .col(ColumnDef::new(Receipts::UploadTime).timestamp().not_null())
                    .col(ColumnDef::new(Receipts::MerchantName).string())
                    .col(ColumnDef::new(Receipts::TransactionDate).date())
                    .col(ColumnDef::new(Receipts::OriginalCurrency).string())
                    .col(ColumnDef::new(Receipts::OriginalTotal).double())
                    .col(ColumnDef::new(Receipts::BaseCurrency).string())
                    .col(ColumnDef::new(Receipts::ConvertedTotal).double())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-receipts-upload_time")
                    .table(Receipts::Table)
                    .col(Receipts::UploadTime)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Reconciliations (append-only ledger)
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Reconciliations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Reconciliations::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Reconciliations::ReceiptId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Reconciliations::ReconciliationTime)
                            .timestamp()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Reconciliations::TransactionDate).date())
                    .col(ColumnDef::new(Reconciliations::OriginalCurrency).string())
                    .col(ColumnDef::new(Reconciliations::OriginalTotal).double())
                    .col(ColumnDef::new(Reconciliations::BaseCurrency).string())
                    .col(ColumnDef::new(Reconciliations::ConvertedTotal).double())
                    .col(ColumnDef::new(Reconciliations::ExchangeRate).double())
                    .col(
                        ColumnDef::new(Reconciliations::RateSource)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Reconciliations::Status).string().not_null())
                    .col(ColumnDef::new(Reconciliations::Notes).string().not_null())
                    .col(ColumnDef::new(Reconciliations::FileName).string())
                    .col(ColumnDef::new(Reconciliations::MerchantName).string())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-reconciliations-receipt_id")
                            .from(Reconciliations::Table, Reconciliations::ReceiptId)
                            .to(Receipts::Table, Receipts::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-reconciliations-receipt_id")
                    .table(Reconciliations::Table)
                    .col(Reconciliations::ReceiptId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-reconciliations-reconciliation_time")
                    .table(Reconciliations::Table)
                    .col(Reconciliations::ReconciliationTime)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Reconciliations::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Receipts::Table).to_owned())
            .await
    }
}
