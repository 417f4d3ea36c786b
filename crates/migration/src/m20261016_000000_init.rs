//! Initial schema.
//!
//! - `users`: authentication
//! - `treasuries`: shared funds with their notarization address
//! - `members`: user roles per treasury
//! - `transactions`: incomes and expenses with their review lifecycle
//! - `chain_logs`: one notarization record per confirmed transaction
//! - `bank_accounts`: payment details shown to members
//!
//! `chain_logs.transaction_id` is unique but not a foreign key: a log outlives
//! anything that happens to its transaction.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum Users {
    Table,
    Username,
    Password,
    Email,
}

#[derive(Iden)]
enum Treasuries {
    Table,
    Id,
    Name,
    Description,
    CreatedBy,
    ChainAddress,
    CreatedAt,
}

#[derive(Iden)]
enum Members {
    Table,
    Id,
    TreasuryId,
    UserId,
    Role,
    JoinedAt,
}

#[derive(Iden)]
enum Transactions {
    Table,
    Id,
    TreasuryId,
    Kind,
    AmountMinor,
    Note,
    CreatedBy,
    CreatedAt,
    Status,
    ConfirmedAmountMinor,
    ConfirmedBy,
    ConfirmedAt,
    RejectReason,
}

#[derive(Iden)]
enum ChainLogs {
    Table,
    Id,
    TransactionId,
    TxHash,
    DetailHash,
    BlockNumber,
    Status,
    Attempt,
    ErrorDetail,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum BankAccounts {
    Table,
    Id,
    TreasuryId,
    BankName,
    AccountNumber,
    AccountName,
    QrCodeUrl,
    CreatedAt,
    UpdatedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Users
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Users::Username)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Users::Password).string().not_null())
                    .col(ColumnDef::new(Users::Email).string())
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Treasuries
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Treasuries::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Treasuries::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Treasuries::Name).string().not_null())
                    .col(ColumnDef::new(Treasuries::Description).string())
                    .col(ColumnDef::new(Treasuries::CreatedBy).string().not_null())
                    .col(ColumnDef::new(Treasuries::ChainAddress).string().not_null())
                    .col(
                        ColumnDef::new(Treasuries::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-treasuries-created_by")
                            .from(Treasuries::Table, Treasuries::CreatedBy)
                            .to(Users::Table, Users::Username),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Members
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Members::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Members::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Members::TreasuryId).string().not_null())
                    .col(ColumnDef::new(Members::UserId).string().not_null())
                    .col(
                        ColumnDef::new(Members::Role)
                            .string()
                            .not_null()
                            .default("member"),
                    )
                    .col(
                        ColumnDef::new(Members::JoinedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-members-treasury_id")
                            .from(Members::Table, Members::TreasuryId)
                            .to(Treasuries::Table, Treasuries::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-members-user_id")
                            .from(Members::Table, Members::UserId)
                            .to(Users::Table, Users::Username)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-members-treasury_id-user_id-unique")
                    .table(Members::Table)
                    .col(Members::TreasuryId)
                    .col(Members::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 4. Transactions
        // ───────────────────────────────────────────────────────────────────
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
                    .col(ColumnDef::new(Transactions::TreasuryId).string().not_null())
                    .col(ColumnDef::new(Transactions::Kind).string().not_null())
                    .col(
                        ColumnDef::new(Transactions::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Transactions::Note).string())
                    .col(ColumnDef::new(Transactions::CreatedBy).string().not_null())
                    .col(
                        ColumnDef::new(Transactions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Transactions::Status)
                            .string()
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(Transactions::ConfirmedAmountMinor).big_integer())
                    .col(ColumnDef::new(Transactions::ConfirmedBy).string())
                    .col(ColumnDef::new(Transactions::ConfirmedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Transactions::RejectReason).string())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-transactions-treasury_id")
                            .from(Transactions::Table, Transactions::TreasuryId)
                            .to(Treasuries::Table, Treasuries::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-transactions-created_by")
                            .from(Transactions::Table, Transactions::CreatedBy)
                            .to(Users::Table, Users::Username),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transactions-treasury_id-created_at")
                    .table(Transactions::Table)
                    .col(Transactions::TreasuryId)
                    .col(Transactions::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transactions-treasury_id-status")
                    .table(Transactions::Table)
                    .col(Transactions::TreasuryId)
                    .col(Transactions::Status)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 5. Chain logs
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(ChainLogs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ChainLogs::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ChainLogs::TransactionId).string().not_null())
                    .col(ColumnDef::new(ChainLogs::TxHash).string())
                    .col(ColumnDef::new(ChainLogs::DetailHash).string())
                    .col(ColumnDef::new(ChainLogs::BlockNumber).big_integer())
                    .col(
                        ColumnDef::new(ChainLogs::Status)
                            .string()
                            .not_null()
                            .default("none"),
                    )
                    .col(
                        ColumnDef::new(ChainLogs::Attempt)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(ChainLogs::ErrorDetail).text())
                    .col(
                        ColumnDef::new(ChainLogs::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ChainLogs::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-chain_logs-transaction_id-unique")
                    .table(ChainLogs::Table)
                    .col(ChainLogs::TransactionId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-chain_logs-status")
                    .table(ChainLogs::Table)
                    .col(ChainLogs::Status)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 6. Bank accounts
        // ───────────────────────────────────────────────────────────────────
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
                    .col(ColumnDef::new(BankAccounts::TreasuryId).string().not_null())
                    .col(ColumnDef::new(BankAccounts::BankName).string().not_null())
                    .col(ColumnDef::new(BankAccounts::AccountNumber).string().not_null())
                    .col(ColumnDef::new(BankAccounts::AccountName).string().not_null())
                    .col(ColumnDef::new(BankAccounts::QrCodeUrl).string())
                    .col(
                        ColumnDef::new(BankAccounts::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BankAccounts::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-bank_accounts-treasury_id")
                            .from(BankAccounts::Table, BankAccounts::TreasuryId)
                            .to(Treasuries::Table, Treasuries::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-bank_accounts-treasury_id-unique")
                    .table(BankAccounts::Table)
                    .col(BankAccounts::TreasuryId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(BankAccounts::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ChainLogs::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Transactions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Members::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Treasuries::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        Ok(())
    }
}
