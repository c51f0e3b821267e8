use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20260301_000002_create_wallet_tables"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Wallets are keyed by auth user id; a profile row may not exist yet
        manager
            .create_table(
                Table::create()
                    .table(Wallets::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Wallets::Id)
                            .uuid()
                            .not_null()
                            .primary_key()
                            .default(Expr::cust("gen_random_uuid()")),
                    )
                    .col(ColumnDef::new(Wallets::UserId).uuid().not_null())
                    .col(
                        ColumnDef::new(Wallets::WalletType)
                            .string_len(16)
                            .not_null()
                            .default("personal"),
                    )
                    .col(
                        ColumnDef::new(Wallets::Balance)
                            .decimal_len(12, 2)
                            .not_null()
                            .default(0)
                            .check(Expr::col(Wallets::Balance).gte(0)),
                    )
                    .col(
                        ColumnDef::new(Wallets::TotalDeposited)
                            .decimal_len(12, 2)
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Wallets::TotalWithdrawn)
                            .decimal_len(12, 2)
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Wallets::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Wallets::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // One wallet per user and type
        manager
            .create_index(
                Index::create()
                    .unique()
                    .name("idx_wallets_user_type_unique")
                    .table(Wallets::Table)
                    .col(Wallets::UserId)
                    .col(Wallets::WalletType)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(WalletTransactions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(WalletTransactions::Id)
                            .uuid()
                            .not_null()
                            .primary_key()
                            .default(Expr::cust("gen_random_uuid()")),
                    )
                    .col(ColumnDef::new(WalletTransactions::WalletId).uuid().not_null())
                    .col(ColumnDef::new(WalletTransactions::UserId).uuid().not_null())
                    .col(
                        ColumnDef::new(WalletTransactions::TransactionType)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WalletTransactions::Amount)
                            .decimal_len(12, 2)
                            .not_null()
                            .check(Expr::col(WalletTransactions::Amount).gt(0)),
                    )
                    .col(
                        ColumnDef::new(WalletTransactions::BalanceBefore)
                            .decimal_len(12, 2)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WalletTransactions::BalanceAfter)
                            .decimal_len(12, 2)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WalletTransactions::Status)
                            .string_len(16)
                            .not_null()
                            .default("completed"),
                    )
                    .col(ColumnDef::new(WalletTransactions::ReferenceType).string_len(16))
                    .col(ColumnDef::new(WalletTransactions::ReferenceId).uuid())
                    .col(ColumnDef::new(WalletTransactions::Description).text())
                    .col(ColumnDef::new(WalletTransactions::Metadata).json_binary())
                    .col(
                        ColumnDef::new(WalletTransactions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_wallet_transactions_wallet")
                            .from(WalletTransactions::Table, WalletTransactions::WalletId)
                            .to(Wallets::Table, Wallets::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Transaction history is read newest first per wallet
        manager
            .create_index(
                Index::create()
                    .name("idx_wallet_transactions_wallet_created")
                    .table(WalletTransactions::Table)
                    .col(WalletTransactions::WalletId)
                    .col(WalletTransactions::CreatedAt)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_wallet_transactions_reference")
                    .table(WalletTransactions::Table)
                    .col(WalletTransactions::ReferenceType)
                    .col(WalletTransactions::ReferenceId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(
                Table::drop()
                    .table(WalletTransactions::Table)
                    .if_exists()
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().table(Wallets::Table).if_exists().to_owned())
            .await
    }
}

#[derive(Iden)]
enum Wallets {
    Table,
    Id,
    UserId,
    WalletType,
    Balance,
    TotalDeposited,
    TotalWithdrawn,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum WalletTransactions {
    Table,
    Id,
    WalletId,
    UserId,
    TransactionType,
    Amount,
    BalanceBefore,
    BalanceAfter,
    Status,
    ReferenceType,
    ReferenceId,
    Description,
    Metadata,
    CreatedAt,
}
