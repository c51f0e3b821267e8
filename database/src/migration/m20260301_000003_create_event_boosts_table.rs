use sea_orm_migration::prelude::*;

use super::m20260301_000001_create_profiles_and_events::Events;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20260301_000003_create_event_boosts_table"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(EventBoosts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(EventBoosts::Id)
                            .uuid()
                            .not_null()
                            .primary_key()
                            .default(Expr::cust("gen_random_uuid()")),
                    )
                    .col(ColumnDef::new(EventBoosts::EventId).uuid().not_null())
                    .col(ColumnDef::new(EventBoosts::UserId).uuid().not_null())
                    .col(ColumnDef::new(EventBoosts::Package).string_len(32).not_null())
                    .col(ColumnDef::new(EventBoosts::Price).decimal_len(12, 2).not_null())
                    .col(
                        ColumnDef::new(EventBoosts::DiscountPercent)
                            .decimal_len(5, 2)
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(EventBoosts::DurationHours)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(EventBoosts::StartsAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(EventBoosts::ExpiresAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(EventBoosts::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(EventBoosts::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_event_boosts_event")
                            .from(EventBoosts::Table, EventBoosts::EventId)
                            .to(Events::Table, Events::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Lazy expiry and the sweep both filter on (is_active, expires_at)
        manager
            .create_index(
                Index::create()
                    .name("idx_event_boosts_active_expires")
                    .table(EventBoosts::Table)
                    .col(EventBoosts::IsActive)
                    .col(EventBoosts::ExpiresAt)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_event_boosts_event_id")
                    .table(EventBoosts::Table)
                    .col(EventBoosts::EventId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_event_boosts_user_id")
                    .table(EventBoosts::Table)
                    .col(EventBoosts::UserId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(EventBoosts::Table).if_exists().to_owned())
            .await
    }
}

#[derive(Iden)]
enum EventBoosts {
    Table,
    Id,
    EventId,
    UserId,
    Package,
    Price,
    DiscountPercent,
    DurationHours,
    StartsAt,
    ExpiresAt,
    IsActive,
    CreatedAt,
}
