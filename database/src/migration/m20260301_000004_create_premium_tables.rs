use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20260301_000004_create_premium_tables"
    }
}

/// Starting catalogue: slug, name, price, days, boost discount, features, order
const PLANS: [(&str, &str, &str, i32, &str, &str, i32); 3] = [
    (
        "mensal",
        "Premium Mensal",
        "19.90",
        30,
        "20",
        r#"["Desconto em boosts","Selo premium","Suporte prioritário"]"#,
        1,
    ),
    (
        "trimestral",
        "Premium Trimestral",
        "49.90",
        90,
        "25",
        r#"["Desconto em boosts","Selo premium","Suporte prioritário"]"#,
        2,
    ),
    (
        "anual",
        "Premium Anual",
        "179.90",
        365,
        "30",
        r#"["Desconto em boosts","Selo premium","Suporte prioritário","Destaque no perfil"]"#,
        3,
    ),
];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PremiumPlans::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PremiumPlans::Id)
                            .uuid()
                            .not_null()
                            .primary_key()
                            .default(Expr::cust("gen_random_uuid()")),
                    )
                    .col(
                        ColumnDef::new(PremiumPlans::Slug)
                            .string_len(32)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(PremiumPlans::Name).string_len(80).not_null())
                    .col(ColumnDef::new(PremiumPlans::Price).decimal_len(12, 2).not_null())
                    .col(ColumnDef::new(PremiumPlans::DurationDays).integer().not_null())
                    .col(
                        ColumnDef::new(PremiumPlans::BoostDiscountPercent)
                            .decimal_len(5, 2)
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(PremiumPlans::Features)
                            .json_binary()
                            .not_null()
                            .default(Expr::cust("'[]'::jsonb")),
                    )
                    .col(
                        ColumnDef::new(PremiumPlans::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(PremiumPlans::SortOrder)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(PremiumPlans::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PremiumSubscriptions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PremiumSubscriptions::Id)
                            .uuid()
                            .not_null()
                            .primary_key()
                            .default(Expr::cust("gen_random_uuid()")),
                    )
                    .col(ColumnDef::new(PremiumSubscriptions::UserId).uuid().not_null())
                    .col(ColumnDef::new(PremiumSubscriptions::PlanId).uuid().not_null())
                    .col(
                        ColumnDef::new(PremiumSubscriptions::Status)
                            .string_len(16)
                            .not_null()
                            .default("active"),
                    )
                    .col(
                        ColumnDef::new(PremiumSubscriptions::PricePaid)
                            .decimal_len(12, 2)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PremiumSubscriptions::StartedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PremiumSubscriptions::ExpiresAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PremiumSubscriptions::CancelledAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(PremiumSubscriptions::AutoRenew)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(PremiumSubscriptions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_premium_subscriptions_plan")
                            .from(PremiumSubscriptions::Table, PremiumSubscriptions::PlanId)
                            .to(PremiumPlans::Table, PremiumPlans::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_premium_subscriptions_user_status")
                    .table(PremiumSubscriptions::Table)
                    .col(PremiumSubscriptions::UserId)
                    .col(PremiumSubscriptions::Status)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        // Seed the plan catalogue
        let mut insert = Query::insert();
        insert
            .into_table(PremiumPlans::Table)
            .columns([
                PremiumPlans::Slug,
                PremiumPlans::Name,
                PremiumPlans::Price,
                PremiumPlans::DurationDays,
                PremiumPlans::BoostDiscountPercent,
                PremiumPlans::Features,
                PremiumPlans::SortOrder,
            ])
            .on_conflict(OnConflict::column(PremiumPlans::Slug).do_nothing().to_owned());

        for (slug, name, price, days, discount, features, order) in PLANS {
            insert
                .values([
                    slug.into(),
                    name.into(),
                    Expr::cust(format!("{}::numeric", price)),
                    days.into(),
                    Expr::cust(format!("{}::numeric", discount)),
                    Expr::cust(format!("'{}'::jsonb", features)),
                    order.into(),
                ])
                .map_err(|e| DbErr::Migration(e.to_string()))?;
        }

        manager.exec_stmt(insert).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(
                Table::drop()
                    .table(PremiumSubscriptions::Table)
                    .if_exists()
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().table(PremiumPlans::Table).if_exists().to_owned())
            .await
    }
}

#[derive(Iden)]
enum PremiumPlans {
    Table,
    Id,
    Slug,
    Name,
    Price,
    DurationDays,
    BoostDiscountPercent,
    Features,
    IsActive,
    SortOrder,
    CreatedAt,
}

#[derive(Iden)]
enum PremiumSubscriptions {
    Table,
    Id,
    UserId,
    PlanId,
    Status,
    PricePaid,
    StartedAt,
    ExpiresAt,
    CancelledAt,
    AutoRenew,
    CreatedAt,
}
