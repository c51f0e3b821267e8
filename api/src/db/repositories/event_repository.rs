use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use std::sync::Arc;
use uuid::Uuid;

use crate::db::DbError;
use crate::entity::events;

/// Repository for the boost-related columns of events
#[derive(Clone, Debug)]
pub struct EventRepository {
    conn: Arc<DatabaseConnection>,
}

impl EventRepository {
    pub fn new(conn: Arc<DatabaseConnection>) -> Self {
        Self { conn }
    }

    pub async fn get_by_id(&self, event_id: Uuid) -> Result<Option<events::Model>, DbError> {
        let result = events::Entity::find_by_id(event_id).one(self.conn.as_ref()).await?;
        Ok(result)
    }

    /// Store the recomputed active boost count
    pub async fn set_boost_counters(
        &self,
        event_id: Uuid,
        active_boosts: i32,
        now: DateTime<Utc>,
    ) -> Result<u64, DbError> {
        let result = events::Entity::update_many()
            .col_expr(events::Column::ActiveBoostsCount, Expr::value(active_boosts))
            .col_expr(events::Column::IsBoosted, Expr::value(active_boosts > 0))
            .col_expr(events::Column::UpdatedAt, Expr::value(now))
            .filter(events::Column::Id.eq(event_id))
            .exec(self.conn.as_ref())
            .await?;
        Ok(result.rows_affected)
    }
}
