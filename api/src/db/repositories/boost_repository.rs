// Repository for event boost rows

use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::db::DbError;
use crate::entity::event_boosts;

#[derive(Clone, Debug)]
pub struct BoostRepository {
    conn: Arc<DatabaseConnection>,
}

impl BoostRepository {
    pub fn new(conn: Arc<DatabaseConnection>) -> Self {
        Self { conn }
    }

    pub async fn insert(
        &self,
        boost: event_boosts::ActiveModel,
    ) -> Result<event_boosts::Model, DbError> {
        Ok(boost.insert(self.conn.as_ref()).await?)
    }

    /// Active, unexpired boost with the latest expiry for an event
    pub async fn latest_active_for_event(
        &self,
        event_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<event_boosts::Model>, DbError> {
        let result = event_boosts::Entity::find()
            .filter(event_boosts::Column::EventId.eq(event_id))
            .filter(event_boosts::Column::IsActive.eq(true))
            .filter(event_boosts::Column::ExpiresAt.gt(now))
            .order_by_desc(event_boosts::Column::ExpiresAt)
            .one(self.conn.as_ref())
            .await?;
        Ok(result)
    }

    pub async fn count_active_for_event(
        &self,
        event_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<u64, DbError> {
        let count = event_boosts::Entity::find()
            .filter(event_boosts::Column::EventId.eq(event_id))
            .filter(event_boosts::Column::IsActive.eq(true))
            .filter(event_boosts::Column::ExpiresAt.gt(now))
            .count(self.conn.as_ref())
            .await?;
        Ok(count)
    }

    /// Flip expired rows of one event to inactive
    pub async fn deactivate_expired_for_event(
        &self,
        event_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<u64, DbError> {
        let result = event_boosts::Entity::update_many()
            .col_expr(event_boosts::Column::IsActive, Expr::value(false))
            .filter(event_boosts::Column::EventId.eq(event_id))
            .filter(event_boosts::Column::IsActive.eq(true))
            .filter(event_boosts::Column::ExpiresAt.lte(now))
            .exec(self.conn.as_ref())
            .await?;
        Ok(result.rows_affected)
    }

    /// Every active row whose expiry has passed
    pub async fn find_expired_active(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<event_boosts::Model>, DbError> {
        let results = event_boosts::Entity::find()
            .filter(event_boosts::Column::IsActive.eq(true))
            .filter(event_boosts::Column::ExpiresAt.lte(now))
            .all(self.conn.as_ref())
            .await?;
        Ok(results)
    }

    pub async fn deactivate(&self, boost_ids: &[Uuid]) -> Result<u64, DbError> {
        if boost_ids.is_empty() {
            return Ok(0);
        }
        let result = event_boosts::Entity::update_many()
            .col_expr(event_boosts::Column::IsActive, Expr::value(false))
            .filter(event_boosts::Column::Id.is_in(boost_ids.to_vec()))
            .filter(event_boosts::Column::IsActive.eq(true))
            .exec(self.conn.as_ref())
            .await?;
        Ok(result.rows_affected)
    }

    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<event_boosts::Model>, DbError> {
        let results = event_boosts::Entity::find()
            .filter(event_boosts::Column::UserId.eq(user_id))
            .order_by_desc(event_boosts::Column::CreatedAt)
            .all(self.conn.as_ref())
            .await?;
        Ok(results)
    }
}
