use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use std::sync::Arc;
use uuid::Uuid;

use crate::db::DbError;
use crate::entity::profiles;

/// Repository for user profiles
#[derive(Clone, Debug)]
pub struct ProfileRepository {
    conn: Arc<DatabaseConnection>,
}

impl ProfileRepository {
    pub fn new(conn: Arc<DatabaseConnection>) -> Self {
        Self { conn }
    }

    pub async fn get_by_id(&self, user_id: Uuid) -> Result<Option<profiles::Model>, DbError> {
        let result = profiles::Entity::find_by_id(user_id).one(self.conn.as_ref()).await?;
        Ok(result)
    }

    /// Returns false for users without a profile row
    pub async fn is_admin(&self, user_id: Uuid) -> Result<bool, DbError> {
        Ok(self
            .get_by_id(user_id)
            .await?
            .map_or(false, |p| p.is_admin))
    }

    /// Set the legacy premium flag; subscriptions never raise it
    pub async fn set_premium_flag(
        &self,
        user_id: Uuid,
        is_premium: bool,
        now: DateTime<Utc>,
    ) -> Result<u64, DbError> {
        let result = profiles::Entity::update_many()
            .col_expr(profiles::Column::IsPremium, Expr::value(is_premium))
            .col_expr(profiles::Column::UpdatedAt, Expr::value(now))
            .filter(profiles::Column::Id.eq(user_id))
            .exec(self.conn.as_ref())
            .await?;
        Ok(result.rows_affected)
    }
}
