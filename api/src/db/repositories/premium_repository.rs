// Repository for premium plans and subscriptions

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::db::DbError;
use crate::entity::{premium_plans, premium_subscriptions};
use crate::models::premium::SubscriptionStatus;

#[derive(Clone, Debug)]
pub struct PremiumRepository {
    conn: Arc<DatabaseConnection>,
}

impl PremiumRepository {
    pub fn new(conn: Arc<DatabaseConnection>) -> Self {
        Self { conn }
    }

    /// Plans offered for sale, in display order
    pub async fn list_active_plans(&self) -> Result<Vec<premium_plans::Model>, DbError> {
        let results = premium_plans::Entity::find()
            .filter(premium_plans::Column::IsActive.eq(true))
            .order_by_asc(premium_plans::Column::SortOrder)
            .order_by_asc(premium_plans::Column::Price)
            .all(self.conn.as_ref())
            .await?;
        Ok(results)
    }

    pub async fn get_plan(&self, plan_id: Uuid) -> Result<Option<premium_plans::Model>, DbError> {
        let result = premium_plans::Entity::find_by_id(plan_id)
            .one(self.conn.as_ref())
            .await?;
        Ok(result)
    }

    /// Batch lookup, including retired plans
    pub async fn plans_by_ids(&self, plan_ids: &[Uuid]) -> Result<Vec<premium_plans::Model>, DbError> {
        if plan_ids.is_empty() {
            return Ok(Vec::new());
        }
        let results = premium_plans::Entity::find()
            .filter(premium_plans::Column::Id.is_in(plan_ids.to_vec()))
            .all(self.conn.as_ref())
            .await?;
        Ok(results)
    }

    /// The user's subscription that is active and still inside its paid period
    pub async fn find_active_subscription(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<premium_subscriptions::Model>, DbError> {
        let result = premium_subscriptions::Entity::find()
            .filter(premium_subscriptions::Column::UserId.eq(user_id))
            .filter(premium_subscriptions::Column::Status.eq(SubscriptionStatus::Active.as_str()))
            .filter(premium_subscriptions::Column::ExpiresAt.gt(now))
            .order_by_desc(premium_subscriptions::Column::ExpiresAt)
            .one(self.conn.as_ref())
            .await?;
        Ok(result)
    }

    /// Every subscription the user ever had, newest first
    pub async fn subscriptions_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<premium_subscriptions::Model>, DbError> {
        let results = premium_subscriptions::Entity::find()
            .filter(premium_subscriptions::Column::UserId.eq(user_id))
            .order_by_desc(premium_subscriptions::Column::CreatedAt)
            .all(self.conn.as_ref())
            .await?;
        Ok(results)
    }

    pub async fn insert_subscription(
        &self,
        subscription: premium_subscriptions::ActiveModel,
    ) -> Result<premium_subscriptions::Model, DbError> {
        Ok(subscription.insert(self.conn.as_ref()).await?)
    }

    pub async fn mark_cancelled(
        &self,
        subscription: premium_subscriptions::Model,
        now: DateTime<Utc>,
    ) -> Result<premium_subscriptions::Model, DbError> {
        let mut active: premium_subscriptions::ActiveModel = subscription.into();
        active.status = Set(SubscriptionStatus::Cancelled.as_str().to_string());
        active.cancelled_at = Set(Some(now));
        active.auto_renew = Set(false);
        Ok(active.update(self.conn.as_ref()).await?)
    }
}
