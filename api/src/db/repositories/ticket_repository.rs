// Repository for support tickets and their message threads

use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::db::DbError;
use crate::entity::{support_tickets, ticket_messages};

#[derive(Clone, Debug)]
pub struct TicketRepository {
    conn: Arc<DatabaseConnection>,
}

impl TicketRepository {
    pub fn new(conn: Arc<DatabaseConnection>) -> Self {
        Self { conn }
    }

    pub async fn insert_ticket(
        &self,
        ticket: support_tickets::ActiveModel,
    ) -> Result<support_tickets::Model, DbError> {
        Ok(ticket.insert(self.conn.as_ref()).await?)
    }

    pub async fn insert_message(
        &self,
        message: ticket_messages::ActiveModel,
    ) -> Result<ticket_messages::Model, DbError> {
        Ok(message.insert(self.conn.as_ref()).await?)
    }

    /// Drop a ticket that never got its opening message
    pub async fn delete_ticket(&self, ticket_id: Uuid) -> Result<u64, DbError> {
        let result = support_tickets::Entity::delete_by_id(ticket_id)
            .exec(self.conn.as_ref())
            .await?;
        Ok(result.rows_affected)
    }

    pub async fn get_ticket(&self, ticket_id: Uuid) -> Result<Option<support_tickets::Model>, DbError> {
        let result = support_tickets::Entity::find_by_id(ticket_id)
            .one(self.conn.as_ref())
            .await?;
        Ok(result)
    }

    /// Page of tickets ordered by latest activity; `owner` = None lists every user's tickets
    pub async fn list_tickets(
        &self,
        owner: Option<Uuid>,
        status: Option<&str>,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<support_tickets::Model>, DbError> {
        let mut query = support_tickets::Entity::find();

        if let Some(user_id) = owner {
            query = query.filter(support_tickets::Column::UserId.eq(user_id));
        }
        if let Some(s) = status {
            query = query.filter(support_tickets::Column::Status.eq(s));
        }

        let results = query
            .order_by_desc(support_tickets::Column::LastMessageAt)
            .limit(limit)
            .offset(offset)
            .all(self.conn.as_ref())
            .await?;
        Ok(results)
    }

    pub async fn messages_for_ticket(
        &self,
        ticket_id: Uuid,
    ) -> Result<Vec<ticket_messages::Model>, DbError> {
        let results = ticket_messages::Entity::find()
            .filter(ticket_messages::Column::TicketId.eq(ticket_id))
            .order_by_asc(ticket_messages::Column::CreatedAt)
            .all(self.conn.as_ref())
            .await?;
        Ok(results)
    }

    pub async fn set_status(
        &self,
        ticket_id: Uuid,
        status: &str,
        now: DateTime<Utc>,
    ) -> Result<u64, DbError> {
        let result = support_tickets::Entity::update_many()
            .col_expr(support_tickets::Column::Status, Expr::value(status))
            .col_expr(support_tickets::Column::UpdatedAt, Expr::value(now))
            .filter(support_tickets::Column::Id.eq(ticket_id))
            .exec(self.conn.as_ref())
            .await?;
        Ok(result.rows_affected)
    }

    /// Bump activity timestamps after a reply, optionally moving the status
    pub async fn touch(
        &self,
        ticket_id: Uuid,
        status: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<u64, DbError> {
        let mut update = support_tickets::Entity::update_many()
            .col_expr(support_tickets::Column::LastMessageAt, Expr::value(now))
            .col_expr(support_tickets::Column::UpdatedAt, Expr::value(now));
        if let Some(s) = status {
            update = update.col_expr(support_tickets::Column::Status, Expr::value(s));
        }
        let result = update
            .filter(support_tickets::Column::Id.eq(ticket_id))
            .exec(self.conn.as_ref())
            .await?;
        Ok(result.rows_affected)
    }
}
