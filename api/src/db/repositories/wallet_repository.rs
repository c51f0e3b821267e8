// Repository for wallets and their transaction log

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::db::DbError;
use crate::entity::{wallet_transactions, wallets};

/// Balance columns written together on every ledger mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalanceSnapshot {
    pub balance: Decimal,
    pub total_deposited: Decimal,
    pub total_withdrawn: Decimal,
}

impl From<&wallets::Model> for BalanceSnapshot {
    fn from(w: &wallets::Model) -> Self {
        BalanceSnapshot {
            balance: w.balance,
            total_deposited: w.total_deposited,
            total_withdrawn: w.total_withdrawn,
        }
    }
}

#[derive(Clone, Debug)]
pub struct WalletRepository {
    conn: Arc<DatabaseConnection>,
}

impl WalletRepository {
    pub fn new(conn: Arc<DatabaseConnection>) -> Self {
        Self { conn }
    }

    /// Find the wallet of a given type for a user
    pub async fn find(
        &self,
        user_id: Uuid,
        wallet_type: &str,
    ) -> Result<Option<wallets::Model>, DbError> {
        let result = wallets::Entity::find()
            .filter(wallets::Column::UserId.eq(user_id))
            .filter(wallets::Column::WalletType.eq(wallet_type))
            .one(self.conn.as_ref())
            .await?;
        Ok(result)
    }

    /// Insert an empty wallet
    pub async fn create(
        &self,
        user_id: Uuid,
        wallet_type: &str,
        now: DateTime<Utc>,
    ) -> Result<wallets::Model, DbError> {
        let wallet = wallets::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            wallet_type: Set(wallet_type.to_string()),
            balance: Set(Decimal::ZERO),
            total_deposited: Set(Decimal::ZERO),
            total_withdrawn: Set(Decimal::ZERO),
            created_at: Set(now),
            updated_at: Set(now),
        };
        Ok(wallet.insert(self.conn.as_ref()).await?)
    }

    /// Write new balances only if all three stored columns still equal `expected`.
    /// Returns the number of rows touched (0 means another writer got there first).
    pub async fn update_balances_if_unchanged(
        &self,
        wallet_id: Uuid,
        expected: BalanceSnapshot,
        next: BalanceSnapshot,
        now: DateTime<Utc>,
    ) -> Result<u64, DbError> {
        let result = wallets::Entity::update_many()
            .col_expr(wallets::Column::Balance, Expr::value(next.balance))
            .col_expr(
                wallets::Column::TotalDeposited,
                Expr::value(next.total_deposited),
            )
            .col_expr(
                wallets::Column::TotalWithdrawn,
                Expr::value(next.total_withdrawn),
            )
            .col_expr(wallets::Column::UpdatedAt, Expr::value(now))
            .filter(wallets::Column::Id.eq(wallet_id))
            .filter(wallets::Column::Balance.eq(expected.balance))
            .filter(wallets::Column::TotalDeposited.eq(expected.total_deposited))
            .filter(wallets::Column::TotalWithdrawn.eq(expected.total_withdrawn))
            .exec(self.conn.as_ref())
            .await?;
        Ok(result.rows_affected)
    }

    /// Unconditionally put balances back; used to compensate a half-applied mutation
    pub async fn restore_balances(
        &self,
        wallet_id: Uuid,
        previous: BalanceSnapshot,
        now: DateTime<Utc>,
    ) -> Result<u64, DbError> {
        let result = wallets::Entity::update_many()
            .col_expr(wallets::Column::Balance, Expr::value(previous.balance))
            .col_expr(
                wallets::Column::TotalDeposited,
                Expr::value(previous.total_deposited),
            )
            .col_expr(
                wallets::Column::TotalWithdrawn,
                Expr::value(previous.total_withdrawn),
            )
            .col_expr(wallets::Column::UpdatedAt, Expr::value(now))
            .filter(wallets::Column::Id.eq(wallet_id))
            .exec(self.conn.as_ref())
            .await?;
        Ok(result.rows_affected)
    }

    /// Append a row to the transaction log
    pub async fn insert_transaction(
        &self,
        transaction: wallet_transactions::ActiveModel,
    ) -> Result<wallet_transactions::Model, DbError> {
        Ok(transaction.insert(self.conn.as_ref()).await?)
    }

    /// Newest-first page of a wallet's transactions
    pub async fn list_transactions(
        &self,
        wallet_id: Uuid,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<wallet_transactions::Model>, DbError> {
        let results = wallet_transactions::Entity::find()
            .filter(wallet_transactions::Column::WalletId.eq(wallet_id))
            .order_by_desc(wallet_transactions::Column::CreatedAt)
            .limit(limit)
            .offset(offset)
            .all(self.conn.as_ref())
            .await?;
        Ok(results)
    }

    /// Full log in insertion order, for replaying balances
    pub async fn all_transactions(
        &self,
        wallet_id: Uuid,
    ) -> Result<Vec<wallet_transactions::Model>, DbError> {
        let results = wallet_transactions::Entity::find()
            .filter(wallet_transactions::Column::WalletId.eq(wallet_id))
            .order_by_asc(wallet_transactions::Column::CreatedAt)
            .all(self.conn.as_ref())
            .await?;
        Ok(results)
    }
}
