// Wallet service: balance mutations paired with ledger rows

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::ActiveValue::Set;
use serde_json::json;
use uuid::Uuid;

use crate::db::repositories::BalanceSnapshot;
use crate::db::Repositories;
use crate::entity::{wallet_transactions, wallets};
use crate::error::{ApiError, ApiResult};
use crate::models::wallet::{
    Reference, ReferenceType, TransactionStatus, TransactionType, WalletAuditResponse, WalletType,
    WalletView,
};
use crate::services::ledger;

/// One ledger movement to apply to a wallet
#[derive(Debug, Clone)]
pub struct LedgerEntry {
    pub kind: TransactionType,
    pub amount: Decimal,
    pub status: TransactionStatus,
    pub reference: Option<Reference>,
    pub description: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

/// Wallet as it stands after a recorded movement, with the log row
#[derive(Debug, Clone)]
pub struct AppliedEntry {
    pub wallet: wallets::Model,
    pub transaction: wallet_transactions::Model,
}

/// Fetch the user's wallet, creating an empty one on first access
pub async fn get_or_create_wallet(
    repos: &Repositories,
    user_id: Uuid,
    wallet_type: WalletType,
) -> ApiResult<wallets::Model> {
    if let Some(wallet) = repos.wallets.find(user_id, wallet_type.as_str()).await? {
        return Ok(wallet);
    }

    match repos
        .wallets
        .create(user_id, wallet_type.as_str(), Utc::now())
        .await
    {
        Ok(wallet) => {
            tracing::info!("Created {} wallet {} for user {}", wallet.wallet_type, wallet.id, user_id);
            Ok(wallet)
        }
        Err(e) => {
            // A parallel first request may have won the unique (user_id, wallet_type) race
            if let Some(wallet) = repos.wallets.find(user_id, wallet_type.as_str()).await? {
                return Ok(wallet);
            }
            Err(e.into())
        }
    }
}

/// Apply `entry` to `wallet` and append the matching log row.
///
/// The balance write is conditional on the balances read earlier; a lost race
/// surfaces as `Conflict`. If the log insert fails the previous balances are
/// written back, best effort.
pub async fn record(
    repos: &Repositories,
    wallet: &wallets::Model,
    entry: LedgerEntry,
    now: DateTime<Utc>,
) -> ApiResult<AppliedEntry> {
    let before = BalanceSnapshot::from(wallet);
    let after = ledger::apply(before, entry.kind, entry.amount)?;

    let updated = repos
        .wallets
        .update_balances_if_unchanged(wallet.id, before, after, now)
        .await?;
    if updated == 0 {
        tracing::warn!(
            "Wallet {} changed underneath a {} of {}",
            wallet.id,
            entry.kind.as_str(),
            entry.amount
        );
        return Err(ApiError::Conflict(
            "O saldo foi alterado por outra operação. Tente novamente.".to_string(),
        ));
    }

    let transaction = wallet_transactions::ActiveModel {
        id: Set(Uuid::new_v4()),
        wallet_id: Set(wallet.id),
        user_id: Set(wallet.user_id),
        transaction_type: Set(entry.kind.as_str().to_string()),
        amount: Set(entry.amount),
        balance_before: Set(before.balance),
        balance_after: Set(after.balance),
        status: Set(entry.status.as_str().to_string()),
        reference_type: Set(entry.reference.map(|r| r.kind.as_str().to_string())),
        reference_id: Set(entry.reference.map(|r| r.id)),
        description: Set(entry.description),
        metadata: Set(entry.metadata),
        created_at: Set(now),
    };

    match repos.wallets.insert_transaction(transaction).await {
        Ok(transaction) => {
            let mut wallet = wallet.clone();
            wallet.balance = after.balance;
            wallet.total_deposited = after.total_deposited;
            wallet.total_withdrawn = after.total_withdrawn;
            wallet.updated_at = now;
            Ok(AppliedEntry {
                wallet,
                transaction,
            })
        }
        Err(e) => {
            tracing::error!(
                "Ledger insert failed for wallet {} ({} of {}): {}; restoring balance {}",
                wallet.id,
                entry.kind.as_str(),
                entry.amount,
                e,
                before.balance
            );
            if let Err(restore_err) = repos
                .wallets
                .restore_balances(wallet.id, before, Utc::now())
                .await
            {
                tracing::error!(
                    "Compensating write failed for wallet {}: {}; stored balance no longer matches the ledger",
                    wallet.id,
                    restore_err
                );
            }
            Err(ApiError::Internal(format!(
                "Failed to record {} transaction: {}",
                entry.kind.as_str(),
                e
            )))
        }
    }
}

pub async fn deposit(
    repos: &Repositories,
    user_id: Uuid,
    wallet_type: WalletType,
    amount: Decimal,
    payment_method: Option<String>,
) -> ApiResult<AppliedEntry> {
    let amount = ledger::validate_deposit(amount)?;
    let wallet = get_or_create_wallet(repos, user_id, wallet_type).await?;

    let entry = LedgerEntry {
        kind: TransactionType::Deposit,
        amount,
        status: TransactionStatus::Completed,
        reference: None,
        description: Some("Depósito na carteira".to_string()),
        metadata: payment_method.map(|m| json!({ "payment_method": m })),
    };

    let applied = record(repos, &wallet, entry, Utc::now()).await?;
    tracing::info!(
        "Deposit of {} into wallet {}: {} -> {}",
        amount,
        wallet.id,
        applied.transaction.balance_before,
        applied.transaction.balance_after
    );
    Ok(applied)
}

/// Withdrawals leave the balance immediately and settle outside the app
pub async fn withdraw(
    repos: &Repositories,
    user_id: Uuid,
    wallet_type: WalletType,
    amount: Decimal,
    pix_key: Option<String>,
) -> ApiResult<AppliedEntry> {
    let wallet = get_or_create_wallet(repos, user_id, wallet_type).await?;
    let amount = ledger::validate_withdraw(amount, wallet.balance)?;

    let entry = LedgerEntry {
        kind: TransactionType::Withdraw,
        amount,
        status: TransactionStatus::Pending,
        reference: None,
        description: Some("Saque solicitado".to_string()),
        metadata: pix_key.map(|k| json!({ "pix_key": k })),
    };

    let applied = record(repos, &wallet, entry, Utc::now()).await?;
    tracing::info!(
        "Withdrawal of {} requested from wallet {} (pending)",
        amount,
        wallet.id
    );
    Ok(applied)
}

/// Debit the personal wallet for an in-app purchase
pub async fn charge(
    repos: &Repositories,
    user_id: Uuid,
    kind: TransactionType,
    amount: Decimal,
    reference: Reference,
    description: String,
    now: DateTime<Utc>,
) -> ApiResult<AppliedEntry> {
    let wallet = get_or_create_wallet(repos, user_id, WalletType::Personal).await?;
    let amount = ledger::round_money(amount);
    if amount > wallet.balance {
        return Err(ApiError::BadRequest("Saldo insuficiente".to_string()));
    }

    let entry = LedgerEntry {
        kind,
        amount,
        status: TransactionStatus::Completed,
        reference: Some(reference),
        description: Some(description),
        metadata: None,
    };
    record(repos, &wallet, entry, now).await
}

/// Debit for a purchase. A fully discounted purchase touches no balance and
/// logs nothing.
#[derive(Debug, Clone)]
pub struct Payment {
    pub wallet: wallets::Model,
    pub charge: Option<AppliedEntry>,
}

impl Payment {
    pub fn amount(&self) -> Decimal {
        self.charge
            .as_ref()
            .map_or(Decimal::ZERO, |c| c.transaction.amount)
    }
}

pub async fn pay(
    repos: &Repositories,
    user_id: Uuid,
    kind: TransactionType,
    amount: Decimal,
    reference: Reference,
    description: String,
    now: DateTime<Utc>,
) -> ApiResult<Payment> {
    if ledger::round_money(amount).is_zero() {
        let wallet = get_or_create_wallet(repos, user_id, WalletType::Personal).await?;
        tracing::debug!("Free {} for user {}, nothing charged", kind.as_str(), user_id);
        return Ok(Payment {
            wallet,
            charge: None,
        });
    }

    let charged = charge(repos, user_id, kind, amount, reference, description, now).await?;
    Ok(Payment {
        wallet: charged.wallet.clone(),
        charge: Some(charged),
    })
}

/// Refund whatever `payment` took, logging instead of failing
pub async fn refund_payment(repos: &Repositories, payment: &Payment, reason: &str) {
    let Some(charged) = &payment.charge else {
        return;
    };
    if let Err(e) = refund(repos, charged, reason).await {
        tracing::error!(
            "Refund of charge {} failed: {}",
            charged.transaction.id,
            e
        );
    }
}

/// Give back a charge whose follow-up write failed
pub async fn refund(
    repos: &Repositories,
    charged: &AppliedEntry,
    reason: &str,
) -> ApiResult<AppliedEntry> {
    let entry = LedgerEntry {
        kind: TransactionType::Refund,
        amount: charged.transaction.amount,
        status: TransactionStatus::Completed,
        reference: charged_reference(&charged.transaction),
        description: Some(format!("Estorno: {}", reason)),
        metadata: Some(json!({ "refunded_transaction_id": charged.transaction.id })),
    };
    let applied = record(repos, &charged.wallet, entry, Utc::now()).await?;
    tracing::warn!(
        "Refunded {} to wallet {}: {}",
        charged.transaction.amount,
        charged.wallet.id,
        reason
    );
    Ok(applied)
}

/// The refund points at whatever the original charge pointed at
fn charged_reference(transaction: &wallet_transactions::Model) -> Option<Reference> {
    let kind = transaction
        .reference_type
        .as_deref()
        .and_then(ReferenceType::parse)?;
    let id = transaction.reference_id?;
    Some(Reference { kind, id })
}

pub async fn list_transactions(
    repos: &Repositories,
    user_id: Uuid,
    wallet_type: WalletType,
    limit: u64,
    offset: u64,
) -> ApiResult<(wallets::Model, Vec<wallet_transactions::Model>)> {
    let wallet = get_or_create_wallet(repos, user_id, wallet_type).await?;
    let transactions = repos
        .wallets
        .list_transactions(wallet.id, limit, offset)
        .await?;
    Ok((wallet, transactions))
}

/// Compare stored balances with the ones rebuilt from the log
pub async fn audit(
    repos: &Repositories,
    user_id: Uuid,
    wallet_type: WalletType,
) -> ApiResult<WalletAuditResponse> {
    let wallet = get_or_create_wallet(repos, user_id, wallet_type).await?;
    let transactions = repos.wallets.all_transactions(wallet.id).await?;
    let replayed = ledger::replay(&transactions);
    let stored = BalanceSnapshot::from(&wallet);
    let consistent = stored == replayed.totals;

    if !consistent {
        tracing::warn!(
            "Wallet {} drifted from its ledger: stored {:?}, replayed {:?}",
            wallet.id,
            stored,
            replayed.totals
        );
    }

    Ok(WalletAuditResponse {
        wallet: WalletView::from(&wallet),
        expected_balance: replayed.totals.balance,
        expected_total_deposited: replayed.totals.total_deposited,
        expected_total_withdrawn: replayed.totals.total_withdrawn,
        transactions_counted: replayed.counted,
        consistent,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, DatabaseConnection, DbErr, MockDatabase, MockExecResult, Transaction};
    use std::sync::Arc;

    /// Repositories over a mock connection the test keeps a handle to
    pub(crate) fn mock_repositories(db: MockDatabase) -> (Repositories, Arc<DatabaseConnection>) {
        let conn = Arc::new(db.into_connection());
        (Repositories::from_arc(conn.clone()), conn)
    }

    /// Statements the mock received, once the repositories are gone
    pub(crate) fn transaction_log(
        repos: Repositories,
        conn: Arc<DatabaseConnection>,
    ) -> Vec<Transaction> {
        drop(repos);
        match Arc::try_unwrap(conn) {
            Ok(conn) => conn.into_transaction_log(),
            Err(_) => panic!("mock connection is still shared"),
        }
    }

    /// The WHERE clause of a logged statement
    pub(crate) fn where_clause(transaction: &Transaction) -> String {
        let sql = format!("{:?}", transaction);
        sql.split_once("WHERE")
            .map(|(_, guard)| guard.to_string())
            .unwrap_or_default()
    }

    pub(crate) fn wallet(user_id: Uuid, balance: Decimal) -> wallets::Model {
        let now = Utc::now();
        wallets::Model {
            id: Uuid::new_v4(),
            user_id,
            wallet_type: "personal".to_string(),
            balance,
            total_deposited: balance,
            total_withdrawn: Decimal::ZERO,
            created_at: now,
            updated_at: now,
        }
    }

    pub(crate) fn transaction_row(
        wallet: &wallets::Model,
        kind: TransactionType,
        amount: Decimal,
        before: Decimal,
        after: Decimal,
        status: TransactionStatus,
    ) -> wallet_transactions::Model {
        wallet_transactions::Model {
            id: Uuid::new_v4(),
            wallet_id: wallet.id,
            user_id: wallet.user_id,
            transaction_type: kind.as_str().to_string(),
            amount,
            balance_before: before,
            balance_after: after,
            status: status.as_str().to_string(),
            reference_type: None,
            reference_id: None,
            description: None,
            metadata: None,
            created_at: Utc::now(),
        }
    }

    pub(crate) fn exec(rows: u64) -> MockExecResult {
        MockExecResult {
            last_insert_id: 0,
            rows_affected: rows,
        }
    }

    #[tokio::test]
    async fn test_deposit_updates_balance_and_logs_completed() {
        let user = Uuid::new_v4();
        let stored = wallet(user, Decimal::new(100, 0));
        let logged = transaction_row(
            &stored,
            TransactionType::Deposit,
            Decimal::new(50, 0),
            Decimal::new(100, 0),
            Decimal::new(150, 0),
            TransactionStatus::Completed,
        );

        let conn = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![stored.clone()]])
            .append_query_results([vec![logged.clone()]])
            .append_exec_results([exec(1)])
            .into_connection();
        let repos = Repositories::new(conn);

        let applied = deposit(&repos, user, WalletType::Personal, Decimal::new(50, 0), None)
            .await
            .unwrap();

        assert_eq!(applied.wallet.balance, Decimal::new(150, 0));
        assert_eq!(applied.wallet.total_deposited, Decimal::new(150, 0));
        assert_eq!(applied.transaction.status, "completed");
        assert_eq!(
            applied.transaction.balance_after,
            applied.transaction.balance_before + Decimal::new(50, 0)
        );
    }

    #[tokio::test]
    async fn test_deposit_over_limit_touches_nothing() {
        let conn = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let repos = Repositories::new(conn);

        let result = deposit(
            &repos,
            Uuid::new_v4(),
            WalletType::Personal,
            Decimal::new(10_001, 0),
            None,
        )
        .await;
        assert!(matches!(result, Err(ApiError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_withdraw_is_pending_and_tracks_total() {
        let user = Uuid::new_v4();
        let stored = wallet(user, Decimal::new(80, 0));
        let logged = transaction_row(
            &stored,
            TransactionType::Withdraw,
            Decimal::new(30, 0),
            Decimal::new(80, 0),
            Decimal::new(50, 0),
            TransactionStatus::Pending,
        );

        let conn = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![stored.clone()]])
            .append_query_results([vec![logged]])
            .append_exec_results([exec(1)])
            .into_connection();
        let repos = Repositories::new(conn);

        let applied = withdraw(
            &repos,
            user,
            WalletType::Personal,
            Decimal::new(30, 0),
            Some("chave@pix.com".to_string()),
        )
        .await
        .unwrap();

        assert_eq!(applied.wallet.balance, Decimal::new(50, 0));
        assert_eq!(applied.wallet.total_withdrawn, Decimal::new(30, 0));
        assert_eq!(applied.transaction.status, "pending");
    }

    #[tokio::test]
    async fn test_withdraw_more_than_balance_is_rejected() {
        let user = Uuid::new_v4();
        let conn = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![wallet(user, Decimal::new(20, 0))]])
            .into_connection();
        let repos = Repositories::new(conn);

        let result = withdraw(&repos, user, WalletType::Personal, Decimal::new(25, 0), None).await;
        assert!(matches!(result, Err(ApiError::BadRequest(msg)) if msg == "Saldo insuficiente"));
    }

    #[tokio::test]
    async fn test_lost_race_is_a_conflict() {
        let user = Uuid::new_v4();
        let conn = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![wallet(user, Decimal::new(100, 0))]])
            .append_exec_results([exec(0)])
            .into_connection();
        let repos = Repositories::new(conn);

        let result = deposit(&repos, user, WalletType::Personal, Decimal::new(10, 0), None).await;
        assert!(matches!(result, Err(ApiError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_failed_log_insert_restores_balance() {
        let user = Uuid::new_v4();
        let (repos, conn) = mock_repositories(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![wallet(user, Decimal::new(100, 0))]])
                .append_query_errors([DbErr::Custom("insert failed".to_string())])
                .append_exec_results([exec(1), exec(1)]),
        );

        let result = deposit(&repos, user, WalletType::Personal, Decimal::new(10, 0), None).await;
        assert!(matches!(result, Err(ApiError::Internal(_))));

        // find, conditional update, failed insert, compensating update
        let log = transaction_log(repos, conn);
        assert_eq!(log.len(), 4);
    }

    #[tokio::test]
    async fn test_balance_write_guards_every_balance_column() {
        let user = Uuid::new_v4();
        let stored = wallet(user, Decimal::new(100, 0));
        let logged = transaction_row(
            &stored,
            TransactionType::Deposit,
            Decimal::new(10, 0),
            Decimal::new(100, 0),
            Decimal::new(110, 0),
            TransactionStatus::Completed,
        );

        let (repos, conn) = mock_repositories(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![stored]])
                .append_query_results([vec![logged]])
                .append_exec_results([exec(1)]),
        );

        deposit(&repos, user, WalletType::Personal, Decimal::new(10, 0), None)
            .await
            .unwrap();

        // A balance that returned to its old value must not hide a moved total
        let log = transaction_log(repos, conn);
        let guard = where_clause(&log[1]);
        assert!(guard.contains("balance"), "{}", guard);
        assert!(guard.contains("total_deposited"), "{}", guard);
        assert!(guard.contains("total_withdrawn"), "{}", guard);
    }

    #[tokio::test]
    async fn test_audit_detects_drift() {
        let user = Uuid::new_v4();
        let stored = wallet(user, Decimal::new(100, 0));
        let log = vec![transaction_row(
            &stored,
            TransactionType::Deposit,
            Decimal::new(90, 0),
            Decimal::ZERO,
            Decimal::new(90, 0),
            TransactionStatus::Completed,
        )];

        let conn = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![stored]])
            .append_query_results([log])
            .into_connection();
        let repos = Repositories::new(conn);

        let audit = audit(&repos, user, WalletType::Personal).await.unwrap();
        assert!(!audit.consistent);
        assert_eq!(audit.expected_balance, Decimal::new(90, 0));
        assert_eq!(audit.transactions_counted, 1);
    }
}
