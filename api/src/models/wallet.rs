// Wallet ledger models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entity::{wallet_transactions, wallets};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WalletType {
    #[default]
    Personal,
    Business,
}

impl WalletType {
    pub fn as_str(&self) -> &'static str {
        match self {
            WalletType::Personal => "personal",
            WalletType::Business => "business",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Deposit,
    Withdraw,
    Purchase,
    Refund,
    Boost,
    Premium,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Deposit => "deposit",
            TransactionType::Withdraw => "withdraw",
            TransactionType::Purchase => "purchase",
            TransactionType::Refund => "refund",
            TransactionType::Boost => "boost",
            TransactionType::Premium => "premium",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "deposit" => Some(TransactionType::Deposit),
            "withdraw" => Some(TransactionType::Withdraw),
            "purchase" => Some(TransactionType::Purchase),
            "refund" => Some(TransactionType::Refund),
            "boost" => Some(TransactionType::Boost),
            "premium" => Some(TransactionType::Premium),
            _ => None,
        }
    }

    /// Deposits and refunds add to the balance, everything else subtracts
    pub fn is_credit(&self) -> bool {
        matches!(self, TransactionType::Deposit | TransactionType::Refund)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Completed,
    Pending,
    Failed,
    Cancelled,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Completed => "completed",
            TransactionStatus::Pending => "pending",
            TransactionStatus::Failed => "failed",
            TransactionStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "completed" => Some(TransactionStatus::Completed),
            "pending" => Some(TransactionStatus::Pending),
            "failed" => Some(TransactionStatus::Failed),
            "cancelled" => Some(TransactionStatus::Cancelled),
            _ => None,
        }
    }

    /// Failed and cancelled rows never moved money
    pub fn affects_balance(&self) -> bool {
        matches!(
            self,
            TransactionStatus::Completed | TransactionStatus::Pending
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceType {
    Event,
    Boost,
    Subscription,
}

impl ReferenceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReferenceType::Event => "event",
            ReferenceType::Boost => "boost",
            ReferenceType::Subscription => "subscription",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "event" => Some(ReferenceType::Event),
            "boost" => Some(ReferenceType::Boost),
            "subscription" => Some(ReferenceType::Subscription),
            _ => None,
        }
    }
}

/// Link from a ledger row to the entity that caused it
#[derive(Debug, Clone, Copy)]
pub struct Reference {
    pub kind: ReferenceType,
    pub id: Uuid,
}

#[derive(Debug, Deserialize, Default)]
pub struct WalletQuery {
    #[serde(default)]
    pub wallet_type: WalletType,
}

#[derive(Debug, Deserialize)]
pub struct TransactionsQuery {
    #[serde(default)]
    pub wallet_type: WalletType,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

/// Request body for POST /api/wallet/deposit
#[derive(Debug, Deserialize)]
pub struct DepositRequest {
    pub amount: Decimal,
    #[serde(default)]
    pub wallet_type: WalletType,
    pub payment_method: Option<String>,
}

/// Request body for POST /api/wallet/withdraw
#[derive(Debug, Deserialize)]
pub struct WithdrawRequest {
    pub amount: Decimal,
    #[serde(default)]
    pub wallet_type: WalletType,
    pub pix_key: Option<String>,
}

#[derive(Debug, Serialize, Clone)]
pub struct WalletView {
    pub id: Uuid,
    pub wallet_type: String,
    pub balance: Decimal,
    pub total_deposited: Decimal,
    pub total_withdrawn: Decimal,
    pub updated_at: DateTime<Utc>,
}

impl From<&wallets::Model> for WalletView {
    fn from(m: &wallets::Model) -> Self {
        WalletView {
            id: m.id,
            wallet_type: m.wallet_type.clone(),
            balance: m.balance,
            total_deposited: m.total_deposited,
            total_withdrawn: m.total_withdrawn,
            updated_at: m.updated_at,
        }
    }
}

#[derive(Debug, Serialize, Clone)]
pub struct TransactionView {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub transaction_type: String,
    pub amount: Decimal,
    pub balance_before: Decimal,
    pub balance_after: Decimal,
    pub status: String,
    pub reference_type: Option<String>,
    pub reference_id: Option<Uuid>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&wallet_transactions::Model> for TransactionView {
    fn from(m: &wallet_transactions::Model) -> Self {
        TransactionView {
            id: m.id,
            transaction_type: m.transaction_type.clone(),
            amount: m.amount,
            balance_before: m.balance_before,
            balance_after: m.balance_after,
            status: m.status.clone(),
            reference_type: m.reference_type.clone(),
            reference_id: m.reference_id,
            description: m.description.clone(),
            created_at: m.created_at,
        }
    }
}

/// Response for deposit/withdraw
#[derive(Debug, Serialize)]
pub struct WalletMutationResponse {
    pub success: bool,
    pub message: String,
    pub wallet: WalletView,
    pub transaction: TransactionView,
}

#[derive(Debug, Serialize)]
pub struct TransactionsResponse {
    pub wallet_id: Uuid,
    pub transactions: Vec<TransactionView>,
    pub limit: u64,
    pub offset: u64,
}

/// Stored balances next to the ones rebuilt from the transaction log
#[derive(Debug, Serialize)]
pub struct WalletAuditResponse {
    pub wallet: WalletView,
    pub expected_balance: Decimal,
    pub expected_total_deposited: Decimal,
    pub expected_total_withdrawn: Decimal,
    pub transactions_counted: usize,
    pub consistent: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_type_round_trip_names() {
        for kind in [
            TransactionType::Deposit,
            TransactionType::Withdraw,
            TransactionType::Purchase,
            TransactionType::Refund,
            TransactionType::Boost,
            TransactionType::Premium,
        ] {
            assert_eq!(TransactionType::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(TransactionType::parse("transfer"), None);
    }

    #[test]
    fn test_credit_kinds() {
        assert!(TransactionType::Deposit.is_credit());
        assert!(TransactionType::Refund.is_credit());
        assert!(!TransactionType::Boost.is_credit());
        assert!(!TransactionType::Withdraw.is_credit());
    }

    #[test]
    fn test_wallet_type_defaults_to_personal() {
        let query: WalletQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(query.wallet_type, WalletType::Personal);

        let req: DepositRequest =
            serde_json::from_str(r#"{"amount": 50.5, "wallet_type": "business"}"#).unwrap();
        assert_eq!(req.wallet_type, WalletType::Business);
        assert_eq!(req.amount, Decimal::new(505, 1));
    }
}
