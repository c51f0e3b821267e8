// Wallet ledger arithmetic: validation, balance mutation and log replay.
// Everything here is pure so the rules can be checked without a database.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::db::repositories::BalanceSnapshot;
use crate::entity::wallet_transactions;
use crate::error::{ApiError, ApiResult};
use crate::models::wallet::{TransactionStatus, TransactionType};

/// Largest single deposit, in BRL
pub fn max_deposit() -> Decimal {
    Decimal::new(10_000, 0)
}

/// Smallest withdrawal, in BRL
pub fn min_withdraw() -> Decimal {
    Decimal::new(10, 0)
}

/// Money is kept with two decimal places, half away from zero
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

pub fn validate_deposit(amount: Decimal) -> ApiResult<Decimal> {
    let amount = round_money(amount);
    if amount <= Decimal::ZERO {
        return Err(ApiError::BadRequest(
            "O valor do depósito deve ser maior que zero".to_string(),
        ));
    }
    if amount > max_deposit() {
        return Err(ApiError::BadRequest(format!(
            "O valor máximo por depósito é R$ {}",
            max_deposit()
        )));
    }
    Ok(amount)
}

pub fn validate_withdraw(amount: Decimal, balance: Decimal) -> ApiResult<Decimal> {
    let amount = round_money(amount);
    if amount < min_withdraw() {
        return Err(ApiError::BadRequest(format!(
            "O valor mínimo para saque é R$ {}",
            min_withdraw()
        )));
    }
    if amount > balance {
        return Err(ApiError::BadRequest("Saldo insuficiente".to_string()));
    }
    Ok(amount)
}

/// Price after a percentage discount, clamped to 0..=100 percent
pub fn apply_discount(base: Decimal, percent: Decimal) -> Decimal {
    let percent = percent.clamp(Decimal::ZERO, Decimal::ONE_HUNDRED);
    round_money(base * (Decimal::ONE_HUNDRED - percent) / Decimal::ONE_HUNDRED)
}

/// Balances after applying one transaction of `kind` to `current`.
/// Debits that would overdraw the wallet are rejected.
pub fn apply(
    current: BalanceSnapshot,
    kind: TransactionType,
    amount: Decimal,
) -> ApiResult<BalanceSnapshot> {
    if amount <= Decimal::ZERO {
        return Err(ApiError::BadRequest(
            "O valor deve ser maior que zero".to_string(),
        ));
    }

    let mut next = current;
    if kind.is_credit() {
        next.balance += amount;
    } else {
        if amount > current.balance {
            return Err(ApiError::BadRequest("Saldo insuficiente".to_string()));
        }
        next.balance -= amount;
    }

    match kind {
        TransactionType::Deposit => next.total_deposited += amount,
        TransactionType::Withdraw => next.total_withdrawn += amount,
        _ => {}
    }

    Ok(next)
}

/// Balances implied by a transaction log
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Replay {
    pub totals: BalanceSnapshot,
    pub counted: usize,
}

/// Rebuild balances from the log. Rows that never moved money and rows with
/// unknown kinds are skipped.
pub fn replay(transactions: &[wallet_transactions::Model]) -> Replay {
    let mut totals = BalanceSnapshot {
        balance: Decimal::ZERO,
        total_deposited: Decimal::ZERO,
        total_withdrawn: Decimal::ZERO,
    };
    let mut counted = 0;

    for tx in transactions {
        let Some(kind) = TransactionType::parse(&tx.transaction_type) else {
            tracing::warn!("Skipping transaction {} with unknown type {}", tx.id, tx.transaction_type);
            continue;
        };
        let moved = TransactionStatus::parse(&tx.status).map_or(false, |s| s.affects_balance());
        if !moved {
            continue;
        }

        if kind.is_credit() {
            totals.balance += tx.amount;
        } else {
            totals.balance -= tx.amount;
        }
        match kind {
            TransactionType::Deposit => totals.total_deposited += tx.amount,
            TransactionType::Withdraw => totals.total_withdrawn += tx.amount,
            _ => {}
        }
        counted += 1;
    }

    Replay { totals, counted }
}
