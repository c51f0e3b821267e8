// Wallet API endpoint handlers

use axum::{extract::State, Json};

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::handlers::extract::{JsonBody, QueryParams};
use crate::handlers::{enforce_rate_limit, AppState};
use crate::models::wallet::{
    DepositRequest, TransactionView, TransactionsQuery, TransactionsResponse, WalletAuditResponse,
    WalletMutationResponse, WalletQuery, WalletView, WithdrawRequest,
};
use crate::models::PageParams;
use crate::services::wallet_service::{self, AppliedEntry};

fn mutation_response(applied: AppliedEntry, message: &str) -> WalletMutationResponse {
    WalletMutationResponse {
        success: true,
        message: message.to_string(),
        wallet: WalletView::from(&applied.wallet),
        transaction: TransactionView::from(&applied.transaction),
    }
}

/// GET /api/wallet
pub async fn get_wallet(
    State(state): State<AppState>,
    user: AuthUser,
    QueryParams(params): QueryParams<WalletQuery>,
) -> ApiResult<Json<WalletView>> {
    let wallet =
        wallet_service::get_or_create_wallet(&state.repositories, user.id, params.wallet_type)
            .await?;
    Ok(Json(WalletView::from(&wallet)))
}

/// GET /api/wallet/transactions
pub async fn list_transactions(
    State(state): State<AppState>,
    user: AuthUser,
    QueryParams(params): QueryParams<TransactionsQuery>,
) -> ApiResult<Json<TransactionsResponse>> {
    let (limit, offset) = PageParams {
        limit: params.limit,
        offset: params.offset,
    }
    .window();

    let (wallet, transactions) = wallet_service::list_transactions(
        &state.repositories,
        user.id,
        params.wallet_type,
        limit,
        offset,
    )
    .await?;

    Ok(Json(TransactionsResponse {
        wallet_id: wallet.id,
        transactions: transactions.iter().map(TransactionView::from).collect(),
        limit,
        offset,
    }))
}

/// GET /api/wallet/audit
pub async fn audit_wallet(
    State(state): State<AppState>,
    user: AuthUser,
    QueryParams(params): QueryParams<WalletQuery>,
) -> ApiResult<Json<WalletAuditResponse>> {
    let report = wallet_service::audit(&state.repositories, user.id, params.wallet_type).await?;
    Ok(Json(report))
}

/// POST /api/wallet/deposit
pub async fn deposit(
    State(state): State<AppState>,
    user: AuthUser,
    JsonBody(body): JsonBody<DepositRequest>,
) -> ApiResult<Json<WalletMutationResponse>> {
    enforce_rate_limit(&state, &user).await?;
    let applied = wallet_service::deposit(
        &state.repositories,
        user.id,
        body.wallet_type,
        body.amount,
        body.payment_method,
    )
    .await?;
    Ok(Json(mutation_response(applied, "Depósito realizado com sucesso")))
}

/// POST /api/wallet/withdraw
pub async fn withdraw(
    State(state): State<AppState>,
    user: AuthUser,
    JsonBody(body): JsonBody<WithdrawRequest>,
) -> ApiResult<Json<WalletMutationResponse>> {
    enforce_rate_limit(&state, &user).await?;
    let applied = wallet_service::withdraw(
        &state.repositories,
        user.id,
        body.wallet_type,
        body.amount,
        body.pix_key,
    )
    .await?;
    Ok(Json(mutation_response(
        applied,
        "Saque solicitado. O valor será transferido em até 2 dias úteis",
    )))
}
