// Premium subscription endpoint handlers

use axum::{extract::State, Json};
use chrono::Utc;

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::handlers::extract::JsonBody;
use crate::handlers::{enforce_rate_limit, AppState};
use crate::models::premium::{
    CancelResponse, CurrentSubscriptionResponse, DiscountResolution, PlansResponse,
    SubscribeRequest, SubscribeResponse,
};
use crate::services::premium_service;

/// GET /api/premium/plans
pub async fn list_plans(State(state): State<AppState>) -> ApiResult<Json<PlansResponse>> {
    let plans = premium_service::list_plans(&state.repositories).await?;
    Ok(Json(PlansResponse { plans }))
}

/// GET /api/premium/subscription
pub async fn current_subscription(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<CurrentSubscriptionResponse>> {
    let current = premium_service::current(&state.repositories, user.id, Utc::now()).await?;
    Ok(Json(current))
}

/// GET /api/premium/discount
pub async fn boost_discount(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<DiscountResolution>> {
    let discount =
        premium_service::resolve_discount(&state.repositories, user.id, Utc::now()).await?;
    Ok(Json(discount))
}

/// POST /api/premium/subscribe
pub async fn subscribe(
    State(state): State<AppState>,
    user: AuthUser,
    JsonBody(body): JsonBody<SubscribeRequest>,
) -> ApiResult<Json<SubscribeResponse>> {
    enforce_rate_limit(&state, &user).await?;
    let response =
        premium_service::subscribe(&state.repositories, user.id, body.plan_id, Utc::now()).await?;
    Ok(Json(response))
}

/// POST /api/premium/cancel
pub async fn cancel(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<CancelResponse>> {
    enforce_rate_limit(&state, &user).await?;
    let response = premium_service::cancel(&state.repositories, user.id, Utc::now()).await?;
    Ok(Json(response))
}
