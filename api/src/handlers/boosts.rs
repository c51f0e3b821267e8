// Event boost endpoint handlers

use axum::{extract::State, http::HeaderMap, Json};
use chrono::Utc;
use uuid::Uuid;

use crate::auth::{bearer_token, AuthUser};
use crate::error::{ApiError, ApiResult};
use crate::handlers::extract::{JsonBody, PathParam};
use crate::handlers::{enforce_rate_limit, AppState};
use crate::models::boost::{
    BoostListResponse, BoostPackagesResponse, BoostPurchaseResponse, BoostStatusResponse,
    PurchaseBoostRequest, SweepReport,
};
use crate::services::boost_service;

pub const CRON_SECRET_HEADER: &str = "x-cron-secret";

/// GET /api/boosts/packages
pub async fn list_packages() -> Json<BoostPackagesResponse> {
    Json(BoostPackagesResponse {
        packages: boost_service::package_views(),
    })
}

/// GET /api/boosts
pub async fn list_my_boosts(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<BoostListResponse>> {
    let boosts = boost_service::list_for_user(&state.repositories, user.id).await?;
    Ok(Json(BoostListResponse { boosts }))
}

/// POST /api/boosts
pub async fn purchase_boost(
    State(state): State<AppState>,
    user: AuthUser,
    JsonBody(body): JsonBody<PurchaseBoostRequest>,
) -> ApiResult<Json<BoostPurchaseResponse>> {
    enforce_rate_limit(&state, &user).await?;
    let response = boost_service::purchase(
        &state.repositories,
        user.id,
        body.event_id,
        &body.package,
        Utc::now(),
    )
    .await?;
    Ok(Json(response))
}

/// GET /api/boosts/status/{event_id}
pub async fn boost_status(
    State(state): State<AppState>,
    PathParam(event_id): PathParam<Uuid>,
) -> ApiResult<Json<BoostStatusResponse>> {
    let status = boost_service::status(&state.repositories, event_id, Utc::now()).await?;
    Ok(Json(status))
}

/// Constant-time comparison of the presented cron secret
fn secret_matches(expected: &str, presented: &str) -> bool {
    expected.len() == presented.len()
        && expected
            .bytes()
            .zip(presented.bytes())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}

/// POST /api/boosts/expire, for the scheduler or an admin
pub async fn expire_boosts(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<SweepReport>> {
    let presented = headers
        .get(CRON_SECRET_HEADER)
        .and_then(|v| v.to_str().ok());
    let by_cron = match (state.config.cron_secret.as_deref(), presented) {
        (Some(expected), Some(presented)) => secret_matches(expected, presented),
        _ => false,
    };

    if !by_cron {
        let token = bearer_token(&headers)
            .ok_or_else(|| ApiError::Unauthorized("Faça login para continuar".to_string()))?;
        let user = state.auth.verify(token).await?;
        if !state.repositories.profiles.is_admin(user.id).await? {
            return Err(ApiError::Forbidden(
                "Apenas administradores podem executar esta ação".to_string(),
            ));
        }
        tracing::info!("Boost sweep triggered by admin {}", user.id);
    }

    let report = boost_service::sweep_expired(&state.repositories, Utc::now()).await?;
    Ok(Json(report))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_matches() {
        assert!(secret_matches("s3cret", "s3cret"));
        assert!(!secret_matches("s3cret", "s3cres"));
        assert!(!secret_matches("s3cret", "s3cret!"));
        assert!(!secret_matches("s3cret", ""));
    }
}
