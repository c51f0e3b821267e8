// Handlers Module
// This module contains the API endpoint handlers

pub mod boosts;
pub mod extract;
pub mod health;
pub mod premium;
pub mod tickets;
pub mod wallet;

use std::sync::Arc;

use crate::auth::{AuthClient, AuthUser};
use crate::config::ApiConfig;
use crate::db::Repositories;
use crate::error::{ApiError, ApiResult};
use crate::services::rate_limit::RateLimiter;

/// Shared application context
pub struct AppContext {
    pub repositories: Repositories,
    pub config: ApiConfig,
    pub auth: AuthClient,
    pub rate_limiter: RateLimiter,
}

// Type alias for the application state
pub type AppState = Arc<AppContext>;

/// Spend one request token for a money- or state-changing call
pub(crate) async fn enforce_rate_limit(state: &AppState, user: &AuthUser) -> ApiResult<()> {
    if state.rate_limiter.allow(user.id).await {
        Ok(())
    } else {
        tracing::warn!("User {} exceeded the request rate", user.id);
        Err(ApiError::RateLimited(
            "Muitas requisições. Aguarde alguns instantes".to_string(),
        ))
    }
}
