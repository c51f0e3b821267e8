// Bearer token validation against the hosted auth service

use std::time::Duration;

use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts, HeaderMap, StatusCode};
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

use crate::config::ApiConfig;
use crate::error::ApiError;
use crate::handlers::AppState;

/// Error type for auth service calls
#[derive(Debug, Error)]
pub enum AuthError {
    /// No usable bearer token on the request
    #[error("missing bearer token")]
    MissingToken,
    /// The auth service refused the token
    #[error("token rejected with status {0}")]
    Rejected(StatusCode),
    /// The auth service answered with something unexpected
    #[error("auth service error: {0}")]
    Upstream(String),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingToken => {
                ApiError::Unauthorized("Faça login para continuar".to_string())
            }
            AuthError::Rejected(_) => {
                ApiError::Unauthorized("Sessão expirada. Faça login novamente".to_string())
            }
            other => ApiError::Internal(other.to_string()),
        }
    }
}

/// The signed-in caller
#[derive(Debug, Clone, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
}

/// Client for the hosted auth service's user endpoint
#[derive(Debug, Clone)]
pub struct AuthClient {
    client: Client,
    base_url: String,
    anon_key: String,
}

impl AuthClient {
    pub fn new(config: &ApiConfig) -> Result<Self, AuthError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .connect_timeout(Duration::from_secs(5))
            .build()?;

        Ok(AuthClient {
            client,
            base_url: config.auth_url.clone(),
            anon_key: config.auth_anon_key.clone(),
        })
    }

    /// Resolve a bearer token to its user
    pub async fn verify(&self, token: &str) -> Result<AuthUser, AuthError> {
        let url = format!("{}/auth/v1/user", self.base_url);
        let response = self
            .client
            .get(&url)
            .header("apikey", &self.anon_key)
            .bearer_auth(token)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(AuthError::Rejected(status));
        }
        if !status.is_success() {
            return Err(AuthError::Upstream(format!("unexpected status {}", status)));
        }

        Ok(response.json::<AuthUser>().await?)
    }
}

/// Token from an `Authorization: Bearer <token>` header
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers).ok_or(AuthError::MissingToken)?;
        match state.auth.verify(token).await {
            Ok(user) => Ok(user),
            Err(e) => {
                tracing::debug!("Token verification failed: {}", e);
                Err(e.into())
            }
        }
    }
}
