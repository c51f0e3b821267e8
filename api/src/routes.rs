// Router assembly

use std::time::Duration;

use axum::routing::{get, patch, post, Router};
use http::{header, HeaderName, Method, StatusCode};
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::boosts::{self, CRON_SECRET_HEADER};
use crate::handlers::health::health_check;
use crate::handlers::{premium, tickets, wallet, AppState};

const MAX_BODY_BYTES: usize = 64 * 1024;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::ORIGIN,
            header::AUTHORIZATION,
            HeaderName::from_static(CRON_SECRET_HEADER),
        ])
        .expose_headers([header::CONTENT_TYPE, header::CONTENT_LENGTH])
        .max_age(Duration::from_secs(3600))
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        // Wallet
        .route("/api/wallet", get(wallet::get_wallet))
        .route("/api/wallet/transactions", get(wallet::list_transactions))
        .route("/api/wallet/audit", get(wallet::audit_wallet))
        .route("/api/wallet/deposit", post(wallet::deposit))
        .route("/api/wallet/withdraw", post(wallet::withdraw))
        // Boosts
        .route("/api/boosts/packages", get(boosts::list_packages))
        .route(
            "/api/boosts",
            get(boosts::list_my_boosts).post(boosts::purchase_boost),
        )
        .route("/api/boosts/status/{event_id}", get(boosts::boost_status))
        .route("/api/boosts/expire", post(boosts::expire_boosts))
        // Premium
        .route("/api/premium/plans", get(premium::list_plans))
        .route("/api/premium/subscription", get(premium::current_subscription))
        .route("/api/premium/discount", get(premium::boost_discount))
        .route("/api/premium/subscribe", post(premium::subscribe))
        .route("/api/premium/cancel", post(premium::cancel))
        // Support tickets
        .route(
            "/api/tickets",
            get(tickets::list_tickets).post(tickets::create_ticket),
        )
        .route("/api/tickets/{id}", get(tickets::get_ticket))
        .route("/api/tickets/{id}/messages", post(tickets::post_message))
        .route("/api/tickets/{id}/status", patch(tickets::update_status))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            REQUEST_TIMEOUT,
        ))
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
