// Role API server entry point

mod auth;
mod config;
mod db;
mod entity;
mod error;
mod handlers;
mod models;
mod routes;
mod services;

use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use auth::AuthClient;
use config::ApiConfig;
use db::DbPool;
use handlers::AppContext;
use services::rate_limit::RateLimiter;

fn load_env() {
    dotenv::dotenv().ok();
}

#[tokio::main]
async fn main() {
    load_env();
    // Configure logging with tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load API configuration from environment
    let config = ApiConfig::from_env();
    tracing::info!("Configuration loaded");
    if config.auth_anon_key.is_empty() {
        tracing::warn!("SUPABASE_ANON_KEY is not set; token validation will fail");
    }

    // Establish database connection pool
    let db_pool = DbPool::new(&config)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Connected to database");

    let auth = AuthClient::new(&config).expect("Failed to build auth client");
    let repositories = db_pool.repositories();

    // Expire boosts in the background
    let _sweep = services::sweep::spawn(repositories.clone(), config.boost_sweep_interval_secs);

    let app_state = Arc::new(AppContext {
        repositories,
        auth,
        rate_limiter: RateLimiter::from_config(&config),
        config: config.clone(),
    });

    let app = routes::build_router(app_state);

    // Parse server address from config
    let addr: SocketAddr = config.server_addr().parse().expect("Invalid address");

    // Start HTTP server
    tracing::info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");
    axum::serve(listener, app)
        .await
        .expect("Failed to start server");
}
