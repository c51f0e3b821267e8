// Background task that periodically expires boosts

use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;

use crate::db::Repositories;
use crate::services::boost_service;

/// Spawn the sweep loop; `None` when the interval is zero
pub fn spawn(repositories: Repositories, interval_secs: u64) -> Option<JoinHandle<()>> {
    if interval_secs == 0 {
        tracing::info!("Boost sweep disabled");
        return None;
    }

    tracing::info!("Boost sweep every {}s", interval_secs);
    Some(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if let Err(e) = boost_service::sweep_expired(&repositories, Utc::now()).await {
                tracing::warn!("Boost sweep failed: {}", e);
            }
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_zero_interval_disables_sweep() {
        let conn = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        assert!(spawn(Repositories::new(conn), 0).is_none());
    }
}
