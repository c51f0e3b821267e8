// Health check service implementation

use serde::Serialize;

use crate::db::Repositories;

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct HealthReport {
    pub status: &'static str,
    pub database: &'static str,
}

impl HealthReport {
    pub fn is_healthy(&self) -> bool {
        self.status == "ok"
    }
}

pub struct HealthChecker<'a> {
    repositories: &'a Repositories,
}

impl<'a> HealthChecker<'a> {
    pub fn new(repositories: &'a Repositories) -> Self {
        Self { repositories }
    }

    pub async fn check(&self) -> HealthReport {
        match self.repositories.ping().await {
            Ok(()) => HealthReport {
                status: "ok",
                database: "up",
            },
            Err(e) => {
                tracing::error!("Health check failed, database unreachable: {}", e);
                HealthReport {
                    status: "degraded",
                    database: "down",
                }
            }
        }
    }
}
