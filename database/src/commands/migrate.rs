use sea_orm::{Database, DatabaseConnection};
use sea_orm_migration::prelude::*;
use std::error::Error;
use tracing::{error, info};

use crate::config::DatabaseConfig;
use crate::migration;

async fn connect() -> Result<DatabaseConnection, Box<dyn Error>> {
    let config = DatabaseConfig::from_env()?;

    info!(
        "Connecting to database {} on {}:{}",
        config.name, config.host, config.port
    );

    match Database::connect(&config.url).await {
        Ok(conn) => Ok(conn),
        Err(e) => {
            error!("Failed to connect to database: {}", e);
            Err(Box::new(e))
        }
    }
}

/// Execute the migrate command
pub async fn execute(steps: Option<u32>) -> Result<(), Box<dyn Error>> {
    let connection = connect().await?;

    let pending = migration::Migrator::get_pending_migrations(&connection).await?;
    info!("Found {} pending migrations", pending.len());
    for m in &pending {
        info!("Pending migration: {}", m.name());
    }

    match steps {
        Some(n) => info!("Running {} migrations", n),
        None => info!("Running all pending migrations"),
    }

    match migration::Migrator::up(&connection, steps).await {
        Ok(_) => {
            info!("Migrations applied");
            Ok(())
        }
        Err(e) => {
            error!("Failed to run migrations: {}", e);
            error!("Migration error details: {:?}", e);
            Err(Box::new(e))
        }
    }
}

/// Drop every table and re-apply all migrations
pub async fn reset() -> Result<(), Box<dyn Error>> {
    let connection = connect().await?;

    info!("Resetting database: dropping all tables");
    match migration::Migrator::fresh(&connection).await {
        Ok(_) => {
            info!("Database reset and all migrations applied");
            Ok(())
        }
        Err(e) => {
            error!("Failed to reset database: {}", e);
            Err(Box::new(e))
        }
    }
}

/// Print applied and pending migrations
pub async fn status() -> Result<(), Box<dyn Error>> {
    let connection = connect().await?;

    let applied = migration::Migrator::get_applied_migrations(&connection).await?;
    let pending = migration::Migrator::get_pending_migrations(&connection).await?;

    for m in &applied {
        info!("Applied  {}", m.name());
    }
    for m in &pending {
        info!("Pending  {}", m.name());
    }
    info!(
        "{} applied, {} pending, {} total",
        applied.len(),
        pending.len(),
        migration::Migrator::migrations().len()
    );

    Ok(())
}
