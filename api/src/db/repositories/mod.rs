// Database repository management

mod boost_repository;
mod event_repository;
mod premium_repository;
mod profile_repository;
mod ticket_repository;
mod wallet_repository;

pub use boost_repository::BoostRepository;
pub use event_repository::EventRepository;
pub use premium_repository::PremiumRepository;
pub use profile_repository::ProfileRepository;
pub use ticket_repository::TicketRepository;
pub use wallet_repository::{BalanceSnapshot, WalletRepository};

use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::db::DbError;

/// Container for all database repositories
#[derive(Clone, Debug)]
pub struct Repositories {
    pub wallets: WalletRepository,
    pub events: EventRepository,
    pub boosts: BoostRepository,
    pub profiles: ProfileRepository,
    pub premium: PremiumRepository,
    pub tickets: TicketRepository,
    conn: Arc<DatabaseConnection>,
}

impl Repositories {
    /// Creates a new repositories container with database connection
    pub fn new(conn: DatabaseConnection) -> Self {
        Self::from_arc(Arc::new(conn))
    }

    /// Builds the container over a connection the caller keeps a handle to
    pub fn from_arc(conn: Arc<DatabaseConnection>) -> Self {
        Repositories {
            wallets: WalletRepository::new(conn.clone()),
            events: EventRepository::new(conn.clone()),
            boosts: BoostRepository::new(conn.clone()),
            profiles: ProfileRepository::new(conn.clone()),
            premium: PremiumRepository::new(conn.clone()),
            tickets: TicketRepository::new(conn.clone()),
            conn,
        }
    }

    /// Round-trip to the database, used by the health check
    pub async fn ping(&self) -> Result<(), DbError> {
        Ok(self.conn.ping().await?)
    }
}
