// Business logic service implementations

pub mod boost_service;
pub mod health;
pub mod ledger;
pub mod premium_service;
pub mod rate_limit;
pub mod sweep;
pub mod ticket_service;
pub mod wallet_service;
