//! Entity module for database models

pub mod event_boosts;
pub mod events;
pub mod premium_plans;
pub mod premium_subscriptions;
pub mod profiles;
pub mod support_tickets;
pub mod ticket_messages;
pub mod wallet_transactions;
pub mod wallets;
