// Event boost models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entity::event_boosts;
use crate::models::premium::DiscountResolution;
use crate::models::wallet::{TransactionView, WalletView};

/// Request body for POST /api/boosts
#[derive(Debug, Deserialize)]
pub struct PurchaseBoostRequest {
    pub event_id: Uuid,
    pub package: String,
}

#[derive(Debug, Serialize, Clone)]
pub struct BoostPackageView {
    pub slug: &'static str,
    pub name: &'static str,
    pub duration_hours: i64,
    pub price: Decimal,
}

#[derive(Debug, Serialize)]
pub struct BoostPackagesResponse {
    pub packages: Vec<BoostPackageView>,
}

#[derive(Debug, Serialize, Clone)]
pub struct BoostView {
    pub id: Uuid,
    pub event_id: Uuid,
    pub package: String,
    pub price: Decimal,
    pub discount_percent: Decimal,
    pub duration_hours: i32,
    pub starts_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub is_active: bool,
}

impl From<&event_boosts::Model> for BoostView {
    fn from(m: &event_boosts::Model) -> Self {
        BoostView {
            id: m.id,
            event_id: m.event_id,
            package: m.package.clone(),
            price: m.price,
            discount_percent: m.discount_percent,
            duration_hours: m.duration_hours,
            starts_at: m.starts_at,
            expires_at: m.expires_at,
            is_active: m.is_active,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BoostPurchaseResponse {
    pub success: bool,
    pub boost: BoostView,
    pub discount: DiscountResolution,
    pub wallet: WalletView,
    /// Absent when nothing was charged
    pub transaction: Option<TransactionView>,
}

#[derive(Debug, Serialize)]
pub struct BoostStatusResponse {
    pub event_id: Uuid,
    pub is_boosted: bool,
    pub boost: Option<BoostView>,
    pub remaining_seconds: i64,
    pub expired_now: u64,
}

#[derive(Debug, Serialize)]
pub struct BoostListResponse {
    pub boosts: Vec<BoostView>,
}

/// Outcome of one expiration sweep
#[derive(Debug, Serialize, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub expired: u64,
    pub events_updated: usize,
    pub events_failed: usize,
}
