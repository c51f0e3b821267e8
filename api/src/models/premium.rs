// Premium plan and subscription models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entity::{premium_plans, premium_subscriptions};
use crate::models::wallet::{TransactionView, WalletView};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    Cancelled,
    Expired,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Cancelled => "cancelled",
            SubscriptionStatus::Expired => "expired",
        }
    }
}

/// Which step of the fallback chain produced a discount
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountSource {
    ActiveSubscription,
    LegacySubscription,
    LegacyDefault,
    None,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscountResolution {
    pub percent: Decimal,
    pub source: DiscountSource,
    pub subscription_id: Option<Uuid>,
    pub plan_id: Option<Uuid>,
}

impl DiscountResolution {
    pub fn none() -> Self {
        DiscountResolution {
            percent: Decimal::ZERO,
            source: DiscountSource::None,
            subscription_id: None,
            plan_id: None,
        }
    }
}

/// Request body for POST /api/premium/subscribe
#[derive(Debug, Deserialize)]
pub struct SubscribeRequest {
    pub plan_id: Uuid,
}

#[derive(Debug, Serialize, Clone)]
pub struct PlanView {
    pub id: Uuid,
    pub slug: String,
    pub name: String,
    pub price: Decimal,
    pub duration_days: i32,
    pub boost_discount_percent: Decimal,
    pub features: serde_json::Value,
}

impl From<&premium_plans::Model> for PlanView {
    fn from(m: &premium_plans::Model) -> Self {
        PlanView {
            id: m.id,
            slug: m.slug.clone(),
            name: m.name.clone(),
            price: m.price,
            duration_days: m.duration_days,
            boost_discount_percent: m.boost_discount_percent,
            features: m.features.clone(),
        }
    }
}

#[derive(Debug, Serialize, Clone)]
pub struct SubscriptionView {
    pub id: Uuid,
    pub plan_id: Uuid,
    pub status: String,
    pub price_paid: Decimal,
    pub started_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub auto_renew: bool,
}

impl From<&premium_subscriptions::Model> for SubscriptionView {
    fn from(m: &premium_subscriptions::Model) -> Self {
        SubscriptionView {
            id: m.id,
            plan_id: m.plan_id,
            status: m.status.clone(),
            price_paid: m.price_paid,
            started_at: m.started_at,
            expires_at: m.expires_at,
            cancelled_at: m.cancelled_at,
            auto_renew: m.auto_renew,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PlansResponse {
    pub plans: Vec<PlanView>,
}

#[derive(Debug, Serialize)]
pub struct CurrentSubscriptionResponse {
    pub is_premium: bool,
    pub subscription: Option<SubscriptionView>,
    pub plan: Option<PlanView>,
    pub discount: DiscountResolution,
}

#[derive(Debug, Serialize)]
pub struct SubscribeResponse {
    pub success: bool,
    pub subscription: SubscriptionView,
    pub plan: PlanView,
    pub wallet: WalletView,
    /// Absent when nothing was charged
    pub transaction: Option<TransactionView>,
}

#[derive(Debug, Serialize)]
pub struct CancelResponse {
    pub success: bool,
    pub message: String,
    pub subscription: SubscriptionView,
}
