// Boost lifecycle: purchase, lazy expiration on read and the periodic sweep

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use sea_orm::ActiveValue::Set;
use std::collections::BTreeSet;
use uuid::Uuid;

use crate::db::Repositories;
use crate::entity::event_boosts;
use crate::error::{ApiError, ApiResult};
use crate::models::boost::{
    BoostPackageView, BoostPurchaseResponse, BoostStatusResponse, BoostView, SweepReport,
};
use crate::models::wallet::{Reference, ReferenceType, TransactionType, TransactionView, WalletView};
use crate::services::{ledger, premium_service, wallet_service};

/// A fixed-price, fixed-duration boost offer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoostPackage {
    pub slug: &'static str,
    pub name: &'static str,
    pub duration_hours: i64,
    /// Price in centavos
    pub price_cents: i64,
}

impl BoostPackage {
    pub fn price(&self) -> Decimal {
        Decimal::new(self.price_cents, 2)
    }
}

pub const PACKAGES: [BoostPackage; 3] = [
    BoostPackage {
        slug: "basic",
        name: "Boost 24h",
        duration_hours: 24,
        price_cents: 990,
    },
    BoostPackage {
        slug: "plus",
        name: "Boost 3 dias",
        duration_hours: 72,
        price_cents: 2490,
    },
    BoostPackage {
        slug: "max",
        name: "Boost 7 dias",
        duration_hours: 168,
        price_cents: 4990,
    },
];

pub fn find_package(slug: &str) -> Option<BoostPackage> {
    PACKAGES.iter().copied().find(|p| p.slug == slug)
}

pub fn package_views() -> Vec<BoostPackageView> {
    PACKAGES
        .iter()
        .map(|p| BoostPackageView {
            slug: p.slug,
            name: p.name,
            duration_hours: p.duration_hours,
            price: p.price(),
        })
        .collect()
}

/// A new boost starts now, or queues behind the event's running boost
pub fn boost_window(
    now: DateTime<Utc>,
    running_until: Option<DateTime<Utc>>,
    duration_hours: i64,
) -> (DateTime<Utc>, DateTime<Utc>) {
    let starts_at = running_until.filter(|until| *until > now).unwrap_or(now);
    (starts_at, starts_at + Duration::hours(duration_hours))
}

pub fn remaining_seconds(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (expires_at - now).num_seconds().max(0)
}

/// Recount an event's live boosts and store the result
async fn refresh_event_counters(
    repos: &Repositories,
    event_id: Uuid,
    now: DateTime<Utc>,
) -> ApiResult<u64> {
    let active = repos.boosts.count_active_for_event(event_id, now).await?;
    let active_i32 = i32::try_from(active).unwrap_or(i32::MAX);
    repos
        .events
        .set_boost_counters(event_id, active_i32, now)
        .await?;
    Ok(active)
}

pub async fn purchase(
    repos: &Repositories,
    user_id: Uuid,
    event_id: Uuid,
    package_slug: &str,
    now: DateTime<Utc>,
) -> ApiResult<BoostPurchaseResponse> {
    let package = find_package(package_slug)
        .ok_or_else(|| ApiError::BadRequest(format!("Pacote de boost inválido: {}", package_slug)))?;

    let event = repos
        .events
        .get_by_id(event_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Evento não encontrado".to_string()))?;
    if event.owner_id != user_id {
        return Err(ApiError::Forbidden(
            "Apenas o organizador pode impulsionar este evento".to_string(),
        ));
    }

    let discount = premium_service::resolve_discount(repos, user_id, now).await?;
    let price = ledger::apply_discount(package.price(), discount.percent);

    let running = repos.boosts.latest_active_for_event(event_id, now).await?;
    let (starts_at, expires_at) = boost_window(
        now,
        running.map(|b| b.expires_at),
        package.duration_hours,
    );

    let payment = wallet_service::pay(
        repos,
        user_id,
        TransactionType::Boost,
        price,
        Reference {
            kind: ReferenceType::Event,
            id: event_id,
        },
        format!("{} para {}", package.name, event.title),
        now,
    )
    .await?;

    let boost = event_boosts::ActiveModel {
        id: Set(Uuid::new_v4()),
        event_id: Set(event_id),
        user_id: Set(user_id),
        package: Set(package.slug.to_string()),
        price: Set(payment.amount()),
        discount_percent: Set(discount.percent),
        duration_hours: Set(package.duration_hours as i32),
        starts_at: Set(starts_at),
        expires_at: Set(expires_at),
        is_active: Set(true),
        created_at: Set(now),
    };

    let boost = match repos.boosts.insert(boost).await {
        Ok(boost) => boost,
        Err(e) => {
            tracing::error!("Failed to create boost for event {}: {}", event_id, e);
            wallet_service::refund_payment(repos, &payment, "falha ao ativar boost").await;
            return Err(e.into());
        }
    };

    if let Err(e) = refresh_event_counters(repos, event_id, now).await {
        tracing::warn!("Boost {} created but counters for event {} not refreshed: {}", boost.id, event_id, e);
    }

    tracing::info!(
        "Boost {} ({}) bought for event {} at {} ({}% off), expires {}",
        boost.id,
        package.slug,
        event_id,
        boost.price,
        discount.percent,
        boost.expires_at
    );

    Ok(BoostPurchaseResponse {
        success: true,
        boost: BoostView::from(&boost),
        discount,
        wallet: WalletView::from(&payment.wallet),
        transaction: payment
            .charge
            .as_ref()
            .map(|c| TransactionView::from(&c.transaction)),
    })
}

/// Report an event's boost, expiring stale rows on the way
pub async fn status(
    repos: &Repositories,
    event_id: Uuid,
    now: DateTime<Utc>,
) -> ApiResult<BoostStatusResponse> {
    repos
        .events
        .get_by_id(event_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Evento não encontrado".to_string()))?;

    let expired_now = repos
        .boosts
        .deactivate_expired_for_event(event_id, now)
        .await?;
    if expired_now > 0 {
        tracing::debug!("Expired {} boost(s) of event {} on read", expired_now, event_id);
        refresh_event_counters(repos, event_id, now).await?;
    }

    let current = repos.boosts.latest_active_for_event(event_id, now).await?;

    Ok(BoostStatusResponse {
        event_id,
        is_boosted: current.is_some(),
        remaining_seconds: current
            .as_ref()
            .map_or(0, |b| remaining_seconds(b.expires_at, now)),
        boost: current.as_ref().map(BoostView::from),
        expired_now,
    })
}

/// Deactivate every expired boost and recount the affected events
pub async fn sweep_expired(repos: &Repositories, now: DateTime<Utc>) -> ApiResult<SweepReport> {
    let expired = repos.boosts.find_expired_active(now).await?;
    if expired.is_empty() {
        return Ok(SweepReport::default());
    }

    let ids: Vec<Uuid> = expired.iter().map(|b| b.id).collect();
    let events: BTreeSet<Uuid> = expired.iter().map(|b| b.event_id).collect();

    let deactivated = repos.boosts.deactivate(&ids).await?;

    let mut report = SweepReport {
        expired: deactivated,
        ..Default::default()
    };
    for event_id in events {
        match refresh_event_counters(repos, event_id, now).await {
            Ok(_) => report.events_updated += 1,
            Err(e) => {
                tracing::warn!("Failed to recount boosts for event {}: {}", event_id, e);
                report.events_failed += 1;
            }
        }
    }

    tracing::info!(
        "Boost sweep: {} expired, {} events updated, {} failed",
        report.expired,
        report.events_updated,
        report.events_failed
    );
    Ok(report)
}

pub async fn list_for_user(repos: &Repositories, user_id: Uuid) -> ApiResult<Vec<BoostView>> {
    let boosts = repos.boosts.list_for_user(user_id).await?;
    Ok(boosts.iter().map(BoostView::from).collect())
}
