// Premium plans, subscriptions and boost discount resolution

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use sea_orm::ActiveValue::Set;
use std::collections::HashMap;
use uuid::Uuid;

use crate::db::Repositories;
use crate::entity::{premium_plans, premium_subscriptions};
use crate::error::{ApiError, ApiResult};
use crate::models::premium::{
    CancelResponse, CurrentSubscriptionResponse, DiscountResolution, DiscountSource, PlanView,
    SubscribeResponse, SubscriptionStatus, SubscriptionView,
};
use crate::models::wallet::{Reference, ReferenceType, TransactionType, TransactionView, WalletView};
use crate::services::wallet_service;

/// Discount granted to profiles flagged premium before subscriptions existed
pub fn legacy_default_discount() -> Decimal {
    Decimal::new(20, 0)
}

/// Walk the fallback chain: active subscription, then the legacy flag with
/// its best historical subscription, then the hardcoded default.
pub fn resolve_discount_from(
    active: Option<(&premium_subscriptions::Model, &premium_plans::Model)>,
    legacy_flag: bool,
    history: &[(premium_subscriptions::Model, Option<premium_plans::Model>)],
    now: DateTime<Utc>,
) -> DiscountResolution {
    if let Some((subscription, plan)) = active {
        return DiscountResolution {
            percent: plan.boost_discount_percent,
            source: DiscountSource::ActiveSubscription,
            subscription_id: Some(subscription.id),
            plan_id: Some(plan.id),
        };
    }

    if !legacy_flag {
        return DiscountResolution::none();
    }

    // Prefer a subscription whose paid period still runs, then the newest one
    let best = history
        .iter()
        .filter_map(|(sub, plan)| plan.as_ref().map(|p| (sub, p)))
        .max_by_key(|(sub, _)| (sub.expires_at > now, sub.created_at));

    match best {
        Some((subscription, plan)) => DiscountResolution {
            percent: plan.boost_discount_percent,
            source: DiscountSource::LegacySubscription,
            subscription_id: Some(subscription.id),
            plan_id: Some(plan.id),
        },
        None => DiscountResolution {
            percent: legacy_default_discount(),
            source: DiscountSource::LegacyDefault,
            subscription_id: None,
            plan_id: None,
        },
    }
}

/// Active subscription joined with its plan. A subscription pointing at a
/// missing plan is treated as absent.
async fn active_subscription_with_plan(
    repos: &Repositories,
    user_id: Uuid,
    now: DateTime<Utc>,
) -> ApiResult<Option<(premium_subscriptions::Model, premium_plans::Model)>> {
    let Some(subscription) = repos.premium.find_active_subscription(user_id, now).await? else {
        return Ok(None);
    };
    match repos.premium.get_plan(subscription.plan_id).await? {
        Some(plan) => Ok(Some((subscription, plan))),
        None => {
            tracing::warn!(
                "Subscription {} references missing plan {}",
                subscription.id,
                subscription.plan_id
            );
            Ok(None)
        }
    }
}

pub async fn resolve_discount(
    repos: &Repositories,
    user_id: Uuid,
    now: DateTime<Utc>,
) -> ApiResult<DiscountResolution> {
    let active = active_subscription_with_plan(repos, user_id, now).await?;
    if let Some((subscription, plan)) = &active {
        return Ok(resolve_discount_from(
            Some((subscription, plan)),
            false,
            &[],
            now,
        ));
    }

    let legacy_flag = repos
        .profiles
        .get_by_id(user_id)
        .await?
        .map_or(false, |p| p.is_premium);
    if !legacy_flag {
        return Ok(DiscountResolution::none());
    }

    let subscriptions = repos.premium.subscriptions_for_user(user_id).await?;
    let plan_ids: Vec<Uuid> = subscriptions.iter().map(|s| s.plan_id).collect();
    let plans: HashMap<Uuid, premium_plans::Model> = repos
        .premium
        .plans_by_ids(&plan_ids)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();
    let history: Vec<_> = subscriptions
        .into_iter()
        .map(|s| {
            let plan = plans.get(&s.plan_id).cloned();
            (s, plan)
        })
        .collect();

    Ok(resolve_discount_from(None, legacy_flag, &history, now))
}

pub async fn list_plans(repos: &Repositories) -> ApiResult<Vec<PlanView>> {
    let plans = repos.premium.list_active_plans().await?;
    Ok(plans.iter().map(PlanView::from).collect())
}

pub async fn current(
    repos: &Repositories,
    user_id: Uuid,
    now: DateTime<Utc>,
) -> ApiResult<CurrentSubscriptionResponse> {
    let active = active_subscription_with_plan(repos, user_id, now).await?;
    let discount = match &active {
        Some((subscription, plan)) => {
            resolve_discount_from(Some((subscription, plan)), false, &[], now)
        }
        None => resolve_discount(repos, user_id, now).await?,
    };

    Ok(CurrentSubscriptionResponse {
        is_premium: discount.source != DiscountSource::None,
        subscription: active.as_ref().map(|(s, _)| SubscriptionView::from(s)),
        plan: active.as_ref().map(|(_, p)| PlanView::from(p)),
        discount,
    })
}

/// Pay for a plan from the personal wallet and open a subscription
pub async fn subscribe(
    repos: &Repositories,
    user_id: Uuid,
    plan_id: Uuid,
    now: DateTime<Utc>,
) -> ApiResult<SubscribeResponse> {
    let plan = repos
        .premium
        .get_plan(plan_id)
        .await?
        .filter(|p| p.is_active)
        .ok_or_else(|| ApiError::NotFound("Plano não encontrado".to_string()))?;

    if repos
        .premium
        .find_active_subscription(user_id, now)
        .await?
        .is_some()
    {
        return Err(ApiError::BadRequest(
            "Você já possui uma assinatura premium ativa".to_string(),
        ));
    }

    let subscription_id = Uuid::new_v4();
    let payment = wallet_service::pay(
        repos,
        user_id,
        TransactionType::Premium,
        plan.price,
        Reference {
            kind: ReferenceType::Subscription,
            id: subscription_id,
        },
        format!("Assinatura {}", plan.name),
        now,
    )
    .await?;

    let subscription = premium_subscriptions::ActiveModel {
        id: Set(subscription_id),
        user_id: Set(user_id),
        plan_id: Set(plan.id),
        status: Set(SubscriptionStatus::Active.as_str().to_string()),
        price_paid: Set(payment.amount()),
        started_at: Set(now),
        expires_at: Set(now + Duration::days(i64::from(plan.duration_days))),
        cancelled_at: Set(None),
        auto_renew: Set(true),
        created_at: Set(now),
    };

    let subscription = match repos.premium.insert_subscription(subscription).await {
        Ok(subscription) => subscription,
        Err(e) => {
            tracing::error!("Failed to create subscription for user {}: {}", user_id, e);
            wallet_service::refund_payment(repos, &payment, "falha ao ativar assinatura").await;
            return Err(e.into());
        }
    };

    tracing::info!(
        "User {} subscribed to plan {} until {}",
        user_id,
        plan.slug,
        subscription.expires_at
    );

    Ok(SubscribeResponse {
        success: true,
        subscription: SubscriptionView::from(&subscription),
        plan: PlanView::from(&plan),
        wallet: WalletView::from(&payment.wallet),
        transaction: payment
            .charge
            .as_ref()
            .map(|c| TransactionView::from(&c.transaction)),
    })
}

/// Cancel the active subscription; premium access ends immediately, no refund
pub async fn cancel(
    repos: &Repositories,
    user_id: Uuid,
    now: DateTime<Utc>,
) -> ApiResult<CancelResponse> {
    let subscription = repos
        .premium
        .find_active_subscription(user_id, now)
        .await?
        .ok_or_else(|| ApiError::NotFound("Nenhuma assinatura ativa encontrada".to_string()))?;

    let cancelled = repos.premium.mark_cancelled(subscription, now).await?;
    repos.profiles.set_premium_flag(user_id, false, now).await?;

    tracing::info!("User {} cancelled subscription {}", user_id, cancelled.id);

    Ok(CancelResponse {
        success: true,
        message: "Assinatura cancelada".to_string(),
        subscription: SubscriptionView::from(&cancelled),
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::entity::profiles;
    use crate::models::wallet::TransactionStatus;
    use crate::services::wallet_service::tests::{
        exec, mock_repositories, transaction_log, transaction_row, wallet,
    };
    use sea_orm::{DatabaseBackend, DbErr, MockDatabase};

    pub(crate) fn plan(discount: i64) -> premium_plans::Model {
        premium_plans::Model {
            id: Uuid::new_v4(),
            slug: format!("plan-{}", discount),
            name: format!("Plano {}", discount),
            price: Decimal::new(1990, 2),
            duration_days: 30,
            boost_discount_percent: Decimal::new(discount, 0),
            features: serde_json::json!(["boost_discount"]),
            is_active: true,
            sort_order: 0,
            created_at: Utc::now(),
        }
    }

    pub(crate) fn subscription(
        user_id: Uuid,
        plan: &premium_plans::Model,
        status: SubscriptionStatus,
        created_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> premium_subscriptions::Model {
        premium_subscriptions::Model {
            id: Uuid::new_v4(),
            user_id,
            plan_id: plan.id,
            status: status.as_str().to_string(),
            price_paid: plan.price,
            started_at: created_at,
            expires_at,
            cancelled_at: None,
            auto_renew: false,
            created_at,
        }
    }

    fn profile(user_id: Uuid, is_premium: bool) -> profiles::Model {
        profiles::Model {
            id: user_id,
            display_name: None,
            is_premium,
            is_admin: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_active_subscription_wins() {
        let now = Utc::now();
        let user = Uuid::new_v4();
        let gold = plan(30);
        let sub = subscription(
            user,
            &gold,
            SubscriptionStatus::Active,
            now - Duration::days(3),
            now + Duration::days(27),
        );

        let resolved = resolve_discount_from(Some((&sub, &gold)), true, &[], now);
        assert_eq!(resolved.percent, Decimal::new(30, 0));
        assert_eq!(resolved.source, DiscountSource::ActiveSubscription);
        assert_eq!(resolved.subscription_id, Some(sub.id));
    }

    #[test]
    fn test_legacy_prefers_running_period_then_newest() {
        let now = Utc::now();
        let user = Uuid::new_v4();
        let old_plan = plan(10);
        let mid_plan = plan(15);
        let new_plan = plan(25);

        let running = subscription(
            user,
            &mid_plan,
            SubscriptionStatus::Cancelled,
            now - Duration::days(20),
            now + Duration::days(10),
        );
        let ended_newer = subscription(
            user,
            &new_plan,
            SubscriptionStatus::Expired,
            now - Duration::days(2),
            now - Duration::days(1),
        );
        let ended_older = subscription(
            user,
            &old_plan,
            SubscriptionStatus::Expired,
            now - Duration::days(90),
            now - Duration::days(60),
        );

        let history = vec![
            (ended_newer.clone(), Some(new_plan.clone())),
            (running.clone(), Some(mid_plan.clone())),
            (ended_older.clone(), Some(old_plan.clone())),
        ];
        let resolved = resolve_discount_from(None, true, &history, now);
        assert_eq!(resolved.source, DiscountSource::LegacySubscription);
        assert_eq!(resolved.percent, Decimal::new(15, 0));

        let history = vec![
            (ended_older, Some(old_plan)),
            (ended_newer.clone(), Some(new_plan)),
        ];
        let resolved = resolve_discount_from(None, true, &history, now);
        assert_eq!(resolved.subscription_id, Some(ended_newer.id));
        assert_eq!(resolved.percent, Decimal::new(25, 0));
    }

    #[test]
    fn test_legacy_without_usable_history_uses_default() {
        let now = Utc::now();
        let user = Uuid::new_v4();
        let retired = plan(50);
        let orphan = subscription(
            user,
            &retired,
            SubscriptionStatus::Expired,
            now - Duration::days(40),
            now - Duration::days(10),
        );

        let resolved = resolve_discount_from(None, true, &[(orphan, None)], now);
        assert_eq!(resolved.source, DiscountSource::LegacyDefault);
        assert_eq!(resolved.percent, legacy_default_discount());
    }

    #[test]
    fn test_no_flag_no_discount() {
        let resolved = resolve_discount_from(None, false, &[], Utc::now());
        assert_eq!(resolved, DiscountResolution::none());
    }

    #[tokio::test]
    async fn test_resolve_discount_for_legacy_profile() {
        let now = Utc::now();
        let user = Uuid::new_v4();
        let silver = plan(15);
        let past = subscription(
            user,
            &silver,
            SubscriptionStatus::Expired,
            now - Duration::days(60),
            now - Duration::days(30),
        );

        let conn = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<premium_subscriptions::Model>::new()])
            .append_query_results([vec![profile(user, true)]])
            .append_query_results([vec![past]])
            .append_query_results([vec![silver]])
            .into_connection();
        let repos = Repositories::new(conn);

        let resolved = resolve_discount(&repos, user, now).await.unwrap();
        assert_eq!(resolved.source, DiscountSource::LegacySubscription);
        assert_eq!(resolved.percent, Decimal::new(15, 0));
    }

    #[tokio::test]
    async fn test_subscribe_rejects_inactive_plan() {
        let mut retired = plan(10);
        retired.is_active = false;

        let conn = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![retired.clone()]])
            .into_connection();
        let repos = Repositories::new(conn);

        let result = subscribe(&repos, Uuid::new_v4(), retired.id, Utc::now()).await;
        assert!(matches!(result, Err(ApiError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_cancel_without_subscription_is_not_found() {
        let conn = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<premium_subscriptions::Model>::new()])
            .into_connection();
        let repos = Repositories::new(conn);

        let result = cancel(&repos, Uuid::new_v4(), Utc::now()).await;
        assert!(matches!(result, Err(ApiError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_lapsed_subscriber_keeps_no_discount() {
        let now = Utc::now();
        let user = Uuid::new_v4();

        let conn = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<premium_subscriptions::Model>::new()])
            .append_query_results([Vec::<premium_subscriptions::Model>::new()])
            .append_query_results([vec![profile(user, false)]])
            .into_connection();
        let repos = Repositories::new(conn);

        let current = current(&repos, user, now).await.unwrap();
        assert!(!current.is_premium);
        assert!(current.subscription.is_none());
        assert_eq!(current.discount, DiscountResolution::none());
    }

    #[tokio::test]
    async fn test_subscribe_charges_and_leaves_legacy_flag_alone() {
        let now = Utc::now();
        let user = Uuid::new_v4();
        let monthly = plan(10);
        let funded = wallet(user, Decimal::new(50, 0));
        let charged = transaction_row(
            &funded,
            TransactionType::Premium,
            monthly.price,
            Decimal::new(50, 0),
            Decimal::new(3010, 2),
            TransactionStatus::Completed,
        );
        let opened = subscription(
            user,
            &monthly,
            SubscriptionStatus::Active,
            now,
            now + Duration::days(30),
        );

        let (repos, conn) = mock_repositories(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![monthly.clone()]])
                .append_query_results([Vec::<premium_subscriptions::Model>::new()])
                .append_query_results([vec![funded]])
                .append_query_results([vec![charged]])
                .append_query_results([vec![opened]])
                .append_exec_results([exec(1)]),
        );

        let response = subscribe(&repos, user, monthly.id, now).await.unwrap();
        assert_eq!(response.wallet.balance, Decimal::new(3010, 2));
        assert_eq!(response.plan.id, monthly.id);
        assert!(response.transaction.is_some());

        // plan, active check, wallet, balance write, log row, subscription
        let log = transaction_log(repos, conn);
        assert_eq!(log.len(), 6);
        let subscription_insert = format!("{:?}", log[5]);
        assert!(subscription_insert.contains(&format!("{:?}", now + Duration::days(30))));
        assert!(log
            .iter()
            .all(|t| !format!("{:?}", t).contains("profiles")));
    }

    #[tokio::test]
    async fn test_failed_subscription_insert_is_refunded() {
        let now = Utc::now();
        let user = Uuid::new_v4();
        let monthly = plan(10);
        let funded = wallet(user, Decimal::new(50, 0));
        let charged = transaction_row(
            &funded,
            TransactionType::Premium,
            monthly.price,
            Decimal::new(50, 0),
            Decimal::new(3010, 2),
            TransactionStatus::Completed,
        );
        let refunded = transaction_row(
            &funded,
            TransactionType::Refund,
            monthly.price,
            Decimal::new(3010, 2),
            Decimal::new(50, 0),
            TransactionStatus::Completed,
        );

        let (repos, conn) = mock_repositories(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![monthly.clone()]])
                .append_query_results([Vec::<premium_subscriptions::Model>::new()])
                .append_query_results([vec![funded]])
                .append_query_results([vec![charged]])
                .append_query_errors([DbErr::Custom("insert failed".to_string())])
                .append_query_results([vec![refunded]])
                .append_exec_results([exec(1), exec(1)]),
        );

        let result = subscribe(&repos, user, monthly.id, now).await;
        assert!(result.is_err());

        let log = transaction_log(repos, conn);
        assert_eq!(log.len(), 8);
        let restore = format!("{:?}", log[6]);
        assert!(restore.contains("50.00"), "{}", restore);
        assert!(format!("{:?}", log[7]).contains("refund"));
    }

    #[tokio::test]
    async fn test_cancel_ends_subscription_and_clears_flag() {
        let now = Utc::now();
        let user = Uuid::new_v4();
        let monthly = plan(10);
        let active = subscription(
            user,
            &monthly,
            SubscriptionStatus::Active,
            now - Duration::days(5),
            now + Duration::days(25),
        );
        let mut cancelled = active.clone();
        cancelled.status = SubscriptionStatus::Cancelled.as_str().to_string();
        cancelled.cancelled_at = Some(now);

        let (repos, conn) = mock_repositories(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![active]])
                .append_query_results([vec![cancelled.clone()]])
                .append_exec_results([exec(1)]),
        );

        let response = cancel(&repos, user, now).await.unwrap();
        assert!(response.success);
        assert_eq!(response.subscription.id, cancelled.id);

        let log = transaction_log(repos, conn);
        assert_eq!(log.len(), 3);
        let update = format!("{:?}", log[1]);
        assert!(update.contains("cancelled"), "{}", update);
        assert!(update.contains("auto_renew"), "{}", update);
        assert!(format!("{:?}", log[2]).contains("is_premium"));
    }
}
