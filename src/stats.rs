// src/stats.rs
//
// Read-only projections. Always recomputed from the stores in a single
// statement (one snapshot), never cached, so they cannot drift from the
// underlying truth.

use serde::Serialize;
use sqlx::{FromRow, PgPool};
use utoipa::ToSchema;

use crate::error::CoreError;

#[derive(Debug, Serialize, FromRow, ToSchema)]
pub struct MemberStats {
    pub total_tokens: i64,
    pub active_subscriptions: i64,
    pub total_requests: i64,
    pub completed_requests: i64,
    pub total_spent_fcfa: i64,
}

#[derive(Debug, Serialize, FromRow, ToSchema)]
pub struct GlobalStats {
    pub members: i64,
    pub total_tokens: i64,
    pub active_subscriptions: i64,
    pub total_requests: i64,
    pub completed_requests: i64,
    pub total_spent_fcfa: i64,
}

pub async fn member_stats(pool: &PgPool, member_id: i32) -> Result<MemberStats, CoreError> {
    let stats = sqlx::query_as::<_, MemberStats>(
        "SELECT
            (SELECT COALESCE(SUM(token_balance), 0) FROM subscriptions
              WHERE member_id = $1 AND is_active)                        AS total_tokens,
            (SELECT COUNT(*) FROM subscriptions
              WHERE member_id = $1 AND is_active)                        AS active_subscriptions,
            (SELECT COUNT(*) FROM rescue_requests r
              JOIN subscriptions s ON s.id = r.subscription_id
              WHERE s.member_id = $1)                                    AS total_requests,
            (SELECT COUNT(*) FROM rescue_requests r
              JOIN subscriptions s ON s.id = r.subscription_id
              WHERE s.member_id = $1 AND r.status = 'completed')         AS completed_requests,
            (SELECT COALESCE(SUM(t.amount_fcfa), 0)::BIGINT FROM token_transactions t
              JOIN subscriptions s ON s.id = t.subscription_id
              WHERE s.member_id = $1 AND t.kind = 'purchase')            AS total_spent_fcfa",
    )
    .bind(member_id)
    .fetch_one(pool)
    .await?;

    Ok(stats)
}

pub async fn global_stats(pool: &PgPool) -> Result<GlobalStats, CoreError> {
    let stats = sqlx::query_as::<_, GlobalStats>(
        "SELECT
            (SELECT COUNT(*) FROM members)                               AS members,
            (SELECT COALESCE(SUM(token_balance), 0) FROM subscriptions
              WHERE is_active)                                           AS total_tokens,
            (SELECT COUNT(*) FROM subscriptions WHERE is_active)         AS active_subscriptions,
            (SELECT COUNT(*) FROM rescue_requests)                       AS total_requests,
            (SELECT COUNT(*) FROM rescue_requests
              WHERE status = 'completed')                                AS completed_requests,
            (SELECT COALESCE(SUM(amount_fcfa), 0)::BIGINT FROM token_transactions
              WHERE kind = 'purchase')                                   AS total_spent_fcfa",
    )
    .fetch_one(pool)
    .await?;

    Ok(stats)
}
