// src/db.rs
//
// Subscription store. Enrollment and cancellation write here; the ledger and
// the rescue state machine go through `lock_subscription` so that every
// balance-changing unit of work serializes on the subscription row.

use sqlx::{PgConnection, PgPool};

use crate::benefits::BenefitCategory;
use crate::error::CoreError;
use crate::models::Subscription;

const SUBSCRIPTION_COLS: &str = "id, member_id, category, token_balance, is_active, \
     enrollment_date, last_token_purchase_date, last_rescue_claim_date";

pub async fn enroll(
    pool: &PgPool,
    member_id: i32,
    category: BenefitCategory,
) -> Result<Subscription, CoreError> {
    let existing = sqlx::query_scalar::<_, i32>(
        "SELECT id FROM subscriptions
         WHERE member_id = $1 AND category = $2 AND is_active",
    )
    .bind(member_id)
    .bind(category.as_str())
    .fetch_optional(pool)
    .await?;

    if existing.is_some() {
        return Err(CoreError::DuplicateSubscription);
    }

    let sub = sqlx::query_as::<_, Subscription>(&format!(
        "INSERT INTO subscriptions (member_id, category)
         VALUES ($1, $2)
         RETURNING {SUBSCRIPTION_COLS}"
    ))
    .bind(member_id)
    .bind(category.as_str())
    .fetch_one(pool)
    .await
    .map_err(|e| match &e {
        // the partial unique index backstops the check above under races
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            CoreError::DuplicateSubscription
        }
        _ => CoreError::Store(e),
    })?;

    Ok(sub)
}

/// Idempotent: cancelling an already-inactive subscription is a no-op.
/// Balance and ledger history are retained for audit.
pub async fn cancel(pool: &PgPool, subscription_id: i32) -> Result<Subscription, CoreError> {
    let sub = sqlx::query_as::<_, Subscription>(&format!(
        "UPDATE subscriptions SET is_active = FALSE
         WHERE id = $1
         RETURNING {SUBSCRIPTION_COLS}"
    ))
    .bind(subscription_id)
    .fetch_optional(pool)
    .await?;

    sub.ok_or(CoreError::NotFound("subscription"))
}

pub async fn get_subscription(
    pool: &PgPool,
    subscription_id: i32,
) -> Result<Subscription, CoreError> {
    let sub = sqlx::query_as::<_, Subscription>(&format!(
        "SELECT {SUBSCRIPTION_COLS} FROM subscriptions WHERE id = $1"
    ))
    .bind(subscription_id)
    .fetch_optional(pool)
    .await?;

    sub.ok_or(CoreError::NotFound("subscription"))
}

/// Same as `get_subscription` but scoped to the calling member. A foreign
/// subscription id reads as not-found rather than forbidden.
pub async fn get_owned_subscription(
    pool: &PgPool,
    subscription_id: i32,
    member_id: i32,
) -> Result<Subscription, CoreError> {
    let sub = get_subscription(pool, subscription_id).await?;
    if sub.member_id != member_id {
        return Err(CoreError::NotFound("subscription"));
    }
    Ok(sub)
}

pub async fn list_member_subscriptions(
    pool: &PgPool,
    member_id: i32,
) -> Result<Vec<Subscription>, CoreError> {
    let subs = sqlx::query_as::<_, Subscription>(&format!(
        "SELECT {SUBSCRIPTION_COLS} FROM subscriptions
         WHERE member_id = $1
         ORDER BY enrollment_date DESC"
    ))
    .bind(member_id)
    .fetch_all(pool)
    .await?;

    Ok(subs)
}

/// Row-locks the subscription for the duration of the enclosing transaction.
/// Every writer that touches the balance must come through here first.
pub async fn lock_subscription(
    conn: &mut PgConnection,
    subscription_id: i32,
) -> Result<Subscription, CoreError> {
    let sub = sqlx::query_as::<_, Subscription>(&format!(
        "SELECT {SUBSCRIPTION_COLS} FROM subscriptions WHERE id = $1 FOR UPDATE"
    ))
    .bind(subscription_id)
    .fetch_optional(conn)
    .await?;

    sub.ok_or(CoreError::NotFound("subscription"))
}
