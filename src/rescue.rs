// src/rescue.rs
//
// Rescue request state machine: pending -> {approved, rejected, completed},
// approved -> completed, terminal states admit nothing. Completion is the only
// transition with a ledger effect.

use chrono::Utc;
use sqlx::PgPool;

use crate::benefits::{self, BenefitCategory};
use crate::db;
use crate::error::CoreError;
use crate::ledger;
use crate::models::{RescueRequest, RescueStatus, ReviewAction};

const REQUEST_COLS: &str = "id, subscription_id, status, description, token_balance_at_request, \
     rescue_value_fcfa, admin_notes, requested_at, processed_at";

/// Submits a rescue claim for an eligible subscription. The token balance and
/// rescue value are snapshotted here; later ledger activity never changes what
/// this request pays out.
pub async fn submit(
    pool: &PgPool,
    subscription_id: i32,
    member_id: i32,
    description: &str,
) -> Result<RescueRequest, CoreError> {
    let description = description.trim();
    if description.is_empty() {
        return Err(CoreError::Validation(
            "a description of the emergency is required".to_string(),
        ));
    }

    let mut tx = pool.begin().await.map_err(CoreError::Store)?;

    // lock the row so the snapshot cannot race a purchase or a completion
    let sub = db::lock_subscription(&mut tx, subscription_id).await?;
    if sub.member_id != member_id {
        return Err(CoreError::NotFound("subscription"));
    }
    if !sub.is_active {
        return Err(CoreError::Validation(
            "subscription is not active".to_string(),
        ));
    }

    let now = Utc::now();
    if !benefits::is_eligible(sub.enrollment_date, now) {
        return Err(CoreError::NotYetEligible {
            days_remaining: benefits::days_until_eligible(sub.enrollment_date, now),
        });
    }

    // an empty balance has nothing to snapshot or pay out, and a zero-amount
    // claim could never clear the ledger on completion
    if sub.token_balance <= 0 {
        return Err(CoreError::Validation(
            "subscription has no tokens, there is nothing to pay out".to_string(),
        ));
    }

    // one open claim per subscription: the payout snapshot is the full
    // balance, so two open claims could never both be honored
    let open = sqlx::query_scalar::<_, i32>(
        "SELECT id FROM rescue_requests
         WHERE subscription_id = $1 AND status IN ('pending', 'approved')
         LIMIT 1",
    )
    .bind(subscription_id)
    .fetch_optional(&mut *tx)
    .await?;

    if let Some(open_id) = open {
        return Err(CoreError::Validation(format!(
            "rescue request #{open_id} is still open for this subscription"
        )));
    }

    let category = BenefitCategory::parse(&sub.category)?;
    let rescue_value = benefits::rescue_value_fcfa(sub.token_balance, category);

    let request = sqlx::query_as::<_, RescueRequest>(&format!(
        "INSERT INTO rescue_requests
             (subscription_id, description, token_balance_at_request, rescue_value_fcfa)
         VALUES ($1, $2, $3, $4)
         RETURNING {REQUEST_COLS}"
    ))
    .bind(subscription_id)
    .bind(description)
    .bind(sub.token_balance)
    .bind(rescue_value)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await.map_err(CoreError::Store)?;
    Ok(request)
}

/// Applies one administrator review action. Refused transitions leave every
/// record untouched; the refusal names the request's current status.
pub async fn review(
    pool: &PgPool,
    request_id: i32,
    action: ReviewAction,
    notes: Option<&str>,
) -> Result<RescueRequest, CoreError> {
    let mut tx = pool.begin().await.map_err(CoreError::Store)?;

    let request = sqlx::query_as::<_, RescueRequest>(&format!(
        "SELECT {REQUEST_COLS} FROM rescue_requests WHERE id = $1 FOR UPDATE"
    ))
    .bind(request_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(CoreError::NotFound("rescue request"))?;

    let from = RescueStatus::parse(&request.status)?;
    if !action.allowed_from(from) {
        return Err(CoreError::InvalidStateTransition {
            from: request.status,
            action: action.verb(),
        });
    }

    // completion pays out: debit the snapshot amount atomically with the
    // status change, linked back to this request by reference
    if action == ReviewAction::Complete {
        let reference = format!("rescue_{}", request.id);
        ledger::record_rescue_claim(
            &mut tx,
            request.subscription_id,
            request.token_balance_at_request,
            request.rescue_value_fcfa,
            &reference,
        )
        .await?;
    }

    let request = sqlx::query_as::<_, RescueRequest>(&format!(
        "UPDATE rescue_requests
         SET status = $1, admin_notes = $2, processed_at = NOW()
         WHERE id = $3
         RETURNING {REQUEST_COLS}"
    ))
    .bind(action.target_status().as_str())
    .bind(notes)
    .bind(request_id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await.map_err(CoreError::Store)?;
    Ok(request)
}

pub async fn get_request(pool: &PgPool, request_id: i32) -> Result<RescueRequest, CoreError> {
    let request = sqlx::query_as::<_, RescueRequest>(&format!(
        "SELECT {REQUEST_COLS} FROM rescue_requests WHERE id = $1"
    ))
    .bind(request_id)
    .fetch_optional(pool)
    .await?;

    request.ok_or(CoreError::NotFound("rescue request"))
}

/// Adjudication queue, optionally filtered by status.
pub async fn list_requests(
    pool: &PgPool,
    status: Option<RescueStatus>,
) -> Result<Vec<RescueRequest>, CoreError> {
    let requests = match status {
        Some(status) => {
            sqlx::query_as::<_, RescueRequest>(&format!(
                "SELECT {REQUEST_COLS} FROM rescue_requests
                 WHERE status = $1
                 ORDER BY requested_at ASC"
            ))
            .bind(status.as_str())
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, RescueRequest>(&format!(
                "SELECT {REQUEST_COLS} FROM rescue_requests ORDER BY requested_at ASC"
            ))
            .fetch_all(pool)
            .await?
        }
    };

    Ok(requests)
}

pub async fn list_member_requests(
    pool: &PgPool,
    member_id: i32,
) -> Result<Vec<RescueRequest>, CoreError> {
    let requests = sqlx::query_as::<_, RescueRequest>(
        "SELECT r.id, r.subscription_id, r.status, r.description,
                r.token_balance_at_request, r.rescue_value_fcfa, r.admin_notes,
                r.requested_at, r.processed_at
         FROM rescue_requests r
         JOIN subscriptions s ON s.id = r.subscription_id
         WHERE s.member_id = $1
         ORDER BY r.requested_at DESC",
    )
    .bind(member_id)
    .fetch_all(pool)
    .await?;

    Ok(requests)
}
