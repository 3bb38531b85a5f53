// src/ledger.rs
//
// Token ledger. Every balance change is one transaction: row-lock the
// subscription, append the ledger entry, update the derived balance. A crash
// between the append and the balance update therefore cannot leave the two
// inconsistent.

use sqlx::{PgConnection, PgPool};

use crate::db;
use crate::error::CoreError;
use crate::models::{Subscription, TokenTransaction, TransactionKind};

const TRANSACTION_COLS: &str =
    "id, subscription_id, kind, token_amount, amount_fcfa, payment_method, reference, created_at";

fn check_amounts(token_amount: i32, amount_fcfa: i64) -> Result<(), CoreError> {
    if token_amount <= 0 {
        return Err(CoreError::Validation(
            "token amount must be a positive integer".to_string(),
        ));
    }
    if amount_fcfa < 0 {
        return Err(CoreError::Validation(
            "monetary amount must not be negative".to_string(),
        ));
    }
    Ok(())
}

async fn append_entry(
    conn: &mut PgConnection,
    subscription_id: i32,
    kind: TransactionKind,
    token_amount: i32,
    amount_fcfa: i64,
    payment_method: Option<&str>,
    reference: Option<&str>,
) -> Result<TokenTransaction, CoreError> {
    let entry = sqlx::query_as::<_, TokenTransaction>(&format!(
        "INSERT INTO token_transactions
             (subscription_id, kind, token_amount, amount_fcfa, payment_method, reference)
         VALUES ($1, $2, $3, $4, $5, $6)
         RETURNING {TRANSACTION_COLS}"
    ))
    .bind(subscription_id)
    .bind(kind.as_str())
    .bind(token_amount)
    .bind(amount_fcfa)
    .bind(payment_method)
    .bind(reference)
    .fetch_one(conn)
    .await?;

    Ok(entry)
}

/// Records a completed token purchase. The payment itself happened upstream
/// (opaque capability); `payment_reference` is the id that completed payment
/// returned, recorded for traceability.
pub async fn purchase(
    pool: &PgPool,
    subscription_id: i32,
    token_amount: i32,
    amount_fcfa: i64,
    payment_method: &str,
    payment_reference: &str,
) -> Result<(TokenTransaction, Subscription), CoreError> {
    check_amounts(token_amount, amount_fcfa)?;
    if payment_method.trim().is_empty() {
        return Err(CoreError::Validation("payment method is required".to_string()));
    }
    if payment_reference.trim().is_empty() {
        return Err(CoreError::Validation(
            "payment reference is required".to_string(),
        ));
    }

    let mut tx = pool.begin().await.map_err(CoreError::Store)?;

    let sub = db::lock_subscription(&mut tx, subscription_id).await?;
    if !sub.is_active {
        return Err(CoreError::Validation(
            "subscription is not active".to_string(),
        ));
    }

    let entry = append_entry(
        &mut tx,
        subscription_id,
        TransactionKind::Purchase,
        token_amount,
        amount_fcfa,
        Some(payment_method),
        Some(payment_reference),
    )
    .await?;

    let sub = sqlx::query_as::<_, Subscription>(
        "UPDATE subscriptions
         SET token_balance = token_balance + $1,
             last_token_purchase_date = NOW()
         WHERE id = $2
         RETURNING id, member_id, category, token_balance, is_active,
                   enrollment_date, last_token_purchase_date, last_rescue_claim_date",
    )
    .bind(token_amount)
    .bind(subscription_id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await.map_err(CoreError::Store)?;
    Ok((entry, sub))
}

/// Reverses a failed or disputed purchase by appending a symmetric `refund`
/// entry. Allowed on inactive subscriptions: it is an audit correction, not a
/// member benefit.
pub async fn refund(
    pool: &PgPool,
    subscription_id: i32,
    token_amount: i32,
    amount_fcfa: i64,
    reference: Option<&str>,
) -> Result<(TokenTransaction, Subscription), CoreError> {
    check_amounts(token_amount, amount_fcfa)?;

    let mut tx = pool.begin().await.map_err(CoreError::Store)?;

    db::lock_subscription(&mut tx, subscription_id).await?;

    let entry = append_entry(
        &mut tx,
        subscription_id,
        TransactionKind::Refund,
        token_amount,
        amount_fcfa,
        None,
        reference,
    )
    .await?;

    let sub = sqlx::query_as::<_, Subscription>(
        "UPDATE subscriptions
         SET token_balance = token_balance + $1
         WHERE id = $2
         RETURNING id, member_id, category, token_balance, is_active,
                   enrollment_date, last_token_purchase_date, last_rescue_claim_date",
    )
    .bind(token_amount)
    .bind(subscription_id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await.map_err(CoreError::Store)?;
    Ok((entry, sub))
}

/// Debits the balance for a completed rescue claim. Only the rescue state
/// machine's completion transition calls this, inside its own transaction; it
/// re-takes the row lock (a no-op when the caller already holds it) and
/// refuses to drive the balance negative.
pub async fn record_rescue_claim(
    conn: &mut PgConnection,
    subscription_id: i32,
    token_amount: i32,
    amount_fcfa: i64,
    reference: &str,
) -> Result<TokenTransaction, CoreError> {
    check_amounts(token_amount, amount_fcfa)?;

    let sub = db::lock_subscription(conn, subscription_id).await?;
    if token_amount > sub.token_balance {
        return Err(CoreError::InsufficientBalance {
            requested: token_amount,
            available: sub.token_balance,
        });
    }

    let entry = append_entry(
        conn,
        subscription_id,
        TransactionKind::RescueClaim,
        token_amount,
        amount_fcfa,
        None,
        Some(reference),
    )
    .await?;

    sqlx::query(
        "UPDATE subscriptions
         SET token_balance = token_balance - $1,
             last_rescue_claim_date = NOW()
         WHERE id = $2",
    )
    .bind(token_amount)
    .bind(subscription_id)
    .execute(conn)
    .await?;

    Ok(entry)
}

pub async fn list_transactions(
    pool: &PgPool,
    subscription_id: i32,
) -> Result<Vec<TokenTransaction>, CoreError> {
    let entries = sqlx::query_as::<_, TokenTransaction>(&format!(
        "SELECT {TRANSACTION_COLS} FROM token_transactions
         WHERE subscription_id = $1
         ORDER BY created_at DESC, id DESC"
    ))
    .bind(subscription_id)
    .fetch_all(pool)
    .await?;

    Ok(entries)
}

/// Signed sum of the ledger for one subscription: purchases and refunds add,
/// rescue claims subtract. The stored balance must always equal this.
pub async fn reconciled_balance(pool: &PgPool, subscription_id: i32) -> Result<i64, CoreError> {
    let sum = sqlx::query_scalar::<_, i64>(
        "SELECT COALESCE(SUM(CASE WHEN kind = 'rescue_claim'
                                  THEN -token_amount
                                  ELSE token_amount END), 0)
         FROM token_transactions
         WHERE subscription_id = $1",
    )
    .bind(subscription_id)
    .fetch_one(pool)
    .await?;

    Ok(sum)
}
