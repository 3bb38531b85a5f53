// src/models.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::error::CoreError;

/// One record per (member, benefit category). `token_balance` is derived from
/// the ledger and updated in lock-step with every append.
#[derive(Debug, Serialize, FromRow, ToSchema)]
pub struct Subscription {
    pub id: i32,
    pub member_id: i32,
    pub category: String,
    pub token_balance: i32,
    pub is_active: bool,
    pub enrollment_date: DateTime<Utc>,
    pub last_token_purchase_date: Option<DateTime<Utc>>,
    pub last_rescue_claim_date: Option<DateTime<Utc>>,
}

/// Append-only ledger entry. Never updated or deleted; corrections are new
/// `refund` rows.
#[derive(Debug, Serialize, FromRow, ToSchema)]
pub struct TokenTransaction {
    pub id: i32,
    pub subscription_id: i32,
    pub kind: String,
    pub token_amount: i32,
    pub amount_fcfa: i64,
    pub payment_method: Option<String>,
    pub reference: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, FromRow, ToSchema)]
pub struct RescueRequest {
    pub id: i32,
    pub subscription_id: i32,
    pub status: String,
    pub description: String,
    /// Snapshot taken at submission; the payout is always evaluated against
    /// this, not the live balance.
    pub token_balance_at_request: i32,
    pub rescue_value_fcfa: i64,
    pub admin_notes: Option<String>,
    pub requested_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionKind {
    Purchase,
    RescueClaim,
    Refund,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Purchase => "purchase",
            TransactionKind::RescueClaim => "rescue_claim",
            TransactionKind::Refund => "refund",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RescueStatus {
    Pending,
    Approved,
    Rejected,
    Completed,
}

impl RescueStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RescueStatus::Pending => "pending",
            RescueStatus::Approved => "approved",
            RescueStatus::Rejected => "rejected",
            RescueStatus::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Result<RescueStatus, CoreError> {
        match s {
            "pending" => Ok(RescueStatus::Pending),
            "approved" => Ok(RescueStatus::Approved),
            "rejected" => Ok(RescueStatus::Rejected),
            "completed" => Ok(RescueStatus::Completed),
            other => Err(CoreError::Validation(format!(
                "unknown rescue request status '{other}'"
            ))),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RescueStatus::Rejected | RescueStatus::Completed)
    }
}

/// Administrator review actions driving the rescue state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewAction {
    Approve,
    Reject,
    Complete,
}

impl ReviewAction {
    pub fn verb(&self) -> &'static str {
        match self {
            ReviewAction::Approve => "approve",
            ReviewAction::Reject => "reject",
            ReviewAction::Complete => "complete",
        }
    }

    pub fn target_status(&self) -> RescueStatus {
        match self {
            ReviewAction::Approve => RescueStatus::Approved,
            ReviewAction::Reject => RescueStatus::Rejected,
            ReviewAction::Complete => RescueStatus::Completed,
        }
    }

    /// The whole transition table: pending may be approved, rejected or
    /// completed directly; approved may only be completed; terminal states
    /// admit nothing.
    pub fn allowed_from(&self, from: RescueStatus) -> bool {
        match (from, self) {
            (RescueStatus::Pending, _) => true,
            (RescueStatus::Approved, ReviewAction::Complete) => true,
            _ => false,
        }
    }
}
