// src/benefits.rs
//
// Benefit category table and the eligibility calculator. This is the single
// source of truth for per-token values and the 30-day accrual window; both the
// member-facing estimate and the snapshot captured at rescue submission go
// through these functions.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::CoreError;

/// Days a subscription must accrue after enrollment before a rescue claim
/// may be honored.
pub const ACCRUAL_WINDOW_DAYS: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum BenefitCategory {
    Auto,
    Transport,
    Education,
    Communication,
    Motors,
}

impl BenefitCategory {
    pub const ALL: [BenefitCategory; 5] = [
        BenefitCategory::Auto,
        BenefitCategory::Transport,
        BenefitCategory::Education,
        BenefitCategory::Communication,
        BenefitCategory::Motors,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BenefitCategory::Auto => "auto",
            BenefitCategory::Transport => "transport",
            BenefitCategory::Education => "education",
            BenefitCategory::Communication => "communication",
            BenefitCategory::Motors => "motors",
        }
    }

    pub fn parse(s: &str) -> Result<BenefitCategory, CoreError> {
        match s {
            "auto" => Ok(BenefitCategory::Auto),
            "transport" => Ok(BenefitCategory::Transport),
            "education" => Ok(BenefitCategory::Education),
            "communication" => Ok(BenefitCategory::Communication),
            "motors" => Ok(BenefitCategory::Motors),
            other => Err(CoreError::Validation(format!(
                "unknown benefit category '{other}'"
            ))),
        }
    }

    /// FCFA value of one token in this category. Configuration, not algorithm:
    /// adjust here and nowhere else.
    pub fn token_unit_value_fcfa(&self) -> i64 {
        match self {
            BenefitCategory::Auto => 750,
            BenefitCategory::Transport => 750,
            BenefitCategory::Education => 500,
            BenefitCategory::Communication => 500,
            BenefitCategory::Motors => 250,
        }
    }
}

/// Accrual progress through the 30-day window, clamped to [0, 100].
pub fn progress_percent(enrollment_date: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let elapsed = (now - enrollment_date).num_seconds() as f64;
    let window = (ACCRUAL_WINDOW_DAYS * 86_400) as f64;
    (elapsed / window * 100.0).clamp(0.0, 100.0)
}

/// Whole days left until the accrual window elapses (0 once eligible).
pub fn days_until_eligible(enrollment_date: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let deadline = enrollment_date + Duration::days(ACCRUAL_WINDOW_DAYS);
    let remaining = (deadline - now).num_seconds();
    if remaining <= 0 {
        0
    } else {
        // ceil to whole days
        (remaining + 86_399) / 86_400
    }
}

pub fn is_eligible(enrollment_date: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    now >= enrollment_date + Duration::days(ACCRUAL_WINDOW_DAYS)
}

/// FCFA payout for a token balance: floor(balance * unit value * 1.5),
/// computed in integer arithmetic so the floor is exact.
pub fn rescue_value_fcfa(token_balance: i32, category: BenefitCategory) -> i64 {
    i64::from(token_balance) * category.token_unit_value_fcfa() * 3 / 2
}

/// Member-facing eligibility report for one subscription.
#[derive(Debug, Serialize, ToSchema)]
pub struct EligibilityReport {
    pub category: BenefitCategory,
    pub token_balance: i32,
    pub progress_percent: f64,
    pub days_until_eligible: i64,
    pub is_eligible: bool,
    pub estimated_rescue_value_fcfa: i64,
}

pub fn eligibility_report(
    category: BenefitCategory,
    token_balance: i32,
    enrollment_date: DateTime<Utc>,
    now: DateTime<Utc>,
) -> EligibilityReport {
    EligibilityReport {
        category,
        token_balance,
        progress_percent: progress_percent(enrollment_date, now),
        days_until_eligible: days_until_eligible(enrollment_date, now),
        is_eligible: is_eligible(enrollment_date, now),
        estimated_rescue_value_fcfa: rescue_value_fcfa(token_balance, category),
    }
}
