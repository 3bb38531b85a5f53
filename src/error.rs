// src/error.rs

use actix_web::HttpResponse;
use serde_json::json;
use thiserror::Error;

/// Error taxonomy of the ledger / rescue core. Validation errors are raised
/// before any record is touched; state-machine and balance errors leave all
/// records unchanged (the enclosing transaction is rolled back).
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("an active subscription already exists for this member and category")]
    DuplicateSubscription,

    #[error("insufficient token balance: requested {requested}, available {available}")]
    InsufficientBalance { requested: i32, available: i32 },

    #[error("cannot {action} a rescue request in status '{from}'")]
    InvalidStateTransition { from: String, action: &'static str },

    #[error("subscription is not yet eligible for a rescue claim: {days_remaining} day(s) remaining")]
    NotYetEligible { days_remaining: i64 },

    #[error("{0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("store unavailable: {0}")]
    Store(#[from] sqlx::Error),
}

impl CoreError {
    /// Maps a core error to the HTTP response the handlers return.
    /// Administrators get the specific refusal reason, not a generic failure.
    pub fn to_response(&self) -> HttpResponse {
        let body = json!({ "error": self.to_string() });
        match self {
            CoreError::DuplicateSubscription => HttpResponse::Conflict().json(body),
            CoreError::InsufficientBalance { .. } => HttpResponse::Conflict().json(body),
            CoreError::InvalidStateTransition { .. } => HttpResponse::Conflict().json(body),
            CoreError::NotYetEligible { .. } => HttpResponse::UnprocessableEntity().json(body),
            CoreError::Validation(_) => HttpResponse::BadRequest().json(body),
            CoreError::NotFound(_) => HttpResponse::NotFound().json(body),
            CoreError::Store(e) => {
                log::error!("store error: {e}");
                HttpResponse::InternalServerError()
                    .json(json!({ "error": "store unavailable, retry later" }))
            }
        }
    }
}
