// src/api/admin.rs
//
// Adjudication surface. These handlers only orchestrate: the state machine's
// preconditions (not separate logic here) refuse a second terminal action on
// the same request.

use actix_web::{get, post, web, HttpResponse, Responder};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::models::{RescueStatus, ReviewAction};
use crate::{db, ledger, rescue, AppState};

#[derive(Debug, Deserialize, ToSchema)]
pub struct ReviewNotes {
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct QueueQuery {
    /// pending | approved | rejected | completed
    pub status: Option<String>,
}

#[utoipa::path(
    get,
    path = "/rescue-requests",
    context_path = "/api/admin",
    params(QueueQuery),
    responses((status = 200, body = [crate::models::RescueRequest])),
    tag = "admin"
)]
#[get("/rescue-requests")]
pub async fn list_requests(
    state: web::Data<AppState>,
    query: web::Query<QueueQuery>,
) -> impl Responder {
    let status = match query.status.as_deref() {
        Some(s) => match RescueStatus::parse(s) {
            Ok(status) => Some(status),
            Err(e) => return e.to_response(),
        },
        None => None,
    };

    match rescue::list_requests(&state.pool, status).await {
        Ok(requests) => HttpResponse::Ok().json(requests),
        Err(e) => e.to_response(),
    }
}

async fn review(
    state: &AppState,
    request_id: i32,
    action: ReviewAction,
    notes: Option<&str>,
) -> HttpResponse {
    match rescue::review(&state.pool, request_id, action, notes).await {
        Ok(request) => {
            log::info!(
                "rescue {} request_id={} status={}",
                action.verb(),
                request.id,
                request.status
            );
            HttpResponse::Ok().json(request)
        }
        Err(e) => e.to_response(),
    }
}

#[utoipa::path(
    post,
    path = "/rescue-requests/{id}/approve",
    context_path = "/api/admin",
    request_body = ReviewNotes,
    responses(
        (status = 200, body = crate::models::RescueRequest),
        (status = 409, description = "refused")
    ),
    tag = "admin"
)]
#[post("/rescue-requests/{id}/approve")]
pub async fn approve_request(
    path: web::Path<i32>,
    state: web::Data<AppState>,
    payload: web::Json<ReviewNotes>,
) -> impl Responder {
    review(&state, path.into_inner(), ReviewAction::Approve, payload.notes.as_deref()).await
}

#[utoipa::path(
    post,
    path = "/rescue-requests/{id}/reject",
    context_path = "/api/admin",
    request_body = ReviewNotes,
    responses(
        (status = 200, body = crate::models::RescueRequest),
        (status = 409, description = "refused")
    ),
    tag = "admin"
)]
#[post("/rescue-requests/{id}/reject")]
pub async fn reject_request(
    path: web::Path<i32>,
    state: web::Data<AppState>,
    payload: web::Json<ReviewNotes>,
) -> impl Responder {
    review(&state, path.into_inner(), ReviewAction::Reject, payload.notes.as_deref()).await
}

#[utoipa::path(
    post,
    path = "/rescue-requests/{id}/complete",
    context_path = "/api/admin",
    request_body = ReviewNotes,
    responses(
        (status = 200, body = crate::models::RescueRequest),
        (status = 409, description = "refused")
    ),
    tag = "admin"
)]
#[post("/rescue-requests/{id}/complete")]
pub async fn complete_request(
    path: web::Path<i32>,
    state: web::Data<AppState>,
    payload: web::Json<ReviewNotes>,
) -> impl Responder {
    review(&state, path.into_inner(), ReviewAction::Complete, payload.notes.as_deref()).await
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RefundRequest {
    pub token_count: i32,
    pub amount_fcfa: i64,
    pub reference: Option<String>,
}

#[utoipa::path(
    post,
    path = "/subscriptions/{id}/tokens/refund",
    context_path = "/api/admin",
    request_body = RefundRequest,
    responses(
        (status = 200, body = crate::models::TokenTransaction),
        (status = 400, description = "invalid input")
    ),
    tag = "admin"
)]
#[post("/subscriptions/{id}/tokens/refund")]
pub async fn refund_tokens(
    path: web::Path<i32>,
    state: web::Data<AppState>,
    payload: web::Json<RefundRequest>,
) -> impl Responder {
    match ledger::refund(
        &state.pool,
        path.into_inner(),
        payload.token_count,
        payload.amount_fcfa,
        payload.reference.as_deref(),
    )
    .await
    {
        Ok((entry, sub)) => HttpResponse::Ok().json(serde_json::json!({
            "transaction": entry,
            "token_balance": sub.token_balance,
        })),
        Err(e) => e.to_response(),
    }
}

#[utoipa::path(
    get,
    path = "/subscriptions/{id}/audit",
    context_path = "/api/admin",
    responses(
        (status = 200, description = "reconciliation report"),
        (status = 404, description = "not found")
    ),
    tag = "admin"
)]
#[get("/subscriptions/{id}/audit")]
pub async fn audit_subscription(
    path: web::Path<i32>,
    state: web::Data<AppState>,
) -> impl Responder {
    let subscription_id = path.into_inner();

    let sub = match db::get_subscription(&state.pool, subscription_id).await {
        Ok(s) => s,
        Err(e) => return e.to_response(),
    };

    let ledger_balance = match ledger::reconciled_balance(&state.pool, subscription_id).await {
        Ok(b) => b,
        Err(e) => return e.to_response(),
    };

    HttpResponse::Ok().json(serde_json::json!({
        "subscription_id": subscription_id,
        "stored_balance": sub.token_balance,
        "ledger_balance": ledger_balance,
        "reconciled": i64::from(sub.token_balance) == ledger_balance,
    }))
}
