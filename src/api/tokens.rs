// src/api/tokens.rs

use actix_web::{get, post, web, HttpResponse, Responder};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::{db, ledger, AppState};

#[derive(Debug, Deserialize, ToSchema)]
pub struct PurchaseRequest {
    pub token_count: i32,
    /// Amount actually paid, in whole FCFA.
    pub amount_fcfa: i64,
    pub payment_method: String,
    /// Transaction id returned by the (already completed) payment.
    pub payment_reference: String,
}

#[utoipa::path(
    post,
    path = "/subscriptions/{id}/tokens/purchase",
    context_path = "/api",
    request_body = PurchaseRequest,
    responses(
        (status = 200, body = crate::models::TokenTransaction),
        (status = 400, description = "invalid input")
    ),
    tag = "tokens"
)]
#[post("/subscriptions/{id}/tokens/purchase")]
pub async fn purchase_tokens(
    member_id: web::ReqData<i32>,
    path: web::Path<i32>,
    state: web::Data<AppState>,
    payload: web::Json<PurchaseRequest>,
) -> impl Responder {
    let subscription_id = path.into_inner();

    if let Err(e) = db::get_owned_subscription(&state.pool, subscription_id, *member_id).await {
        return e.to_response();
    }

    match ledger::purchase(
        &state.pool,
        subscription_id,
        payload.token_count,
        payload.amount_fcfa,
        &payload.payment_method,
        &payload.payment_reference,
    )
    .await
    {
        Ok((entry, sub)) => {
            log::info!(
                "purchase subscription_id={} tokens={} balance={}",
                subscription_id,
                entry.token_amount,
                sub.token_balance
            );
            HttpResponse::Ok().json(serde_json::json!({
                "transaction": entry,
                "token_balance": sub.token_balance,
            }))
        }
        Err(e) => e.to_response(),
    }
}

#[utoipa::path(
    get,
    path = "/subscriptions/{id}/transactions",
    context_path = "/api",
    responses(
        (status = 200, body = [crate::models::TokenTransaction]),
        (status = 404, description = "not found")
    ),
    tag = "tokens"
)]
#[get("/subscriptions/{id}/transactions")]
pub async fn list_transactions(
    member_id: web::ReqData<i32>,
    path: web::Path<i32>,
    state: web::Data<AppState>,
) -> impl Responder {
    let subscription_id = path.into_inner();

    if let Err(e) = db::get_owned_subscription(&state.pool, subscription_id, *member_id).await {
        return e.to_response();
    }

    match ledger::list_transactions(&state.pool, subscription_id).await {
        Ok(entries) => HttpResponse::Ok().json(entries),
        Err(e) => e.to_response(),
    }
}
