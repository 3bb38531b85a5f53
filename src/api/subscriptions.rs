// src/api/subscriptions.rs

use actix_web::{get, post, web, HttpResponse, Responder};
use chrono::Utc;
use serde::Deserialize;
use utoipa::ToSchema;

use crate::benefits::{self, BenefitCategory};
use crate::{db, AppState};

#[derive(Debug, Deserialize, ToSchema)]
pub struct EnrollRequest {
    /// Benefit category slug (auto, transport, education, communication, motors).
    pub category: String,
}

#[utoipa::path(
    post,
    path = "/subscriptions/enroll",
    context_path = "/api",
    request_body = EnrollRequest,
    responses(
        (status = 200, body = crate::models::Subscription),
        (status = 409, description = "refused")
    ),
    tag = "subscriptions"
)]
#[post("/subscriptions/enroll")]
pub async fn enroll(
    member_id: web::ReqData<i32>,
    state: web::Data<AppState>,
    payload: web::Json<EnrollRequest>,
) -> impl Responder {
    let category = match BenefitCategory::parse(&payload.category) {
        Ok(c) => c,
        Err(e) => return e.to_response(),
    };

    match db::enroll(&state.pool, *member_id, category).await {
        Ok(sub) => HttpResponse::Ok().json(sub),
        Err(e) => e.to_response(),
    }
}

#[utoipa::path(
    get,
    path = "/subscriptions",
    context_path = "/api",
    responses((status = 200, body = [crate::models::Subscription])),
    tag = "subscriptions"
)]
#[get("/subscriptions")]
pub async fn list_subscriptions(
    member_id: web::ReqData<i32>,
    state: web::Data<AppState>,
) -> impl Responder {
    match db::list_member_subscriptions(&state.pool, *member_id).await {
        Ok(subs) => HttpResponse::Ok().json(subs),
        Err(e) => e.to_response(),
    }
}

#[utoipa::path(
    post,
    path = "/subscriptions/{id}/cancel",
    context_path = "/api",
    responses(
        (status = 200, body = crate::models::Subscription),
        (status = 404, description = "not found")
    ),
    tag = "subscriptions"
)]
#[post("/subscriptions/{id}/cancel")]
pub async fn cancel_subscription(
    member_id: web::ReqData<i32>,
    path: web::Path<i32>,
    state: web::Data<AppState>,
) -> impl Responder {
    let subscription_id = path.into_inner();

    // ownership first, then the idempotent deactivation
    if let Err(e) = db::get_owned_subscription(&state.pool, subscription_id, *member_id).await {
        return e.to_response();
    }

    match db::cancel(&state.pool, subscription_id).await {
        Ok(sub) => HttpResponse::Ok().json(sub),
        Err(e) => e.to_response(),
    }
}

#[utoipa::path(
    get,
    path = "/subscriptions/{id}/eligibility",
    context_path = "/api",
    responses(
        (status = 200, body = benefits::EligibilityReport),
        (status = 404, description = "not found")
    ),
    tag = "subscriptions"
)]
#[get("/subscriptions/{id}/eligibility")]
pub async fn eligibility(
    member_id: web::ReqData<i32>,
    path: web::Path<i32>,
    state: web::Data<AppState>,
) -> impl Responder {
    let subscription_id = path.into_inner();

    let sub = match db::get_owned_subscription(&state.pool, subscription_id, *member_id).await {
        Ok(s) => s,
        Err(e) => return e.to_response(),
    };

    let category = match BenefitCategory::parse(&sub.category) {
        Ok(c) => c,
        Err(e) => return e.to_response(),
    };

    // same calculator the submission snapshot uses; server clock only
    let report =
        benefits::eligibility_report(category, sub.token_balance, sub.enrollment_date, Utc::now());
    HttpResponse::Ok().json(report)
}
