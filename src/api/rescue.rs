// src/api/rescue.rs

use actix_web::{get, post, web, HttpResponse, Responder};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::{rescue, AppState};

#[derive(Debug, Deserialize, ToSchema)]
pub struct SubmitRescueRequest {
    pub description: String,
}

#[utoipa::path(
    post,
    path = "/subscriptions/{id}/rescue",
    context_path = "/api",
    request_body = SubmitRescueRequest,
    responses(
        (status = 200, body = crate::models::RescueRequest),
        (status = 422, description = "accrual window not yet elapsed")
    ),
    tag = "rescue"
)]
#[post("/subscriptions/{id}/rescue")]
pub async fn submit_rescue(
    member_id: web::ReqData<i32>,
    path: web::Path<i32>,
    state: web::Data<AppState>,
    payload: web::Json<SubmitRescueRequest>,
) -> impl Responder {
    let subscription_id = path.into_inner();

    match rescue::submit(&state.pool, subscription_id, *member_id, &payload.description).await {
        Ok(request) => {
            log::info!(
                "rescue submitted request_id={} subscription_id={} value_fcfa={}",
                request.id,
                subscription_id,
                request.rescue_value_fcfa
            );
            HttpResponse::Ok().json(request)
        }
        Err(e) => e.to_response(),
    }
}

#[utoipa::path(
    get,
    path = "/rescue-requests",
    context_path = "/api",
    responses((status = 200, body = [crate::models::RescueRequest])),
    tag = "rescue"
)]
#[get("/rescue-requests")]
pub async fn list_my_requests(
    member_id: web::ReqData<i32>,
    state: web::Data<AppState>,
) -> impl Responder {
    match rescue::list_member_requests(&state.pool, *member_id).await {
        Ok(requests) => HttpResponse::Ok().json(requests),
        Err(e) => e.to_response(),
    }
}
