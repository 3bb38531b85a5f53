// src/api/stats.rs

use actix_web::{get, web, HttpResponse, Responder};

use crate::{stats, AppState};

#[utoipa::path(
    get,
    path = "/stats",
    context_path = "/api",
    responses((status = 200, body = stats::MemberStats)),
    tag = "stats"
)]
#[get("/stats")]
pub async fn member_stats(
    member_id: web::ReqData<i32>,
    state: web::Data<AppState>,
) -> impl Responder {
    match stats::member_stats(&state.pool, *member_id).await {
        Ok(s) => HttpResponse::Ok().json(s),
        Err(e) => e.to_response(),
    }
}

#[utoipa::path(
    get,
    path = "/stats",
    context_path = "/api/admin",
    responses((status = 200, body = stats::GlobalStats)),
    tag = "stats"
)]
#[get("/stats")]
pub async fn global_stats(state: web::Data<AppState>) -> impl Responder {
    match stats::global_stats(&state.pool).await {
        Ok(s) => HttpResponse::Ok().json(s),
        Err(e) => e.to_response(),
    }
}
