// src/main.rs
use actix_web::{web, App, HttpResponse, HttpServer, Responder};
use dotenvy::dotenv;
use sqlx::PgPool;
use std::env;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use secours_api::{api, docs, AppState};

async fn index() -> impl Responder {
    HttpResponse::Ok().body("Service ready!")
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init();

    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = PgPool::connect(&database_url)
        .await
        .expect("Failed to connect to DB");

    sqlx::migrate!()
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    // JWT_SECRET is read per-request by the auth middleware; fail fast here
    env::var("JWT_SECRET").expect("JWT_SECRET required");

    let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8070".to_string());

    let state = web::Data::new(AppState { pool });

    log::info!("listening on {bind_addr}");

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .route("/", web::get().to(index))
            .service(
                SwaggerUi::new("/docs/{_:.*}")
                    .url("/api-docs/openapi.json", docs::ApiDoc::openapi()),
            )
            // public auth routes
            .service(api::auth::register)
            .service(api::auth::login)
            // member routes
            .service(
                web::scope("/api")
                    .service(
                        web::scope("/admin")
                            .wrap(api::auth::JwtMiddleware::admin())
                            .service(api::admin::list_requests)
                            .service(api::admin::approve_request)
                            .service(api::admin::reject_request)
                            .service(api::admin::complete_request)
                            .service(api::admin::refund_tokens)
                            .service(api::admin::audit_subscription)
                            .service(api::stats::global_stats),
                    )
                    .service(
                        web::scope("")
                            .wrap(api::auth::JwtMiddleware::member())
                            .service(api::subscriptions::enroll)
                            .service(api::subscriptions::list_subscriptions)
                            .service(api::subscriptions::cancel_subscription)
                            .service(api::subscriptions::eligibility)
                            .service(api::tokens::purchase_tokens)
                            .service(api::tokens::list_transactions)
                            .service(api::rescue::submit_rescue)
                            .service(api::rescue::list_my_requests)
                            .service(api::stats::member_stats),
                    ),
            )
    })
    .bind(bind_addr)?
    .run()
    .await
}
