use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::api::auth::register,
        crate::api::auth::login,
        crate::api::subscriptions::enroll,
        crate::api::subscriptions::list_subscriptions,
        crate::api::subscriptions::cancel_subscription,
        crate::api::subscriptions::eligibility,
        crate::api::tokens::purchase_tokens,
        crate::api::tokens::list_transactions,
        crate::api::rescue::submit_rescue,
        crate::api::rescue::list_my_requests,
        crate::api::stats::member_stats,
        crate::api::admin::list_requests,
        crate::api::admin::approve_request,
        crate::api::admin::reject_request,
        crate::api::admin::complete_request,
        crate::api::admin::refund_tokens,
        crate::api::admin::audit_subscription,
        crate::api::stats::global_stats
    ),
    components(
        schemas(
            crate::api::auth::RegisterRequest,
            crate::api::auth::LoginRequest,
            crate::api::auth::AuthResponse,
            crate::api::subscriptions::EnrollRequest,
            crate::api::tokens::PurchaseRequest,
            crate::api::rescue::SubmitRescueRequest,
            crate::api::admin::ReviewNotes,
            crate::api::admin::RefundRequest,
            crate::models::Subscription,
            crate::models::TokenTransaction,
            crate::models::RescueRequest,
            crate::benefits::BenefitCategory,
            crate::benefits::EligibilityReport,
            crate::stats::MemberStats,
            crate::stats::GlobalStats
        )
    ),
    tags(
        (name = "auth", description = "Member authentication"),
        (name = "subscriptions", description = "Benefit subscriptions"),
        (name = "tokens", description = "Token ledger"),
        (name = "rescue", description = "Rescue claims"),
        (name = "admin", description = "Adjudication and corrections"),
        (name = "stats", description = "Projections")
    )
)]
pub struct ApiDoc;
