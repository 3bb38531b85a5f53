use uuid::Uuid;

use secours_api::benefits::BenefitCategory;
use secours_api::error::CoreError;
use secours_api::models::ReviewAction;
use secours_api::{db, ledger, rescue};

mod support;

async fn eligible_subscription(
    pool: &sqlx::PgPool,
    category: BenefitCategory,
    tokens: i32,
) -> (i32, i32) {
    let member_id = support::insert_member(pool, &format!("{}@test", Uuid::new_v4())).await;
    let sub = db::enroll(pool, member_id, category).await.expect("enroll");
    support::backdate_enrollment(pool, sub.id, 31).await;
    if tokens > 0 {
        ledger::purchase(pool, sub.id, tokens, i64::from(tokens) * 500, "cash", "pay-seed")
            .await
            .expect("seed purchase");
    }
    (member_id, sub.id)
}

#[actix_web::test]
async fn submission_is_gated_on_the_accrual_window() {
    let Some(test_db) = support::init_test_db().await else { return };
    let pool = &test_db.pool;
    let member_id = support::insert_member(pool, &format!("{}@test", Uuid::new_v4())).await;
    let sub = db::enroll(pool, member_id, BenefitCategory::Auto)
        .await
        .expect("enroll");

    let err = rescue::submit(pool, sub.id, member_id, "engine failure on the highway")
        .await
        .expect_err("too early");
    match err {
        CoreError::NotYetEligible { days_remaining } => {
            assert!(days_remaining > 0 && days_remaining <= 30)
        }
        other => panic!("expected NotYetEligible, got {other:?}"),
    }

    support::backdate_enrollment(pool, sub.id, 31).await;
    rescue::submit(pool, sub.id, member_id, "engine failure on the highway")
        .await
        .expect("eligible now");
}

#[actix_web::test]
async fn submission_snapshots_balance_and_value() {
    let Some(test_db) = support::init_test_db().await else { return };
    let pool = &test_db.pool;
    let (member_id, sub_id) =
        eligible_subscription(pool, BenefitCategory::Motors, 8).await;

    let request = rescue::submit(pool, sub_id, member_id, "moto stolen")
        .await
        .expect("submit");
    assert_eq!(request.status, "pending");
    assert_eq!(request.token_balance_at_request, 8);
    // floor(8 * 250 * 1.5)
    assert_eq!(request.rescue_value_fcfa, 3_000);
    assert!(request.processed_at.is_none());

    // later ledger activity must not change the snapshot
    ledger::refund(pool, sub_id, 5, 1_250, Some("late-credit"))
        .await
        .expect("refund");
    let request = rescue::get_request(pool, request.id).await.expect("reload");
    assert_eq!(request.token_balance_at_request, 8);
    assert_eq!(request.rescue_value_fcfa, 3_000);
}

#[actix_web::test]
async fn submission_requires_a_positive_balance() {
    let Some(test_db) = support::init_test_db().await else { return };
    let pool = &test_db.pool;
    // past the accrual window but never bought a token
    let (member_id, sub_id) = eligible_subscription(pool, BenefitCategory::Auto, 0).await;

    let err = rescue::submit(pool, sub_id, member_id, "car accident")
        .await
        .expect_err("empty balance");
    match err {
        CoreError::Validation(msg) => assert!(msg.contains("no tokens"), "got: {msg}"),
        other => panic!("expected Validation, got {other:?}"),
    }

    // nothing was recorded, so a later funded submission is not blocked
    ledger::purchase(pool, sub_id, 2, 1_500, "cash", "pay-after")
        .await
        .expect("purchase");
    let request = rescue::submit(pool, sub_id, member_id, "car accident")
        .await
        .expect("submit once funded");
    assert_eq!(request.token_balance_at_request, 2);
}

#[actix_web::test]
async fn completion_debits_the_snapshot_through_the_ledger() {
    let Some(test_db) = support::init_test_db().await else { return };
    let pool = &test_db.pool;
    // snapshot of 8 motors tokens pays out floor(8 * 250 * 1.5) = 3000
    let (member_id, sub_id) =
        eligible_subscription(pool, BenefitCategory::Motors, 8).await;
    let request = rescue::submit(pool, sub_id, member_id, "moto stolen")
        .await
        .expect("submit");

    let request = rescue::review(pool, request.id, ReviewAction::Complete, Some("paid out"))
        .await
        .expect("complete");
    assert_eq!(request.status, "completed");
    assert_eq!(request.admin_notes.as_deref(), Some("paid out"));
    assert!(request.processed_at.is_some());

    let sub = db::get_subscription(pool, sub_id).await.expect("get");
    assert_eq!(sub.token_balance, 0);
    assert!(sub.last_rescue_claim_date.is_some());

    let entries = ledger::list_transactions(pool, sub_id).await.expect("list");
    let claim = entries
        .iter()
        .find(|e| e.kind == "rescue_claim")
        .expect("claim entry");
    assert_eq!(claim.token_amount, 8);
    assert_eq!(claim.amount_fcfa, 3_000);
    assert_eq!(
        claim.reference.as_deref(),
        Some(format!("rescue_{}", request.id).as_str())
    );

    assert_eq!(
        ledger::reconciled_balance(pool, sub_id).await.expect("sum"),
        0
    );
}

#[actix_web::test]
async fn rejection_is_terminal_and_has_no_ledger_effect() {
    let Some(test_db) = support::init_test_db().await else { return };
    let pool = &test_db.pool;
    let (member_id, sub_id) =
        eligible_subscription(pool, BenefitCategory::Education, 4).await;
    let request = rescue::submit(pool, sub_id, member_id, "school fees emergency")
        .await
        .expect("submit");

    let request = rescue::review(pool, request.id, ReviewAction::Reject, Some("duplicate claim"))
        .await
        .expect("reject");
    assert_eq!(request.status, "rejected");
    assert_eq!(request.admin_notes.as_deref(), Some("duplicate claim"));
    assert!(request.processed_at.is_some());

    let entries = ledger::list_transactions(pool, sub_id).await.expect("list");
    assert!(entries.iter().all(|e| e.kind != "rescue_claim"));
    let sub = db::get_subscription(pool, sub_id).await.expect("get");
    assert_eq!(sub.token_balance, 4);

    // terminal: nothing moves it again
    for action in [ReviewAction::Approve, ReviewAction::Reject, ReviewAction::Complete] {
        let err = rescue::review(pool, request.id, action, None)
            .await
            .expect_err("terminal");
        assert!(matches!(err, CoreError::InvalidStateTransition { .. }));
    }
}

#[actix_web::test]
async fn approve_then_complete_and_terminal_closure_after_completion() {
    let Some(test_db) = support::init_test_db().await else { return };
    let pool = &test_db.pool;
    let (member_id, sub_id) = eligible_subscription(pool, BenefitCategory::Auto, 2).await;
    let request = rescue::submit(pool, sub_id, member_id, "car accident")
        .await
        .expect("submit");

    let request = rescue::review(pool, request.id, ReviewAction::Approve, Some("docs verified"))
        .await
        .expect("approve");
    assert_eq!(request.status, "approved");
    assert!(request.processed_at.is_some());

    // approved admits only completion
    let err = rescue::review(pool, request.id, ReviewAction::Reject, None)
        .await
        .expect_err("reject after approve");
    assert!(matches!(err, CoreError::InvalidStateTransition { .. }));

    let request = rescue::review(pool, request.id, ReviewAction::Complete, None)
        .await
        .expect("complete");
    assert_eq!(request.status, "completed");

    // approve on a completed request fails and nothing changes
    let before = rescue::get_request(pool, request.id).await.expect("reload");
    let err = rescue::review(pool, request.id, ReviewAction::Approve, Some("oops"))
        .await
        .expect_err("approve after complete");
    assert!(matches!(err, CoreError::InvalidStateTransition { .. }));
    let after = rescue::get_request(pool, request.id).await.expect("reload");
    assert_eq!(before.status, after.status);
    assert_eq!(before.admin_notes, after.admin_notes);

    let entries = ledger::list_transactions(pool, sub_id).await.expect("list");
    assert_eq!(
        entries.iter().filter(|e| e.kind == "rescue_claim").count(),
        1
    );
}

#[actix_web::test]
async fn completion_refuses_to_overdraw_a_changed_balance() {
    let Some(test_db) = support::init_test_db().await else { return };
    let pool = &test_db.pool;
    let (member_id, sub_id) = eligible_subscription(pool, BenefitCategory::Motors, 8).await;
    let request = rescue::submit(pool, sub_id, member_id, "moto stolen")
        .await
        .expect("submit");

    // force the live balance below the snapshot (simulates the drift the
    // check exists to catch)
    sqlx::query("UPDATE subscriptions SET token_balance = 3 WHERE id = $1")
        .bind(sub_id)
        .execute(pool)
        .await
        .expect("force balance");

    let err = rescue::review(pool, request.id, ReviewAction::Complete, None)
        .await
        .expect_err("overdraw");
    match err {
        CoreError::InsufficientBalance { requested, available } => {
            assert_eq!(requested, 8);
            assert_eq!(available, 3);
        }
        other => panic!("expected InsufficientBalance, got {other:?}"),
    }

    // the refused completion left the request pending and the ledger untouched
    let request = rescue::get_request(pool, request.id).await.expect("reload");
    assert_eq!(request.status, "pending");
    let entries = ledger::list_transactions(pool, sub_id).await.expect("list");
    assert!(entries.iter().all(|e| e.kind != "rescue_claim"));
}

#[actix_web::test]
async fn one_open_request_per_subscription() {
    let Some(test_db) = support::init_test_db().await else { return };
    let pool = &test_db.pool;
    let (member_id, sub_id) = eligible_subscription(pool, BenefitCategory::Transport, 5).await;

    let first = rescue::submit(pool, sub_id, member_id, "bus broke down")
        .await
        .expect("first submit");
    let err = rescue::submit(pool, sub_id, member_id, "second emergency")
        .await
        .expect_err("second open submit");
    assert!(matches!(err, CoreError::Validation(_)));

    // still blocked while approved, open again once terminal
    rescue::review(pool, first.id, ReviewAction::Approve, None)
        .await
        .expect("approve");
    assert!(rescue::submit(pool, sub_id, member_id, "second emergency")
        .await
        .is_err());

    rescue::review(pool, first.id, ReviewAction::Complete, None)
        .await
        .expect("complete");
    rescue::submit(pool, sub_id, member_id, "second emergency")
        .await
        .expect("submit after terminal");
}

#[actix_web::test]
async fn submit_validates_description_and_ownership() {
    let Some(test_db) = support::init_test_db().await else { return };
    let pool = &test_db.pool;
    let (member_id, sub_id) = eligible_subscription(pool, BenefitCategory::Auto, 1).await;

    let err = rescue::submit(pool, sub_id, member_id, "   ")
        .await
        .expect_err("blank description");
    assert!(matches!(err, CoreError::Validation(_)));

    let stranger = support::insert_member(pool, &format!("{}@test", Uuid::new_v4())).await;
    let err = rescue::submit(pool, sub_id, stranger, "not my subscription")
        .await
        .expect_err("foreign subscription");
    assert!(matches!(err, CoreError::NotFound(_)));
}
