//! End-to-end credit gate workflow.
//!
//! Walks a fresh account through the full metered lifecycle: implicit
//! provisioning on first use, per-question decrement, exhaustion, and
//! recovery through premium activation.

mod common;

use serde_json::json;

#[tokio::test]
async fn ask_provisions_and_decrements_credits() {
    skip_unless_enabled!();
    let ctx = common::setup().await;

    // First question provisions the default allotment implicitly.
    let response = ctx
        .mentor_post("/mentor/ask", &json!({ "message": "What is a cover letter?" }))
        .await
        .unwrap();
    assert!(response.status().is_success(), "{}", response.status());

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["credits_remaining"], 99);

    // The ledger agrees with what the mentor reported.
    let snapshot = ctx.credit_snapshot().await.unwrap();
    assert_eq!(snapshot["total_credits"], 100);
    assert_eq!(snapshot["used_credits"], 1);
}

#[tokio::test]
async fn conversation_survives_across_requests() {
    skip_unless_enabled!();
    let ctx = common::setup().await;

    let first: serde_json::Value = ctx
        .mentor_post("/mentor/ask", &json!({ "message": "Name one soft skill." }))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let conversation_id = first["conversation_id"].as_str().unwrap().to_string();

    let second: serde_json::Value = ctx
        .mentor_post(
            "/mentor/ask",
            &json!({ "message": "Why does it matter?", "conversation_id": conversation_id }),
        )
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(second["conversation_id"].as_str().unwrap(), conversation_id);
    assert_eq!(second["credits_remaining"], 98);
}

#[tokio::test]
async fn exhaustion_blocks_and_premium_unblocks() {
    skip_unless_enabled!();
    let ctx = common::setup().await;

    // Provision via a first question, then drain the ledger directly.
    ctx.mentor_post("/mentor/ask", &json!({ "message": "hello" }))
        .await
        .unwrap();

    let drain = ctx
        .client
        .post(format!(
            "{}/accounts/{}/charge",
            ctx.endpoints.credits, ctx.account_id
        ))
        .json(&json!({ "amount": 99 }))
        .send()
        .await
        .unwrap();
    assert!(drain.status().is_success());

    // Exhausted: the mentor refuses with the upgrade CTA.
    let refused = ctx
        .mentor_post("/mentor/ask", &json!({ "message": "one more?" }))
        .await
        .unwrap();
    assert_eq!(refused.status().as_u16(), 402);
    let body: serde_json::Value = refused.json().await.unwrap();
    assert_eq!(body["code"], "insufficient_credits");

    // Premium activation resets the ledger and unblocks the account.
    let confirmation = ctx.activate_premium().await.unwrap();
    assert_eq!(confirmation["success"], true);
    assert_eq!(confirmation["credits_granted"], 1000);

    let answered = ctx
        .mentor_post("/mentor/ask", &json!({ "message": "and now?" }))
        .await
        .unwrap();
    assert!(answered.status().is_success());

    let snapshot = ctx.credit_snapshot().await.unwrap();
    assert_eq!(snapshot["plan_type"], "unlimited");
    assert_eq!(snapshot["used_credits"], 1);
}
