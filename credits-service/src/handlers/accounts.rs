//! Account ledger handlers.
//!
//! The charge endpoint is the single authoritative enforcement point: a
//! refused charge is a normal 200 with `committed: false`, because running
//! out of credits is an expected, user-actionable state, not a fault.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use service_core::error::AppError;
use service_core::middleware::account::AccountContext;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dtos::{AccountResponse, ActivatePremiumResponse, ChargeRequest, ChargeResponse},
    models::PREMIUM_CREDITS,
    services::metrics::{record_charge, ACCOUNTS_PROVISIONED_TOTAL, PREMIUM_ACTIVATIONS_TOTAL},
    services::ChargeResult,
    startup::AppState,
};

/// Get an account's balance snapshot. 404 means the account has no ledger
/// yet; callers are expected to provision it, not to treat this as a
/// failure.
pub async fn get_account(
    State(state): State<AppState>,
    Path(account_id): Path<Uuid>,
) -> Result<Json<AccountResponse>, AppError> {
    let snapshot = state
        .db
        .get_snapshot(account_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("No credit account for this id")))?;

    Ok(Json(AccountResponse::from(snapshot)))
}

/// Provision the default ledger for an account. Idempotent.
pub async fn provision_account(
    State(state): State<AppState>,
    Path(account_id): Path<Uuid>,
) -> Result<(StatusCode, Json<AccountResponse>), AppError> {
    tracing::info!(account_id = %account_id, "Provisioning credit account");

    let snapshot = state.db.ensure_account(account_id).await?;

    if let Some(counter) = ACCOUNTS_PROVISIONED_TOTAL.get() {
        counter.with_label_values(&["api"]).inc();
    }

    Ok((StatusCode::CREATED, Json(AccountResponse::from(snapshot))))
}

/// Authoritatively charge credits against an account.
pub async fn charge(
    State(state): State<AppState>,
    Path(account_id): Path<Uuid>,
    Json(payload): Json<ChargeRequest>,
) -> Result<Json<ChargeResponse>, AppError> {
    payload.validate()?;

    tracing::info!(
        account_id = %account_id,
        amount = payload.amount,
        "Charging credits"
    );

    match state.db.charge(account_id, payload.amount).await? {
        ChargeResult::Committed(snapshot) => {
            record_charge("committed");
            Ok(Json(ChargeResponse {
                committed: true,
                account: AccountResponse::from(snapshot),
            }))
        }
        ChargeResult::InsufficientCredits(snapshot) => {
            record_charge("insufficient");
            Ok(Json(ChargeResponse {
                committed: false,
                account: AccountResponse::from(snapshot),
            }))
        }
        ChargeResult::NotFound => {
            record_charge("not_found");
            Err(AppError::NotFound(anyhow::anyhow!(
                "No credit account for this id"
            )))
        }
    }
}

/// Premium activation from a confirmed billing event.
///
/// No request body: the activation applies only to the authenticated
/// account from the BFF-injected header, never to an identifier a caller
/// could put in a payload.
pub async fn activate_premium(
    State(state): State<AppState>,
    account: AccountContext,
) -> Result<Json<ActivatePremiumResponse>, AppError> {
    tracing::info!(account_id = %account.account_id, "Activating premium plan");

    let snapshot = state.db.activate_premium(account.account_id).await?;

    if let Some(counter) = PREMIUM_ACTIVATIONS_TOTAL.get() {
        counter.with_label_values(&["success"]).inc();
    }

    Ok(Json(ActivatePremiumResponse {
        success: true,
        credits_granted: PREMIUM_CREDITS,
        expires_utc: snapshot.subscription.premium_expires_utc,
    }))
}
