use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::AccountSnapshot;

/// Account snapshot as served to callers. `remaining_credits` is derived
/// on the way out; it is never stored.
#[derive(Debug, Serialize, Deserialize)]
pub struct AccountResponse {
    pub account_id: Uuid,
    pub total_credits: i32,
    pub used_credits: i32,
    pub remaining_credits: i32,
    pub plan_type: String,
    pub is_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub premium_expires_utc: Option<DateTime<Utc>>,
}

impl From<AccountSnapshot> for AccountResponse {
    fn from(snapshot: AccountSnapshot) -> Self {
        AccountResponse {
            account_id: snapshot.account.account_id,
            total_credits: snapshot.account.total_credits,
            used_credits: snapshot.account.used_credits,
            remaining_credits: snapshot.account.remaining_credits(),
            plan_type: snapshot.subscription.plan_type.clone(),
            is_active: snapshot.subscription.is_active,
            premium_expires_utc: snapshot.subscription.premium_expires_utc,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct ChargeRequest {
    #[validate(range(min = 1, message = "charge amount must be at least 1"))]
    pub amount: i32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChargeResponse {
    pub committed: bool,
    pub account: AccountResponse,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ActivatePremiumResponse {
    pub success: bool,
    pub credits_granted: i32,
    pub expires_utc: Option<DateTime<Utc>>,
}
