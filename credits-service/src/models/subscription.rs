//! Subscription status model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// How long a premium activation stays valid before falling back to
/// standard enforcement.
pub const PREMIUM_VALIDITY_DAYS: i64 = 30;

/// Subscription plan tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanType {
    Standard,
    Unlimited,
}

impl PlanType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanType::Standard => "standard",
            PlanType::Unlimited => "unlimited",
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s {
            "unlimited" => PlanType::Unlimited,
            _ => PlanType::Standard,
        }
    }
}

/// Subscription status for one account.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Subscription {
    pub account_id: Uuid,
    pub plan_type: String,
    pub is_active: bool,
    pub premium_expires_utc: Option<DateTime<Utc>>,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

impl Subscription {
    pub fn plan(&self) -> PlanType {
        PlanType::from_string(&self.plan_type)
    }

    /// Whether the ceiling bypass applies at `now`. An expired premium
    /// window silently reverts to standard enforcement; no background job
    /// is needed to flip the row.
    pub fn is_unlimited_active(&self, now: DateTime<Utc>) -> bool {
        self.plan() == PlanType::Unlimited
            && self.is_active
            && self.premium_expires_utc.map(|e| e > now).unwrap_or(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_type_round_trips_through_strings() {
        assert_eq!(PlanType::from_string("unlimited"), PlanType::Unlimited);
        assert_eq!(PlanType::from_string("standard"), PlanType::Standard);
        // Unknown strings default to the metered tier, never to unlimited.
        assert_eq!(PlanType::from_string("gibberish"), PlanType::Standard);
    }
}
