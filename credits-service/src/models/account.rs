//! Credit account model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::Subscription;

/// Credits granted when an account is first provisioned.
pub const DEFAULT_CREDITS: i32 = 100;

/// Credits granted on premium activation (alongside the unlimited plan,
/// kept for reporting once the premium window lapses).
pub const PREMIUM_CREDITS: i32 = 1000;

/// One credit ledger row per account.
///
/// Invariant for standard plans: `0 <= used_credits <= total_credits` at
/// every commit point. The ceiling is enforced by the conditional charge
/// statement, never re-checked client-side.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CreditAccount {
    pub account_id: Uuid,
    pub total_credits: i32,
    pub used_credits: i32,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

impl CreditAccount {
    /// Derived, never stored.
    pub fn remaining_credits(&self) -> i32 {
        self.total_credits - self.used_credits
    }
}

/// An account's ledger row together with its subscription status, loaded
/// in one read so affordability checks see a consistent pair.
#[derive(Debug, Clone)]
pub struct AccountSnapshot {
    pub account: CreditAccount,
    pub subscription: Subscription,
}

impl AccountSnapshot {
    /// Advisory affordability predicate (no I/O). Authoritative
    /// enforcement happens in the conditional charge statement.
    pub fn can_afford(&self, required: i32) -> bool {
        self.subscription.is_unlimited_active(Utc::now())
            || self.account.remaining_credits() >= required
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PlanType;
    use chrono::Duration;

    fn snapshot(total: i32, used: i32, plan: PlanType, is_active: bool) -> AccountSnapshot {
        let now = Utc::now();
        AccountSnapshot {
            account: CreditAccount {
                account_id: Uuid::new_v4(),
                total_credits: total,
                used_credits: used,
                created_utc: now,
                updated_utc: now,
            },
            subscription: Subscription {
                account_id: Uuid::new_v4(),
                plan_type: plan.as_str().to_string(),
                is_active,
                premium_expires_utc: None,
                created_utc: now,
                updated_utc: now,
            },
        }
    }

    #[test]
    fn remaining_is_derived_from_counters() {
        let snap = snapshot(100, 37, PlanType::Standard, true);
        assert_eq!(snap.account.remaining_credits(), 63);
    }

    #[test]
    fn standard_plan_respects_ceiling() {
        let snap = snapshot(100, 99, PlanType::Standard, true);
        assert!(snap.can_afford(1));
        assert!(!snap.can_afford(5));
    }

    #[test]
    fn unlimited_active_ignores_ceiling() {
        let snap = snapshot(1000, 99_999, PlanType::Unlimited, true);
        assert!(snap.can_afford(1));
    }

    #[test]
    fn inactive_unlimited_is_metered() {
        let snap = snapshot(100, 100, PlanType::Unlimited, false);
        assert!(!snap.can_afford(1));
    }

    #[test]
    fn expired_premium_window_is_metered() {
        let mut snap = snapshot(1000, 1000, PlanType::Unlimited, true);
        snap.subscription.premium_expires_utc = Some(Utc::now() - Duration::days(1));
        assert!(!snap.can_afford(1));
    }
}
