pub mod account;
pub mod subscription;

pub use account::{AccountSnapshot, CreditAccount, DEFAULT_CREDITS, PREMIUM_CREDITS};
pub use subscription::{PlanType, Subscription, PREMIUM_VALIDITY_DAYS};
