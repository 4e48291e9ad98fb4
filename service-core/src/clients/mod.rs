pub mod credits;

pub use credits::{AccountView, ChargeOutcome, CreditsApi, CreditsClient};
