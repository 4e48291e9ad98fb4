pub mod account;
pub mod metrics;
pub mod tracing;
