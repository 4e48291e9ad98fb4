pub mod database;
pub mod metrics;

pub use database::{ChargeResult, Database};
pub use metrics::{get_metrics, init_metrics};
