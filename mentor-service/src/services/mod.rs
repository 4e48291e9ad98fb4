pub mod database;
pub mod metering;
pub mod metrics;
pub mod model_catalog;
pub mod providers;

pub use database::MentorDb;
pub use metering::{MeteredChat, ACTION_COST};
pub use metrics::{get_metrics, init_metrics};
