use anyhow::Result;
use dotenvy::dotenv;
use secrecy::Secret;
use serde::Deserialize;
use service_core::config as core_config;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct MentorConfig {
    pub common: core_config::Config,
    pub service_name: String,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
    pub mongodb: MongoConfig,
    pub relay: RelayConfig,
    pub credits: CreditsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MongoConfig {
    pub uri: String,
    pub database: String,
}

/// AI relay connection settings. The key never leaves the server side;
/// when it is absent the service runs against the mock provider.
#[derive(Debug, Clone, Deserialize)]
pub struct RelayConfig {
    pub base_url: String,
    pub api_key: Option<Secret<String>>,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreditsConfig {
    pub base_url: String,
}

impl MentorConfig {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            common: core_config::Config::from_port_var("MENTOR_SERVICE_PORT", 3006)?,
            service_name: "mentor-service".to_string(),
            log_level: env::var("MENTOR_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            otlp_endpoint: env::var("OTLP_ENDPOINT").ok(),
            mongodb: MongoConfig {
                uri: env::var("MENTOR_MONGODB_URI")
                    .unwrap_or_else(|_| "mongodb://localhost:27017".to_string()),
                database: env::var("MENTOR_MONGODB_DATABASE")
                    .unwrap_or_else(|_| "mentor_db".to_string()),
            },
            relay: RelayConfig {
                base_url: env::var("AI_RELAY_BASE_URL")
                    .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
                api_key: env::var("AI_RELAY_API_KEY").ok().map(Secret::new),
                timeout_secs: env::var("AI_RELAY_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(60),
            },
            credits: CreditsConfig {
                base_url: env::var("CREDITS_SERVICE_URL")
                    .unwrap_or_else(|_| "http://localhost:3005".to_string()),
            },
        })
    }
}
