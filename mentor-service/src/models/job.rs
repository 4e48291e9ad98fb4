//! Job listing and match models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored job listing available for matching.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobListing {
    /// Unique job identifier.
    pub job_id: String,

    pub title: String,

    pub company: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    pub description: String,

    /// Skills named in the listing.
    #[serde(default)]
    pub skills: Vec<String>,

    /// When the listing was stored.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

/// A ranked match joining a listing with the relay's assessment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobMatch {
    #[serde(flatten)]
    pub listing: JobListing,

    /// Relevance on a 0-100 scale.
    pub relevance_score: i32,

    /// Short rationale for the score.
    pub match_reason: String,
}
