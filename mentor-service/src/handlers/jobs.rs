//! Job listing and matching handlers.
//!
//! Matching is a metered action built on a forced tool call: the relay
//! must answer through `rank_jobs`, and the ranking is joined back onto
//! the stored listings by `job_id`. A relay that degrades to prose still
//! produces a response - empty results with the prose as explanation.

use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use service_core::error::AppError;
use service_core::middleware::account::AccountContext;
use std::collections::HashMap;
use validator::Validate;

use crate::{
    dtos::{CreateJobRequest, JobMatchRequest, JobMatchResponse},
    models::{JobListing, JobMatch},
    services::model_catalog,
    services::providers::{ChatOutcome, ChatRequest, ChatTurn, ToolSpec},
    startup::AppState,
};

const MATCHER_PROMPT: &str = "You are a job-matching assistant. Rank the provided job listings \
     by relevance to the candidate's query. Score 0-100. Only reference listings by their \
     job_id. Respond through the rank_jobs tool.";

/// Shape of the `rank_jobs` tool arguments.
#[derive(Debug, Deserialize)]
struct Ranking {
    #[serde(default)]
    matches: Vec<RankedJob>,
    #[serde(default)]
    explanation: String,
}

#[derive(Debug, Deserialize)]
struct RankedJob {
    job_id: String,
    relevance_score: i32,
    #[serde(default)]
    match_reason: String,
}

fn rank_jobs_tool() -> ToolSpec {
    ToolSpec {
        name: "rank_jobs".to_string(),
        description: "Report the ranked job matches for the candidate".to_string(),
        parameters: serde_json::json!({
            "type": "object",
            "properties": {
                "matches": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "job_id": { "type": "string" },
                            "relevance_score": { "type": "integer", "minimum": 0, "maximum": 100 },
                            "match_reason": { "type": "string" }
                        },
                        "required": ["job_id", "relevance_score"]
                    }
                },
                "explanation": { "type": "string" }
            },
            "required": ["matches"]
        }),
    }
}

pub async fn match_jobs(
    State(state): State<AppState>,
    account: AccountContext,
    Json(payload): Json<JobMatchRequest>,
) -> Result<Json<JobMatchResponse>, AppError> {
    payload.validate()?;

    let listings = state.db.list_jobs().await?;
    if listings.is_empty() {
        return Err(AppError::NotFound(anyhow::anyhow!(
            "No job listings available to match against"
        )));
    }

    let resolved = model_catalog::resolve(payload.model.as_deref());
    let request = ChatRequest {
        model: resolved.model_id,
        turns: vec![
            ChatTurn::system(MATCHER_PROMPT),
            ChatTurn::user(format_matching_prompt(&payload.query, &listings)),
        ],
        tool: Some(rank_jobs_tool()),
    };

    let metered = state
        .gate
        .execute(account.account_id, "job_match", &request)
        .await?;

    let (results, explanation) = interpret_outcome(metered.outcome, &listings);

    Ok(Json(JobMatchResponse {
        total_analyzed: listings.len(),
        results,
        explanation,
        credits_remaining: metered.account.remaining_credits,
    }))
}

/// Turn the relay outcome into results plus an explanation. The charge
/// has already been committed at this point, so nothing here fails the
/// request: a payload that misses the `rank_jobs` schema is served raw
/// as the explanation, and prose from a relay that ignored the tool is
/// surfaced the same way.
fn interpret_outcome(outcome: ChatOutcome, listings: &[JobListing]) -> (Vec<JobMatch>, String) {
    match outcome {
        ChatOutcome::Structured(value) => match Ranking::deserialize(&value) {
            Ok(ranking) => join_ranking(ranking, listings),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "rank_jobs arguments did not match the schema, serving raw payload"
                );
                (Vec::new(), value.to_string())
            }
        },
        ChatOutcome::Text(text) => (Vec::new(), text),
    }
}

fn format_matching_prompt(query: &str, listings: &[JobListing]) -> String {
    let mut prompt = format!("Candidate query: {}\n\nJob listings:\n", query);
    for job in listings {
        prompt.push_str(&format!(
            "- job_id: {} | {} at {}{} | skills: {} | {}\n",
            job.job_id,
            job.title,
            job.company,
            job.location
                .as_deref()
                .map(|l| format!(" ({})", l))
                .unwrap_or_default(),
            job.skills.join(", "),
            job.description
        ));
    }
    prompt
}

/// Join the relay's ranking back onto the stored listings. Unknown
/// job_ids are dropped; scores are clamped to 0-100.
fn join_ranking(ranking: Ranking, listings: &[JobListing]) -> (Vec<JobMatch>, String) {
    let by_id: HashMap<&str, &JobListing> = listings
        .iter()
        .map(|job| (job.job_id.as_str(), job))
        .collect();

    let mut results: Vec<JobMatch> = ranking
        .matches
        .into_iter()
        .filter_map(|ranked| {
            let listing = match by_id.get(ranked.job_id.as_str()) {
                Some(listing) => (*listing).clone(),
                None => {
                    tracing::warn!(job_id = %ranked.job_id, "Ranking referenced an unknown job");
                    return None;
                }
            };
            Some(JobMatch {
                listing,
                relevance_score: ranked.relevance_score.clamp(0, 100),
                match_reason: ranked.match_reason,
            })
        })
        .collect();

    results.sort_by(|a, b| b.relevance_score.cmp(&a.relevance_score));
    (results, ranking.explanation)
}

pub async fn create_job(
    State(state): State<AppState>,
    Json(payload): Json<CreateJobRequest>,
) -> Result<(StatusCode, Json<JobListing>), AppError> {
    payload.validate()?;

    let job = JobListing {
        job_id: uuid::Uuid::new_v4().to_string(),
        title: payload.title,
        company: payload.company,
        location: payload.location,
        description: payload.description,
        skills: payload.skills,
        created_at: chrono::Utc::now(),
    };

    state.db.insert_job(&job).await?;
    Ok((StatusCode::CREATED, Json(job)))
}

pub async fn list_jobs(
    State(state): State<AppState>,
) -> Result<Json<Vec<JobListing>>, AppError> {
    Ok(Json(state.db.list_jobs().await?))
}
