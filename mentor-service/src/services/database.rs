//! Database operations for mentor-service.
//!
//! Handles conversation persistence and job listings via MongoDB.

use crate::models::{Conversation, ConversationMessage, JobListing};
use futures::TryStreamExt;
use mongodb::{
    bson::doc,
    options::IndexOptions,
    Client as MongoClient, Collection, Database, IndexModel,
};
use service_core::error::AppError;

#[derive(Clone)]
pub struct MentorDb {
    client: MongoClient,
    db: Database,
}

impl MentorDb {
    pub async fn connect(uri: &str, database: &str) -> Result<Self, AppError> {
        tracing::info!(uri = %uri, "Connecting to MongoDB");
        let client = MongoClient::with_uri_str(uri).await.map_err(|e| {
            tracing::error!("Failed to connect to MongoDB at {}: {}", uri, e);
            AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
        })?;
        let db = client.database(database);
        tracing::info!(database = %database, "Successfully connected to MongoDB database");
        Ok(Self { client, db })
    }

    pub async fn initialize_indexes(&self) -> Result<(), AppError> {
        tracing::info!("Creating MongoDB indexes for mentor-service");

        let conversations = self.conversations();

        let conversation_id_index = IndexModel::builder()
            .keys(doc! { "conversation_id": 1 })
            .options(
                IndexOptions::builder()
                    .name("conversation_id_idx".to_string())
                    .unique(true)
                    .build(),
            )
            .build();

        conversations
            .create_index(conversation_id_index, None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to create conversation_id index: {}", e);
                AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
            })?;

        let account_id_index = IndexModel::builder()
            .keys(doc! { "account_id": 1, "updated_at": -1 })
            .options(
                IndexOptions::builder()
                    .name("account_updated_idx".to_string())
                    .build(),
            )
            .build();

        conversations
            .create_index(account_id_index, None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to create account_id index: {}", e);
                AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
            })?;

        let job_id_index = IndexModel::builder()
            .keys(doc! { "job_id": 1 })
            .options(
                IndexOptions::builder()
                    .name("job_id_idx".to_string())
                    .unique(true)
                    .build(),
            )
            .build();

        self.job_listings()
            .create_index(job_id_index, None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to create job_id index: {}", e);
                AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
            })?;

        tracing::info!("Successfully created all MongoDB indexes");
        Ok(())
    }

    pub async fn health_check(&self) -> Result<(), AppError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| {
                tracing::error!("MongoDB health check failed: {}", e);
                AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
            })?;
        Ok(())
    }

    // Collection accessors

    pub fn conversations(&self) -> Collection<Conversation> {
        self.db.collection("conversations")
    }

    pub fn job_listings(&self) -> Collection<JobListing> {
        self.db.collection("job_listings")
    }

    // Conversation operations

    pub async fn insert_conversation(&self, conversation: &Conversation) -> Result<(), AppError> {
        self.conversations()
            .insert_one(conversation, None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to insert conversation: {}", e);
                AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
            })?;
        Ok(())
    }

    pub async fn find_conversation(
        &self,
        conversation_id: &str,
        account_id: &str,
    ) -> Result<Option<Conversation>, AppError> {
        self.conversations()
            .find_one(
                doc! { "conversation_id": conversation_id, "account_id": account_id },
                None,
            )
            .await
            .map_err(|e| {
                tracing::error!("Failed to find conversation: {}", e);
                AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
            })
    }

    /// Append a pair of turns (user question, assistant reply) to an
    /// existing conversation.
    pub async fn append_turns(
        &self,
        conversation_id: &str,
        turns: &[ConversationMessage],
    ) -> Result<(), AppError> {
        let turn_docs: Vec<_> = turns
            .iter()
            .map(mongodb::bson::to_document)
            .collect::<Result<_, _>>()
            .map_err(|e| {
                tracing::error!("Failed to serialize conversation turns: {}", e);
                AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
            })?;

        // Stored as epoch millis to match the model's serde representation.
        let now = chrono::Utc::now().timestamp_millis();

        self.conversations()
            .update_one(
                doc! { "conversation_id": conversation_id },
                doc! {
                    "$push": { "messages": { "$each": turn_docs } },
                    "$inc": { "message_count": turns.len() as i32 },
                    "$set": { "updated_at": now }
                },
                None,
            )
            .await
            .map_err(|e| {
                tracing::error!("Failed to append conversation turns: {}", e);
                AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
            })?;

        Ok(())
    }

    // Job listing operations

    pub async fn insert_job(&self, job: &JobListing) -> Result<(), AppError> {
        self.job_listings().insert_one(job, None).await.map_err(|e| {
            tracing::error!("Failed to insert job listing: {}", e);
            AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
        })?;
        Ok(())
    }

    pub async fn list_jobs(&self) -> Result<Vec<JobListing>, AppError> {
        let cursor = self.job_listings().find(None, None).await.map_err(|e| {
            tracing::error!("Failed to query job listings: {}", e);
            AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
        })?;

        cursor.try_collect().await.map_err(|e| {
            tracing::error!("Failed to collect job listings: {}", e);
            AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
        })
    }
}
