//! Database service for credits-service.
//!
//! The credit ledger is mutated exclusively through `charge` and
//! `activate_premium`; both are single conditional statements, so two
//! racing requests can never both commit past the ceiling.

use crate::models::{
    AccountSnapshot, CreditAccount, PlanType, Subscription, DEFAULT_CREDITS, PREMIUM_CREDITS,
    PREMIUM_VALIDITY_DAYS,
};
use crate::services::metrics::DB_QUERY_DURATION;
use service_core::error::AppError;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{info, instrument};
use uuid::Uuid;

/// Outcome of an authoritative charge attempt.
#[derive(Debug)]
pub enum ChargeResult {
    /// The increment committed; snapshot reflects the new balance.
    Committed(AccountSnapshot),
    /// The ceiling would have been exceeded; nothing was mutated.
    InsufficientCredits(AccountSnapshot),
    /// No ledger row exists for the account.
    NotFound,
}

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool.
    #[instrument(skip(database_url), fields(service = "credits-service"))]
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, AppError> {
        info!(
            max_connections = max_connections,
            min_connections = min_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .connect(database_url)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to connect: {}", e)))?;

        info!("PostgreSQL connection pool established");

        Ok(Self { pool })
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Check database health.
    #[instrument(skip(self))]
    pub async fn health_check(&self) -> Result<(), AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["health_check"])
            .start_timer();

        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Health check failed: {}", e)))?;

        timer.observe_duration();
        Ok(())
    }

    /// Run database migrations.
    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Migration failed: {}", e)))?;
        info!("Database migrations completed");
        Ok(())
    }

    /// Fetch an account's ledger row together with its subscription.
    #[instrument(skip(self), fields(account_id = %account_id))]
    pub async fn get_snapshot(
        &self,
        account_id: Uuid,
    ) -> Result<Option<AccountSnapshot>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_snapshot"])
            .start_timer();

        let account = sqlx::query_as::<_, CreditAccount>(
            r#"
            SELECT account_id, total_credits, used_credits, created_utc, updated_utc
            FROM credit_accounts
            WHERE account_id = $1
            "#,
        )
        .bind(account_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to fetch account: {}", e)))?;

        let Some(account) = account else {
            timer.observe_duration();
            return Ok(None);
        };

        let subscription = sqlx::query_as::<_, Subscription>(
            r#"
            SELECT account_id, plan_type, is_active, premium_expires_utc, created_utc, updated_utc
            FROM subscriptions
            WHERE account_id = $1
            "#,
        )
        .bind(account_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to fetch subscription: {}", e))
        })?
        .ok_or_else(|| {
            AppError::DatabaseError(anyhow::anyhow!(
                "Account {} has a ledger row but no subscription row",
                account_id
            ))
        })?;

        timer.observe_duration();

        Ok(Some(AccountSnapshot {
            account,
            subscription,
        }))
    }

    /// Provision the default ledger for an account if it does not exist
    /// yet, then return the snapshot. Idempotent.
    #[instrument(skip(self), fields(account_id = %account_id))]
    pub async fn ensure_account(&self, account_id: Uuid) -> Result<AccountSnapshot, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["ensure_account"])
            .start_timer();

        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        sqlx::query(
            r#"
            INSERT INTO credit_accounts (account_id, total_credits, used_credits)
            VALUES ($1, $2, 0)
            ON CONFLICT (account_id) DO NOTHING
            "#,
        )
        .bind(account_id)
        .bind(DEFAULT_CREDITS)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to create account: {}", e)))?;

        sqlx::query(
            r#"
            INSERT INTO subscriptions (account_id, plan_type, is_active)
            VALUES ($1, $2, TRUE)
            ON CONFLICT (account_id) DO NOTHING
            "#,
        )
        .bind(account_id)
        .bind(PlanType::Standard.as_str())
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to create subscription: {}", e))
        })?;

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit provisioning: {}", e))
        })?;

        timer.observe_duration();

        self.get_snapshot(account_id).await?.ok_or_else(|| {
            AppError::DatabaseError(anyhow::anyhow!(
                "Account {} missing immediately after provisioning",
                account_id
            ))
        })
    }

    /// Authoritative charge: increment `used_credits` by `amount` only if
    /// the account is unlimited-active or the ceiling still holds.
    ///
    /// This is one conditional UPDATE, not a read-modify-write; concurrent
    /// charges against the last remaining credit commit exactly once.
    #[instrument(skip(self), fields(account_id = %account_id, amount = amount))]
    pub async fn charge(&self, account_id: Uuid, amount: i32) -> Result<ChargeResult, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["charge"])
            .start_timer();

        let updated = sqlx::query_as::<_, CreditAccount>(
            r#"
            UPDATE credit_accounts AS a
            SET used_credits = a.used_credits + $2, updated_utc = now()
            FROM subscriptions AS s
            WHERE a.account_id = $1
              AND s.account_id = a.account_id
              AND (
                (s.plan_type = 'unlimited' AND s.is_active
                   AND (s.premium_expires_utc IS NULL OR s.premium_expires_utc > now()))
                OR a.used_credits + $2 <= a.total_credits
              )
            RETURNING a.account_id, a.total_credits, a.used_credits, a.created_utc, a.updated_utc
            "#,
        )
        .bind(account_id)
        .bind(amount)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to charge: {}", e)))?;

        timer.observe_duration();

        match updated {
            Some(account) => {
                let subscription = self.get_subscription(account_id).await?;
                info!(
                    account_id = %account_id,
                    used_credits = account.used_credits,
                    total_credits = account.total_credits,
                    "Charge committed"
                );
                Ok(ChargeResult::Committed(AccountSnapshot {
                    account,
                    subscription,
                }))
            }
            // The conditional refused: either insufficient balance or an
            // unknown account. Distinguish with a plain read.
            None => match self.get_snapshot(account_id).await? {
                Some(snapshot) => {
                    info!(
                        account_id = %account_id,
                        remaining = snapshot.account.remaining_credits(),
                        requested = amount,
                        "Charge refused - insufficient credits"
                    );
                    Ok(ChargeResult::InsufficientCredits(snapshot))
                }
                None => Ok(ChargeResult::NotFound),
            },
        }
    }

    /// Premium activation from a confirmed billing event.
    ///
    /// Resets the allotment to the premium grant and opens a fresh
    /// 30-day unlimited window. Idempotent: re-activation re-extends.
    #[instrument(skip(self), fields(account_id = %account_id))]
    pub async fn activate_premium(&self, account_id: Uuid) -> Result<AccountSnapshot, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["activate_premium"])
            .start_timer();

        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        let account = sqlx::query_as::<_, CreditAccount>(
            r#"
            INSERT INTO credit_accounts (account_id, total_credits, used_credits)
            VALUES ($1, $2, 0)
            ON CONFLICT (account_id) DO UPDATE
            SET total_credits = EXCLUDED.total_credits, used_credits = 0, updated_utc = now()
            RETURNING account_id, total_credits, used_credits, created_utc, updated_utc
            "#,
        )
        .bind(account_id)
        .bind(PREMIUM_CREDITS)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to reset credit ledger: {}", e))
        })?;

        let subscription = sqlx::query_as::<_, Subscription>(
            r#"
            INSERT INTO subscriptions (account_id, plan_type, is_active, premium_expires_utc)
            VALUES ($1, 'unlimited', TRUE, now() + make_interval(days => $2))
            ON CONFLICT (account_id) DO UPDATE
            SET plan_type = 'unlimited',
                is_active = TRUE,
                premium_expires_utc = now() + make_interval(days => $2),
                updated_utc = now()
            RETURNING account_id, plan_type, is_active, premium_expires_utc, created_utc, updated_utc
            "#,
        )
        .bind(account_id)
        .bind(PREMIUM_VALIDITY_DAYS as i32)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to activate subscription: {}", e))
        })?;

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit activation: {}", e))
        })?;

        timer.observe_duration();
        info!(
            account_id = %account_id,
            expires = ?subscription.premium_expires_utc,
            "Premium plan activated"
        );

        Ok(AccountSnapshot {
            account,
            subscription,
        })
    }

    async fn get_subscription(&self, account_id: Uuid) -> Result<Subscription, AppError> {
        sqlx::query_as::<_, Subscription>(
            r#"
            SELECT account_id, plan_type, is_active, premium_expires_utc, created_utc, updated_utc
            FROM subscriptions
            WHERE account_id = $1
            "#,
        )
        .bind(account_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to fetch subscription: {}", e))
        })?
        .ok_or_else(|| {
            AppError::DatabaseError(anyhow::anyhow!(
                "Account {} has a ledger row but no subscription row",
                account_id
            ))
        })
    }
}
