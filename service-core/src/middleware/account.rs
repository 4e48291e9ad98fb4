//! Account context extractor.
//!
//! Extracts the acting account from the `X-Account-ID` request header.
//! The header is set by the BFF (secure frontend) after authenticating the
//! user - services behind it never see raw credentials and must only act
//! on the account carried here, never on an identifier from the body.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

use crate::error::AppError;

pub const ACCOUNT_ID_HEADER: &str = "X-Account-ID";

/// The authenticated account a request acts on behalf of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountContext {
    pub account_id: Uuid,
}

#[async_trait]
impl<S> FromRequestParts<S> for AccountContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(ACCOUNT_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                AppError::AuthError(anyhow::anyhow!(
                    "Missing X-Account-ID header (required from BFF)"
                ))
            })?;

        let account_id = Uuid::parse_str(raw).map_err(|_| {
            AppError::AuthError(anyhow::anyhow!("X-Account-ID header is not a valid UUID"))
        })?;

        // Record on the active span for observability
        tracing::Span::current().record("account_id", tracing::field::display(account_id));

        Ok(AccountContext { account_id })
    }
}
