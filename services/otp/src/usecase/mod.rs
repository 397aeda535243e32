use std::future::Future;
use std::time::Duration;

use crate::error::OtpServiceError;

pub mod issue;
pub mod purge;
pub mod sweep;
pub mod verify;

/// Bound one storage round trip. On timeout the caller cannot know whether
/// the write landed, so it surfaces as a storage error.
pub(crate) async fn bounded<T, F>(limit: Duration, op: &'static str, fut: F) -> Result<T, OtpServiceError>
where
    F: Future<Output = Result<T, OtpServiceError>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => {
            let timeout_ms = u64::try_from(limit.as_millis()).unwrap_or(u64::MAX);
            tracing::warn!(op, timeout_ms, "storage round trip timed out");
            Err(OtpServiceError::Storage(anyhow::anyhow!(
                "{op} timed out after {timeout_ms}ms"
            )))
        }
    }
}
