//! Timeout helper.

use std::future::Future;
use std::time::Duration;

use crate::error::McpToolsError;

/// Wrap a future with a timeout, mapping expiry to [`McpToolsError::Timeout`].
pub async fn with_timeout<T>(
    duration: Duration,
    future: impl Future<Output = Result<T, McpToolsError>>,
) -> Result<T, McpToolsError> {
    match tokio::time::timeout(duration, future).await {
        Ok(result) => result,
        Err(_) => Err(McpToolsError::Timeout(duration.as_millis() as u64)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn expired_future_maps_to_timeout_error() {
        let err = with_timeout(Duration::from_millis(40), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok::<_, McpToolsError>(())
        })
        .await
        .expect_err("future should time out");
        assert!(matches!(err, McpToolsError::Timeout(40)));
    }

    #[tokio::test]
    async fn inner_errors_pass_through_before_expiry() {
        let err = with_timeout(Duration::from_secs(1), async {
            Err::<(), _>(McpToolsError::ConnectionLost("alpha".into()))
        })
        .await
        .expect_err("inner error");
        assert!(matches!(err, McpToolsError::ConnectionLost(ref id) if id == "alpha"));
    }
}
