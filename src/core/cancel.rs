//! Cooperative cancellation for a summary run.

use std::future::Future;
use tokio_util::sync::CancellationToken;

use crate::errors::DigestError;

/// `Cancelled` if `cancel` has already fired.
///
/// # Errors
///
/// Returns `Cancelled` when the token is cancelled.
pub fn ensure_active(cancel: Option<&CancellationToken>) -> Result<(), DigestError> {
    match cancel {
        Some(token) if token.is_cancelled() => Err(DigestError::Cancelled),
        _ => Ok(()),
    }
}

/// Drive `fut` to completion unless `cancel` fires first, in which case `fut` is dropped.
///
/// # Errors
///
/// Returns `Cancelled` when the token fires before `fut` finishes.
pub async fn until_cancelled<F>(
    cancel: Option<&CancellationToken>,
    fut: F,
) -> Result<F::Output, DigestError>
where
    F: Future,
{
    match cancel {
        Some(token) => tokio::select! {
            biased;
            () = token.cancelled() => Err(DigestError::Cancelled),
            out = fut => Ok(out),
        },
        None => Ok(fut.await),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_until_cancelled_passes_output_through() {
        let token = CancellationToken::new();
        let out = until_cancelled(Some(&token), async { 7 }).await.unwrap();
        assert_eq!(out, 7);
        assert_eq!(until_cancelled(None, async { 8 }).await.unwrap(), 8);
    }

    #[tokio::test]
    async fn test_until_cancelled_interrupts_long_sleep() {
        let token = CancellationToken::new();
        let trigger = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let started = std::time::Instant::now();
        let long_wait = tokio::time::sleep(Duration::from_secs(60));
        let result = until_cancelled(Some(&token), long_wait).await;

        assert!(matches!(result, Err(DigestError::Cancelled)));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_ensure_active() {
        let token = CancellationToken::new();
        assert!(ensure_active(Some(&token)).is_ok());
        assert!(ensure_active(None).is_ok());
        token.cancel();
        assert!(matches!(ensure_active(Some(&token)), Err(DigestError::Cancelled)));
    }
}
