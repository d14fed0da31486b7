use std::future::Future;
use tracing::warn;
use crate::error::{Error, Result};
use crate::utils::time::sleep_with_jitter;

/// Retries transient failures with doubling delay; anything else is returned immediately.
pub async fn retry_with_backoff<T, F, Fut>(
    mut retries: u32,
    base_delay_ms: u64,
    operation: F,
) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut delay = base_delay_ms;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) if !e.is_transient() => return Err(e),
            Err(e) => {
                if retries == 0 {
                    warn!(error = %e, "Giving up after retries");
                    return Err(Error::MaxRetriesExceeded);
                }

                warn!(error = %e, delay_ms = delay, retries_left = retries, "Transient failure, retrying");
                retries -= 1;
                sleep_with_jitter(delay, delay / 2).await;
                delay *= 2;
            }
        }
    }
}
