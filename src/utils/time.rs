use rand::Rng;
use std::time::Duration;

/// `base_ms` plus a uniform draw from `0..=jitter_ms`.
pub fn jittered(base_ms: u64, jitter_ms: u64) -> Duration {
    let jitter = rand::rng().random_range(0..=jitter_ms);
    Duration::from_millis(base_ms.saturating_add(jitter))
}

pub async fn sleep_with_jitter(base_ms: u64, jitter_ms: u64) {
    tokio::time::sleep(jittered(base_ms, jitter_ms)).await;
}
