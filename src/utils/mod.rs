pub mod bootstrap;
pub mod retry;
pub mod time;

pub use bootstrap::init_tracing;
pub use retry::retry_with_backoff;
pub use time::sleep_with_jitter;
