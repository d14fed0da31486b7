pub mod clients;
pub mod config;
pub mod error;
pub mod models;
pub mod server;
pub mod services;
pub mod storage;
pub mod utils;

pub use error::{Error, Result};
pub use server::router;
pub use services::Services;
pub use storage::{MemoryStore, ObjectStore, SalesLedger};
pub use utils::{retry_with_backoff, sleep_with_jitter};
