pub mod json;
pub mod memory;
pub mod minio;
pub mod parquet;

pub use json::SnapshotFile;
pub use memory::{Change, Collection, Database, MemoryStore};
pub use minio::{MemoryObjectStore, MinioStore, ObjectStore};
pub use parquet::SalesLedger;
