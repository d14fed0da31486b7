use std::path::{Path, PathBuf};
use tokio::fs::File as TokioFile;
use tokio::io::{AsyncWriteExt, BufWriter as TokioBufWriter};
use tracing::debug;
use crate::error::Result;
use crate::storage::memory::Database;

/// Whole-database JSON snapshot, replaced atomically on every commit.
#[derive(Debug, Clone)]
pub struct SnapshotFile {
    path: PathBuf,
}

impl SnapshotFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn load(&self) -> Result<Option<Database>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => {
                let db = serde_json::from_slice(&bytes)?;
                debug!(path = ?self.path, bytes = bytes.len(), "Loaded store snapshot");
                Ok(Some(db))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Writes to a sibling temp file first so a crash never leaves a torn snapshot.
    pub async fn write(&self, db: &Database) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                tokio::fs::create_dir_all(dir).await?;
            }
        }

        let tmp_path = self.path.with_extension("json.tmp");
        let file = TokioFile::create(&tmp_path).await?;
        let mut writer = TokioBufWriter::new(file);

        let json = serde_json::to_vec_pretty(db)?;
        writer.write_all(&json).await?;
        writer.flush().await?;
        writer.get_ref().sync_all().await?;
        drop(writer);

        tokio::fs::rename(&tmp_path, &self.path).await?;

        debug!(path = ?self.path, bytes = json.len(), "Wrote store snapshot");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use crate::models::Category;

    #[tokio::test]
    async fn missing_snapshot_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = SnapshotFile::new(dir.path().join("absent.json"));
        assert!(snapshot.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn snapshot_survives_a_reload() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = SnapshotFile::new(dir.path().join("nested").join("store.json"));

        let mut db = Database::default();
        let mut goat = Category::new("Goat", 45_000, Utc::now());
        goat.stock_qty = 7;
        db.categories.insert(goat.id.clone(), goat.clone());
        snapshot.write(&db).await.unwrap();

        let loaded = snapshot.load().await.unwrap().unwrap();
        assert_eq!(loaded.categories.get(&goat.id), Some(&goat));
        assert!(!snapshot.path().with_extension("json.tmp").exists());
    }
}
