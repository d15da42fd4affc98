use crate::domain::ports::Storage;
use crate::utils::error::Result;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// Files under the data root (e.g. `/usr/local/gpsdata`).
#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }
}

impl Storage for LocalStorage {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let data = tokio::fs::read(self.resolve(path)).await?;
        Ok(data)
    }

    async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
        let full_path = self.resolve(path);

        if let Some(parent) = full_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        tokio::fs::write(full_path, data).await?;
        Ok(())
    }

    async fn append_file(&self, path: &str, data: &[u8]) -> Result<()> {
        let full_path = self.resolve(path);

        if let Some(parent) = full_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(full_path)
            .await?;
        file.write_all(data).await?;
        // rows must survive a power cut right after they are logged
        file.sync_data().await?;
        Ok(())
    }

    async fn create_dir(&self, path: &str) -> Result<()> {
        tokio::fs::create_dir_all(self.resolve(path)).await?;
        Ok(())
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.base_path.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_append_and_read() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());

        storage.write_file("s/log.csv", b"a,b\n").await.unwrap();
        storage.append_file("s/log.csv", b"1,2\n").await.unwrap();
        storage.append_file("s/log.csv", b"3,4\n").await.unwrap();

        let content = storage.read_file("s/log.csv").await.unwrap();
        assert_eq!(content, b"a,b\n1,2\n3,4\n");
    }

    #[tokio::test]
    async fn test_create_dir_and_resolve() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());

        tokio_test::assert_ok!(storage.create_dir("190704.130509").await);
        assert!(dir.path().join("190704.130509").is_dir());
        assert_eq!(storage.resolve("x/y.jpg"), dir.path().join("x/y.jpg"));
    }

    #[tokio::test]
    async fn test_read_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());
        let err = tokio_test::assert_err!(storage.read_file("nope.csv").await);
        assert!(matches!(err, crate::utils::error::LoggerError::IoError(_)));
    }
}
