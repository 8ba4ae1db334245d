//! File storage for filedock.
//!
//! Files live directly in the storage root, one file per key:
//! ```text
//! {root}/
//! ├── a.bin
//! ├── test.jpg
//! └── .filedock-<uuid>.tmp   (only while a save is in progress)
//! ```

use std::io;
use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{is_temp_name, validate_filename, FileMetadata, TEMP_PREFIX, TEMP_SUFFIX};
use crate::{FiledockError, Result};

/// Flat file store rooted at one directory.
///
/// A single read-write lock guards the whole root: reads and listings share
/// it, saves take it exclusively. A save to one file therefore blocks reads of
/// every other file for its duration.
#[derive(Debug)]
pub struct FileStorage {
    /// Storage root directory.
    root: PathBuf,
    pub(crate) lock: RwLock<()>,
}

impl FileStorage {
    /// Create a new FileStorage rooted at `root`.
    ///
    /// The directory will be created if it doesn't exist.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;

        Ok(Self {
            root,
            lock: RwLock::new(()),
        })
    }

    /// Get the storage root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a filename to its path under the root.
    pub fn file_path(&self, filename: &str) -> Result<PathBuf> {
        validate_filename(filename)?;
        Ok(self.root.join(filename))
    }

    /// Store `content` under `filename`, replacing any previous content.
    ///
    /// The bytes are written to a temporary file in the root and renamed into
    /// place, so the key holds either the old or the new content, never a
    /// prefix of either.
    pub async fn save(&self, filename: &str, content: &[u8]) -> Result<()> {
        let path = self.file_path(filename)?;
        let tmp = self
            .root
            .join(format!("{TEMP_PREFIX}{}{TEMP_SUFFIX}", Uuid::new_v4()));

        let _guard = self.lock.write().await;

        if let Err(e) = write_and_rename(&tmp, &path, content).await {
            if let Err(cleanup) = fs::remove_file(&tmp).await {
                if cleanup.kind() != io::ErrorKind::NotFound {
                    tracing::warn!(path = %tmp.display(), error = %cleanup, "failed to remove temporary file");
                }
            }
            return Err(e.into());
        }

        Ok(())
    }

    /// Load the full content stored under `filename`.
    pub async fn load(&self, filename: &str) -> Result<Vec<u8>> {
        let path = self.file_path(filename)?;

        let _guard = self.lock.read().await;

        match fs::read(&path).await {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(FiledockError::NotFound(format!("file {filename}")))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// List every file in the root.
    ///
    /// Subdirectories and temporary files are skipped. Entries whose metadata
    /// cannot be read (for example because they were removed mid-scan) are
    /// skipped as well rather than failing the listing. The result is in
    /// directory-scan order.
    pub async fn list(&self) -> Result<Vec<FileMetadata>> {
        let _guard = self.lock.read().await;

        let mut entries = fs::read_dir(&self.root).await?;
        let mut files = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            if is_temp_name(&name) {
                continue;
            }

            let metadata = match entry.metadata().await {
                Ok(m) => m,
                Err(e) => {
                    tracing::debug!(filename = %name, error = %e, "skipping unreadable entry");
                    continue;
                }
            };
            if metadata.is_dir() {
                continue;
            }
            let Ok(modified) = metadata.modified() else {
                continue;
            };

            files.push(FileMetadata::from_modified(name, metadata.len(), modified));
        }

        Ok(files)
    }

    /// Check if a file exists in storage.
    pub async fn exists(&self, filename: &str) -> bool {
        let Ok(path) = self.file_path(filename) else {
            return false;
        };

        let _guard = self.lock.read().await;

        fs::metadata(&path)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false)
    }
}

async fn write_and_rename(tmp: &Path, path: &Path, content: &[u8]) -> io::Result<()> {
    fs::write(tmp, content).await?;
    fs::rename(tmp, path).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::TempDir;

    fn setup_storage() -> (TempDir, FileStorage) {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::new(temp_dir.path()).unwrap();
        (temp_dir, storage)
    }

    async fn names(storage: &FileStorage) -> Vec<String> {
        let mut names: Vec<String> = storage
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.filename)
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_new_creates_directory() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("uploads");

        assert!(!root.exists());

        let storage = FileStorage::new(&root).unwrap();

        assert!(root.is_dir());
        assert_eq!(storage.root(), root);
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let (_temp_dir, storage) = setup_storage();

        storage.save("hello.txt", b"Hello, World!").await.unwrap();

        let loaded = storage.load("hello.txt").await.unwrap();
        assert_eq!(loaded, b"Hello, World!");
    }

    #[tokio::test]
    async fn test_save_overwrites() {
        let (_temp_dir, storage) = setup_storage();

        storage.save("f.bin", &[1u8; 1000]).await.unwrap();
        storage.save("f.bin", b"short").await.unwrap();

        assert_eq!(storage.load("f.bin").await.unwrap(), b"short");
    }

    #[tokio::test]
    async fn test_save_empty_content() {
        let (_temp_dir, storage) = setup_storage();

        storage.save("empty", b"").await.unwrap();

        assert!(storage.exists("empty").await);
        assert!(storage.load("empty").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_leaves_no_temporary_files() {
        let (temp_dir, storage) = setup_storage();

        storage.save("a.bin", b"data").await.unwrap();

        let leftovers: Vec<_> = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .flatten()
            .filter(|e| e.file_name().to_string_lossy().ends_with(TEMP_SUFFIX))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[tokio::test]
    async fn test_save_failure_cleans_up() {
        let (temp_dir, storage) = setup_storage();
        std::fs::create_dir(temp_dir.path().join("occupied")).unwrap();
        std::fs::write(temp_dir.path().join("occupied").join("x"), b"x").unwrap();

        // Renaming a file over a non-empty directory fails
        let result = storage.save("occupied", b"data").await;
        assert!(matches!(result, Err(FiledockError::Io(_))));

        let leftovers = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .flatten()
            .filter(|e| is_temp_name(&e.file_name().to_string_lossy()))
            .count();
        assert_eq!(leftovers, 0);
    }

    #[tokio::test]
    async fn test_load_not_found() {
        let (_temp_dir, storage) = setup_storage();

        let result = storage.load("nonexistent.txt").await;

        assert!(matches!(result, Err(FiledockError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_rejects_traversal() {
        let (temp_dir, storage) = setup_storage();

        let result = storage.save("../escape.txt", b"data").await;
        assert!(matches!(result, Err(FiledockError::InvalidArgument(_))));
        assert!(!temp_dir.path().parent().unwrap().join("escape.txt").exists());

        let result = storage.load("../etc/passwd").await;
        assert!(matches!(result, Err(FiledockError::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn test_exists() {
        let (temp_dir, storage) = setup_storage();
        storage.save("test.txt", b"data").await.unwrap();
        std::fs::create_dir(temp_dir.path().join("subdir")).unwrap();

        assert!(storage.exists("test.txt").await);
        assert!(!storage.exists("nonexistent.txt").await);
        assert!(!storage.exists("subdir").await);
        assert!(!storage.exists("").await);
    }

    #[tokio::test]
    async fn test_list_reports_size_and_skips_directories() {
        let (temp_dir, storage) = setup_storage();
        storage.save("one.txt", b"1").await.unwrap();
        storage.save("two.txt", b"22").await.unwrap();
        std::fs::create_dir(temp_dir.path().join("nested")).unwrap();

        let mut files = storage.list().await.unwrap();
        files.sort_by(|a, b| a.filename.cmp(&b.filename));

        assert_eq!(files.len(), 2);
        assert_eq!(files[0].filename, "one.txt");
        assert_eq!(files[0].size, 1);
        assert_eq!(files[1].filename, "two.txt");
        assert_eq!(files[1].size, 2);
        assert_eq!(files[1].created_at, files[1].updated_at);
    }

    #[tokio::test]
    async fn test_list_skips_temporary_files() {
        let (temp_dir, storage) = setup_storage();
        storage.save("real.bin", b"data").await.unwrap();
        std::fs::write(temp_dir.path().join(".filedock-stale.tmp"), b"partial").unwrap();

        assert_eq!(names(&storage).await, vec!["real.bin"]);
    }

    #[tokio::test]
    async fn test_list_omits_deleted_files() {
        let (temp_dir, storage) = setup_storage();
        storage.save("keep.bin", b"k").await.unwrap();
        storage.save("gone.bin", b"g").await.unwrap();

        std::fs::remove_file(temp_dir.path().join("gone.bin")).unwrap();

        assert_eq!(names(&storage).await, vec!["keep.bin"]);
    }

    #[tokio::test]
    async fn test_list_empty_root() {
        let (_temp_dir, storage) = setup_storage();

        assert!(storage.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_write_excludes_readers() {
        let (_temp_dir, storage) = setup_storage();
        let storage = Arc::new(storage);
        storage.save("b.bin", b"unrelated").await.unwrap();

        let guard = storage.lock.write().await;

        let reader = {
            let storage = Arc::clone(&storage);
            tokio::spawn(async move { storage.load("b.bin").await })
        };

        // The read of an unrelated file waits for the exclusive holder
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!reader.is_finished());

        drop(guard);
        assert_eq!(reader.await.unwrap().unwrap(), b"unrelated");
    }

    #[tokio::test]
    async fn test_concurrent_overwrites_are_never_torn() {
        let (_temp_dir, storage) = setup_storage();
        let storage = Arc::new(storage);
        let a = vec![b'a'; 256 * 1024];
        let b = vec![b'b'; 128 * 1024];

        let mut handles = Vec::new();
        for i in 0..8 {
            let storage = Arc::clone(&storage);
            let content = if i % 2 == 0 { a.clone() } else { b.clone() };
            handles.push(tokio::spawn(async move {
                storage.save("shared.bin", &content).await.unwrap();
                storage.load("shared.bin").await.unwrap()
            }));
        }

        for handle in handles {
            let loaded = handle.await.unwrap();
            assert!(loaded == a || loaded == b, "read observed a torn write");
        }
    }

    #[tokio::test]
    async fn test_binary_content() {
        let (_temp_dir, storage) = setup_storage();
        let content: Vec<u8> = (0..=255).collect();

        storage.save("binary.bin", &content).await.unwrap();

        assert_eq!(storage.load("binary.bin").await.unwrap(), content);
    }
}
