use super::types::Article;
use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("collection file '{0}' does not exist")]
    Missing(PathBuf),
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("collection file '{path}' is not a valid article list: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    /// Another writer holds `<file>.lock`.
    #[error("collection is locked by another run (remove '{0}' if that run is gone)")]
    Locked(PathBuf),
}

impl StoreError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_owned(),
            source,
        }
    }
}

/// The JSON article collection shared with the publishing layer.
///
/// A `Store` holds the exclusive lock file for as long as it lives, so a
/// load → merge → save cycle cannot interleave with another run.
#[derive(Debug)]
pub struct Store {
    path: PathBuf,
    lock_path: PathBuf,
}

impl Store {
    /// Takes the writer lock for `path`.
    ///
    /// # Errors
    ///
    /// [`StoreError::Locked`] when another run holds the lock.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let lock_path = lock_path_for(&path);
        match OpenOptions::new().write(true).create_new(true).open(&lock_path) {
            Ok(mut lock) => {
                // The pid is informational; the lock is the file's existence.
                if let Err(e) = writeln!(lock, "{}", std::process::id()) {
                    tracing::warn!(path = %lock_path.display(), error = %e, "Could not record pid in lock file");
                }
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => return Err(StoreError::Locked(lock_path)),
            Err(e) => return Err(StoreError::io(&lock_path, e)),
        }
        tracing::debug!(path = %path.display(), "Acquired collection lock");
        Ok(Self { path, lock_path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Vec<Article>, StoreError> {
        read_articles(&self.path)
    }

    /// Writes the collection atomically: pretty JSON to a temp file, fsync, rename.
    pub fn save(&self, articles: &[Article]) -> Result<(), StoreError> {
        let json = serde_json::to_vec_pretty(articles).map_err(|source| StoreError::Json {
            path: self.path.clone(),
            source,
        })?;
        atomic_write(&self.path, &json)?;
        tracing::info!(path = %self.path.display(), count = articles.len(), "Saved collection");
        Ok(())
    }
}

impl Drop for Store {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.lock_path) {
            tracing::warn!(path = %self.lock_path.display(), error = %e, "Failed to remove collection lock");
        }
    }
}

/// Reads a collection without taking the lock.
///
/// # Errors
///
/// [`StoreError::Missing`] when the file does not exist; a collection that
/// was never created is an operator error, not an empty collection.
pub fn read_articles(path: &Path) -> Result<Vec<Article>, StoreError> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Err(StoreError::Missing(path.to_owned())),
        Err(e) => return Err(StoreError::io(path, e)),
    };
    serde_json::from_slice(&bytes).map_err(|source| StoreError::Json {
        path: path.to_owned(),
        source,
    })
}

fn lock_path_for(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".lock");
    PathBuf::from(name)
}

fn atomic_write(dst: &Path, content: &[u8]) -> Result<(), StoreError> {
    // Unpredictable temp name; create_new refuses a pre-planted file or symlink.
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    let temp_path = dst.with_extension(format!("tmp.{}", &suffix[..16]));

    let write = |file: &mut File| -> std::io::Result<()> {
        file.write_all(content)?;
        file.write_all(b"\n")?;
        file.sync_all()
    };

    let mut temp_file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&temp_path)
        .map_err(|e| StoreError::io(&temp_path, e))?;
    if let Err(e) = write(&mut temp_file) {
        let _ = std::fs::remove_file(&temp_path);
        return Err(StoreError::io(&temp_path, e));
    }
    drop(temp_file);

    std::fs::rename(&temp_path, dst).map_err(|e| {
        let _ = std::fs::remove_file(&temp_path);
        StoreError::io(dst, e)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{Category, Status};
    use pretty_assertions::assert_eq;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("newswire_store_{name}_{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn article(id: &str) -> Article {
        Article {
            id: id.into(),
            slug: "s".into(),
            title: "Título".into(),
            category: Category::Cultura,
            subtitle: String::new(),
            content: "<p>x</p>".into(),
            image: String::new(),
            author: "A".into(),
            tags: vec!["t".into()],
            published_at: "2026-01-01T00:00".into(),
            status: Status::Published,
            source: "S".into(),
            source_url: format!("https://example.com/{id}"),
            updated_at: String::new(),
        }
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = temp_dir("missing");
        let err = read_articles(&dir.join("news.json")).unwrap_err();
        assert!(matches!(err, StoreError::Missing(_)));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        let dir = temp_dir("invalid");
        let path = dir.join("news.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(read_articles(&path), Err(StoreError::Json { .. })));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_save_then_load() {
        let dir = temp_dir("roundtrip");
        let path = dir.join("news.json");
        std::fs::write(&path, "[]").unwrap();

        let store = Store::open(&path).unwrap();
        assert!(store.load().unwrap().is_empty());
        store.save(&[article("1"), article("2")]).unwrap();
        let loaded = store.load().unwrap();
        assert_eq!(loaded, vec![article("1"), article("2")]);

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("\n  {"), "pretty printed");
        assert!(text.contains("\"publishedAt\""));
        let leftovers: Vec<_> = std::fs::read_dir(&dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().contains(".tmp."))
            .collect();
        assert!(leftovers.is_empty());

        drop(store);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_lock_is_exclusive_and_released_on_drop() {
        let dir = temp_dir("lock");
        let path = dir.join("news.json");

        let first = Store::open(&path).unwrap();
        let recorded = std::fs::read_to_string(lock_path_for(&path)).unwrap();
        assert_eq!(recorded.trim(), std::process::id().to_string());
        assert!(matches!(Store::open(&path), Err(StoreError::Locked(_))));
        drop(first);
        assert!(!lock_path_for(&path).exists());
        assert!(Store::open(&path).is_ok());

        let _ = std::fs::remove_dir_all(&dir);
    }
}
