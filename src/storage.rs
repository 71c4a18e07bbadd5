use chrono::Utc;
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use tokio::fs;

/// Directory holding uploaded spreadsheets until they are filtered or expire
#[derive(Debug, Clone)]
pub struct UploadDir {
    root: PathBuf,
}

impl UploadDir {
    /// Open the upload directory, creating it if it doesn't exist
    ///
    /// # Arguments
    /// * `root` - Directory path
    ///
    /// # Returns
    /// * `io::Result<UploadDir>` - The directory handle or an IO error
    pub async fn open(root: impl Into<PathBuf>) -> io::Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root).await?;
        Ok(UploadDir { root })
    }

    /// Path of a stored file
    ///
    /// Only the final component of `stored_name` is used, so a name can never
    /// point outside the upload directory.
    pub fn path_of(&self, stored_name: &str) -> PathBuf {
        self.root.join(safe_file_name(stored_name))
    }

    /// Write an upload to disk under `<timestamp-millis>-<original-name>`
    ///
    /// # Arguments
    /// * `original_name` - Filename sent by the client
    /// * `contents` - File bytes
    ///
    /// # Returns
    /// * `io::Result<String>` - The stored filename
    pub async fn store(&self, original_name: &str, contents: &[u8]) -> io::Result<String> {
        let stored_name = stored_file_name(Utc::now().timestamp_millis(), original_name);
        fs::write(self.root.join(&stored_name), contents).await?;
        Ok(stored_name)
    }

    pub async fn exists(&self, stored_name: &str) -> bool {
        fs::try_exists(self.path_of(stored_name))
            .await
            .unwrap_or(false)
    }

    /// Delete a stored file if it is still there
    ///
    /// # Returns
    /// * `io::Result<bool>` - `true` if a file was removed, `false` if it was already gone
    pub async fn delete_if_exists(&self, stored_name: &str) -> io::Result<bool> {
        match fs::remove_file(self.path_of(stored_name)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Delete a stored file after `delay` on a detached task
    ///
    /// The task is never cancelled. If the file was already removed the
    /// deletion is a no-op; other failures are logged.
    pub fn schedule_cleanup(&self, stored_name: String, delay: Duration) {
        let uploads = self.clone();
        log::debug!("Scheduling cleanup of {} in {:?}", stored_name, delay);

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            match uploads.delete_if_exists(&stored_name).await {
                Ok(true) => log::debug!("Cleaned up expired upload {}", stored_name),
                Ok(false) => {}
                Err(e) => log::warn!("Failed to clean up upload {}: {}", stored_name, e),
            }
        });
    }
}

/// Build the stored name for an upload
///
/// # Examples
/// ```
/// use sheet_filter::storage::stored_file_name;
///
/// assert_eq!(stored_file_name(1700000000000, "q3/report.xlsx"), "1700000000000-report.xlsx");
/// ```
pub fn stored_file_name(timestamp_millis: i64, original_name: &str) -> String {
    format!("{}-{}", timestamp_millis, safe_file_name(original_name))
}

// Final path component only, with both separator styles treated as separators
fn safe_file_name(name: &str) -> &str {
    let last = name.rsplit(['/', '\\']).next().unwrap_or(name);
    match last {
        "" | "." | ".." => "upload",
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_names_keep_only_the_file_component() {
        assert_eq!(stored_file_name(42, "data.xlsx"), "42-data.xlsx");
        assert_eq!(stored_file_name(42, "../../etc/passwd"), "42-passwd");
        assert_eq!(stored_file_name(42, "C:\\Users\\me\\book.xls"), "42-book.xls");
        assert_eq!(stored_file_name(42, ".."), "42-upload");
    }

    #[tokio::test]
    async fn store_then_delete_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let uploads = UploadDir::open(dir.path().join("uploads")).await.unwrap();

        let name = uploads.store("book.xlsx", b"bytes").await.unwrap();
        assert!(name.ends_with("-book.xlsx"));
        assert!(uploads.exists(&name).await);
        assert_eq!(fs::read(uploads.path_of(&name)).await.unwrap(), b"bytes");

        assert!(uploads.delete_if_exists(&name).await.unwrap());
        assert!(!uploads.delete_if_exists(&name).await.unwrap());
        assert!(!uploads.exists(&name).await);
    }

    #[tokio::test]
    async fn path_of_stays_inside_the_directory() {
        let dir = tempfile::tempdir().unwrap();
        let uploads = UploadDir::open(dir.path()).await.unwrap();

        assert_eq!(uploads.path_of("../secret"), dir.path().join("secret"));
    }

    #[tokio::test]
    async fn scheduled_cleanup_removes_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let uploads = UploadDir::open(dir.path()).await.unwrap();
        let name = uploads.store("book.xlsx", b"bytes").await.unwrap();

        uploads.schedule_cleanup(name.clone(), Duration::from_millis(20));
        tokio::time::sleep(Duration::from_millis(200)).await;

        assert!(!uploads.exists(&name).await);
    }

    #[tokio::test]
    async fn scheduled_cleanup_tolerates_a_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let uploads = UploadDir::open(dir.path()).await.unwrap();
        let name = uploads.store("book.xlsx", b"bytes").await.unwrap();

        uploads.schedule_cleanup(name.clone(), Duration::from_millis(20));
        assert!(uploads.delete_if_exists(&name).await.unwrap());
        tokio::time::sleep(Duration::from_millis(200)).await;

        assert!(!uploads.exists(&name).await);
    }
}
