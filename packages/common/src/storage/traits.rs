use std::io::Cursor;

use async_trait::async_trait;
use tokio::io::AsyncRead;

use super::error::StorageError;

/// Type alias for a boxed async reader.
pub type BoxReader = Box<dyn AsyncRead + Unpin + Send>;

/// Key-addressed image storage.
///
/// Keys are generated by the store on write; the caller embeds them in the
/// record's image URL and they are the only handle needed to read or delete
/// a stored file later.
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Store bytes under a fresh key and return the key.
    async fn put(&self, extension: Option<&str>, data: &[u8]) -> Result<String, StorageError> {
        let reader: BoxReader = Box::new(Cursor::new(data.to_vec()));
        self.put_stream(extension, reader).await
    }

    /// Store data from an async reader under a fresh key and return the key.
    async fn put_stream(
        &self,
        extension: Option<&str>,
        reader: BoxReader,
    ) -> Result<String, StorageError>;

    /// Open a stored file as a streaming async reader.
    async fn open(&self, key: &str) -> Result<BoxReader, StorageError>;

    /// Check whether a file exists.
    async fn exists(&self, key: &str) -> Result<bool, StorageError>;

    /// Delete a file by key.
    ///
    /// Returns `true` if the file was deleted, `false` if it did not exist.
    async fn delete(&self, key: &str) -> Result<bool, StorageError>;
}
