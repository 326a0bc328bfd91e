//! File-store boundary used to persist attachment bytes.
//!
//! Concrete backends (local disk, object storage) live outside this crate;
//! the agent only needs to store bytes, read them back, and resolve a URL
//! that a completion provider can fetch.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Locator for bytes held by a [`FileStore`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct StoredFile {
    pub file_id: String,
    pub storage_path: String,
    pub storage_backend: String,
}

#[async_trait]
pub trait FileStore: Send + Sync {
    /// Persist `content` and return where it landed.
    async fn save(
        &self,
        content: &[u8],
        filename: &str,
        mime_type: Option<&str>,
    ) -> Result<StoredFile>;

    /// Read previously stored bytes.
    async fn get(&self, file: &StoredFile) -> Result<Vec<u8>>;

    /// URL a provider can use to fetch the stored file.
    fn url(&self, file: &StoredFile) -> String;
}
