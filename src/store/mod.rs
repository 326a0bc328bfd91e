//! Thread persistence boundary.

mod memory;

pub use memory::MemoryThreadStore;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::Result;
use crate::types::Thread;

/// Storage for threads.
///
/// The agent loop only calls [`get`](ThreadStore::get) and
/// [`save`](ThreadStore::save). Stores persist the thread's
/// [`ThreadRecord`](crate::types::ThreadRecord), so system messages are not
/// kept. Concurrent writers to the same thread id are the store's concern.
#[async_trait]
pub trait ThreadStore: Send + Sync {
    /// Insert or replace a thread.
    async fn save(&self, thread: &Thread) -> Result<()>;

    async fn get(&self, id: &str) -> Result<Option<Thread>>;

    /// Returns `false` if no thread had that id.
    async fn delete(&self, id: &str) -> Result<bool>;

    /// Threads ordered by most recent update first.
    async fn list(&self, limit: usize, offset: usize) -> Result<Vec<Thread>>;

    /// Threads whose attributes contain every key/value in `attributes`.
    async fn find_by_attributes(&self, attributes: &Map<String, Value>) -> Result<Vec<Thread>>;

    /// Threads whose source has `name == source_name` and matches `properties`.
    async fn find_by_source(
        &self,
        source_name: &str,
        properties: &Map<String, Value>,
    ) -> Result<Vec<Thread>>;
}
