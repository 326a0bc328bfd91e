use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::RwLock;

use super::ThreadStore;
use crate::error::Result;
use crate::types::{Thread, ThreadRecord};

/// Process-local thread store, mainly for tests and short-lived agents.
#[derive(Debug, Default)]
pub struct MemoryThreadStore {
    threads: RwLock<HashMap<String, ThreadRecord>>,
}

impl MemoryThreadStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn filter<F>(&self, predicate: F) -> Result<Vec<Thread>>
    where
        F: Fn(&ThreadRecord) -> bool,
    {
        let threads = self.threads.read().await;
        let mut matches: Vec<&ThreadRecord> = threads.values().filter(|r| predicate(r)).collect();
        matches.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        matches
            .into_iter()
            .map(|r| Thread::from_record(r.clone()))
            .collect()
    }
}

fn contains_all(haystack: &Map<String, Value>, needles: &Map<String, Value>) -> bool {
    needles
        .iter()
        .all(|(key, value)| haystack.get(key) == Some(value))
}

#[async_trait]
impl ThreadStore for MemoryThreadStore {
    async fn save(&self, thread: &Thread) -> Result<()> {
        self.threads
            .write()
            .await
            .insert(thread.id().to_string(), thread.to_record());
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<Thread>> {
        let threads = self.threads.read().await;
        threads.get(id).cloned().map(Thread::from_record).transpose()
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        Ok(self.threads.write().await.remove(id).is_some())
    }

    async fn list(&self, limit: usize, offset: usize) -> Result<Vec<Thread>> {
        let all = self.filter(|_| true).await?;
        Ok(all.into_iter().skip(offset).take(limit).collect())
    }

    async fn find_by_attributes(&self, attributes: &Map<String, Value>) -> Result<Vec<Thread>> {
        self.filter(|r| contains_all(&r.attributes, attributes)).await
    }

    async fn find_by_source(
        &self,
        source_name: &str,
        properties: &Map<String, Value>,
    ) -> Result<Vec<Thread>> {
        self.filter(|r| {
            r.source.as_ref().is_some_and(|source| {
                source.get("name").and_then(Value::as_str) == Some(source_name)
                    && contains_all(source, properties)
            })
        })
        .await
    }
}
