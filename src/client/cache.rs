use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use serde_json::Value;

use super::api::{ClientResult, ResourceClient};

#[derive(Default)]
struct Entries {
    lists: HashMap<String, Vec<Value>>,
    generations: HashMap<String, u64>,
}

/// Per-collection list cache shared by every controller in a session.
///
/// Invalidation bumps a generation counter so a fetch that was already in
/// flight cannot write a stale list back after a mutation.
#[derive(Clone, Default)]
pub struct QueryCache {
    entries: Arc<Mutex<Entries>>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, Entries> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn get(&self, collection: &str) -> Option<Vec<Value>> {
        self.entries().lists.get(collection).cloned()
    }

    pub fn generation(&self, collection: &str) -> u64 {
        self.entries()
            .generations
            .get(collection)
            .copied()
            .unwrap_or(0)
    }

    /// Stores `rows` unless the collection was invalidated since `generation`.
    pub fn put(&self, collection: &str, generation: u64, rows: Vec<Value>) -> bool {
        let mut entries = self.entries();
        let current = entries.generations.get(collection).copied().unwrap_or(0);
        if current != generation {
            return false;
        }
        entries.lists.insert(collection.to_string(), rows);
        true
    }

    pub fn invalidate(&self, collection: &str) {
        let mut entries = self.entries();
        entries.lists.remove(collection);
        *entries.generations.entry(collection.to_string()).or_insert(0) += 1;
        tracing::debug!(collection, "query cache invalidated");
    }

    /// Returns the cached list or loads it through `client`.
    pub async fn fetch<C>(&self, client: &C, collection: &str) -> ClientResult<Vec<Value>>
    where
        C: ResourceClient + ?Sized,
    {
        if let Some(rows) = self.get(collection) {
            return Ok(rows);
        }
        let generation = self.generation(collection);
        let rows = client.list(collection).await?;
        self.put(collection, generation, rows.clone());
        Ok(rows)
    }
}
