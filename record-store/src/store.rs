use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{RepositoryError, RepositoryResult};
use crate::models::Record;

/// Primary storage for records
#[async_trait]
pub trait EntityStore<E: Record>: Send + Sync {
    /// Store a new record
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Conflict`] if the id is taken.
    async fn insert(&self, record: E) -> RepositoryResult<E>;

    /// Overwrite an existing record
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::NotFound`] if there is nothing to overwrite.
    async fn replace(&self, record: E) -> RepositoryResult<E>;

    async fn get(&self, id: Uuid) -> RepositoryResult<Option<E>>;

    async fn remove(&self, id: Uuid) -> RepositoryResult<Option<E>>;

    async fn list(&self) -> RepositoryResult<Vec<E>>;
}

/// In-memory record storage for development/testing
pub struct InMemoryEntityStore<E> {
    records: Arc<RwLock<HashMap<Uuid, E>>>,
}

impl<E> InMemoryEntityStore<E> {
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl<E> Default for InMemoryEntityStore<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Clone for InMemoryEntityStore<E> {
    fn clone(&self) -> Self {
        Self {
            records: Arc::clone(&self.records),
        }
    }
}

#[async_trait]
impl<E: Record> EntityStore<E> for InMemoryEntityStore<E> {
    async fn insert(&self, record: E) -> RepositoryResult<E> {
        let mut records = self.records.write().await;
        let id = record.id();

        if records.contains_key(&id) {
            return Err(RepositoryError::Conflict(id));
        }

        records.insert(id, record.clone());
        Ok(record)
    }

    async fn replace(&self, record: E) -> RepositoryResult<E> {
        let mut records = self.records.write().await;
        let id = record.id();

        match records.get_mut(&id) {
            Some(existing) => {
                *existing = record.clone();
                Ok(record)
            }
            None => Err(RepositoryError::NotFound(id)),
        }
    }

    async fn get(&self, id: Uuid) -> RepositoryResult<Option<E>> {
        Ok(self.records.read().await.get(&id).cloned())
    }

    async fn remove(&self, id: Uuid) -> RepositoryResult<Option<E>> {
        Ok(self.records.write().await.remove(&id))
    }

    async fn list(&self) -> RepositoryResult<Vec<E>> {
        Ok(self.records.read().await.values().cloned().collect())
    }
}
