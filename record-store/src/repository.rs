//! Change-logging repository.
//!
//! Every write goes through one path: derived data is recomputed, the
//! creation/update times are stamped, the record is committed to the entity
//! store, and a change record is written for the committed state.
//!
//! The change record is written after the commit and is not part of it. If
//! writing it fails, the committed record stays in place; the configured
//! [`FailurePolicy`] decides whether the caller sees the failure.

use audit_engine::{
    AuditConfig, ChangeAction, ChangeRecord, ChangeRecorder, FailurePolicy,
    JsonSnapshotSerializer, SnapshotSerializer,
};
use chrono::Utc;
use natural_order::NaturallyOrderable;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::context::ChangeContext;
use crate::error::{RepositoryError, RepositoryResult};
use crate::models::Record;
use crate::store::{EntityStore, InMemoryEntityStore};

pub struct ChangeLoggingRepository<E, S = InMemoryEntityStore<E>, Z = JsonSnapshotSerializer> {
    store: S,
    recorder: Arc<ChangeRecorder<Z>>,
    enabled: bool,
    failure_policy: FailurePolicy,
    _record: PhantomData<fn() -> E>,
}

impl<E, S, Z> ChangeLoggingRepository<E, S, Z>
where
    E: Record,
    S: EntityStore<E>,
    Z: SnapshotSerializer,
{
    pub fn new(store: S, recorder: Arc<ChangeRecorder<Z>>) -> Self {
        Self {
            store,
            recorder,
            enabled: true,
            failure_policy: FailurePolicy::default(),
            _record: PhantomData,
        }
    }

    /// Apply the `enabled` flag and failure policy from configuration
    pub fn with_config(mut self, config: &AuditConfig) -> Self {
        self.enabled = config.enabled;
        self.failure_policy = config.failure_policy;
        self
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    pub fn with_change_logging(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Commit a new record and log a create
    ///
    /// # Errors
    ///
    /// - [`RepositoryError::Ordering`] (or another `prepare_save` error) before
    ///   anything is stored
    /// - [`RepositoryError::Conflict`] if the id already exists
    /// - [`RepositoryError::Audit`] under [`FailurePolicy::Propagate`] when the
    ///   change record could not be written; the record is still committed
    pub async fn create(&self, ctx: &ChangeContext, mut record: E) -> RepositoryResult<E> {
        record.prepare_save()?;
        record.timestamps_mut().mark_created(Utc::now());

        let saved = self.store.insert(record).await?;
        debug!(object_type = E::OBJECT_TYPE, id = %saved.id(), "Record created");

        self.log_change(ctx, &saved, ChangeAction::Create).await?;
        Ok(saved)
    }

    /// Commit changes to an existing record and log an update.
    ///
    /// The stored creation date is kept regardless of what `record` carries.
    ///
    /// # Errors
    ///
    /// - [`RepositoryError::NotFound`] if the record does not exist
    /// - [`RepositoryError::Ordering`] (or another `prepare_save` error) before
    ///   anything is stored
    /// - [`RepositoryError::Audit`] under [`FailurePolicy::Propagate`]
    pub async fn update(&self, ctx: &ChangeContext, mut record: E) -> RepositoryResult<E> {
        let id = record.id();
        let existing = self
            .store
            .get(id)
            .await?
            .ok_or(RepositoryError::NotFound(id))?;

        record.prepare_save()?;
        let created = existing.timestamps().created;
        record.timestamps_mut().mark_updated(created, Utc::now());

        let saved = self.store.replace(record).await?;
        debug!(object_type = E::OBJECT_TYPE, id = %id, "Record updated");

        self.log_change(ctx, &saved, ChangeAction::Update).await?;
        Ok(saved)
    }

    /// Remove a record and log a delete carrying its final state
    ///
    /// # Errors
    ///
    /// - [`RepositoryError::NotFound`] if the record does not exist
    /// - [`RepositoryError::Audit`] under [`FailurePolicy::Propagate`]
    pub async fn delete(&self, ctx: &ChangeContext, id: Uuid) -> RepositoryResult<E> {
        let removed = self
            .store
            .remove(id)
            .await?
            .ok_or(RepositoryError::NotFound(id))?;
        debug!(object_type = E::OBJECT_TYPE, id = %id, "Record deleted");

        self.log_change(ctx, &removed, ChangeAction::Delete).await?;
        Ok(removed)
    }

    /// # Errors
    ///
    /// Propagates entity store failures.
    pub async fn get(&self, id: Uuid) -> RepositoryResult<Option<E>> {
        self.store.get(id).await
    }

    async fn log_change(
        &self,
        ctx: &ChangeContext,
        record: &E,
        action: ChangeAction,
    ) -> RepositoryResult<Option<ChangeRecord>> {
        if !self.enabled {
            return Ok(None);
        }

        match self
            .recorder
            .record_change(record, ctx.actor.as_ref(), ctx.request_id, action)
            .await
        {
            Ok(change) => Ok(Some(change)),
            Err(e) => match self.failure_policy {
                FailurePolicy::Propagate => Err(e.into()),
                FailurePolicy::LogAndContinue => {
                    warn!(
                        target: "audit",
                        object_type = E::OBJECT_TYPE,
                        id = %record.id(),
                        action = %action,
                        request_id = %ctx.request_id,
                        error = %e,
                        "Change record not written; continuing"
                    );
                    Ok(None)
                }
            },
        }
    }
}

impl<E, S, Z> ChangeLoggingRepository<E, S, Z>
where
    E: Record + NaturallyOrderable,
    S: EntityStore<E>,
    Z: SnapshotSerializer,
{
    /// All records sorted by natural key.
    ///
    /// Records with equal keys (the same interface name on two devices, or
    /// `Ethernet1/1` next to `GigabitEthernet1/1`) fall back to their
    /// representation and then their id, so the order does not depend on how
    /// the store happens to return them.
    ///
    /// # Errors
    ///
    /// Propagates entity store failures.
    pub async fn list_naturally_ordered(&self) -> RepositoryResult<Vec<E>> {
        let mut records = self.store.list().await?;
        records.sort_by_cached_key(|record| {
            (*record.natural_key(), record.object_repr(), record.id())
        });
        Ok(records)
    }
}
