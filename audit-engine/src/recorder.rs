use std::sync::Arc;
use tracing::{debug, error};
use uuid::Uuid;

use crate::entry::{Actor, ChangeAction, ChangeRecord};
use crate::error::AuditResult;
use crate::snapshot::{Auditable, JsonSnapshotSerializer, SnapshotSerializer};
use crate::storage::AuditStore;

/// Writes one change record per recorded mutation.
///
/// The recorder holds no mutable state of its own, so it can be shared freely
/// between tasks. Each call snapshots the object, builds a record and makes a
/// single append to the store.
pub struct ChangeRecorder<S = JsonSnapshotSerializer> {
    store: Arc<dyn AuditStore>,
    serializer: S,
}

impl ChangeRecorder<JsonSnapshotSerializer> {
    pub fn new(store: Arc<dyn AuditStore>) -> Self {
        Self {
            store,
            serializer: JsonSnapshotSerializer::default(),
        }
    }
}

impl<S: SnapshotSerializer> ChangeRecorder<S> {
    pub fn with_serializer(store: Arc<dyn AuditStore>, serializer: S) -> Self {
        Self { store, serializer }
    }

    pub fn store(&self) -> &Arc<dyn AuditStore> {
        &self.store
    }

    /// Record a change made to `object`.
    ///
    /// The snapshot reflects the object as passed in, i.e. its state after the
    /// mutation for creates and updates. Calling twice with the same inputs
    /// writes two records.
    ///
    /// # Errors
    ///
    /// - [`AuditError::Serialization`](crate::AuditError::Serialization) if the
    ///   object cannot be snapshotted; nothing is written.
    /// - [`AuditError::Persistence`](crate::AuditError::Persistence) if the
    ///   store append fails.
    pub async fn record_change<E: Auditable>(
        &self,
        object: &E,
        actor: Option<&Actor>,
        request_id: Uuid,
        action: ChangeAction,
    ) -> AuditResult<ChangeRecord> {
        let changed_object = object.object_ref();

        let object_data = self.serializer.serialize(object).map_err(|e| {
            error!(
                target: "audit",
                object = %changed_object,
                action = %action,
                error = %e,
                "Failed to snapshot changed object"
            );
            e
        })?;

        let record = ChangeRecord::new(
            actor.cloned(),
            request_id,
            changed_object,
            action,
            object_data,
        );

        if let Err(e) = self.store.append(&record).await {
            error!(
                target: "audit",
                record_id = %record.id,
                object = %record.changed_object,
                request_id = %request_id,
                error = %e,
                "Failed to append change record"
            );
            return Err(e);
        }

        debug!(
            target: "audit",
            record_id = %record.id,
            object = %record.changed_object,
            action = %action,
            request_id = %request_id,
            user = ?record.actor.as_ref().map(|a| a.user_name.as_str()),
            "Change recorded"
        );

        Ok(record)
    }
}
