// Record models
use audit_engine::Auditable;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::RepositoryResult;

/// Creation and last-update times written by the repository.
///
/// Both are optional so rows that predate change logging stay valid.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChangeLoggedFields {
    pub created: Option<NaiveDate>,
    pub last_updated: Option<DateTime<Utc>>,
}

impl ChangeLoggedFields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stamp a first save
    pub fn mark_created(&mut self, now: DateTime<Utc>) {
        self.created = Some(now.date_naive());
        self.last_updated = Some(now);
    }

    /// Stamp a later save, keeping the original creation date
    pub fn mark_updated(&mut self, created: Option<NaiveDate>, now: DateTime<Utc>) {
        self.created = created;
        self.last_updated = Some(now);
    }
}

/// A change-logged record managed by [`ChangeLoggingRepository`](crate::ChangeLoggingRepository)
pub trait Record: Auditable + Clone + Send + Sync + 'static {
    fn id(&self) -> Uuid {
        self.object_id()
    }

    fn timestamps(&self) -> &ChangeLoggedFields;

    fn timestamps_mut(&mut self) -> &mut ChangeLoggedFields;

    /// Runs before every write, ahead of persistence.
    ///
    /// Records recompute derived data here; an error aborts the write.
    ///
    /// # Errors
    ///
    /// Implementations return an error when derived data cannot be computed.
    fn prepare_save(&mut self) -> RepositoryResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_update_keeps_creation_date() {
        let created_at = Utc.with_ymd_and_hms(2024, 3, 1, 23, 59, 0).unwrap();
        let updated_at = Utc.with_ymd_and_hms(2024, 5, 9, 8, 0, 0).unwrap();

        let mut fields = ChangeLoggedFields::new();
        fields.mark_created(created_at);
        assert_eq!(fields.created, NaiveDate::from_ymd_opt(2024, 3, 1));

        let created = fields.created;
        fields.mark_updated(created, updated_at);
        assert_eq!(fields.created, NaiveDate::from_ymd_opt(2024, 3, 1));
        assert_eq!(fields.last_updated, Some(updated_at));
    }

    #[test]
    fn test_legacy_rows_have_no_timestamps() {
        let fields: ChangeLoggedFields = serde_json::from_str("{}").unwrap();
        assert_eq!(fields, ChangeLoggedFields::default());
    }
}
