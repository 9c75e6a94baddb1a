// Change record types
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::AuditError;

/// Kind of mutation a change record describes
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ChangeAction {
    Create,
    Update,
    Delete,
}

impl ChangeAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeAction::Create => "create",
            ChangeAction::Update => "update",
            ChangeAction::Delete => "delete",
        }
    }
}

impl fmt::Display for ChangeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChangeAction {
    type Err = AuditError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "create" => Ok(ChangeAction::Create),
            "update" => Ok(ChangeAction::Update),
            "delete" => Ok(ChangeAction::Delete),
            other => Err(AuditError::Persistence(format!(
                "Unknown change action: {}",
                other
            ))),
        }
    }
}

/// Principal responsible for a change
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Actor {
    pub user_id: Uuid,
    /// Kept alongside the id so the record stays readable if the user is removed
    pub user_name: String,
}

impl Actor {
    pub fn new(user_id: Uuid, user_name: impl Into<String>) -> Self {
        Self {
            user_id,
            user_name: user_name.into(),
        }
    }
}

/// Weak reference to the object a change record describes.
///
/// Holds identity and type only; the referenced object may be deleted while
/// its change records live on.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ObjectRef {
    pub object_type: String,
    pub object_id: Uuid,
    /// Display form of the object at the time of the change
    pub object_repr: String,
}

impl ObjectRef {
    pub fn new(
        object_type: impl Into<String>,
        object_id: Uuid,
        object_repr: impl Into<String>,
    ) -> Self {
        Self {
            object_type: object_type.into(),
            object_id,
            object_repr: object_repr.into(),
        }
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.object_type, self.object_id)
    }
}

/// An immutable record of one mutation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChangeRecord {
    pub id: Uuid,
    pub time: DateTime<Utc>,
    pub actor: Option<Actor>,
    pub request_id: Uuid,
    pub changed_object: ObjectRef,
    pub action: ChangeAction,
    /// Snapshot of the object's fields after the change
    pub object_data: serde_json::Value,
}

impl ChangeRecord {
    pub fn new(
        actor: Option<Actor>,
        request_id: Uuid,
        changed_object: ObjectRef,
        action: ChangeAction,
        object_data: serde_json::Value,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            time: Utc::now(),
            actor,
            request_id,
            changed_object,
            action,
            object_data,
        }
    }

    pub fn is_system_change(&self) -> bool {
        self.actor.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_action_round_trips_through_str() {
        for action in [ChangeAction::Create, ChangeAction::Update, ChangeAction::Delete] {
            assert_eq!(action.as_str().parse::<ChangeAction>().unwrap(), action);
        }
        assert!("archive".parse::<ChangeAction>().is_err());
    }

    #[test]
    fn test_new_records_get_distinct_ids() {
        let object = ObjectRef::new("dcim.rack", Uuid::new_v4(), "Rack 42");
        let request_id = Uuid::new_v4();

        let first = ChangeRecord::new(None, request_id, object.clone(), ChangeAction::Update, json!({}));
        let second = ChangeRecord::new(None, request_id, object, ChangeAction::Update, json!({}));

        assert_ne!(first.id, second.id);
        assert!(first.is_system_change());
    }

    #[test]
    fn test_object_ref_display() {
        let id = Uuid::new_v4();
        let object = ObjectRef::new("dcim.interface", id, "eth0");
        assert_eq!(object.to_string(), format!("dcim.interface/{}", id));
    }
}
