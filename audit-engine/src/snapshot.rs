//! Object snapshots captured into change records.
//!
//! A snapshot is a JSON object mapping field names to values. Its shape is
//! fixed per object type: the serializer never adds or drops fields based on
//! the values it sees.

use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::entry::ObjectRef;
use crate::error::{AuditError, AuditResult};

/// Objects whose mutations are recorded as change records
pub trait Auditable: Serialize {
    /// Type tag stored on the record, e.g. `dcim.rack`
    const OBJECT_TYPE: &'static str;

    fn object_id(&self) -> Uuid;

    /// Human-readable form kept on the record
    fn object_repr(&self) -> String {
        self.object_id().to_string()
    }

    fn object_ref(&self) -> ObjectRef {
        ObjectRef::new(Self::OBJECT_TYPE, self.object_id(), self.object_repr())
    }
}

/// Produces the payload stored on a change record
pub trait SnapshotSerializer: Send + Sync {
    /// # Errors
    ///
    /// Returns [`AuditError::Serialization`] when the object cannot be
    /// represented as a field map.
    fn serialize<T: Serialize + ?Sized>(&self, object: &T) -> AuditResult<Value>;
}

/// Serializes objects through serde into a JSON field map
#[derive(Debug, Clone, Default)]
pub struct JsonSnapshotSerializer {
    excluded_fields: Vec<String>,
}

impl JsonSnapshotSerializer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Never capture the named field
    pub fn with_excluded_field(mut self, field: impl Into<String>) -> Self {
        self.excluded_fields.push(field.into());
        self
    }

    pub fn excluded_fields(&self) -> &[String] {
        &self.excluded_fields
    }
}

impl SnapshotSerializer for JsonSnapshotSerializer {
    fn serialize<T: Serialize + ?Sized>(&self, object: &T) -> AuditResult<Value> {
        let value = serde_json::to_value(object)?;

        match value {
            Value::Object(mut fields) => {
                for field in &self.excluded_fields {
                    fields.remove(field);
                }
                Ok(Value::Object(fields))
            }
            other => Err(AuditError::Serialization(format!(
                "snapshot must be a field map, got {}",
                json_kind(&other)
            ))),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
