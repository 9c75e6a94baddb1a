//! Per-request change context
//!
//! Carries who is making changes and the correlation id that ties together
//! every change record written while handling one request.

use audit_engine::Actor;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Header callers use to pass an existing request id
pub const REQUEST_ID_HEADER: &str = "X-Request-ID";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChangeContext {
    /// `None` for system-initiated changes
    pub actor: Option<Actor>,
    pub request_id: Uuid,
}

impl ChangeContext {
    /// Context for a user action with a freshly generated request id
    pub fn new(actor: Actor) -> Self {
        Self {
            actor: Some(actor),
            request_id: Uuid::new_v4(),
        }
    }

    /// Context for changes made by the system itself
    pub fn system() -> Self {
        Self {
            actor: None,
            request_id: Uuid::new_v4(),
        }
    }

    pub fn for_request(actor: Option<Actor>, request_id: Uuid) -> Self {
        Self { actor, request_id }
    }

    /// Reuse the id from a request header when it is a UUID, otherwise generate one
    pub fn from_header(actor: Option<Actor>, request_id: Option<&str>) -> Self {
        let request_id = request_id
            .and_then(|value| Uuid::parse_str(value.trim()).ok())
            .unwrap_or_else(Uuid::new_v4);

        Self { actor, request_id }
    }

    pub fn is_system(&self) -> bool {
        self.actor.is_none()
    }
}
