//! Change recording for persisted records
//!
//! Every create, update or delete of a change-logged object produces exactly
//! one [`ChangeRecord`]: who made the change, under which request, what kind of
//! change it was, and a snapshot of the object's fields afterwards.
//!
//! - Append-only: records are never updated or removed here
//! - Weak object references that survive deletion of the object
//! - Pluggable snapshot serializer and audit store
//! - In-memory and SQLite stores
//!
//! # Example
//!
//! ```rust
//! use audit_engine::{Actor, Auditable, ChangeAction, ChangeRecorder, InMemoryAuditStore};
//! use serde::Serialize;
//! use std::sync::Arc;
//! use uuid::Uuid;
//!
//! #[derive(Serialize)]
//! struct Rack {
//!     id: Uuid,
//!     name: String,
//! }
//!
//! impl Auditable for Rack {
//!     const OBJECT_TYPE: &'static str = "dcim.rack";
//!
//!     fn object_id(&self) -> Uuid {
//!         self.id
//!     }
//! }
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = InMemoryAuditStore::new();
//! let recorder = ChangeRecorder::new(Arc::new(store.clone()));
//!
//! let rack = Rack { id: Uuid::new_v4(), name: "R42".to_string() };
//! let alice = Actor::new(Uuid::new_v4(), "alice");
//!
//! let record = recorder
//!     .record_change(&rack, Some(&alice), Uuid::new_v4(), ChangeAction::Update)
//!     .await?;
//!
//! assert_eq!(record.object_data["name"], "R42");
//! assert_eq!(store.len().await, 1);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod entry;
pub mod error;
pub mod recorder;
pub mod snapshot;
pub mod storage;

pub use config::*;
pub use entry::*;
pub use error::*;
pub use recorder::*;
pub use snapshot::*;
pub use storage::*;
