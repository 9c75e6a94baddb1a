//! Change-logged record storage
//!
//! Ties change recording and natural ordering to a record store:
//!
//! - [`ChangeLoggingRepository`] stamps creation/update times, recomputes
//!   derived data, commits, and writes one change record per mutation
//! - [`ChangeContext`] carries the acting user and request correlation id
//! - [`Interface`] derives its natural ordering key from its name
//!
//! # Example
//!
//! ```rust
//! use audit_engine::{Actor, ChangeRecorder, InMemoryAuditStore};
//! use record_store::{ChangeContext, ChangeLoggingRepository, InMemoryEntityStore, Interface};
//! use std::sync::Arc;
//! use uuid::Uuid;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let audit = InMemoryAuditStore::new();
//! let recorder = Arc::new(ChangeRecorder::new(Arc::new(audit.clone())));
//! let interfaces = ChangeLoggingRepository::new(InMemoryEntityStore::<Interface>::new(), recorder);
//!
//! let ctx = ChangeContext::new(Actor::new(Uuid::new_v4(), "alice"));
//! interfaces.create(&ctx, Interface::new("sw1", "Ethernet1/10")?).await?;
//! interfaces.create(&ctx, Interface::new("sw1", "Ethernet1/2")?).await?;
//!
//! let names: Vec<String> = interfaces
//!     .list_naturally_ordered()
//!     .await?
//!     .into_iter()
//!     .map(|i| i.name)
//!     .collect();
//! assert_eq!(names, ["Ethernet1/2", "Ethernet1/10"]);
//! assert_eq!(audit.records_for_request(ctx.request_id).await.len(), 2);
//! # Ok(())
//! # }
//! ```

pub mod context;
pub mod error;
pub mod interface;
pub mod models;
pub mod repository;
pub mod store;

pub use context::*;
pub use error::*;
pub use interface::*;
pub use models::*;
pub use repository::*;
pub use store::*;
