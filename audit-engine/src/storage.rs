//! Audit store backends.
//!
//! Stores are append-only: they accept new change records and never update or
//! remove existing ones. Retention is left to whoever operates the store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::entry::{Actor, ChangeAction, ChangeRecord, ObjectRef};
use crate::error::{AuditError, AuditResult};

/// Durable destination for change records
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuditStore: Send + Sync {
    /// Append one record. Either the whole record is stored or nothing is.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError::Persistence`] when the write fails.
    async fn append(&self, record: &ChangeRecord) -> AuditResult<()>;
}

#[async_trait]
impl<S: AuditStore + ?Sized> AuditStore for Arc<S> {
    async fn append(&self, record: &ChangeRecord) -> AuditResult<()> {
        (**self).append(record).await
    }
}

/// In-memory audit store for development/testing
#[derive(Clone, Default)]
pub struct InMemoryAuditStore {
    records: Arc<RwLock<Vec<ChangeRecord>>>,
}

impl InMemoryAuditStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All records in insertion order
    pub async fn records(&self) -> Vec<ChangeRecord> {
        self.records.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    pub async fn records_for_object(&self, object_id: Uuid) -> Vec<ChangeRecord> {
        self.records
            .read()
            .await
            .iter()
            .filter(|r| r.changed_object.object_id == object_id)
            .cloned()
            .collect()
    }

    pub async fn records_for_request(&self, request_id: Uuid) -> Vec<ChangeRecord> {
        self.records
            .read()
            .await
            .iter()
            .filter(|r| r.request_id == request_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl AuditStore for InMemoryAuditStore {
    async fn append(&self, record: &ChangeRecord) -> AuditResult<()> {
        self.records.write().await.push(record.clone());

        debug!(
            target: "audit",
            record_id = %record.id,
            object = %record.changed_object,
            action = %record.action,
            "Change record appended to memory store"
        );
        Ok(())
    }
}

/// SQLite-backed audit store.
///
/// Records are written to the `object_change` table. The `seq` column keeps
/// insertion order, which is also chronological order.
#[derive(Clone)]
pub struct SqliteAuditStore {
    pool: SqlitePool,
}

const SELECT_COLUMNS: &str = r#"
    SELECT id, time, user_id, user_name, request_id,
           changed_object_type, changed_object_id, object_repr,
           action, object_data
    FROM object_change
"#;

impl SqliteAuditStore {
    /// Open (creating if needed) the store at `path`
    ///
    /// # Errors
    ///
    /// Returns [`AuditError::Persistence`] if the database cannot be opened or
    /// the schema cannot be created.
    pub async fn open(path: impl AsRef<Path>) -> AuditResult<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path.as_ref())
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        Self::with_pool(pool).await
    }

    /// Open a private in-memory database
    ///
    /// # Errors
    ///
    /// Returns [`AuditError::Persistence`] if the schema cannot be created.
    pub async fn in_memory() -> AuditResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;

        // every pooled connection to :memory: is a separate database
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        Self::with_pool(pool).await
    }

    /// Use an existing pool, creating the schema if missing
    ///
    /// # Errors
    ///
    /// Returns [`AuditError::Persistence`] if the schema cannot be created.
    pub async fn with_pool(pool: SqlitePool) -> AuditResult<Self> {
        let store = Self { pool };
        store.initialize_schema().await?;
        Ok(store)
    }

    async fn initialize_schema(&self) -> AuditResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS object_change (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL UNIQUE,
                time TEXT NOT NULL,
                user_id TEXT,
                user_name TEXT,
                request_id TEXT NOT NULL,
                changed_object_type TEXT NOT NULL,
                changed_object_id TEXT NOT NULL,
                object_repr TEXT NOT NULL,
                action TEXT NOT NULL,
                object_data TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_object_change_request ON object_change(request_id)")
            .execute(&self.pool)
            .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_object_change_object \
             ON object_change(changed_object_type, changed_object_id)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_object_change_time ON object_change(time)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Records for one object, oldest first
    ///
    /// # Errors
    ///
    /// Returns [`AuditError::Persistence`] if the query fails or a stored row
    /// is malformed.
    pub async fn records_for_object(&self, object_id: Uuid) -> AuditResult<Vec<ChangeRecord>> {
        let sql = format!("{} WHERE changed_object_id = ? ORDER BY seq ASC", SELECT_COLUMNS);
        let rows = sqlx::query(&sql)
            .bind(object_id.to_string())
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_record).collect()
    }

    /// Records written under one request, oldest first
    ///
    /// # Errors
    ///
    /// Returns [`AuditError::Persistence`] if the query fails or a stored row
    /// is malformed.
    pub async fn records_for_request(&self, request_id: Uuid) -> AuditResult<Vec<ChangeRecord>> {
        let sql = format!("{} WHERE request_id = ? ORDER BY seq ASC", SELECT_COLUMNS);
        let rows = sqlx::query(&sql)
            .bind(request_id.to_string())
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_record).collect()
    }

    /// Total number of stored records
    ///
    /// # Errors
    ///
    /// Returns [`AuditError::Persistence`] if the query fails.
    pub async fn count(&self) -> AuditResult<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS total FROM object_change")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get("total")?)
    }
}

#[async_trait]
impl AuditStore for SqliteAuditStore {
    async fn append(&self, record: &ChangeRecord) -> AuditResult<()> {
        sqlx::query(
            r#"
            INSERT INTO object_change (
                id, time, user_id, user_name, request_id,
                changed_object_type, changed_object_id, object_repr,
                action, object_data
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(record.id.to_string())
        .bind(record.time.to_rfc3339())
        .bind(record.actor.as_ref().map(|a| a.user_id.to_string()))
        .bind(record.actor.as_ref().map(|a| a.user_name.clone()))
        .bind(record.request_id.to_string())
        .bind(&record.changed_object.object_type)
        .bind(record.changed_object.object_id.to_string())
        .bind(&record.changed_object.object_repr)
        .bind(record.action.as_str())
        .bind(record.object_data.to_string())
        .execute(&self.pool)
        .await?;

        debug!(
            target: "audit",
            record_id = %record.id,
            object = %record.changed_object,
            action = %record.action,
            "Change record appended to sqlite store"
        );
        Ok(())
    }
}

fn row_to_record(row: &SqliteRow) -> AuditResult<ChangeRecord> {
    let id: String = row.try_get("id")?;
    let time: String = row.try_get("time")?;
    let user_id: Option<String> = row.try_get("user_id")?;
    let user_name: Option<String> = row.try_get("user_name")?;
    let request_id: String = row.try_get("request_id")?;
    let object_id: String = row.try_get("changed_object_id")?;
    let action: String = row.try_get("action")?;
    let object_data: String = row.try_get("object_data")?;

    let actor = match (user_id, user_name) {
        (Some(user_id), Some(user_name)) => Some(Actor::new(parse_uuid(&user_id)?, user_name)),
        _ => None,
    };

    Ok(ChangeRecord {
        id: parse_uuid(&id)?,
        time: DateTime::parse_from_rfc3339(&time)
            .map_err(|e| AuditError::Persistence(format!("Invalid timestamp: {}", e)))?
            .with_timezone(&Utc),
        actor,
        request_id: parse_uuid(&request_id)?,
        changed_object: ObjectRef::new(
            row.try_get::<String, _>("changed_object_type")?,
            parse_uuid(&object_id)?,
            row.try_get::<String, _>("object_repr")?,
        ),
        action: action.parse::<ChangeAction>()?,
        object_data: serde_json::from_str(&object_data)
            .map_err(|e| AuditError::Persistence(format!("Invalid object data: {}", e)))?,
    })
}

fn parse_uuid(value: &str) -> AuditResult<Uuid> {
    Uuid::parse_str(value).map_err(|e| AuditError::Persistence(format!("Invalid UUID: {}", e)))
}
