// Change logging configuration
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use crate::error::AuditResult;
use crate::storage::{AuditStore, InMemoryAuditStore, SqliteAuditStore};

/// Prefix for environment overrides, e.g. `CHANGELOG_STORE__BACKEND=sqlite`
pub const ENV_PREFIX: &str = "CHANGELOG_";

/// What the commit path does when a change record cannot be written
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Fail the operation. The committed mutation itself stays in place.
    Propagate,
    /// Log the failure and report the mutation as successful
    #[default]
    LogAndContinue,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum StoreConfig {
    #[default]
    Memory,
    Sqlite {
        path: PathBuf,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AuditConfig {
    /// Whether mutations are change-logged at all
    pub enabled: bool,
    pub failure_policy: FailurePolicy,
    pub store: StoreConfig,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            failure_policy: FailurePolicy::default(),
            store: StoreConfig::default(),
        }
    }
}

impl AuditConfig {
    /// Load defaults, then the optional YAML file, then `CHANGELOG_*` env vars.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError::Configuration`](crate::AuditError::Configuration)
    /// when a source cannot be read or does not match the expected shape.
    pub fn load(path: Option<&Path>) -> AuditResult<Self> {
        let mut figment = Figment::from(Serialized::defaults(AuditConfig::default()));

        if let Some(path) = path {
            figment = figment.merge(Yaml::file(path));
        }

        let config: AuditConfig = figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;

        Ok(config)
    }

    /// Build the configured audit store
    ///
    /// # Errors
    ///
    /// Returns [`AuditError::Persistence`](crate::AuditError::Persistence) if a
    /// SQLite store cannot be opened.
    pub async fn open_store(&self) -> AuditResult<Arc<dyn AuditStore>> {
        match &self.store {
            StoreConfig::Memory => {
                info!(target: "audit", "Using in-memory audit store");
                Ok(Arc::new(InMemoryAuditStore::new()))
            }
            StoreConfig::Sqlite { path } => {
                let store = SqliteAuditStore::open(path).await?;
                info!(target: "audit", path = %path.display(), "Opened sqlite audit store");
                Ok(Arc::new(store))
            }
        }
    }
}
