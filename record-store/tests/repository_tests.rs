//! Integration tests for the change-logging repository.
//!
//! These run against the in-memory entity store and both audit store
//! backends; no external database is needed.

use async_trait::async_trait;
use audit_engine::{
    Actor, AuditConfig, AuditError, AuditResult, AuditStore, Auditable, ChangeAction,
    ChangeRecord, ChangeRecorder, FailurePolicy, InMemoryAuditStore, JsonSnapshotSerializer,
    SnapshotSerializer, SqliteAuditStore,
};
use natural_order::OrderingError;
use record_store::{
    ChangeContext, ChangeLoggedFields, ChangeLoggingRepository, EntityStore, InMemoryEntityStore,
    Interface, Record, RepositoryError,
};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct Rack {
    id: Uuid,
    name: String,
    site: String,
    u_height: u8,
    status: String,
    #[serde(flatten)]
    timestamps: ChangeLoggedFields,
}

impl Rack {
    fn new(name: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            site: "ams1".to_string(),
            u_height: 42,
            status: "planned".to_string(),
            timestamps: ChangeLoggedFields::new(),
        }
    }
}

impl Auditable for Rack {
    const OBJECT_TYPE: &'static str = "dcim.rack";

    fn object_id(&self) -> Uuid {
        self.id
    }

    fn object_repr(&self) -> String {
        self.name.clone()
    }
}

impl Record for Rack {
    fn timestamps(&self) -> &ChangeLoggedFields {
        &self.timestamps
    }

    fn timestamps_mut(&mut self) -> &mut ChangeLoggedFields {
        &mut self.timestamps
    }
}

/// Audit store that rejects every append
#[derive(Default)]
struct FailingAuditStore {
    attempts: AtomicUsize,
}

#[async_trait]
impl AuditStore for FailingAuditStore {
    async fn append(&self, _record: &ChangeRecord) -> AuditResult<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(AuditError::Persistence("audit database is read-only".to_string()))
    }
}

fn repository<E: Record>(
    audit: Arc<dyn AuditStore>,
) -> ChangeLoggingRepository<E, InMemoryEntityStore<E>> {
    ChangeLoggingRepository::new(
        InMemoryEntityStore::<E>::new(),
        Arc::new(ChangeRecorder::new(audit)),
    )
}

fn alice() -> Actor {
    Actor::new(Uuid::new_v4(), "alice")
}

#[tokio::test]
async fn test_update_logs_state_after_change() {
    init_tracing();
    let audit = InMemoryAuditStore::new();
    let racks = repository::<Rack>(Arc::new(audit.clone()));
    let r1 = Uuid::new_v4();
    let ctx = ChangeContext::for_request(Some(alice()), r1);

    let mut rack42 = racks.create(&ctx, Rack::new("rack42")).await.unwrap();
    rack42.status = "active".to_string();
    let rack42 = racks.update(&ctx, rack42).await.unwrap();

    let records = audit.records_for_object(rack42.id).await;
    assert_eq!(records.len(), 2);

    let update = &records[1];
    let expected = JsonSnapshotSerializer::new().serialize(&rack42).unwrap();
    assert_eq!(update.action, ChangeAction::Update);
    assert_eq!(update.request_id, r1);
    assert_eq!(update.object_data, expected);
    assert_eq!(update.object_data["status"], "active");
    assert_eq!(
        update.actor.as_ref().map(|a| a.user_name.as_str()),
        Some("alice")
    );
}

#[tokio::test]
async fn test_each_mutation_writes_exactly_one_record() {
    let audit = InMemoryAuditStore::new();
    let racks = repository::<Rack>(Arc::new(audit.clone()));
    let ctx = ChangeContext::new(alice());

    let rack = racks.create(&ctx, Rack::new("rack1")).await.unwrap();
    racks.update(&ctx, rack.clone()).await.unwrap();
    racks.update(&ctx, rack.clone()).await.unwrap();
    racks.delete(&ctx, rack.id).await.unwrap();

    let actions: Vec<ChangeAction> = audit.records().await.iter().map(|r| r.action).collect();
    assert_eq!(
        actions,
        vec![
            ChangeAction::Create,
            ChangeAction::Update,
            ChangeAction::Update,
            ChangeAction::Delete
        ]
    );
}

#[tokio::test]
async fn test_timestamps_are_set_by_repository() {
    let audit = InMemoryAuditStore::new();
    let racks = repository::<Rack>(Arc::new(audit));
    let ctx = ChangeContext::system();

    let created = racks.create(&ctx, Rack::new("rack7")).await.unwrap();
    let created_on = created.timestamps.created;
    let first_update = created.timestamps.last_updated;
    assert!(created_on.is_some());
    assert!(first_update.is_some());

    // callers cannot rewrite the creation date
    let mut tampered = created.clone();
    tampered.timestamps.created = None;
    let updated = racks.update(&ctx, tampered).await.unwrap();

    assert_eq!(updated.timestamps.created, created_on);
    assert!(updated.timestamps.last_updated >= first_update);
}

#[tokio::test]
async fn test_delete_record_keeps_final_state() {
    let audit = InMemoryAuditStore::new();
    let racks = repository::<Rack>(Arc::new(audit.clone()));
    let ctx = ChangeContext::new(alice());

    let rack = racks.create(&ctx, Rack::new("rack9")).await.unwrap();
    racks.delete(&ctx, rack.id).await.unwrap();

    assert!(racks.get(rack.id).await.unwrap().is_none());

    let records = audit.records_for_object(rack.id).await;
    let deleted = records.last().unwrap();
    assert_eq!(deleted.action, ChangeAction::Delete);
    assert_eq!(deleted.changed_object.object_repr, "rack9");
    assert_eq!(deleted.object_data["name"], "rack9");
}

#[tokio::test]
async fn test_missing_records_are_not_logged() {
    let audit = InMemoryAuditStore::new();
    let racks = repository::<Rack>(Arc::new(audit.clone()));
    let ctx = ChangeContext::system();
    let ghost = Rack::new("ghost");
    let ghost_id = ghost.id;

    let err = racks.update(&ctx, ghost).await.unwrap_err();
    assert!(matches!(err, RepositoryError::NotFound(id) if id == ghost_id));

    let err = racks.delete(&ctx, Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, RepositoryError::NotFound(_)));

    assert!(audit.is_empty().await);
}

#[tokio::test]
async fn test_duplicate_create_is_a_conflict() {
    let audit = InMemoryAuditStore::new();
    let racks = repository::<Rack>(Arc::new(audit.clone()));
    let ctx = ChangeContext::system();

    let rack = racks.create(&ctx, Rack::new("rack3")).await.unwrap();
    let err = racks.create(&ctx, rack.clone()).await.unwrap_err();

    assert!(matches!(err, RepositoryError::Conflict(id) if id == rack.id));
    assert_eq!(audit.len().await, 1);
}

#[tokio::test]
async fn test_propagate_policy_surfaces_audit_failure_without_rollback() {
    init_tracing();
    let audit = Arc::new(FailingAuditStore::default());
    let racks = repository::<Rack>(audit.clone()).with_failure_policy(FailurePolicy::Propagate);
    let rack = Rack::new("rack5");
    let id = rack.id;

    let err = racks.create(&ChangeContext::system(), rack).await.unwrap_err();

    assert!(matches!(err, RepositoryError::Audit(AuditError::Persistence(_))));
    assert_eq!(audit.attempts.load(Ordering::SeqCst), 1);
    assert!(racks.get(id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_log_and_continue_policy_swallows_audit_failure() {
    init_tracing();
    let audit = Arc::new(FailingAuditStore::default());
    let racks =
        repository::<Rack>(audit.clone()).with_failure_policy(FailurePolicy::LogAndContinue);

    let rack = racks
        .create(&ChangeContext::system(), Rack::new("rack6"))
        .await
        .unwrap();

    assert_eq!(audit.attempts.load(Ordering::SeqCst), 1);
    assert!(racks.get(rack.id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_disabled_change_logging_writes_nothing() {
    let audit = InMemoryAuditStore::new();
    let config = AuditConfig {
        enabled: false,
        ..AuditConfig::default()
    };
    let racks = repository::<Rack>(Arc::new(audit.clone())).with_config(&config);

    let rack = racks
        .create(&ChangeContext::system(), Rack::new("rack8"))
        .await
        .unwrap();
    racks.delete(&ChangeContext::system(), rack.id).await.unwrap();

    assert!(audit.is_empty().await);
}

#[tokio::test]
async fn test_interfaces_list_in_natural_order() {
    let audit = InMemoryAuditStore::new();
    let interfaces = repository::<Interface>(Arc::new(audit.clone()));
    let ctx = ChangeContext::new(alice());

    for name in ["Ethernet1/10", "Ethernet1/2", "Ethernet2/1", "Ethernet1/1", "mgmt0"] {
        interfaces
            .create(&ctx, Interface::new("sw1", name).unwrap())
            .await
            .unwrap();
    }

    let names: Vec<String> = interfaces
        .list_naturally_ordered()
        .await
        .unwrap()
        .into_iter()
        .map(|i| i.name)
        .collect();

    assert_eq!(
        names,
        vec!["mgmt0", "Ethernet1/1", "Ethernet1/2", "Ethernet1/10", "Ethernet2/1"]
    );
    assert_eq!(audit.records_for_request(ctx.request_id).await.len(), 5);
}

#[tokio::test]
async fn test_out_of_range_key_is_rejected_before_persistence() {
    let audit = InMemoryAuditStore::new();
    let interfaces = repository::<Interface>(Arc::new(audit.clone()));
    let ctx = ChangeContext::new(alice());

    let mut interface = interfaces
        .create(&ctx, Interface::new("sw1", "Ethernet1/2").unwrap())
        .await
        .unwrap();

    // bypass rename() to simulate a caller editing the name directly
    interface.name = "Ethernet1/65536".to_string();
    let err = interfaces.update(&ctx, interface.clone()).await.unwrap_err();

    assert!(matches!(
        err,
        RepositoryError::Ordering(OrderingError::ValueRange { slot: 4, value: 65536 })
    ));

    let stored = interfaces.get(interface.id).await.unwrap().unwrap();
    assert_eq!(stored.name, "Ethernet1/2");
    assert_eq!(audit.len().await, 1);
}

#[tokio::test]
async fn test_rename_recomputes_ordering() {
    let audit = InMemoryAuditStore::new();
    let interfaces = repository::<Interface>(Arc::new(audit));
    let ctx = ChangeContext::system();

    let first = interfaces
        .create(&ctx, Interface::new("sw1", "Ethernet1/1").unwrap())
        .await
        .unwrap();
    let mut second = interfaces
        .create(&ctx, Interface::new("sw1", "Ethernet1/2").unwrap())
        .await
        .unwrap();

    second.rename("Ethernet1/0").unwrap();
    interfaces.update(&ctx, second).await.unwrap();

    let ordered = interfaces.list_naturally_ordered().await.unwrap();
    assert_eq!(ordered[0].name, "Ethernet1/0");
    assert_eq!(ordered[1].id, first.id);
}

#[tokio::test]
async fn test_equal_keys_list_in_a_fixed_order() {
    let interfaces = repository::<Interface>(Arc::new(InMemoryAuditStore::new()));
    let ctx = ChangeContext::system();

    for (device, name) in [
        ("sw3", "Ethernet1/1"),
        ("sw1", "GigabitEthernet1/1"),
        ("sw2", "Ethernet1/1"),
        ("sw1", "Ethernet1/1"),
    ] {
        interfaces
            .create(&ctx, Interface::new(device, name).unwrap())
            .await
            .unwrap();
    }

    let listed: Vec<String> = interfaces
        .list_naturally_ordered()
        .await
        .unwrap()
        .iter()
        .map(Auditable::object_repr)
        .collect();

    assert_eq!(
        listed,
        vec![
            "sw1 Ethernet1/1",
            "sw1 GigabitEthernet1/1",
            "sw2 Ethernet1/1",
            "sw3 Ethernet1/1",
        ]
    );
}

#[tokio::test]
async fn test_repository_uses_recorder_serializer() {
    let audit = InMemoryAuditStore::new();
    let recorder = ChangeRecorder::with_serializer(
        Arc::new(audit.clone()),
        JsonSnapshotSerializer::new().with_excluded_field("description"),
    );
    let interfaces =
        ChangeLoggingRepository::new(InMemoryEntityStore::<Interface>::new(), Arc::new(recorder));

    let interface = Interface::new("sw1", "Ethernet1/1")
        .unwrap()
        .with_description("uplink to core");
    interfaces
        .create(&ChangeContext::new(alice()), interface)
        .await
        .unwrap();

    let records = audit.records().await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].object_data["name"], "Ethernet1/1");
    assert!(records[0].object_data.get("description").is_none());
}

#[tokio::test]
async fn test_sqlite_audit_store_behind_repository() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let audit = SqliteAuditStore::open(dir.path().join("changes.db"))
        .await
        .unwrap();
    let racks = repository::<Rack>(Arc::new(audit.clone()))
        .with_failure_policy(FailurePolicy::Propagate);
    let ctx = ChangeContext::from_header(Some(alice()), Some(&Uuid::new_v4().to_string()));

    let rack = racks.create(&ctx, Rack::new("rack42")).await.unwrap();
    racks.delete(&ctx, rack.id).await.unwrap();

    let records = audit.records_for_request(ctx.request_id).await.unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].action, ChangeAction::Create);
    assert_eq!(records[1].action, ChangeAction::Delete);
    assert!(racks.store().get(rack.id).await.unwrap().is_none());
}
