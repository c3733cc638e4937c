use marketstack_audit::{CatalogMirror, MirrorError, MirrorResult, SqliteMirror};
use marketstack_catalog::{AuditBridge, CatalogConfig, CatalogStore};
use marketstack_model::{Price, ProductDraft, ProductKey, ProductRecord};
use marketstack_types::{ActorId, Category, ChangeLogEntry, ProductField, ProductId};
use pretty_assertions::assert_eq;
use std::fs;
use std::sync::Arc;

const NIKE: &str = "a@x.com,Nike,Air,10,99.99,Running shoe,Nike,SHOES";

/// A mirror whose every call fails.
struct BrokenMirror;

fn broken<T>() -> MirrorResult<T> {
    Err(MirrorError::Storage("mirror offline".to_string()))
}

impl CatalogMirror for BrokenMirror {
    fn upsert_product(&self, _record: &ProductRecord) -> MirrorResult<ProductId> {
        broken()
    }
    fn update_product(&self, _id: &ProductId, _record: &ProductRecord) -> MirrorResult<()> {
        broken()
    }
    fn product_id_for(&self, _name: &str, _store: &str) -> MirrorResult<Option<ProductId>> {
        broken()
    }
    fn record_change(&self, _entry: &ChangeLogEntry) -> MirrorResult<()> {
        broken()
    }
    fn history(&self, _id: &ProductId) -> MirrorResult<Vec<ChangeLogEntry>> {
        broken()
    }
    fn changes_by_actor(&self, _actor: &ActorId) -> MirrorResult<Vec<ChangeLogEntry>> {
        broken()
    }
    fn all_changes(&self) -> MirrorResult<Vec<ChangeLogEntry>> {
        broken()
    }
}

fn price(s: &str) -> Price {
    Price::parse(s).unwrap()
}

fn air_key() -> ProductKey {
    ProductKey::new("Air", 10, price("99.99"), "Running shoe", "Nike")
}

fn air() -> ProductRecord {
    ProductRecord::new("Air", 10, price("99.99"), "Running shoe", "Nike", Category::Shoes)
}

fn open(dir: &std::path::Path, mirror: Arc<dyn CatalogMirror>) -> CatalogStore {
    let path = dir.join("Sellers.txt");
    fs::write(&path, format!("{NIKE}\n")).unwrap();
    CatalogStore::with_mirror(CatalogConfig::new(path), mirror).unwrap()
}

// ── Direct bridge use ────────────────────────────────────────────

#[test]
fn log_change_appends_entry() {
    let mirror = Arc::new(SqliteMirror::open_in_memory().unwrap());
    let bridge = AuditBridge::new(mirror.clone());
    let id = bridge.mirror_product(&air()).unwrap();

    assert!(bridge.log_change(&id, &ActorId::new("a@x.com"), ProductField::Price, "99.99", "89.99"));
    let history = bridge.history(&id);
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].old_value, "99.99");
    assert_eq!(history[0].new_value, "89.99");
    assert_eq!(history[0].change_type(), "Price Update");
}

#[test]
fn broken_mirror_never_fails_the_caller() {
    let bridge = AuditBridge::new(Arc::new(BrokenMirror));
    let id = ProductId::new();
    assert!(!bridge.log_change(&id, &ActorId::new("a"), ProductField::Name, "a", "b"));
    assert_eq!(bridge.mirror_product(&air()), None);
    assert!(bridge.history(&id).is_empty());
    assert!(bridge.all_changes().is_empty());
    let mut renamed = air();
    renamed.name = "Air Max".into();
    assert_eq!(bridge.record_edit(&air(), &renamed, &ActorId::new("a"), None), 0);
}

#[test]
fn disabled_bridge_is_silent() {
    let bridge = AuditBridge::disabled();
    assert!(!bridge.is_enabled());
    assert!(!bridge.log_change(&ProductId::new(), &ActorId::new("a"), ProductField::Name, "a", "b"));
    assert!(bridge.history_for("Air", "Nike").is_empty());
}

// ── Edits through the store ──────────────────────────────────────

#[test]
fn edit_logs_one_entry_per_changed_field() {
    let dir = tempfile::tempdir().unwrap();
    let mirror = Arc::new(SqliteMirror::open_in_memory().unwrap());
    let mut store = open(dir.path(), mirror.clone());

    let draft = ProductDraft::new("Air", 4, price("79.99"), "Running shoe", Category::SportsOutdoors);
    store
        .edit_product(
            "a@x.com",
            "Nike",
            &air_key(),
            draft,
            &ActorId::new("a@x.com"),
            Some("spring sale"),
        )
        .unwrap();

    let history = store.history("Air", "Nike");
    let fields: Vec<ProductField> = history.iter().map(|e| e.field).collect();
    assert_eq!(
        fields,
        vec![ProductField::Category, ProductField::Quantity, ProductField::Price]
    );
    let price_change = &history[2];
    assert_eq!(
        (price_change.old_value.as_str(), price_change.new_value.as_str()),
        ("99.99", "79.99")
    );
    assert_eq!(price_change.change_type(), "Price Update - spring sale");
    assert!(history.iter().all(|e| e.actor_id.as_str() == "a@x.com"));

    let mirrored_id = mirror.product_id_for("Air", "Nike").unwrap().unwrap();
    assert_eq!(mirror.product(&mirrored_id).unwrap().unwrap().quantity, 4);
}

#[test]
fn rename_keeps_history_on_same_handle() {
    let dir = tempfile::tempdir().unwrap();
    let mirror = Arc::new(SqliteMirror::open_in_memory().unwrap());
    let mut store = open(dir.path(), mirror.clone());
    let actor = ActorId::new("a@x.com");

    let renamed = ProductDraft::new("Air Max", 10, price("99.99"), "Running shoe", Category::Shoes);
    store
        .edit_product("a@x.com", "Nike", &air_key(), renamed, &actor, None)
        .unwrap();
    let new_key = ProductKey::new("Air Max", 10, price("99.99"), "Running shoe", "Nike");
    let cheaper = ProductDraft::new("Air Max", 10, price("89.99"), "Running shoe", Category::Shoes);
    store
        .edit_product("a@x.com", "Nike", &new_key, cheaper, &actor, None)
        .unwrap();

    let history = store.history("Air Max", "Nike");
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].field, ProductField::Price);
    assert_eq!(history[1].field, ProductField::Name);
    assert_eq!(store.changes_by_actor(&actor).len(), 2);
    assert_eq!(store.all_changes().len(), 2);
}

#[test]
fn back_to_back_edits_list_latest_first() {
    // Edits a few microseconds apart usually share a millisecond.
    for _ in 0..25 {
        let dir = tempfile::tempdir().unwrap();
        let mirror = Arc::new(SqliteMirror::open_in_memory().unwrap());
        let mut store = open(dir.path(), mirror.clone());
        let seller = ActorId::new("a@x.com");
        let admin = ActorId::new("admin");

        let first = ProductDraft::new("Air2", 9, price("89.99"), "Running shoe", Category::Shoes);
        store
            .edit_product("a@x.com", "Nike", &air_key(), first, &seller, None)
            .unwrap();
        let key = ProductKey::new("Air2", 9, price("89.99"), "Running shoe", "Nike");
        let second = ProductDraft::new("Air2", 9, price("89.99"), "Trail shoe", Category::Shoes);
        store
            .edit_product("a@x.com", "Nike", &key, second, &admin, None)
            .unwrap();

        let history = store.history("Air2", "Nike");
        let fields: Vec<ProductField> = history.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec![
                ProductField::Description,
                ProductField::Name,
                ProductField::Quantity,
                ProductField::Price,
            ]
        );
        assert!(history.windows(2).all(|w| w[0].timestamp > w[1].timestamp));

        let all = store.all_changes();
        assert_eq!(all, history);
        assert_eq!(all[0].actor_id, admin);

        let by_seller: Vec<ProductField> =
            store.changes_by_actor(&seller).iter().map(|e| e.field).collect();
        assert_eq!(
            by_seller,
            vec![ProductField::Name, ProductField::Quantity, ProductField::Price]
        );
        assert_eq!(store.changes_by_actor(&admin).len(), 1);
    }
}

#[test]
fn bridge_timestamps_increase_across_edits() {
    let bridge = AuditBridge::new(Arc::new(SqliteMirror::open_in_memory().unwrap()));
    let actor = ActorId::new("a@x.com");
    let mut cheaper = air();
    cheaper.price = price("89.99");
    cheaper.quantity = 2;
    let mut renamed = cheaper.clone();
    renamed.name = "Air Max".into();

    assert_eq!(bridge.record_edit(&air(), &cheaper, &actor, None), 2);
    assert_eq!(bridge.record_edit(&cheaper, &renamed, &actor, None), 1);

    let all = bridge.all_changes();
    assert_eq!(all.len(), 3);
    assert_eq!(all[0].field, ProductField::Name);
    assert!(all.windows(2).all(|w| w[0].timestamp > w[1].timestamp));
}

#[test]
fn unchanged_edit_logs_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let mirror = Arc::new(SqliteMirror::open_in_memory().unwrap());
    let mut store = open(dir.path(), mirror.clone());
    let same = ProductDraft::new("Air", 10, price("99.99"), "Running shoe", Category::Shoes);
    store
        .edit_product("a@x.com", "Nike", &air_key(), same, &ActorId::new("a"), None)
        .unwrap();
    assert_eq!(mirror.change_count().unwrap(), 0);
}

#[test]
fn broken_mirror_does_not_block_file_writes() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = open(dir.path(), Arc::new(BrokenMirror));

    let draft = ProductDraft::new("Air", 1, price("99.99"), "Running shoe", Category::Shoes);
    store
        .edit_product("a@x.com", "Nike", &air_key(), draft, &ActorId::new("a"), None)
        .unwrap();
    store
        .add_product(
            "a@x.com",
            "Nike",
            ProductDraft::new("Tee", 1, price("5"), "Cotton", Category::Clothing),
        )
        .unwrap();

    let text = fs::read_to_string(store.path()).unwrap();
    assert_eq!(
        text,
        "a@x.com,Nike,Air,1,99.99,Running shoe,Nike,SHOES,Tee,1,5.00,Cotton,Nike,CLOTHING\n"
    );
    let report = store.sync_mirror();
    assert_eq!((report.synced, report.failed), (0, 2));
}

#[test]
fn sync_mirror_upserts_every_product() {
    let dir = tempfile::tempdir().unwrap();
    let mirror = Arc::new(SqliteMirror::open_in_memory().unwrap());
    let path = dir.path().join("Sellers.txt");
    fs::write(
        &path,
        format!("{NIKE}\nb@x.com,Puma,Speed,2,60.00,Fast,Puma,SHOES\n"),
    )
    .unwrap();
    let store = CatalogStore::with_mirror(CatalogConfig::new(path), mirror.clone()).unwrap();

    let report = store.sync_mirror();
    assert_eq!((report.synced, report.failed), (2, 0));
    assert_eq!(mirror.product_count().unwrap(), 2);
    // Re-syncing refreshes rows rather than duplicating them.
    store.sync_mirror();
    assert_eq!(mirror.product_count().unwrap(), 2);
}

#[test]
fn open_with_mirror_path_persists_history() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Sellers.txt");
    let db = dir.path().join("audit.db");
    fs::write(&path, format!("{NIKE}\n")).unwrap();
    let config = CatalogConfig::new(&path).with_mirror(&db);

    {
        let mut store = CatalogStore::open(config.clone()).unwrap();
        assert!(store.bridge().is_enabled());
        let draft = ProductDraft::new("Air", 3, price("99.99"), "Running shoe", Category::Shoes);
        store
            .edit_product("a@x.com", "Nike", &air_key(), draft, &ActorId::new("a"), None)
            .unwrap();
    }

    let store = CatalogStore::open(config).unwrap();
    assert_eq!(store.history("Air", "Nike").len(), 1);
}

#[test]
fn unopenable_mirror_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Sellers.txt");
    fs::write(&path, format!("{NIKE}\n")).unwrap();
    let config = CatalogConfig::new(&path).with_mirror(dir.path().join("no").join("such.db"));
    let store = CatalogStore::open(config).unwrap();
    assert!(!store.bridge().is_enabled());
}
