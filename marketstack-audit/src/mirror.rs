use crate::MirrorResult;
use marketstack_model::ProductRecord;
use marketstack_types::{ActorId, ChangeLogEntry, ProductId};

/// Outbound interface to the relational copy of the catalog.
///
/// Products are addressed by `(name, store)` when first mirrored and by the
/// returned [`ProductId`] afterwards. Change-log entries are append-only:
/// implementations never update or delete them.
pub trait CatalogMirror: Send + Sync {
    /// Inserts the product, or refreshes the row already mirrored under the
    /// same name and store. Returns the product's handle either way.
    fn upsert_product(&self, record: &ProductRecord) -> MirrorResult<ProductId>;

    /// Overwrites the row identified by `id` with `record`.
    fn update_product(&self, id: &ProductId, record: &ProductRecord) -> MirrorResult<()>;

    /// Looks up the handle of a mirrored product. Store names compare
    /// case-insensitively.
    fn product_id_for(&self, name: &str, store_name: &str) -> MirrorResult<Option<ProductId>>;

    /// Appends one entry to the change log.
    fn record_change(&self, entry: &ChangeLogEntry) -> MirrorResult<()>;

    /// Every change recorded for `id`, most recent first.
    fn history(&self, id: &ProductId) -> MirrorResult<Vec<ChangeLogEntry>>;

    /// Every change made by `actor`, most recent first.
    fn changes_by_actor(&self, actor: &ActorId) -> MirrorResult<Vec<ChangeLogEntry>>;

    /// The whole change log, most recent first.
    fn all_changes(&self) -> MirrorResult<Vec<ChangeLogEntry>>;
}
