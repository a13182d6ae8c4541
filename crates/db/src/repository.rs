use std::fmt::{Debug, Display};
use std::hash::Hash;

use async_trait::async_trait;

use crate::error::StorageResult;

/// A record type that can be persisted through a [`Repository`].
///
/// Identifiers are assigned by storage, so every entity has an unsaved
/// `Draft` form and a persisted form produced by [`Entity::from_draft`].
pub trait Entity: Clone + Send + Sync + 'static {
    type Id: Copy + Ord + Hash + Debug + Display + From<i64> + Send + Sync + 'static;
    type Draft: Clone + Send + Sync + 'static;

    /// Name used in log fields and storage errors.
    const KIND: &'static str;

    /// Whether [`Repository::update`] may rewrite stored records.
    const MUTABLE: bool = true;

    fn from_draft(id: Self::Id, draft: Self::Draft) -> Self;

    fn id(&self) -> Self::Id;

    /// Optimistic concurrency counter. Unversioned entities stay at zero.
    fn version(&self) -> i64 {
        0
    }

    fn with_version(self, _version: i64) -> Self {
        self
    }

    /// `(field, value)` pairs that must be unique across all records of this kind.
    fn unique_keys(draft: &Self::Draft) -> Vec<(&'static str, String)> {
        let _ = draft;
        Vec::new()
    }
}

/// Generic persistence gateway over one entity type.
#[async_trait]
pub trait Repository<E: Entity>: Send + Sync {
    /// Persist a new record and return it with its assigned id.
    async fn save(&self, draft: E::Draft) -> StorageResult<E>;

    /// Persist a batch as one unit: either every record is stored or none is.
    async fn save_all(&self, drafts: Vec<E::Draft>) -> StorageResult<Vec<E>>;

    /// Write back a mutated record. Fails with `StaleVersion` when the stored
    /// version no longer matches the one that was read, and with `Immutable`
    /// for entities that are write-once.
    async fn update(&self, entity: &E) -> StorageResult<E>;

    async fn find_by_id(&self, id: E::Id) -> StorageResult<Option<E>>;

    /// All records in ascending id order.
    async fn find_all(&self) -> StorageResult<Vec<E>>;

    async fn count(&self) -> StorageResult<usize>;
}
