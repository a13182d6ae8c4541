use std::collections::{BTreeMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::error::{StorageError, StorageResult};
use crate::repository::{Entity, Repository};

/// Map-backed gateway. Enforces the same uniqueness, versioning and batch
/// atomicity rules as the SQL gateways.
pub struct MemoryRepository<E: Entity> {
    state: Mutex<State<E>>,
}

struct State<E: Entity> {
    last_id: i64,
    rows: BTreeMap<E::Id, E>,
    unique: HashSet<(&'static str, String)>,
}

impl<E: Entity> State<E> {
    /// Checks a batch against stored keys and against itself.
    fn check_unique(&self, drafts: &[E::Draft]) -> StorageResult<()> {
        let mut pending = HashSet::new();
        for draft in drafts {
            for key in E::unique_keys(draft) {
                if self.unique.contains(&key) || !pending.insert(key.clone()) {
                    return Err(StorageError::UniqueViolation {
                        entity: E::KIND,
                        field: key.0.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    fn insert(&mut self, draft: E::Draft) -> E {
        self.unique.extend(E::unique_keys(&draft));
        self.last_id += 1;
        let id = E::Id::from(self.last_id);
        let entity = E::from_draft(id, draft);
        self.rows.insert(id, entity.clone());
        entity
    }
}

impl<E: Entity> MemoryRepository<E> {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                last_id: 0,
                rows: BTreeMap::new(),
                unique: HashSet::new(),
            }),
        }
    }

    fn lock(&self) -> StorageResult<MutexGuard<'_, State<E>>> {
        self.state.lock().map_err(|_| StorageError::Poisoned)
    }
}

impl<E: Entity> Default for MemoryRepository<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<E: Entity> Repository<E> for MemoryRepository<E> {
    async fn save(&self, draft: E::Draft) -> StorageResult<E> {
        let mut state = self.lock()?;
        state.check_unique(std::slice::from_ref(&draft))?;
        Ok(state.insert(draft))
    }

    async fn save_all(&self, drafts: Vec<E::Draft>) -> StorageResult<Vec<E>> {
        let mut state = self.lock()?;
        state.check_unique(&drafts)?;
        Ok(drafts.into_iter().map(|draft| state.insert(draft)).collect())
    }

    async fn update(&self, entity: &E) -> StorageResult<E> {
        if !E::MUTABLE {
            return Err(StorageError::Immutable { entity: E::KIND });
        }
        let mut state = self.lock()?;
        let id = entity.id();
        let stored = state.rows.get_mut(&id).ok_or_else(|| StorageError::Missing {
            entity: E::KIND,
            id: id.to_string(),
        })?;

        if stored.version() != entity.version() {
            return Err(StorageError::StaleVersion {
                entity: E::KIND,
                id: id.to_string(),
            });
        }

        let next = entity.clone().with_version(entity.version() + 1);
        *stored = next.clone();
        Ok(next)
    }

    async fn find_by_id(&self, id: E::Id) -> StorageResult<Option<E>> {
        Ok(self.lock()?.rows.get(&id).cloned())
    }

    async fn find_all(&self) -> StorageResult<Vec<E>> {
        Ok(self.lock()?.rows.values().cloned().collect())
    }

    async fn count(&self) -> StorageResult<usize> {
        Ok(self.lock()?.rows.len())
    }
}
