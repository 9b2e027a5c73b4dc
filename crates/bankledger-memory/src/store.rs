use std::sync::{
    atomic::{AtomicU64, Ordering},
    PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard,
};

use bankledger_core::{Entity, EntityId, StoreError};
use time::OffsetDateTime;
use uuid::Uuid;

/// Thread-safe, insertion-ordered collection of one entity type.
///
/// Entities go in and come out as clones: the caller never holds a reference
/// into the collection. Every scan or scan-then-mutate runs under a single
/// lock acquisition.
pub struct InMemoryStore<T: Entity> {
    entities: RwLock<Vec<T>>,
    sequence_counter: AtomicU64,
}

impl<T: Entity> Default for InMemoryStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Entity> InMemoryStore<T> {
    pub fn new() -> Self {
        Self {
            entities: RwLock::new(Vec::new()),
            sequence_counter: AtomicU64::new(1),
        }
    }

    // Every mutation is a single push, replace or take, so a panic elsewhere
    // cannot leave the collection half-written.
    fn read(&self) -> RwLockReadGuard<'_, Vec<T>> {
        self.entities.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<T>> {
        self.entities.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn next_sequence(&self) -> EntityId {
        self.sequence_counter.fetch_add(1, Ordering::SeqCst)
    }

    pub fn insert(&self, candidate: &T) -> Result<T, StoreError> {
        candidate.validate()?;
        let mut entity = candidate.clone();

        let mut entities = self.write();
        // Taken under the write lock so ids follow insertion order.
        let id = self.next_sequence();
        let uuid = Uuid::new_v4();
        let meta = entity.meta_mut();
        meta.id = Some(id);
        meta.uuid = Some(uuid);
        meta.created_at = Some(OffsetDateTime::now_utc());
        entities.push(entity.clone());
        drop(entities);

        tracing::debug!(kind = T::KIND, id, %uuid, "Entity inserted");
        Ok(entity)
    }

    pub fn get_by_id(&self, uuid: &Uuid) -> Option<T> {
        self.read()
            .iter()
            .find(|entity| entity.uuid().as_ref() == Some(uuid))
            .cloned()
    }

    pub fn get_all(&self) -> Vec<T> {
        self.read().clone()
    }

    pub fn filter<P>(&self, predicate: P) -> Vec<T>
    where
        P: Fn(&T) -> bool,
    {
        self.read()
            .iter()
            .filter(|entity| predicate(entity))
            .cloned()
            .collect()
    }

    /// Applies `f` to a copy of the matching entity and stores the copy only if
    /// `f` succeeds. Store-assigned identity is kept whatever `f` does to it.
    pub fn update<F>(&self, uuid: &Uuid, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut T) -> Result<(), StoreError>,
    {
        let mut entities = self.write();
        let slot = entities
            .iter_mut()
            .find(|entity| entity.uuid().as_ref() == Some(uuid))
            .ok_or_else(|| StoreError::not_found(T::KIND, uuid))?;

        let meta = slot.meta().clone();
        let mut updated = slot.clone();
        f(&mut updated)?;
        *updated.meta_mut() = meta;
        *slot = updated.clone();
        drop(entities);

        tracing::debug!(kind = T::KIND, %uuid, "Entity updated");
        Ok(updated)
    }

    /// Empties the store and returns what was in it. The id sequence is not reset.
    pub fn clear(&self) -> Vec<T> {
        let removed = std::mem::take(&mut *self.write());
        tracing::debug!(kind = T::KIND, removed = removed.len(), "Store cleared");
        removed
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}
