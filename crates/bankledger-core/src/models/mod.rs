use time::OffsetDateTime;
use uuid::Uuid;

use crate::storage::StoreError;

pub mod account;
pub mod transaction;

/// Process-local numeric identity assigned by a store.
pub type EntityId = u64;

/// Identity and bookkeeping fields shared by every stored record.
///
/// All three are `None` on a candidate and filled in by the store on insert.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityMeta {
    pub id: Option<EntityId>,
    pub uuid: Option<Uuid>,
    pub created_at: Option<OffsetDateTime>,
}

/// A record that can be kept in an entity store.
///
/// `Clone` is the copy routine used at the store boundary, so implementors
/// must not share interior state between clones.
pub trait Entity: Clone + Send + Sync + 'static {
    /// Lowercase name used in error messages.
    const KIND: &'static str;

    fn meta(&self) -> &EntityMeta;
    fn meta_mut(&mut self) -> &mut EntityMeta;

    /// Type-specific rules a candidate must satisfy, in a stable order.
    fn violations(&self) -> Vec<String>;

    fn id(&self) -> Option<EntityId> {
        self.meta().id
    }

    fn uuid(&self) -> Option<Uuid> {
        self.meta().uuid
    }

    /// Checks a candidate before insert and reports every problem at once.
    fn validate(&self) -> Result<(), StoreError> {
        let mut violations = Vec::new();
        if self.meta().id.is_some() {
            violations.push("id is already assigned".to_string());
        }
        violations.extend(self.violations());

        if violations.is_empty() {
            Ok(())
        } else {
            Err(StoreError::Validation {
                entity: Self::KIND,
                violations,
            })
        }
    }
}
