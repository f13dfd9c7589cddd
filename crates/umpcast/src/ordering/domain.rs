use std::fmt;
use std::hash::Hash;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Identifier shared by every ordered record, unique across kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Payload that lives inside a strictly ordered sibling group.
///
/// The scope key names the group (a post, league, or division) and is the only
/// thing the engine needs to know about the payload.
pub trait Scoped: Clone + Send + Sync + 'static {
    type Scope: Copy
        + Eq
        + Ord
        + Hash
        + fmt::Debug
        + fmt::Display
        + Serialize
        + DeserializeOwned
        + Send
        + Sync
        + 'static;

    /// Singular label used in logs and error messages.
    const KIND: &'static str;
    /// Plural path segment for the kind's HTTP resources.
    const COLLECTION: &'static str;
    /// Plural path segment of the owning scope.
    const SCOPE_COLLECTION: &'static str;

    fn scope_key(&self) -> Self::Scope;
}

/// A payload together with its identity and its position inside its scope.
///
/// `order` can only be written from inside the crate: the engine and the store
/// are the sole writers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderedEntity<T> {
    id: EntityId,
    order: u32,
    #[serde(flatten)]
    value: T,
}

impl<T: Scoped> OrderedEntity<T> {
    pub(crate) fn new(id: EntityId, order: u32, value: T) -> Self {
        Self { id, order, value }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn order(&self) -> u32 {
        self.order
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn into_value(self) -> T {
        self.value
    }

    pub fn scope_key(&self) -> T::Scope {
        self.value.scope_key()
    }

    pub(crate) fn set_order(&mut self, order: u32) {
        self.order = order;
    }

    pub(crate) fn set_value(&mut self, value: T) {
        self.value = value;
    }
}

/// One sibling whose order value moved during an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OrderChange {
    pub id: EntityId,
    pub from: u32,
    pub to: u32,
}

/// Outcome of a committed move, append, or removal.
///
/// `changes` lists every live entity whose order differs from before the
/// operation, so collaborators can recompute derived state for exactly those
/// entities. Appends record the new entity with `from == to`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Reordering {
    pub changes: Vec<OrderChange>,
    pub created: Option<EntityId>,
    pub top_order: u32,
}

impl Reordering {
    pub fn unchanged(top_order: u32) -> Self {
        Self {
            changes: Vec::new(),
            created: None,
            top_order,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn change_for(&self, id: EntityId) -> Option<&OrderChange> {
        self.changes.iter().find(|change| change.id == id)
    }
}
