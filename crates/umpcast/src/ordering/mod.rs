//! Strict per-scope ordering shared by applications, divisions, roles, and levels.
//!
//! Every ordered record lives in a sibling scope whose order values are always
//! exactly `0..n`. The [`OrderEngine`] is the only writer of order values: it
//! appends on creation, compacts on deletion, and shifts the minimal sibling
//! range on a move, all inside one scope-locked, all-or-nothing commit. Status
//! (casted vs backup) is derived from the committed order and never stored.

pub mod domain;
pub mod engine;
pub mod error;
pub mod handler;
pub mod router;
pub mod scope;
pub mod service;
pub mod status;
pub mod store;

#[cfg(test)]
mod tests;

pub use domain::{EntityId, OrderChange, OrderedEntity, Reordering, Scoped};
pub use engine::{plan_move, OrderEngine, Replacement};
pub use error::{OrderingError, StoreError};
pub use handler::{MoveOperationHandler, MoveRequest};
pub use router::{cast_route, ordering_router};
pub use scope::{OrderingScope, SiblingSlice};
pub use service::{NotifyError, OrderingService, RankNotifier, SilentNotifier};
pub use status::{RankStatus, RankStatusResolver, RankTransition, RankedEntry};
pub use store::{
    MemoryOrderStore, OrderStore, ScopeHandle, StagedWrite, WriteBatch, DEFAULT_SCOPE_LOCK_TIMEOUT,
};
