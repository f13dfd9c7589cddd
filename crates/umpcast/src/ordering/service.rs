use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde_json::Value;
use tracing::warn;

use super::domain::{EntityId, OrderedEntity, Reordering, Scoped};
use super::engine::{OrderEngine, Replacement};
use super::error::OrderingError;
use super::handler::MoveOperationHandler;
use super::scope::OrderingScope;
use super::status::{RankStatusResolver, RankTransition, RankedEntry};
use super::store::OrderStore;

/// Outbound hook told about every rank status flip after it was committed.
pub trait RankNotifier<T: Scoped>: Send + Sync {
    fn rank_changed(
        &self,
        entity: &OrderedEntity<T>,
        transition: &RankTransition,
    ) -> Result<(), NotifyError>;
}

/// Notification dispatch error.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}

/// Notifier for kinds nobody subscribes to.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentNotifier;

impl<T: Scoped> RankNotifier<T> for SilentNotifier {
    fn rank_changed(&self, _: &OrderedEntity<T>, _: &RankTransition) -> Result<(), NotifyError> {
        Ok(())
    }
}

static ENTITY_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_entity_id() -> EntityId {
    EntityId(ENTITY_SEQUENCE.fetch_add(1, Ordering::Relaxed))
}

/// Service composing the order engine, the move handler, and rank notifications.
pub struct OrderingService<T, S, N> {
    engine: OrderEngine<T, S>,
    handler: MoveOperationHandler<T, S>,
    notifier: Arc<N>,
}

impl<T, S, N> OrderingService<T, S, N>
where
    T: Scoped,
    S: OrderStore<T> + 'static,
    N: RankNotifier<T> + 'static,
{
    pub fn new(store: Arc<S>, notifier: Arc<N>) -> Self {
        let engine = OrderEngine::new(store);
        let handler = MoveOperationHandler::with_engine(engine.clone());
        Self {
            engine,
            handler,
            notifier,
        }
    }

    pub fn engine(&self) -> &OrderEngine<T, S> {
        &self.engine
    }

    /// Create `value` at the end of its scope.
    pub fn create(&self, value: T) -> Result<OrderedEntity<T>, OrderingError> {
        let (entity, reordering) = self.engine.append(next_entity_id(), value)?;
        self.publish(&reordering);
        Ok(entity)
    }

    pub fn get(&self, id: EntityId) -> Result<OrderedEntity<T>, OrderingError> {
        self.engine.get(id)
    }

    /// Committed members of `scope` with their derived status, ascending.
    pub fn list_scope(&self, scope: T::Scope) -> Result<Vec<RankedEntry<T>>, OrderingError> {
        Ok(RankedEntry::rank_all(self.engine.list_scope(scope)?))
    }

    pub fn scope(&self, scope: T::Scope) -> Result<OrderingScope<T>, OrderingError> {
        Ok(OrderingScope::new(scope, self.engine.list_scope(scope)?))
    }

    /// Apply a client move request body such as `{"order": 2}`.
    pub fn handle_move(&self, id: EntityId, body: &Value) -> Result<Reordering, OrderingError> {
        let reordering = self.handler.handle(id, body)?;
        self.publish(&reordering);
        Ok(reordering)
    }

    pub fn move_to(&self, id: EntityId, target: i64) -> Result<Reordering, OrderingError> {
        let reordering = self.engine.move_to(id, target)?;
        self.publish(&reordering);
        Ok(reordering)
    }

    /// Move `id` to the head of its scope.
    pub fn cast(&self, id: EntityId) -> Result<Reordering, OrderingError> {
        let reordering = self.engine.top(id)?;
        self.publish(&reordering);
        Ok(reordering)
    }

    pub fn delete(&self, id: EntityId) -> Result<(OrderedEntity<T>, Reordering), OrderingError> {
        let (removed, reordering) = self.engine.remove(id)?;
        self.publish(&reordering);
        Ok((removed, reordering))
    }

    /// Upsert the non-order fields of `id`; a new scope relocates it to that scope's end.
    pub fn replace(&self, id: EntityId, value: T) -> Result<OrderedEntity<T>, OrderingError> {
        match self.engine.replace(id, value)? {
            Replacement::InPlace(entity) => Ok(entity),
            Replacement::Relocated {
                entity,
                vacated,
                joined,
            } => {
                self.publish(&vacated);
                self.publish(&joined);
                Ok(entity)
            }
        }
    }

    fn publish(&self, reordering: &Reordering) {
        for transition in RankStatusResolver::transitions(reordering) {
            let entity = match self.engine.get(transition.id) {
                Ok(entity) => entity,
                Err(err) => {
                    warn!(kind = T::KIND, id = %transition.id, error = %err, "skipping notification");
                    continue;
                }
            };

            if let Err(err) = self.notifier.rank_changed(&entity, &transition) {
                warn!(kind = T::KIND, id = %transition.id, error = %err, "rank notification failed");
            }
        }
    }
}
