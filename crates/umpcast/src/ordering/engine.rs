use std::sync::Arc;

use tracing::{debug, error, info};

use super::domain::{EntityId, OrderChange, OrderedEntity, Reordering, Scoped};
use super::error::OrderingError;
use super::scope::OrderingScope;
use super::store::{OrderStore, WriteBatch};

/// Computes the sibling shifts needed to place `entity` at `target`.
///
/// The returned changes include the moved entity itself and touch only the
/// siblings strictly between the old and new position. An empty plan means
/// the entity is already there.
pub fn plan_move<T: Scoped>(
    scope: &OrderingScope<T>,
    entity: &OrderedEntity<T>,
    target: u32,
) -> Vec<OrderChange> {
    let current = entity.order();
    if target == current {
        return Vec::new();
    }

    let mut changes: Vec<OrderChange> = if target < current {
        scope
            .below_instance(entity)
            .above(target, true)
            .iter()
            .map(|sibling| OrderChange {
                id: sibling.id(),
                from: sibling.order(),
                to: sibling.order() + 1,
            })
            .collect()
    } else {
        scope
            .above_instance(entity)
            .below(target, true)
            .iter()
            .map(|sibling| OrderChange {
                id: sibling.id(),
                from: sibling.order(),
                to: sibling.order() - 1,
            })
            .collect()
    };

    changes.push(OrderChange {
        id: entity.id(),
        from: current,
        to: target,
    });
    changes
}

/// Algorithm layer over an [`OrderStore`]: the only code that writes order values.
pub struct OrderEngine<T, S> {
    store: Arc<S>,
    _marker: std::marker::PhantomData<fn() -> T>,
}

impl<T, S> Clone for OrderEngine<T, S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            _marker: std::marker::PhantomData,
        }
    }
}

impl<T, S> OrderEngine<T, S>
where
    T: Scoped,
    S: OrderStore<T> + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            _marker: std::marker::PhantomData,
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn get(&self, id: EntityId) -> Result<OrderedEntity<T>, OrderingError> {
        self.store
            .fetch(id)?
            .ok_or(OrderingError::NotFound { kind: T::KIND, id })
    }

    pub fn list_scope(&self, scope: T::Scope) -> Result<Vec<OrderedEntity<T>>, OrderingError> {
        Ok(self.store.list_scope(scope)?)
    }

    /// Move `id` to `target` within its scope, shifting the siblings in between.
    pub fn move_to(&self, id: EntityId, target: i64) -> Result<Reordering, OrderingError> {
        let reordering = self.with_entity_scope(id, |scope, batch, entity| {
            let min = scope.min_order().map_err(log_empty_scope::<T>(scope))?;
            let max = scope.max_order().map_err(log_empty_scope::<T>(scope))?;
            let target = match u32::try_from(target) {
                Ok(value) if value >= min && value <= max => value,
                _ => {
                    return Err(OrderingError::OutOfRange {
                        order: target,
                        min,
                        max,
                    })
                }
            };
            Ok(stage_move(scope, batch, entity, target, min))
        })?;

        if !reordering.is_empty() {
            info!(kind = T::KIND, %id, target, writes = reordering.changes.len(), "move committed");
        }
        Ok(reordering)
    }

    /// Move `id` to the head of its scope.
    pub fn top(&self, id: EntityId) -> Result<Reordering, OrderingError> {
        let reordering = self.with_entity_scope(id, |scope, batch, entity| {
            let min = scope.min_order().map_err(log_empty_scope::<T>(scope))?;
            Ok(stage_move(scope, batch, entity, min, min))
        })?;

        if !reordering.is_empty() {
            info!(kind = T::KIND, %id, "moved to top");
        }
        Ok(reordering)
    }

    /// Create a new entity at the end of its scope.
    pub fn append(
        &self,
        id: EntityId,
        value: T,
    ) -> Result<(OrderedEntity<T>, Reordering), OrderingError> {
        let scope_key = value.scope_key();
        let (created, reordering) = self.store.with_scope(scope_key, |scope, batch| {
            Ok::<_, OrderingError>(stage_append(scope, batch, id, value))
        })?;

        info!(kind = T::KIND, id = %created.id(), order = created.order(), scope = %scope_key, "appended");
        Ok((created, reordering))
    }

    /// Delete `id` and close the gap it leaves behind.
    pub fn remove(&self, id: EntityId) -> Result<(OrderedEntity<T>, Reordering), OrderingError> {
        let outcome = self.with_entity_scope(id, |scope, batch, entity| {
            let reordering = stage_removal(scope, batch, entity)?;
            Ok((entity.clone(), reordering))
        })?;

        info!(kind = T::KIND, %id, compacted = outcome.1.changes.len(), "removed");
        Ok(outcome)
    }

    /// Replace the payload of `id` without touching its position.
    ///
    /// A payload that names a different scope relocates the entity: it leaves
    /// its old scope (compacting it) and joins the end of the new one, keeping
    /// its id. Both scopes are locked together and commit as one unit.
    pub fn replace(&self, id: EntityId, value: T) -> Result<Replacement<T>, OrderingError> {
        let scope_key = self.get(id)?.scope_key();
        let new_scope = value.scope_key();

        if new_scope == scope_key {
            let updated = self.with_entity_scope(id, |_, batch, entity| {
                let mut entity = entity.clone();
                batch.replace(id, value.clone());
                entity.set_value(value.clone());
                Ok(entity)
            })?;
            return Ok(Replacement::InPlace(updated));
        }

        let (entity, vacated, joined) =
            self.store
                .with_scope_pair(scope_key, new_scope, |old, new| {
                    let current = locate(old.scope, id)?;
                    let vacated = stage_removal(old.scope, old.batch, current)?;
                    let (entity, joined) = stage_append(new.scope, new.batch, id, value);
                    Ok::<_, OrderingError>((entity, vacated, joined))
                })?;

        info!(kind = T::KIND, %id, from = %scope_key, to = %new_scope, "relocated");
        Ok(Replacement::Relocated {
            entity,
            vacated,
            joined,
        })
    }

    /// Run `work` against the locked scope that currently holds `id`.
    ///
    /// The scope key is read before the lock is taken, so a concurrent
    /// relocation can leave it stale; the lookup is then repeated once against
    /// the entity's new scope.
    fn with_entity_scope<R, F>(&self, id: EntityId, mut work: F) -> Result<R, OrderingError>
    where
        F: FnMut(&OrderingScope<T>, &mut WriteBatch<T>, &OrderedEntity<T>) -> Result<R, OrderingError>,
    {
        for _ in 0..2 {
            let scope_key = self.get(id)?.scope_key();
            let outcome = self.store.with_scope(scope_key, |scope, batch| match scope.get(id) {
                Some(entity) => work(scope, batch, entity).map(Some),
                None => Ok(None),
            })?;
            match outcome {
                Some(output) => return Ok(output),
                None => debug!(kind = T::KIND, %id, scope = %scope_key, "entity left its scope before the lock was taken"),
            }
        }
        Err(OrderingError::NotFound { kind: T::KIND, id })
    }
}

/// Result of [`OrderEngine::replace`].
#[derive(Debug, Clone)]
pub enum Replacement<T> {
    InPlace(OrderedEntity<T>),
    Relocated {
        entity: OrderedEntity<T>,
        vacated: Reordering,
        joined: Reordering,
    },
}

impl<T: Scoped> Replacement<T> {
    pub fn entity(&self) -> &OrderedEntity<T> {
        match self {
            Self::InPlace(entity) | Self::Relocated { entity, .. } => entity,
        }
    }
}

fn locate<T: Scoped>(
    scope: &OrderingScope<T>,
    id: EntityId,
) -> Result<&OrderedEntity<T>, OrderingError> {
    scope
        .get(id)
        .ok_or(OrderingError::NotFound { kind: T::KIND, id })
}

fn stage_move<T: Scoped>(
    scope: &OrderingScope<T>,
    batch: &mut WriteBatch<T>,
    entity: &OrderedEntity<T>,
    target: u32,
    top_order: u32,
) -> Reordering {
    let changes = plan_move(scope, entity, target);
    stage_changes(batch, &changes);
    debug!(kind = T::KIND, id = %entity.id(), target, shifted = changes.len(), "planned move");
    Reordering {
        changes,
        created: None,
        top_order,
    }
}

fn stage_append<T: Scoped>(
    scope: &OrderingScope<T>,
    batch: &mut WriteBatch<T>,
    id: EntityId,
    value: T,
) -> (OrderedEntity<T>, Reordering) {
    let order = scope.next_order();
    let top_order = scope.min_order().unwrap_or(order);
    let entity = OrderedEntity::new(id, order, value);
    batch.insert(entity.clone());
    let reordering = Reordering {
        changes: vec![OrderChange {
            id,
            from: order,
            to: order,
        }],
        created: Some(id),
        top_order,
    };
    (entity, reordering)
}

fn stage_removal<T: Scoped>(
    scope: &OrderingScope<T>,
    batch: &mut WriteBatch<T>,
    entity: &OrderedEntity<T>,
) -> Result<Reordering, OrderingError> {
    let top_order = scope.min_order().map_err(log_empty_scope::<T>(scope))?;
    let changes: Vec<OrderChange> = scope
        .above_instance(entity)
        .iter()
        .map(|sibling| OrderChange {
            id: sibling.id(),
            from: sibling.order(),
            to: sibling.order() - 1,
        })
        .collect();

    batch.remove(entity.id());
    stage_changes(batch, &changes);
    Ok(Reordering {
        changes,
        created: None,
        top_order,
    })
}

fn stage_changes<T: Scoped>(batch: &mut WriteBatch<T>, changes: &[OrderChange]) {
    for change in changes {
        batch.shift(change.id, change.from, change.to);
    }
}

fn log_empty_scope<T: Scoped>(
    scope: &OrderingScope<T>,
) -> impl FnOnce(OrderingError) -> OrderingError + '_ {
    move |err| {
        error!(kind = T::KIND, scope = %scope.key(), "ordered entity has no siblings in its own scope");
        err
    }
}
