use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use super::domain::{EntityId, OrderedEntity, Scoped};
use super::error::StoreError;
use super::scope::OrderingScope;

/// A single write staged against a scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StagedWrite<T> {
    Insert(OrderedEntity<T>),
    Shift { id: EntityId, from: u32, to: u32 },
    Replace { id: EntityId, value: T },
    Remove { id: EntityId },
}

/// Writes collected while a scope is locked; committed all together or not at all.
#[derive(Debug)]
pub struct WriteBatch<T: Scoped> {
    scope: T::Scope,
    writes: Vec<StagedWrite<T>>,
}

impl<T: Scoped> WriteBatch<T> {
    pub(crate) fn new(scope: T::Scope) -> Self {
        Self {
            scope,
            writes: Vec::new(),
        }
    }

    pub fn scope(&self) -> T::Scope {
        self.scope
    }

    pub fn writes(&self) -> &[StagedWrite<T>] {
        &self.writes
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    pub(crate) fn insert(&mut self, entity: OrderedEntity<T>) {
        self.writes.push(StagedWrite::Insert(entity));
    }

    pub(crate) fn shift(&mut self, id: EntityId, from: u32, to: u32) {
        self.writes.push(StagedWrite::Shift { id, from, to });
    }

    pub(crate) fn replace(&mut self, id: EntityId, value: T) {
        self.writes.push(StagedWrite::Replace { id, value });
    }

    pub(crate) fn remove(&mut self, id: EntityId) {
        self.writes.push(StagedWrite::Remove { id });
    }
}

/// Storage abstraction for ordered records so the engine can run against any backend.
///
/// `with_scope` is the only path that writes. Implementations must hold an
/// exclusive lock on `scope` for the whole call, hand `work` a snapshot taken
/// under that lock, and commit the staged batch atomically only when `work`
/// returns `Ok`. Operations on different scopes must not block each other.
pub trait OrderStore<T: Scoped>: Send + Sync {
    fn fetch(&self, id: EntityId) -> Result<Option<OrderedEntity<T>>, StoreError>;

    /// Committed siblings of `scope`, ascending by order.
    fn list_scope(&self, scope: T::Scope) -> Result<Vec<OrderedEntity<T>>, StoreError>;

    fn with_scope<R, E, F>(&self, scope: T::Scope, work: F) -> Result<R, E>
    where
        F: FnOnce(&OrderingScope<T>, &mut WriteBatch<T>) -> Result<R, E>,
        E: From<StoreError>;

    /// Like `with_scope`, but holds two distinct scopes at once and commits
    /// both batches as one unit. Locks are taken in ascending scope order.
    fn with_scope_pair<R, E, F>(&self, first: T::Scope, second: T::Scope, work: F) -> Result<R, E>
    where
        F: FnOnce(ScopeHandle<'_, T>, ScopeHandle<'_, T>) -> Result<R, E>,
        E: From<StoreError>;
}

/// A locked scope snapshot together with the batch staged against it.
pub struct ScopeHandle<'a, T: Scoped> {
    pub scope: &'a OrderingScope<T>,
    pub batch: &'a mut WriteBatch<T>,
}

pub const DEFAULT_SCOPE_LOCK_TIMEOUT: Duration = Duration::from_secs(2);

struct Rows<T: Scoped> {
    by_id: HashMap<EntityId, OrderedEntity<T>>,
    by_scope: HashMap<T::Scope, BTreeSet<EntityId>>,
}

impl<T: Scoped> Default for Rows<T> {
    fn default() -> Self {
        Self {
            by_id: HashMap::new(),
            by_scope: HashMap::new(),
        }
    }
}

impl<T: Scoped> Rows<T> {
    fn scope_members(&self, scope: T::Scope) -> Vec<OrderedEntity<T>> {
        self.by_scope
            .get(&scope)
            .into_iter()
            .flatten()
            .filter_map(|id| self.by_id.get(id).cloned())
            .collect()
    }
}

/// In-process order store with one exclusive lock per scope.
pub struct MemoryOrderStore<T: Scoped> {
    rows: Mutex<Rows<T>>,
    scope_locks: Mutex<HashMap<T::Scope, Arc<Mutex<()>>>>,
    lock_timeout: Duration,
    applied_writes: AtomicU64,
}

impl<T: Scoped> Default for MemoryOrderStore<T> {
    fn default() -> Self {
        Self::new(DEFAULT_SCOPE_LOCK_TIMEOUT)
    }
}

impl<T: Scoped> MemoryOrderStore<T> {
    pub fn new(lock_timeout: Duration) -> Self {
        Self {
            rows: Mutex::new(Rows::default()),
            scope_locks: Mutex::new(HashMap::new()),
            lock_timeout,
            applied_writes: AtomicU64::new(0),
        }
    }

    /// Total number of staged writes committed so far.
    pub fn applied_writes(&self) -> u64 {
        self.applied_writes.load(Ordering::Acquire)
    }

    /// Number of scopes that currently have a lock entry.
    pub fn tracked_scope_locks(&self) -> usize {
        self.scope_locks.lock().len()
    }

    fn scope_lock(&self, scope: T::Scope) -> Arc<Mutex<()>> {
        self.scope_locks.lock().entry(scope).or_default().clone()
    }

    /// Drop the lock entry of a scope that has no members and no other users.
    fn release_scope_lock(&self, scope: T::Scope, lock: Arc<Mutex<()>>) {
        let mut locks = self.scope_locks.lock();
        drop(lock);
        if self.rows.lock().by_scope.contains_key(&scope) {
            return;
        }
        if locks
            .get(&scope)
            .is_some_and(|entry| Arc::strong_count(entry) == 1)
        {
            locks.remove(&scope);
        }
    }

    fn snapshot(&self, scope: T::Scope) -> OrderingScope<T> {
        OrderingScope::new(scope, self.rows.lock().scope_members(scope))
    }

    /// Validate every batch against the current rows, then install them all
    /// in one critical section. Batches are staged in the given order, so an
    /// id removed by an earlier batch may be inserted by a later one.
    fn commit(&self, batches: Vec<WriteBatch<T>>) -> Result<(), StoreError> {
        if batches.iter().all(WriteBatch::is_empty) {
            return Ok(());
        }

        let mut rows = self.rows.lock();
        let mut released = BTreeSet::new();
        let mut staged_scopes = Vec::with_capacity(batches.len());
        let mut count = 0_u64;

        for batch in batches {
            count += batch.writes.len() as u64;
            let staged = stage_batch(&rows, batch, &released)?;
            released.extend(
                staged
                    .entries
                    .iter()
                    .filter(|(_, entity)| entity.is_none())
                    .map(|(id, _)| *id),
            );
            staged_scopes.push(staged);
        }

        for staged in staged_scopes {
            install(&mut rows, staged);
        }

        self.applied_writes.fetch_add(count, Ordering::AcqRel);
        Ok(())
    }
}

/// A scope's members after a batch was applied to a copy of them.
struct StagedScope<T: Scoped> {
    scope: T::Scope,
    entries: BTreeMap<EntityId, Option<OrderedEntity<T>>>,
}

fn stage_batch<T: Scoped>(
    rows: &Rows<T>,
    batch: WriteBatch<T>,
    released: &BTreeSet<EntityId>,
) -> Result<StagedScope<T>, StoreError> {
    let scope = batch.scope;

    // Stage on a copy of the scope so a rejected batch leaves rows untouched.
    let mut entries: BTreeMap<EntityId, Option<OrderedEntity<T>>> = rows
        .scope_members(scope)
        .into_iter()
        .map(|entity| (entity.id(), Some(entity)))
        .collect();

    for write in batch.writes {
        apply_write(rows, &mut entries, released, scope, write)?;
    }

    let mut orders: Vec<u32> = entries.values().flatten().map(OrderedEntity::order).collect();
    orders.sort_unstable();
    if orders
        .iter()
        .enumerate()
        .any(|(index, order)| *order as usize != index)
    {
        return Err(StoreError::Conflict(format!(
            "batch leaves scope {scope} non-contiguous"
        )));
    }

    Ok(StagedScope { scope, entries })
}

fn install<T: Scoped>(rows: &mut Rows<T>, staged: StagedScope<T>) {
    let StagedScope { scope, entries } = staged;
    let members = rows.by_scope.entry(scope).or_default();
    let mut removed = Vec::new();
    for (id, entity) in &entries {
        match entity {
            Some(_) => {
                members.insert(*id);
            }
            None => {
                members.remove(id);
                removed.push(*id);
            }
        }
    }
    if members.is_empty() {
        rows.by_scope.remove(&scope);
    }
    for id in removed {
        rows.by_id.remove(&id);
    }
    for (id, entity) in entries {
        if let Some(entity) = entity {
            rows.by_id.insert(id, entity);
        }
    }
}

fn apply_write<T: Scoped>(
    rows: &Rows<T>,
    staged: &mut BTreeMap<EntityId, Option<OrderedEntity<T>>>,
    released: &BTreeSet<EntityId>,
    scope: T::Scope,
    write: StagedWrite<T>,
) -> Result<(), StoreError> {
    match write {
        StagedWrite::Insert(entity) => {
            let id = entity.id();
            let stored = rows.by_id.contains_key(&id) && !released.contains(&id);
            if stored || matches!(staged.get(&id), Some(Some(_))) {
                return Err(StoreError::Conflict(format!("{} {id} already exists", T::KIND)));
            }
            if entity.scope_key() != scope {
                return Err(StoreError::Conflict(format!(
                    "{} {id} staged outside scope {scope}",
                    T::KIND
                )));
            }
            staged.insert(id, Some(entity));
        }
        StagedWrite::Shift { id, from, to } => {
            let entity = live_entry(staged, id)?;
            if entity.order() != from {
                return Err(StoreError::Conflict(format!(
                    "{} {id} expected at {from}, found at {}",
                    T::KIND,
                    entity.order()
                )));
            }
            entity.set_order(to);
        }
        StagedWrite::Replace { id, value } => {
            if value.scope_key() != scope {
                return Err(StoreError::Conflict(format!(
                    "replacement moves {} {id} out of scope {scope}",
                    T::KIND
                )));
            }
            live_entry(staged, id)?.set_value(value);
        }
        StagedWrite::Remove { id } => {
            live_entry(staged, id)?;
            staged.insert(id, None);
        }
    }
    Ok(())
}

fn live_entry<T: Scoped>(
    staged: &mut BTreeMap<EntityId, Option<OrderedEntity<T>>>,
    id: EntityId,
) -> Result<&mut OrderedEntity<T>, StoreError> {
    staged
        .get_mut(&id)
        .and_then(Option::as_mut)
        .ok_or_else(|| StoreError::Conflict(format!("{} {id} is not in scope", T::KIND)))
}

impl<T: Scoped> OrderStore<T> for MemoryOrderStore<T> {
    fn fetch(&self, id: EntityId) -> Result<Option<OrderedEntity<T>>, StoreError> {
        Ok(self.rows.lock().by_id.get(&id).cloned())
    }

    fn list_scope(&self, scope: T::Scope) -> Result<Vec<OrderedEntity<T>>, StoreError> {
        let mut siblings = self.rows.lock().scope_members(scope);
        siblings.sort_by_key(|entity| (entity.order(), entity.id()));
        Ok(siblings)
    }

    fn with_scope<R, E, F>(&self, scope: T::Scope, work: F) -> Result<R, E>
    where
        F: FnOnce(&OrderingScope<T>, &mut WriteBatch<T>) -> Result<R, E>,
        E: From<StoreError>,
    {
        let lock = self.scope_lock(scope);
        let outcome = (|| -> Result<R, E> {
            let _guard = lock
                .try_lock_for(self.lock_timeout)
                .ok_or(StoreError::LockTimeout)?;

            let snapshot = self.snapshot(scope);
            let mut batch = WriteBatch::new(scope);
            let output = work(&snapshot, &mut batch)?;
            self.commit(vec![batch])?;
            Ok(output)
        })();
        self.release_scope_lock(scope, lock);
        outcome
    }

    fn with_scope_pair<R, E, F>(&self, first: T::Scope, second: T::Scope, work: F) -> Result<R, E>
    where
        F: FnOnce(ScopeHandle<'_, T>, ScopeHandle<'_, T>) -> Result<R, E>,
        E: From<StoreError>,
    {
        if first == second {
            return Err(E::from(StoreError::Conflict(format!(
                "scope {first} cannot be paired with itself"
            ))));
        }

        let (low, high) = (first.min(second), first.max(second));
        let low_lock = self.scope_lock(low);
        let high_lock = self.scope_lock(high);
        let outcome = (|| -> Result<R, E> {
            let _low = low_lock
                .try_lock_for(self.lock_timeout)
                .ok_or(StoreError::LockTimeout)?;
            let _high = high_lock
                .try_lock_for(self.lock_timeout)
                .ok_or(StoreError::LockTimeout)?;

            let first_snapshot = self.snapshot(first);
            let second_snapshot = self.snapshot(second);
            let mut first_batch = WriteBatch::new(first);
            let mut second_batch = WriteBatch::new(second);
            let output = work(
                ScopeHandle {
                    scope: &first_snapshot,
                    batch: &mut first_batch,
                },
                ScopeHandle {
                    scope: &second_snapshot,
                    batch: &mut second_batch,
                },
            )?;
            self.commit(vec![first_batch, second_batch])?;
            Ok(output)
        })();
        self.release_scope_lock(high, high_lock);
        self.release_scope_lock(low, low_lock);
        outcome
    }
}
