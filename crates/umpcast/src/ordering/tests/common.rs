use std::sync::{Arc, Mutex};

use axum::response::Response;
use serde_json::Value;

use crate::league::{Application, PostId, UserId};
use crate::ordering::scope::OrderingScope;
use crate::ordering::service::{NotifyError, OrderingService, RankNotifier};
use crate::ordering::status::RankTransition;
use crate::ordering::store::{MemoryOrderStore, OrderStore, ScopeHandle, WriteBatch};
use crate::ordering::{EntityId, OrderEngine, OrderedEntity, StoreError};

pub(super) type MemoryStore = MemoryOrderStore<Application>;

pub(super) fn application(post: u64, user: u64) -> Application {
    Application {
        post: PostId(post),
        user: UserId(user),
        comments: None,
    }
}

pub(super) fn engine() -> (OrderEngine<Application, MemoryStore>, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::default());
    (OrderEngine::new(store.clone()), store)
}

/// Append `count` applications to `post`, ids `post * 100 + index`.
pub(super) fn seed<S: OrderStore<Application> + 'static>(
    engine: &OrderEngine<Application, S>,
    post: u64,
    count: u64,
) -> Vec<EntityId> {
    (0..count)
        .map(|index| {
            let id = EntityId(post * 100 + index);
            engine
                .append(id, application(post, index + 1))
                .expect("append succeeds");
            id
        })
        .collect()
}

/// Ids of `post` in committed order.
pub(super) fn ids_in_order<S: OrderStore<Application>>(store: &S, post: u64) -> Vec<EntityId> {
    store
        .list_scope(PostId(post))
        .expect("list succeeds")
        .iter()
        .map(OrderedEntity::id)
        .collect()
}

pub(super) fn order_of<S: OrderStore<Application>>(store: &S, id: EntityId) -> u32 {
    store
        .fetch(id)
        .expect("fetch succeeds")
        .expect("entity present")
        .order()
}

pub(super) fn assert_contiguous<S: OrderStore<Application>>(store: &S, post: u64) {
    let scope = OrderingScope::new(PostId(post), store.list_scope(PostId(post)).expect("list"));
    assert!(
        scope.is_contiguous(),
        "post {post} orders not contiguous: {:?}",
        scope
            .siblings()
            .iter()
            .map(|entity| (entity.id(), entity.order()))
            .collect::<Vec<_>>()
    );
}

#[derive(Default)]
pub(super) struct RecordingNotifier {
    events: Mutex<Vec<(EntityId, RankTransition)>>,
}

impl RecordingNotifier {
    pub(super) fn events(&self) -> Vec<(EntityId, RankTransition)> {
        self.events.lock().expect("notifier mutex poisoned").clone()
    }
}

impl RankNotifier<Application> for RecordingNotifier {
    fn rank_changed(
        &self,
        entity: &OrderedEntity<Application>,
        transition: &RankTransition,
    ) -> Result<(), NotifyError> {
        self.events
            .lock()
            .expect("notifier mutex poisoned")
            .push((entity.id(), *transition));
        Ok(())
    }
}

pub(super) struct BrokenNotifier;

impl RankNotifier<Application> for BrokenNotifier {
    fn rank_changed(
        &self,
        _entity: &OrderedEntity<Application>,
        _transition: &RankTransition,
    ) -> Result<(), NotifyError> {
        Err(NotifyError::Transport("mailer offline".to_string()))
    }
}

/// Store whose commits always fail after the work has staged its writes.
#[derive(Default)]
pub(super) struct RejectingStore {
    pub(super) inner: Arc<MemoryStore>,
}

impl OrderStore<Application> for RejectingStore {
    fn fetch(&self, id: EntityId) -> Result<Option<OrderedEntity<Application>>, StoreError> {
        self.inner.fetch(id)
    }

    fn list_scope(&self, scope: PostId) -> Result<Vec<OrderedEntity<Application>>, StoreError> {
        self.inner.list_scope(scope)
    }

    fn with_scope<R, E, F>(&self, scope: PostId, work: F) -> Result<R, E>
    where
        F: FnOnce(&OrderingScope<Application>, &mut WriteBatch<Application>) -> Result<R, E>,
        E: From<StoreError>,
    {
        self.inner.with_scope(scope, |snapshot, batch| {
            let output = work(snapshot, batch)?;
            if batch.is_empty() {
                return Ok(output);
            }
            Err(E::from(StoreError::Unavailable("commit rejected".to_string())))
        })
    }

    fn with_scope_pair<R, E, F>(&self, first: PostId, second: PostId, work: F) -> Result<R, E>
    where
        F: FnOnce(ScopeHandle<'_, Application>, ScopeHandle<'_, Application>) -> Result<R, E>,
        E: From<StoreError>,
    {
        self.inner.with_scope_pair(first, second, |left, right| {
            work(left, right)?;
            Err(E::from(StoreError::Unavailable("commit rejected".to_string())))
        })
    }
}

/// Store whose next `fetch` returns a queued, outdated copy of an entity.
pub(super) struct StaleReadStore {
    pub(super) inner: Arc<MemoryStore>,
    stale: Mutex<Option<OrderedEntity<Application>>>,
}

impl StaleReadStore {
    pub(super) fn new(inner: Arc<MemoryStore>) -> Self {
        Self {
            inner,
            stale: Mutex::new(None),
        }
    }

    pub(super) fn serve_once(&self, entity: OrderedEntity<Application>) {
        *self.stale.lock().expect("stale mutex poisoned") = Some(entity);
    }
}

impl OrderStore<Application> for StaleReadStore {
    fn fetch(&self, id: EntityId) -> Result<Option<OrderedEntity<Application>>, StoreError> {
        let queued = self.stale.lock().expect("stale mutex poisoned").take();
        match queued {
            Some(entity) if entity.id() == id => Ok(Some(entity)),
            _ => self.inner.fetch(id),
        }
    }

    fn list_scope(&self, scope: PostId) -> Result<Vec<OrderedEntity<Application>>, StoreError> {
        self.inner.list_scope(scope)
    }

    fn with_scope<R, E, F>(&self, scope: PostId, work: F) -> Result<R, E>
    where
        F: FnOnce(&OrderingScope<Application>, &mut WriteBatch<Application>) -> Result<R, E>,
        E: From<StoreError>,
    {
        self.inner.with_scope(scope, work)
    }

    fn with_scope_pair<R, E, F>(&self, first: PostId, second: PostId, work: F) -> Result<R, E>
    where
        F: FnOnce(ScopeHandle<'_, Application>, ScopeHandle<'_, Application>) -> Result<R, E>,
        E: From<StoreError>,
    {
        self.inner.with_scope_pair(first, second, work)
    }
}

pub(super) fn service_with<N: RankNotifier<Application> + 'static>(
    notifier: Arc<N>,
) -> (
    Arc<OrderingService<Application, MemoryStore, N>>,
    Arc<MemoryStore>,
) {
    let store = Arc::new(MemoryStore::default());
    (
        Arc::new(OrderingService::new(store.clone(), notifier)),
        store,
    )
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 4096)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
