//! League scheduling records that keep a strict order: applications per post,
//! divisions and levels per league, roles per division.

pub mod domain;
pub mod notifications;

pub use domain::{Application, Division, DivisionId, LeagueId, Level, PostId, Role, RoleId, UserId};
pub use notifications::{ApplicationNotification, ApplicationNotifier, NotificationSink};

use std::sync::Arc;

use axum::Router;

use crate::config::OrderingConfig;
use crate::ordering::{
    cast_route, ordering_router, MemoryOrderStore, OrderingService, SilentNotifier,
};

pub type ApplicationService<K> =
    OrderingService<Application, MemoryOrderStore<Application>, ApplicationNotifier<K>>;
pub type DivisionService = OrderingService<Division, MemoryOrderStore<Division>, SilentNotifier>;
pub type RoleService = OrderingService<Role, MemoryOrderStore<Role>, SilentNotifier>;
pub type LevelService = OrderingService<Level, MemoryOrderStore<Level>, SilentNotifier>;

/// The four ordered kinds wired to in-process stores.
pub struct LeagueServices<K> {
    pub applications: Arc<ApplicationService<K>>,
    pub divisions: Arc<DivisionService>,
    pub roles: Arc<RoleService>,
    pub levels: Arc<LevelService>,
}

impl<K> Clone for LeagueServices<K> {
    fn clone(&self) -> Self {
        Self {
            applications: Arc::clone(&self.applications),
            divisions: Arc::clone(&self.divisions),
            roles: Arc::clone(&self.roles),
            levels: Arc::clone(&self.levels),
        }
    }
}

impl<K: NotificationSink + 'static> LeagueServices<K> {
    pub fn in_memory(config: &OrderingConfig, sink: Arc<K>) -> Self {
        let timeout = config.scope_lock_timeout();
        let silent = Arc::new(SilentNotifier);

        Self {
            applications: Arc::new(OrderingService::new(
                Arc::new(MemoryOrderStore::new(timeout)),
                Arc::new(ApplicationNotifier::new(sink)),
            )),
            divisions: Arc::new(OrderingService::new(
                Arc::new(MemoryOrderStore::new(timeout)),
                silent.clone(),
            )),
            roles: Arc::new(OrderingService::new(
                Arc::new(MemoryOrderStore::new(timeout)),
                silent.clone(),
            )),
            levels: Arc::new(OrderingService::new(
                Arc::new(MemoryOrderStore::new(timeout)),
                silent,
            )),
        }
    }

    /// HTTP routes for every ordered kind plus the application cast action.
    pub fn router(&self) -> Router {
        ordering_router(self.applications.clone())
            .merge(cast_route(self.applications.clone()))
            .merge(ordering_router(self.divisions.clone()))
            .merge(ordering_router(self.roles.clone()))
            .merge(ordering_router(self.levels.clone()))
    }
}
