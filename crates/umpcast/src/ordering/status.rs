use serde::Serialize;

use super::domain::{EntityId, OrderedEntity, Reordering, Scoped};
use super::error::OrderingError;
use super::scope::OrderingScope;

/// Derived rank of an entity inside its scope. Never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RankStatus {
    Casted,
    Backup,
}

impl RankStatus {
    pub const fn at(order: u32, top_order: u32) -> Self {
        if order == top_order {
            Self::Casted
        } else {
            Self::Backup
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Casted => "casted",
            Self::Backup => "backup",
        }
    }
}

/// An entity whose rank status differs from before an operation.
///
/// `before` is `None` for entities created by the operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RankTransition {
    pub id: EntityId,
    pub order: u32,
    pub before: Option<RankStatus>,
    pub after: RankStatus,
}

/// Stateless resolver for casted/backup status.
pub struct RankStatusResolver;

impl RankStatusResolver {
    /// True when `entity` holds the lowest order value in `scope`.
    pub fn is_top<T: Scoped>(
        scope: &OrderingScope<T>,
        entity: &OrderedEntity<T>,
    ) -> Result<bool, OrderingError> {
        Ok(entity.order() == scope.min_order()?)
    }

    pub fn status_of<T: Scoped>(
        scope: &OrderingScope<T>,
        entity: &OrderedEntity<T>,
    ) -> Result<RankStatus, OrderingError> {
        Ok(RankStatus::at(entity.order(), scope.min_order()?))
    }

    /// Status flips caused by a committed operation, in change order.
    pub fn transitions(reordering: &Reordering) -> Vec<RankTransition> {
        let top = reordering.top_order;
        reordering
            .changes
            .iter()
            .filter_map(|change| {
                let after = RankStatus::at(change.to, top);
                if reordering.created == Some(change.id) {
                    return Some(RankTransition {
                        id: change.id,
                        order: change.to,
                        before: None,
                        after,
                    });
                }

                let before = RankStatus::at(change.from, top);
                (before != after).then_some(RankTransition {
                    id: change.id,
                    order: change.to,
                    before: Some(before),
                    after,
                })
            })
            .collect()
    }
}

/// Public listing row: the entity plus its derived status.
#[derive(Debug, Clone, Serialize)]
pub struct RankedEntry<T> {
    pub status: RankStatus,
    #[serde(flatten)]
    pub entity: OrderedEntity<T>,
}

impl<T: Scoped> RankedEntry<T> {
    /// Pair every member of an ascending scope listing with its status.
    pub fn rank_all(siblings: Vec<OrderedEntity<T>>) -> Vec<Self> {
        let top = siblings.first().map(OrderedEntity::order);
        siblings
            .into_iter()
            .map(|entity| Self {
                status: RankStatus::at(entity.order(), top.unwrap_or(0)),
                entity,
            })
            .collect()
    }
}
