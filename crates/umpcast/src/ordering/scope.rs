use super::domain::{EntityId, OrderedEntity, Scoped};
use super::error::OrderingError;

/// Ascending snapshot of one scope's siblings.
///
/// Snapshots are taken while the scope lock is held, so every range query made
/// against one reflects a single committed state of the scope.
#[derive(Debug, Clone)]
pub struct OrderingScope<T: Scoped> {
    key: T::Scope,
    siblings: Vec<OrderedEntity<T>>,
}

impl<T: Scoped> OrderingScope<T> {
    pub(crate) fn new(key: T::Scope, mut siblings: Vec<OrderedEntity<T>>) -> Self {
        siblings.sort_by_key(|entity| (entity.order(), entity.id()));
        Self { key, siblings }
    }

    pub fn key(&self) -> T::Scope {
        self.key
    }

    pub fn siblings(&self) -> SiblingSlice<'_, T> {
        SiblingSlice {
            items: &self.siblings,
        }
    }

    pub fn len(&self) -> usize {
        self.siblings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.siblings.is_empty()
    }

    pub fn get(&self, id: EntityId) -> Option<&OrderedEntity<T>> {
        self.siblings.iter().find(|entity| entity.id() == id)
    }

    pub fn min_order(&self) -> Result<u32, OrderingError> {
        self.siblings
            .first()
            .map(OrderedEntity::order)
            .ok_or(OrderingError::EmptyScope)
    }

    pub fn max_order(&self) -> Result<u32, OrderingError> {
        self.siblings
            .last()
            .map(OrderedEntity::order)
            .ok_or(OrderingError::EmptyScope)
    }

    /// Order value a newly created sibling receives.
    pub fn next_order(&self) -> u32 {
        self.siblings.last().map_or(0, |entity| entity.order() + 1)
    }

    pub fn first(&self) -> Option<&OrderedEntity<T>> {
        self.siblings.first()
    }

    /// Siblings with an order strictly greater than `entity`'s.
    pub fn above_instance(&self, entity: &OrderedEntity<T>) -> SiblingSlice<'_, T> {
        self.siblings().above(entity.order(), false)
    }

    /// Siblings with an order strictly less than `entity`'s.
    pub fn below_instance(&self, entity: &OrderedEntity<T>) -> SiblingSlice<'_, T> {
        self.siblings().below(entity.order(), false)
    }

    /// The sibling ranked immediately after `entity`, if any.
    pub fn successor_of(&self, entity: &OrderedEntity<T>) -> Option<&OrderedEntity<T>> {
        self.above_instance(entity).items.first()
    }

    /// True when the order values are exactly `0..len` with no duplicates.
    pub fn is_contiguous(&self) -> bool {
        self.siblings
            .iter()
            .enumerate()
            .all(|(index, entity)| entity.order() as usize == index)
    }
}

/// Contiguous run of a scope snapshot, still in ascending order.
#[derive(Debug)]
pub struct SiblingSlice<'a, T: Scoped> {
    items: &'a [OrderedEntity<T>],
}

impl<T: Scoped> Clone for SiblingSlice<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: Scoped> Copy for SiblingSlice<'_, T> {}

impl<'a, T: Scoped> SiblingSlice<'a, T> {
    /// Members with `order > bound`, or `order >= bound` when inclusive.
    pub fn above(self, bound: u32, inclusive: bool) -> Self {
        let start = self.items.partition_point(|entity| {
            if inclusive {
                entity.order() < bound
            } else {
                entity.order() <= bound
            }
        });
        Self {
            items: &self.items[start..],
        }
    }

    /// Members with `order < bound`, or `order <= bound` when inclusive.
    pub fn below(self, bound: u32, inclusive: bool) -> Self {
        let end = self.items.partition_point(|entity| {
            if inclusive {
                entity.order() <= bound
            } else {
                entity.order() < bound
            }
        });
        Self {
            items: &self.items[..end],
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'a, OrderedEntity<T>> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn ids(&self) -> Vec<EntityId> {
        self.items.iter().map(OrderedEntity::id).collect()
    }

    pub fn to_vec(&self) -> Vec<OrderedEntity<T>> {
        self.items.to_vec()
    }
}

impl<'a, T: Scoped> IntoIterator for SiblingSlice<'a, T> {
    type Item = &'a OrderedEntity<T>;
    type IntoIter = std::slice::Iter<'a, OrderedEntity<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
