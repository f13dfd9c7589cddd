use super::common::*;
use crate::league::PostId;
use crate::ordering::scope::OrderingScope;
use crate::ordering::store::OrderStore;
use crate::ordering::{EntityId, OrderingError, RankStatus, RankStatusResolver};

fn snapshot(post: u64, count: u64) -> (OrderingScope<crate::league::Application>, Vec<EntityId>) {
    let (engine, store) = engine();
    let ids = seed(&engine, post, count);
    let scope = OrderingScope::new(PostId(post), store.list_scope(PostId(post)).expect("list"));
    (scope, ids)
}

#[test]
fn range_queries_respect_inclusivity() {
    let (scope, ids) = snapshot(1, 5);

    assert_eq!(scope.siblings().above(2, false).ids(), vec![ids[3], ids[4]]);
    assert_eq!(scope.siblings().above(2, true).ids(), vec![ids[2], ids[3], ids[4]]);
    assert_eq!(scope.siblings().below(2, false).ids(), vec![ids[0], ids[1]]);
    assert_eq!(scope.siblings().below(2, true).ids(), vec![ids[0], ids[1], ids[2]]);
    assert_eq!(
        scope.siblings().above(1, true).below(3, true).ids(),
        vec![ids[1], ids[2], ids[3]]
    );
    assert!(scope.siblings().above(4, false).is_empty());
    assert_eq!(scope.siblings().below(9, false).len(), 5);
}

#[test]
fn instance_queries_exclude_the_entity_itself() {
    let (scope, ids) = snapshot(2, 4);
    let second = scope.get(ids[1]).expect("member");

    assert_eq!(scope.above_instance(second).ids(), vec![ids[2], ids[3]]);
    assert_eq!(scope.below_instance(second).ids(), vec![ids[0]]);
    assert_eq!(scope.successor_of(second).map(|entity| entity.id()), Some(ids[2]));

    let last = scope.get(ids[3]).expect("member");
    assert!(scope.successor_of(last).is_none());
    assert!(scope.above_instance(last).is_empty());
}

#[test]
fn bounds_follow_the_snapshot() {
    let (scope, ids) = snapshot(3, 3);

    assert_eq!(scope.min_order(), Ok(0));
    assert_eq!(scope.max_order(), Ok(2));
    assert_eq!(scope.next_order(), 3);
    assert!(scope.is_contiguous());
    assert_eq!(scope.siblings().into_iter().count(), 3);

    let first = scope.first().expect("non-empty");
    assert_eq!(first.id(), ids[0]);
    assert_eq!(RankStatusResolver::is_top(&scope, first), Ok(true));
    assert_eq!(
        RankStatusResolver::status_of(&scope, scope.get(ids[2]).expect("member")),
        Ok(RankStatus::Backup)
    );
}

#[test]
fn empty_scope_has_no_bounds() {
    let scope: OrderingScope<crate::league::Application> = OrderingScope::new(PostId(4), Vec::new());

    assert!(scope.is_empty());
    assert_eq!(scope.min_order(), Err(OrderingError::EmptyScope));
    assert_eq!(scope.max_order(), Err(OrderingError::EmptyScope));
    assert_eq!(scope.next_order(), 0);
    assert!(scope.is_contiguous());
}
