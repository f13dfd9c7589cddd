use std::sync::{Arc, Mutex};

use umpcast::config::OrderingConfig;
use umpcast::league::{
    Application, ApplicationNotification, LeagueServices, Level, PostId, RoleId, UserId,
};
use umpcast::ordering::{EntityId, NotifyError, OrderingError, RankStatus};

#[derive(Default)]
struct Outbox {
    sent: Mutex<Vec<ApplicationNotification>>,
}

impl Outbox {
    fn drain(&self) -> Vec<ApplicationNotification> {
        std::mem::take(&mut *self.sent.lock().expect("outbox mutex poisoned"))
    }
}

impl umpcast::league::NotificationSink for Outbox {
    fn deliver(&self, notification: ApplicationNotification) -> Result<(), NotifyError> {
        self.sent
            .lock()
            .expect("outbox mutex poisoned")
            .push(notification);
        Ok(())
    }
}

fn apply(services: &LeagueServices<Outbox>, post: u64, user: u64) -> EntityId {
    services
        .applications
        .create(Application {
            post: PostId(post),
            user: UserId(user),
            comments: None,
        })
        .expect("application accepted")
        .id()
}

fn statuses(services: &LeagueServices<Outbox>, post: u64) -> Vec<(EntityId, RankStatus)> {
    services
        .applications
        .list_scope(PostId(post))
        .expect("listing succeeds")
        .into_iter()
        .map(|entry| (entry.entity.id(), entry.status))
        .collect()
}

#[test]
fn casting_a_backup_demotes_the_current_umpire() {
    let outbox = Arc::new(Outbox::default());
    let services = LeagueServices::in_memory(&OrderingConfig::default(), outbox.clone());

    let a = apply(&services, 1, 11);
    let b = apply(&services, 1, 12);
    let c = apply(&services, 1, 13);

    let created = outbox.drain();
    assert_eq!(created.len(), 3, "each new application is told its status");
    assert_eq!(created[0].status, RankStatus::Casted);
    assert_eq!(created[0].subject, "Casted for post 1");
    assert!(created[1..]
        .iter()
        .all(|note| note.status == RankStatus::Backup));

    services
        .applications
        .handle_move(c, &serde_json::json!({ "order": 0 }))
        .expect("move succeeds");

    assert_eq!(
        statuses(&services, 1),
        vec![
            (c, RankStatus::Casted),
            (a, RankStatus::Backup),
            (b, RankStatus::Backup),
        ]
    );

    let mut moved = outbox.drain();
    moved.sort_by_key(|note| note.application);
    assert_eq!(moved.len(), 2, "only the two flipped umpires hear about it");
    assert_eq!(moved[0].application, a);
    assert_eq!(moved[0].user, UserId(11));
    assert_eq!(moved[0].message, "You are currently now a backup for post 1");
    assert_eq!(moved[1].application, c);
    assert_eq!(moved[1].message, "You are currently now casted for post 1");
}

#[test]
fn withdrawing_the_casted_umpire_promotes_the_first_backup() {
    let outbox = Arc::new(Outbox::default());
    let services = LeagueServices::in_memory(&OrderingConfig::default(), outbox.clone());
    let a = apply(&services, 2, 1);
    let b = apply(&services, 2, 2);
    let c = apply(&services, 2, 3);
    outbox.drain();

    services.applications.delete(a).expect("delete succeeds");

    assert_eq!(
        statuses(&services, 2),
        vec![(b, RankStatus::Casted), (c, RankStatus::Backup)]
    );
    let promoted = outbox.drain();
    assert_eq!(promoted.len(), 1);
    assert_eq!(promoted[0].application, b);
    assert!(matches!(
        services.applications.get(a),
        Err(OrderingError::NotFound { .. })
    ));
}

#[test]
fn posts_rank_independently() {
    let outbox = Arc::new(Outbox::default());
    let services = LeagueServices::in_memory(&OrderingConfig::default(), outbox.clone());
    let first_post = [apply(&services, 3, 1), apply(&services, 3, 2)];
    let second_post = [apply(&services, 4, 1), apply(&services, 4, 2)];

    services
        .applications
        .cast(first_post[1])
        .expect("cast succeeds");

    assert_eq!(
        statuses(&services, 4),
        vec![
            (second_post[0], RankStatus::Casted),
            (second_post[1], RankStatus::Backup),
        ]
    );
    assert_eq!(statuses(&services, 3)[0], (first_post[1], RankStatus::Casted));
}

#[test]
fn levels_keep_their_visibilities_through_reorders() {
    let outbox = Arc::new(Outbox::default());
    let services = LeagueServices::in_memory(&OrderingConfig::default(), outbox);
    let league = umpcast::league::LeagueId(9);

    let rookie = services
        .levels
        .create(Level {
            league,
            title: "Rookie".to_string(),
            visibilities: vec![RoleId(1)],
        })
        .expect("level created");
    let veteran = services
        .levels
        .create(Level {
            league,
            title: "Veteran".to_string(),
            visibilities: vec![RoleId(1), RoleId(2)],
        })
        .expect("level created");

    services
        .levels
        .move_to(veteran.id(), 0)
        .expect("move succeeds");

    let listing = services.levels.list_scope(league).expect("listing succeeds");
    assert_eq!(listing[0].entity.value().title, "Veteran");
    assert_eq!(listing[0].entity.value().visibilities, vec![RoleId(1), RoleId(2)]);
    assert_eq!(listing[1].entity.id(), rookie.id());
    assert_eq!(listing[1].entity.order(), 1);
}
