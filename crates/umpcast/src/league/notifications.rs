use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::domain::{Application, PostId, UserId};
use crate::ordering::{EntityId, NotifyError, OrderedEntity, RankNotifier, RankStatus, RankTransition};

const SUBJECT_LIMIT: usize = 64;
const MESSAGE_LIMIT: usize = 256;

/// Message telling an umpire whether they are casted or a backup for a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplicationNotification {
    pub application: EntityId,
    pub post: PostId,
    pub user: UserId,
    pub status: RankStatus,
    pub subject: String,
    pub message: String,
    pub notification_date_time: DateTime<Utc>,
}

impl ApplicationNotification {
    pub fn new(
        application: &OrderedEntity<Application>,
        status: RankStatus,
        at: DateTime<Utc>,
    ) -> Self {
        let post = application.value().post;
        let (subject, message) = match status {
            RankStatus::Casted => (
                format!("Casted for post {post}"),
                format!("You are currently now casted for post {post}"),
            ),
            RankStatus::Backup => (
                format!("Backup for post {post}"),
                format!("You are currently now a backup for post {post}"),
            ),
        };

        Self {
            application: application.id(),
            post,
            user: application.value().user,
            status,
            subject: truncate(subject, SUBJECT_LIMIT),
            message: truncate(message, MESSAGE_LIMIT),
            notification_date_time: at,
        }
    }
}

fn truncate(text: String, limit: usize) -> String {
    if text.chars().count() <= limit {
        text
    } else {
        text.chars().take(limit).collect()
    }
}

/// Delivery boundary for application notifications (in-app feed, e-mail, ...).
pub trait NotificationSink: Send + Sync {
    fn deliver(&self, notification: ApplicationNotification) -> Result<(), NotifyError>;
}

/// Turns application rank transitions into casted/backup notifications.
pub struct ApplicationNotifier<K> {
    sink: Arc<K>,
}

impl<K: NotificationSink> ApplicationNotifier<K> {
    pub fn new(sink: Arc<K>) -> Self {
        Self { sink }
    }
}

impl<K: NotificationSink> RankNotifier<Application> for ApplicationNotifier<K> {
    fn rank_changed(
        &self,
        entity: &OrderedEntity<Application>,
        transition: &RankTransition,
    ) -> Result<(), NotifyError> {
        self.sink.deliver(ApplicationNotification::new(
            entity,
            transition.after,
            Utc::now(),
        ))
    }
}
