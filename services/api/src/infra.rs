use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use tracing::info;
use umpcast::league::{ApplicationNotification, NotificationSink};
use umpcast::ordering::NotifyError;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) notifications: Arc<InMemoryNotificationLog>,
}

/// Keeps every delivered casting notice in memory, newest last.
#[derive(Default, Clone)]
pub(crate) struct InMemoryNotificationLog {
    entries: Arc<Mutex<Vec<ApplicationNotification>>>,
}

impl NotificationSink for InMemoryNotificationLog {
    fn deliver(&self, notification: ApplicationNotification) -> Result<(), NotifyError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|_| NotifyError::Transport("notification log poisoned".to_string()))?;
        info!(
            application = %notification.application,
            post = %notification.post,
            status = notification.status.label(),
            "application notification recorded"
        );
        guard.push(notification);
        Ok(())
    }
}

impl InMemoryNotificationLog {
    pub(crate) fn entries(&self) -> Vec<ApplicationNotification> {
        self.entries
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}
