#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use sarpras_api::{
    config::AppConfig,
    db,
    events::{self, EventSender},
    notifications::{NotificationError, NotificationSender},
    AppState,
};
use tokio::sync::mpsc;

/// One captured outbound notification.
#[derive(Debug, Clone)]
pub struct SentNotification {
    pub to: String,
    pub subject: String,
    pub status: String,
    pub reason: Option<String>,
}

/// Notification transport that records every send and can be told to fail.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<SentNotification>>,
    fail: AtomicBool,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<SentNotification> {
        self.sent.lock().expect("notifier lock").clone()
    }

    pub fn fail_next_sends(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl NotificationSender for RecordingNotifier {
    async fn send(
        &self,
        to: &str,
        subject: &str,
        status: &str,
        reason: Option<&str>,
    ) -> Result<(), NotificationError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(NotificationError::Delivery(
                "simulated outage".to_string(),
            ));
        }
        self.sent.lock().expect("notifier lock").push(SentNotification {
            to: to.to_string(),
            subject: subject.to_string(),
            status: status.to_string(),
            reason: reason.map(str::to_string),
        });
        Ok(())
    }
}

/// Helper harness for spinning up an application state backed by an
/// in-memory SQLite database. A single pooled connection keeps the
/// database alive and pinned for the lifetime of the harness.
pub struct TestApp {
    pub state: AppState,
    pub notifier: Arc<RecordingNotifier>,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    /// Construct a new test application with fresh database state.
    pub async fn new() -> Self {
        let mut cfg = AppConfig::new("sqlite::memory:".to_string(), "test".to_string());
        cfg.auto_migrate = true;
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");

        let db_arc = Arc::new(pool);
        let (event_tx, event_rx) = mpsc::channel(256);
        let event_sender = EventSender::new(event_tx);
        let event_task = tokio::spawn(events::process_events(event_rx));

        let notifier = Arc::new(RecordingNotifier::default());
        let state = AppState::new(db_arc, cfg, event_sender, notifier.clone());

        Self {
            state,
            notifier,
            _event_task: event_task,
        }
    }

    /// Waits until at least `count` notifications were recorded. Panics
    /// after a second: notification dispatch is async but local, so
    /// anything slower than that is a bug.
    pub async fn wait_for_notifications(&self, count: usize) -> Vec<SentNotification> {
        for _ in 0..100 {
            let sent = self.notifier.sent();
            if sent.len() >= count {
                return sent;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!(
            "expected at least {} notifications, saw {:?}",
            count,
            self.notifier.sent()
        );
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self._event_task.abort();
    }
}
