//! Review-due scanner.
//!
//! Periodically sweeps the review state store and publishes one reminder
//! event per learner with due items. The scanner only reads state and
//! publishes; persistence and push both happen downstream in the
//! notification consumer, so a reminder goes through the same dedupe as
//! every other notification (keyed by calendar date).

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use lingo_core::defaults::SCAN_INTERVAL_SECS;
use lingo_core::events::NotificationEvent;
use lingo_core::{Result, ReviewRepository};
use lingo_fabric::topology::NOTIFICATION_EXCHANGE;
use lingo_fabric::Broker;

/// Configuration for the review scanner.
#[derive(Debug, Clone)]
pub struct ScannerConfig {
    /// Time between scan passes.
    pub scan_interval: Duration,
    /// Whether scanning is enabled.
    pub enabled: bool,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            scan_interval: Duration::from_secs(SCAN_INTERVAL_SECS),
            enabled: true,
        }
    }
}

impl ScannerConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `REVIEW_SCAN_ENABLED` | `true` | Enable/disable the scanner |
    /// | `REVIEW_SCAN_INTERVAL_SECS` | `86400` | Seconds between passes |
    pub fn from_env() -> Self {
        let enabled = std::env::var("REVIEW_SCAN_ENABLED")
            .map(|v| v != "false" && v != "0")
            .unwrap_or(true);

        let scan_interval = std::env::var("REVIEW_SCAN_INTERVAL_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(SCAN_INTERVAL_SECS));

        Self {
            scan_interval,
            enabled,
        }
    }

    /// Set the scan interval.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.scan_interval = interval;
        self
    }
}

/// Handle for controlling a running scanner.
pub struct ScannerHandle {
    shutdown_tx: mpsc::Sender<()>,
    join: tokio::task::JoinHandle<()>,
}

impl ScannerHandle {
    /// Signal the scanner to shut down and wait for it to stop.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        let _ = self.join.await;
    }
}

pub struct ReviewScanner {
    reviews: Arc<dyn ReviewRepository>,
    broker: Broker,
    config: ScannerConfig,
}

impl ReviewScanner {
    pub fn new(reviews: Arc<dyn ReviewRepository>, broker: Broker, config: ScannerConfig) -> Self {
        Self {
            reviews,
            broker,
            config,
        }
    }

    /// Start the scan loop and return a handle for control.
    pub fn start(self) -> ScannerHandle {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel(1);
        let join = tokio::spawn(async move {
            if !self.config.enabled {
                info!("Review scanner is disabled, not starting");
                return;
            }
            info!(
                interval_secs = self.config.scan_interval.as_secs(),
                "Review scanner started"
            );

            let mut ticker = tokio::time::interval(self.config.scan_interval);
            // The immediate first tick would fire a reminder on every
            // restart; consume it.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        info!("Review scanner received shutdown signal");
                        break;
                    }
                    _ = ticker.tick() => {
                        if let Err(e) = self.scan_once(Utc::now()).await {
                            warn!(error = %e, "Scan pass failed");
                        }
                    }
                }
            }

            info!("Review scanner stopped");
        });
        ScannerHandle { shutdown_tx, join }
    }

    /// One scan pass at a fixed instant. Returns the number of learners a
    /// reminder was published for. One learner's failure never blocks the
    /// rest of the pass.
    pub async fn scan_once(&self, now: DateTime<Utc>) -> Result<usize> {
        let users = self.reviews.users_with_due_items(now).await?;
        debug!(user_count = users.len(), "Scanning users with due reviews");

        let mut notified = 0usize;
        for user_id in users {
            match self.remind_user(user_id, now).await {
                Ok(true) => notified += 1,
                Ok(false) => {}
                Err(e) => {
                    warn!(user_id = %user_id, error = %e, "Reminder failed for user");
                }
            }
        }

        info!(notified, "Scan pass complete");
        Ok(notified)
    }

    async fn remind_user(&self, user_id: uuid::Uuid, now: DateTime<Utc>) -> Result<bool> {
        let due_count = self.reviews.due_count(user_id, now).await?;
        if due_count == 0 {
            // Raced with a review submission between the two queries.
            return Ok(false);
        }

        let event = NotificationEvent::ReviewReminder {
            recipient_id: user_id,
            due_count,
        };
        self.broker
            .publish(NOTIFICATION_EXCHANGE, event.routing_key(), &event)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::FakeReviews;
    use chrono::Duration as ChronoDuration;
    use lingo_core::ReviewState;
    use lingo_fabric::topology::{declare_topology, NOTIFICATION_QUEUE};
    use uuid::Uuid;

    fn due_state(user_id: Uuid, now: DateTime<Utc>, hours_ago: i64) -> ReviewState {
        ReviewState {
            user_id,
            vocabulary_id: Uuid::new_v4(),
            ease_factor: 2.5,
            interval_days: 6,
            repetition_count: 2,
            next_review_at: Some(now - ChronoDuration::hours(hours_ago)),
        }
    }

    fn scanner(reviews: Arc<FakeReviews>) -> (Broker, ReviewScanner) {
        let broker = Broker::new();
        declare_topology(&broker).unwrap();
        let scanner = ReviewScanner::new(reviews, broker.clone(), ScannerConfig::default());
        (broker, scanner)
    }

    #[tokio::test]
    async fn test_publishes_per_user_due_counts() {
        let reviews = Arc::new(FakeReviews::default());
        let now = Utc::now();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        reviews.set(due_state(alice, now, 1));
        reviews.set(due_state(alice, now, 2));
        reviews.set(due_state(bob, now, 3));
        // Not yet due; must not count.
        let mut future = due_state(bob, now, 0);
        future.next_review_at = Some(now + ChronoDuration::hours(5));
        reviews.set(future);

        let (broker, scanner) = scanner(reviews);
        let mut queue = broker.consumer(NOTIFICATION_QUEUE).unwrap();

        let notified = scanner.scan_once(now).await.unwrap();
        assert_eq!(notified, 2);

        let mut counts = std::collections::HashMap::new();
        for _ in 0..2 {
            let delivery = queue.recv().await.unwrap();
            let event: NotificationEvent = delivery.envelope.decode().unwrap();
            match event {
                NotificationEvent::ReviewReminder {
                    recipient_id,
                    due_count,
                } => {
                    counts.insert(recipient_id, due_count);
                }
                other => panic!("unexpected event: {other:?}"),
            }
            delivery.ack();
        }
        assert_eq!(counts[&alice], 2);
        assert_eq!(counts[&bob], 1);
    }

    #[tokio::test]
    async fn test_no_due_items_publishes_nothing() {
        let reviews = Arc::new(FakeReviews::default());
        let (broker, scanner) = scanner(reviews);
        let mut queue = broker.consumer(NOTIFICATION_QUEUE).unwrap();

        let notified = scanner.scan_once(Utc::now()).await.unwrap();
        assert_eq!(notified, 0);
        assert!(queue.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_one_failing_user_does_not_block_others() {
        let reviews = Arc::new(FakeReviews::default());
        let now = Utc::now();
        let failing = Uuid::new_v4();
        let healthy = Uuid::new_v4();
        reviews.set(due_state(failing, now, 1));
        reviews.set(due_state(healthy, now, 1));
        reviews.failing_users.lock().unwrap().push(failing);

        let (broker, scanner) = scanner(reviews);
        let mut queue = broker.consumer(NOTIFICATION_QUEUE).unwrap();

        let notified = scanner.scan_once(now).await.unwrap();
        assert_eq!(notified, 1);

        let delivery = queue.recv().await.unwrap();
        let event: NotificationEvent = delivery.envelope.decode().unwrap();
        assert_eq!(event.recipient_id(), healthy);
        delivery.ack();
    }

    #[test]
    fn test_scanner_config_default() {
        let config = ScannerConfig::default();
        assert_eq!(config.scan_interval.as_secs(), SCAN_INTERVAL_SECS);
        assert!(config.enabled);
    }

    #[test]
    fn test_scanner_config_with_interval() {
        let config = ScannerConfig::default().with_interval(Duration::from_secs(60));
        assert_eq!(config.scan_interval.as_secs(), 60);
    }
}
