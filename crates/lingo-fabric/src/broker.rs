//! In-process topic broker: exchanges, queues, bindings, and at-least-once
//! delivery.
//!
//! Producers publish to a named exchange with a routing key and never block
//! on consumer processing. Each bound queue buffers messages until its
//! consumer acknowledges them. A message that is nacked (or whose
//! [`Delivery`] is dropped without an ack, e.g. when a handler panics) is
//! requeued, up to a bounded number of attempts, after which it is
//! dead-lettered. Consumers must therefore tolerate duplicates.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value as JsonValue;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;

use lingo_core::defaults::MAX_DELIVERY_ATTEMPTS;
use lingo_core::{Error, Result};

use crate::routing::topic_matches;

/// A message in flight on the fabric.
#[derive(Debug, Clone)]
pub struct Envelope {
    /// Unique message identifier (UUIDv7 for temporal ordering).
    pub message_id: Uuid,
    /// Routing key the producer published with.
    pub routing_key: String,
    /// JSON-encoded event payload.
    pub payload: JsonValue,
    /// When the message was published (UTC).
    pub published_at: DateTime<Utc>,
}

impl Envelope {
    /// Decode the payload into a typed event.
    pub fn decode<T: serde::de::DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(self.payload.clone()).map_err(Into::into)
    }
}

struct QueueItem {
    envelope: Envelope,
    attempt: u32,
}

struct QueueState {
    tx: mpsc::UnboundedSender<QueueItem>,
    /// Taken exactly once by the queue's consumer.
    rx: Option<mpsc::UnboundedReceiver<QueueItem>>,
    dead_letters: Arc<Mutex<Vec<Envelope>>>,
}

struct Binding {
    pattern: String,
    queue: String,
}

#[derive(Default)]
struct BrokerInner {
    exchanges: HashMap<String, Vec<Binding>>,
    queues: HashMap<String, QueueState>,
}

/// Topic-based publish/subscribe broker.
///
/// Constructed once at startup and handed to every producer and consumer;
/// an owned resource, not an ambient singleton. Cloning shares the broker.
#[derive(Clone, Default)]
pub struct Broker {
    inner: Arc<Mutex<BrokerInner>>,
}

impl Broker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a topic exchange. Idempotent.
    pub fn declare_exchange(&self, name: &str) {
        let mut inner = self.inner.lock().expect("broker lock poisoned");
        inner.exchanges.entry(name.to_string()).or_default();
    }

    /// Declare a queue. Idempotent; redeclaring keeps the existing buffer.
    pub fn declare_queue(&self, name: &str) {
        let mut inner = self.inner.lock().expect("broker lock poisoned");
        inner.queues.entry(name.to_string()).or_insert_with(|| {
            let (tx, rx) = mpsc::unbounded_channel();
            QueueState {
                tx,
                rx: Some(rx),
                dead_letters: Arc::new(Mutex::new(Vec::new())),
            }
        });
    }

    /// Bind a queue to an exchange with a routing-key pattern.
    pub fn bind(&self, exchange: &str, queue: &str, pattern: &str) -> Result<()> {
        let mut inner = self.inner.lock().expect("broker lock poisoned");
        if !inner.queues.contains_key(queue) {
            return Err(Error::Fabric(format!("unknown queue: {queue}")));
        }
        let bindings = inner
            .exchanges
            .get_mut(exchange)
            .ok_or_else(|| Error::Fabric(format!("unknown exchange: {exchange}")))?;
        bindings.push(Binding {
            pattern: pattern.to_string(),
            queue: queue.to_string(),
        });
        Ok(())
    }

    /// Publish an event to an exchange. Fire-and-forget: enqueues on every
    /// matching bound queue and returns without waiting for consumers. A
    /// routing key matching no binding is logged and dropped.
    pub fn publish<T: Serialize>(&self, exchange: &str, routing_key: &str, event: &T) -> Result<()> {
        let payload = serde_json::to_value(event)?;
        let envelope = Envelope {
            message_id: Uuid::now_v7(),
            routing_key: routing_key.to_string(),
            payload,
            published_at: Utc::now(),
        };

        let inner = self.inner.lock().expect("broker lock poisoned");
        let bindings = inner
            .exchanges
            .get(exchange)
            .ok_or_else(|| Error::Fabric(format!("unknown exchange: {exchange}")))?;

        let mut matched = 0usize;
        for binding in bindings {
            if topic_matches(&binding.pattern, routing_key) {
                if let Some(queue) = inner.queues.get(&binding.queue) {
                    let _ = queue.tx.send(QueueItem {
                        envelope: envelope.clone(),
                        attempt: 1,
                    });
                    matched += 1;
                }
            }
        }

        if matched == 0 {
            debug!(
                exchange,
                routing_key,
                message_id = %envelope.message_id,
                "No binding matched, message dropped"
            );
        } else {
            debug!(
                exchange,
                routing_key,
                message_id = %envelope.message_id,
                queues = matched,
                "Published message"
            );
        }
        Ok(())
    }

    /// Take the consumer side of a queue. Each queue has exactly one
    /// consumer; a second call is an error.
    pub fn consumer(&self, queue: &str) -> Result<QueueConsumer> {
        let mut inner = self.inner.lock().expect("broker lock poisoned");
        let state = inner
            .queues
            .get_mut(queue)
            .ok_or_else(|| Error::Fabric(format!("unknown queue: {queue}")))?;
        let rx = state
            .rx
            .take()
            .ok_or_else(|| Error::Fabric(format!("queue already consumed: {queue}")))?;
        Ok(QueueConsumer {
            queue: queue.to_string(),
            rx,
            requeue_tx: state.tx.clone(),
            dead_letters: state.dead_letters.clone(),
        })
    }

    /// Messages dead-lettered from a queue after exhausting redelivery.
    /// Primarily an operator/test inspection surface.
    pub fn dead_letters(&self, queue: &str) -> Vec<Envelope> {
        let inner = self.inner.lock().expect("broker lock poisoned");
        inner
            .queues
            .get(queue)
            .map(|q| q.dead_letters.lock().expect("dead-letter lock poisoned").clone())
            .unwrap_or_default()
    }
}

/// Consumer handle for one queue. Messages are processed sequentially per
/// queue; independent queues drain concurrently on their own workers.
pub struct QueueConsumer {
    queue: String,
    rx: mpsc::UnboundedReceiver<QueueItem>,
    requeue_tx: mpsc::UnboundedSender<QueueItem>,
    dead_letters: Arc<Mutex<Vec<Envelope>>>,
}

impl QueueConsumer {
    /// Queue this consumer drains.
    pub fn queue(&self) -> &str {
        &self.queue
    }

    /// Wait for the next delivery. Returns `None` when the broker is gone.
    pub async fn recv(&mut self) -> Option<Delivery> {
        let item = self.rx.recv().await?;
        Some(Delivery {
            envelope: item.envelope,
            attempt: item.attempt,
            queue: self.queue.clone(),
            requeue_tx: Some(self.requeue_tx.clone()),
            dead_letters: self.dead_letters.clone(),
            settled: false,
        })
    }

    /// Non-blocking variant of [`recv`](Self::recv) for drain loops.
    pub fn try_recv(&mut self) -> Option<Delivery> {
        let item = self.rx.try_recv().ok()?;
        Some(Delivery {
            envelope: item.envelope,
            attempt: item.attempt,
            queue: self.queue.clone(),
            requeue_tx: Some(self.requeue_tx.clone()),
            dead_letters: self.dead_letters.clone(),
            settled: false,
        })
    }
}

/// One delivery of a message to a consumer.
///
/// Must be settled with [`ack`](Self::ack) after successful processing or
/// [`nack`](Self::nack) to request redelivery. Dropping an unsettled
/// delivery nacks implicitly, so a crashed handler never silently loses a
/// message.
pub struct Delivery {
    pub envelope: Envelope,
    /// 1-based delivery attempt; `> 1` means redelivered.
    pub attempt: u32,
    queue: String,
    requeue_tx: Option<mpsc::UnboundedSender<QueueItem>>,
    dead_letters: Arc<Mutex<Vec<Envelope>>>,
    settled: bool,
}

impl Delivery {
    /// True when this message has been delivered before.
    pub fn redelivered(&self) -> bool {
        self.attempt > 1
    }

    /// Acknowledge successful processing; the message is done.
    pub fn ack(mut self) {
        self.settled = true;
    }

    /// Reject processing and request redelivery. After
    /// [`MAX_DELIVERY_ATTEMPTS`] the message is dead-lettered instead.
    pub fn nack(mut self) {
        self.settled = true;
        self.requeue();
    }

    fn requeue(&mut self) {
        let Some(tx) = self.requeue_tx.take() else {
            return;
        };
        if self.attempt >= MAX_DELIVERY_ATTEMPTS {
            warn!(
                queue = %self.queue,
                message_id = %self.envelope.message_id,
                routing_key = %self.envelope.routing_key,
                attempts = self.attempt,
                "Delivery attempts exhausted, dead-lettering message"
            );
            self.dead_letters
                .lock()
                .expect("dead-letter lock poisoned")
                .push(self.envelope.clone());
            return;
        }
        let _ = tx.send(QueueItem {
            envelope: self.envelope.clone(),
            attempt: self.attempt + 1,
        });
    }
}

impl Drop for Delivery {
    fn drop(&mut self) {
        if !self.settled {
            // Unsettled drop means the handler died mid-message; requeue so
            // at-least-once holds.
            self.requeue();
        }
    }
}
