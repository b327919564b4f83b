//! Queue worker loop shared by all consumers.
//!
//! Each consumer runs one worker draining one queue sequentially. The
//! worker settles every delivery according to the failure taxonomy:
//! permanent errors (bad payload, missing entity, terminal state) are
//! logged and acknowledged so a poison message never loops, while
//! transient errors leave the message unacknowledged for redelivery.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use lingo_core::Result;
use lingo_fabric::{Delivery, Envelope, QueueConsumer};

/// Processes one decoded message. Implementations must be idempotent:
/// the fabric delivers at-least-once.
#[async_trait]
pub trait EventHandler: Send + Sync + 'static {
    /// Stable name for logging.
    fn name(&self) -> &'static str;

    /// Process one envelope. `Ok` acknowledges; a permanent error
    /// acknowledges with a warning; anything else triggers redelivery.
    async fn handle(&self, envelope: &Envelope) -> Result<()>;
}

/// Handle for controlling a running queue worker.
pub struct WorkerHandle {
    shutdown_tx: mpsc::Sender<()>,
    join: tokio::task::JoinHandle<()>,
}

impl WorkerHandle {
    /// Signal the worker to shut down and wait for it to drain.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        let _ = self.join.await;
    }
}

/// Drains one queue, dispatching every delivery to a handler.
pub struct QueueWorker {
    consumer: QueueConsumer,
    handler: Arc<dyn EventHandler>,
}

impl QueueWorker {
    /// Create a worker for a queue and handler pairing.
    pub fn new(consumer: QueueConsumer, handler: Arc<dyn EventHandler>) -> Self {
        Self { consumer, handler }
    }

    /// Start the worker and return a handle for control.
    pub fn start(self) -> WorkerHandle {
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        let join = tokio::spawn(async move {
            self.run(shutdown_rx).await;
        });
        WorkerHandle { shutdown_tx, join }
    }

    async fn run(mut self, mut shutdown_rx: mpsc::Receiver<()>) {
        info!(
            consumer = self.handler.name(),
            queue = self.consumer.queue(),
            "Queue worker started"
        );

        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    info!(consumer = self.handler.name(), "Queue worker received shutdown signal");
                    break;
                }
                delivery = self.consumer.recv() => {
                    match delivery {
                        Some(delivery) => self.process(delivery).await,
                        None => {
                            warn!(consumer = self.handler.name(), "Queue closed, worker stopping");
                            break;
                        }
                    }
                }
            }
        }

        info!(consumer = self.handler.name(), "Queue worker stopped");
    }

    async fn process(&self, delivery: Delivery) {
        let start = Instant::now();
        let message_id = delivery.envelope.message_id;
        let routing_key = delivery.envelope.routing_key.clone();

        if delivery.redelivered() {
            debug!(
                consumer = self.handler.name(),
                message_id = %message_id,
                attempt = delivery.attempt,
                "Processing redelivered message"
            );
        }

        match self.handler.handle(&delivery.envelope).await {
            Ok(()) => {
                debug!(
                    consumer = self.handler.name(),
                    message_id = %message_id,
                    routing_key = %routing_key,
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Message processed"
                );
                delivery.ack();
            }
            // Reprocessing cannot succeed; acknowledge so the message does
            // not loop.
            Err(e) if e.is_permanent() => {
                warn!(
                    consumer = self.handler.name(),
                    message_id = %message_id,
                    routing_key = %routing_key,
                    error = %e,
                    "Dropping message after permanent failure"
                );
                delivery.ack();
            }
            Err(e) => {
                error!(
                    consumer = self.handler.name(),
                    message_id = %message_id,
                    routing_key = %routing_key,
                    attempt = delivery.attempt,
                    error = %e,
                    "Message processing failed, requeueing"
                );
                delivery.nack();
            }
        }
    }
}
