//! In-process message fabric for the engagement pipeline.
//!
//! Decouples producers (API handlers, workers) from consumers with
//! topic-based routing and at-least-once delivery. Producers publish to an
//! exchange and return immediately; each bound queue buffers messages for
//! exactly one consumer, which acknowledges or rejects each delivery.

pub mod broker;
pub mod routing;
pub mod topology;

pub use broker::{Broker, Delivery, Envelope, QueueConsumer};
pub use routing::topic_matches;
