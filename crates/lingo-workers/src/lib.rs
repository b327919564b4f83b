//! # lingo-workers
//!
//! Message consumers and scheduled workers for the lingo engagement
//! pipeline:
//!
//! - Notification consumer: persists and pushes user notifications
//! - Quiz generation consumer: builds practice quizzes from new vocabulary
//! - Scoring consumer: grades submitted quiz attempts
//! - Review scanner: publishes daily review reminders
//!
//! All consumers run on the shared [`QueueWorker`] loop, which applies one
//! failure taxonomy: permanent errors drop the message, transient errors
//! trigger redelivery.

pub mod consumer;
pub mod notification;
pub mod quiz_gen;
pub mod scanner;
pub mod scoring;

#[cfg(test)]
pub(crate) mod fakes;

pub use consumer::{EventHandler, QueueWorker, WorkerHandle};
pub use notification::NotificationDispatcher;
pub use quiz_gen::QuizGenerator;
pub use scanner::{ReviewScanner, ScannerConfig, ScannerHandle};
pub use scoring::ScoringConsumer;
