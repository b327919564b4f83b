//! # lingo-core
//!
//! Core types, traits, and abstractions for the lingo learning platform.
//!
//! This crate provides the foundational data structures, the SM-2
//! scheduler, the wire event schema, and the trait definitions the other
//! lingo crates depend on.

pub mod defaults;
pub mod error;
pub mod events;
pub mod logging;
pub mod models;
pub mod push;
pub mod srs;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use events::{ContentCreatedEvent, NotificationEvent, QuizSubmissionEvent, SubmittedAnswer};
pub use models::*;
pub use push::{ConnectionRegistry, PushReceiver};
pub use srs::{schedule, SrsOutcome, SrsState};
pub use traits::*;
