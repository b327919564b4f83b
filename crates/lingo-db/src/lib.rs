//! # lingo-db
//!
//! PostgreSQL database layer for lingo.
//!
//! This crate provides:
//! - Connection pool management
//! - Repository implementations for all pipeline entities
//! - Idempotent writes backing at-least-once message consumption
//!
//! ## Example
//!
//! ```rust,ignore
//! use lingo_db::Database;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("postgres://localhost/lingo").await?;
//!     let count = db.notifications.unread_count(user_id).await?;
//!     println!("{count} unread");
//!     Ok(())
//! }
//! ```
pub mod attempts;
pub mod notifications;
pub mod pool;
pub mod quizzes;
pub mod reviews;
pub mod users;
pub mod vocabulary;

// Re-export core types
pub use lingo_core::*;

// Re-export repository implementations
pub use attempts::PgAttemptRepository;
pub use notifications::PgNotificationRepository;
pub use pool::{create_pool, PoolConfig};
pub use quizzes::PgQuizRepository;
pub use reviews::PgReviewRepository;
pub use users::PgUserRepository;
pub use vocabulary::PgVocabularyRepository;

/// Aggregates all repositories behind a single connection pool.
#[derive(Clone)]
pub struct Database {
    /// The underlying connection pool.
    pub pool: sqlx::Pool<sqlx::Postgres>,
    /// User lookups.
    pub users: PgUserRepository,
    /// Vocabulary catalog.
    pub vocabulary: PgVocabularyRepository,
    /// Spaced-repetition review state.
    pub reviews: PgReviewRepository,
    /// Durable notifications.
    pub notifications: PgNotificationRepository,
    /// Generated quizzes.
    pub quizzes: PgQuizRepository,
    /// Quiz attempts and scoring.
    pub attempts: PgAttemptRepository,
}

impl Database {
    /// Create a new Database instance from a connection pool.
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self {
            users: PgUserRepository::new(pool.clone()),
            vocabulary: PgVocabularyRepository::new(pool.clone()),
            reviews: PgReviewRepository::new(pool.clone()),
            notifications: PgNotificationRepository::new(pool.clone()),
            quizzes: PgQuizRepository::new(pool.clone()),
            attempts: PgAttemptRepository::new(pool.clone()),
            pool,
        }
    }

    /// Create a new Database instance by connecting to the given URL.
    ///
    /// Pool sizing and timeouts come from `DB_*` environment variables,
    /// see [`PoolConfig::from_env`].
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = create_pool(url).await?;
        Ok(Self::new(pool))
    }

    /// Run pending migrations.
    #[cfg(feature = "migrations")]
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Internal(format!("migration failed: {e}")))
    }
}
