//! lingo gateway binary: HTTP producers, notification reads, the realtime
//! WebSocket endpoint, and the in-process consumers and scanner.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::{header, Method};
use axum::routing::{get, patch, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use lingo_core::ConnectionRegistry;
use lingo_db::Database;
use lingo_fabric::topology::{
    declare_topology, NOTIFICATION_QUEUE, QUIZ_SCORING_QUEUE, VOCABULARY_CREATED_QUEUE,
};
use lingo_fabric::Broker;
use lingo_workers::{
    NotificationDispatcher, QueueWorker, QuizGenerator, ReviewScanner, ScannerConfig,
    ScoringConsumer,
};

mod auth;
mod error;
mod handlers;
mod state;
mod ws;

use auth::TokenSigner;
use state::AppState;

/// Generates time-ordered UUIDv7 request correlation IDs.
#[derive(Clone, Default)]
struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string().parse().ok()?;
        Some(RequestId::new(id))
    }
}

fn init_tracing() {
    // LOG_FORMAT: "json" or "text" (default), RUST_LOG: standard env filter.
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "lingo_api=debug,lingo_workers=debug,tower_http=debug".into());

    let registry = tracing_subscriber::registry().with(env_filter);
    if log_format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

fn parse_allowed_origins() -> Vec<axum::http::HeaderValue> {
    std::env::var("CORS_ALLOWED_ORIGINS")
        .unwrap_or_else(|_| "http://localhost:5173".to_string())
        .split(',')
        .filter_map(|origin| origin.trim().parse().ok())
        .collect()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| "postgres://localhost/lingo".to_string());
    let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| "3000".to_string())
        .parse()
        .unwrap_or(3000);
    let token_secret = std::env::var("AUTH_TOKEN_SECRET")
        .map_err(|_| anyhow::anyhow!("AUTH_TOKEN_SECRET must be set"))?;

    info!("Connecting to database...");
    let db = Database::connect(&database_url).await?;
    info!("Database connected");

    info!("Running database migrations...");
    db.migrate().await?;
    info!("Database migrations complete");

    // Fabric topology, push registry, and the consumer fleet.
    let broker = Broker::new();
    declare_topology(&broker)?;
    let registry = ConnectionRegistry::new();

    let notification_worker = QueueWorker::new(
        broker.consumer(NOTIFICATION_QUEUE)?,
        Arc::new(NotificationDispatcher::new(
            Arc::new(db.users.clone()),
            Arc::new(db.notifications.clone()),
            registry.clone(),
        )),
    )
    .start();

    let quiz_gen_worker = QueueWorker::new(
        broker.consumer(VOCABULARY_CREATED_QUEUE)?,
        Arc::new(QuizGenerator::new(
            Arc::new(db.vocabulary.clone()),
            Arc::new(db.quizzes.clone()),
        )),
    )
    .start();

    let scoring_worker = QueueWorker::new(
        broker.consumer(QUIZ_SCORING_QUEUE)?,
        Arc::new(ScoringConsumer::new(
            Arc::new(db.attempts.clone()),
            broker.clone(),
        )),
    )
    .start();

    let scanner = ReviewScanner::new(
        Arc::new(db.reviews.clone()),
        broker.clone(),
        ScannerConfig::from_env(),
    )
    .start();

    let state = AppState {
        db,
        broker,
        registry,
        tokens: TokenSigner::new(&token_secret),
    };

    let app = Router::new()
        // System
        .route("/health", get(handlers::health))
        // Content intake
        .route("/api/v1/vocabularies", post(handlers::create_vocabulary))
        // Spaced repetition
        .route(
            "/api/v1/vocabularies/:id/reviews",
            post(handlers::submit_review),
        )
        // Quiz attempts
        .route(
            "/api/v1/quizzes/:id/attempts",
            post(handlers::start_attempt),
        )
        .route(
            "/api/v1/attempts/:id/submission",
            post(handlers::submit_attempt),
        )
        // Social engagement producers
        .route("/api/v1/posts/:id/likes", post(handlers::like_post))
        .route(
            "/api/v1/posts/:id/comments/:cid/replies",
            post(handlers::reply_to_comment),
        )
        // Notifications
        .route("/api/v1/notifications", get(handlers::list_notifications))
        .route(
            "/api/v1/notifications/unread-count",
            get(handlers::unread_count),
        )
        .route(
            "/api/v1/notifications/:id/read",
            patch(handlers::mark_notification_read),
        )
        // Realtime push
        .route("/ws", get(ws::ws_handler))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
        .layer(
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(parse_allowed_origins()))
                .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::OPTIONS])
                .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT]),
        )
        .with_state(state);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Drain the pipeline after the HTTP surface stops accepting work.
    info!("Shutting down workers");
    scanner.shutdown().await;
    notification_worker.shutdown().await;
    quiz_gen_worker.shutdown().await;
    scoring_worker.shutdown().await;
    info!("Shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        tracing::error!("Failed to listen for shutdown signal");
    }
}
