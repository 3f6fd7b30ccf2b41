//! Feedboard server entry point.

use std::sync::Arc;

use axum::{Router, middleware};
use feedboard_api::{middleware::AppState, router as api_router};
use feedboard_common::Config;
use feedboard_core::{AccountService, FeedService, FeedbackService, VoteService};
use feedboard_db::repositories::{FeedbackRepository, UserRepository, VoteRepository};
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "feedboard=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting feedboard server...");

    // Load configuration
    let config = Config::load()?;

    // Connect to database
    let db = feedboard_db::init(&config).await?;
    info!("Connected to database");

    // Run migrations
    info!("Running database migrations...");
    feedboard_db::migrate(&db).await?;
    info!("Migrations completed");

    // Initialize repositories
    let db = Arc::new(db);
    let user_repo = UserRepository::new(Arc::clone(&db));
    let feedback_repo = FeedbackRepository::new(Arc::clone(&db));
    let vote_repo = VoteRepository::new(Arc::clone(&db));

    // Initialize services
    let account_service = AccountService::new(user_repo);
    let feedback_service = FeedbackService::new(feedback_repo.clone(), vote_repo.clone());
    let vote_service = VoteService::new(vote_repo.clone(), feedback_repo.clone());
    let feed_service = FeedService::new(feedback_repo, vote_repo);

    // Create app state
    let state = AppState {
        account_service,
        feedback_service,
        vote_service,
        feed_service,
    };

    // Build router
    let app = Router::new()
        .nest("/api", api_router())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            feedboard_api::middleware::auth_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    // Start server with graceful shutdown
    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
