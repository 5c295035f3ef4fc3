use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use quizbank::config::{MatchConfig, ServerConfig};
use quizbank::questions::{FileQuestionStore, HttpQuestionStore, QuestionStore};
use quizbank::{api, broadcast, state::AppState};

#[tokio::main]
async fn main() {
    // Load .env file if present (before any env var reads)
    if let Err(e) = dotenvy::dotenv() {
        // Not an error if .env doesn't exist, only log if it's a different issue
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "quizbank=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting quizbank...");

    let server_config = ServerConfig::from_env();
    let match_config = MatchConfig::from_env();
    tracing::info!("Match defaults: {:?}", match_config);

    let store: Arc<dyn QuestionStore> = match &server_config.remote_url {
        Some(url) => match HttpQuestionStore::new(url.clone()) {
            Ok(store) => Arc::new(store),
            Err(e) => {
                tracing::error!("Failed to set up remote question store: {}", e);
                std::process::exit(1);
            }
        },
        None => Arc::new(FileQuestionStore::new(server_config.data_dir.clone())),
    };

    let state = Arc::new(AppState::new(store, match_config));

    // Spawn background task that drives the question countdown
    broadcast::spawn_match_ticker(state.clone());

    let app = api::router(state, &server_config.data_dir);

    let addr = server_config.bind;
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };
    tracing::info!("Listening on http://{}", addr);

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("Server error: {}", e);
    }
}
