use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crosschat::{api, config::AppConfig, state, state::AppState};

const SMOKE_TEST_TEXT: &str = "hello, world";

#[tokio::main]
async fn main() {
    // Load .env file if present (before any env var reads)
    if let Err(e) = dotenvy::dotenv() {
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "crosschat=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env();

    if std::env::args().skip(1).any(|arg| arg == "--test-translate") {
        test_translate(&config).await;
        return;
    }

    tracing::info!("Starting crosschat...");

    let state = match AppState::from_config(&config) {
        Ok(state) => Arc::new(state),
        Err(e) => {
            tracing::error!("{}", e);
            std::process::exit(1);
        }
    };

    let debug_dir = config.debug.then(|| config.debug_dir.clone());
    let app = api::router(state, debug_dir);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.listen_port));
    tracing::info!("Listening on http://{}", addr);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };
    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Translate a fixed phrase once and exit
async fn test_translate(config: &AppConfig) {
    let translator = match state::build_translator(config) {
        Ok(translator) => translator,
        Err(e) => {
            tracing::error!("{}", e);
            std::process::exit(1);
        }
    };

    match translator.try_translate(SMOKE_TEST_TEXT).await {
        Ok(text) => println!("{} -> {}", SMOKE_TEST_TEXT, text),
        Err(e) => {
            tracing::error!("Translation failed: {}", e);
            std::process::exit(1);
        }
    }
}
