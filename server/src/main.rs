// Forbid unwrap() in production code to prevent panics from bad input.
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
use std::net::SocketAddr;
use std::sync::Arc;

use conduit_server::{
    AppState,
    auth::{JwtConfig, TokenAuthenticator},
    config::ServerConfig,
    routes,
    users::InMemoryUserStore,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "conduit_server=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration from environment variables
    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    tracing::info!("Loaded configuration: listen_port={}", config.listen_port);

    // The secret is fixed from here on; every request verifies against it.
    let jwt_config = match JwtConfig::new_hs256(config.secret) {
        Ok(jwt_config) => jwt_config,
        Err(e) => {
            tracing::error!("Invalid signing secret: {e}");
            std::process::exit(1);
        }
    };

    let state = AppState::new(
        TokenAuthenticator::new(jwt_config),
        Arc::new(InMemoryUserStore::new()),
    );
    let app = routes::router(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], config.listen_port));
    tracing::info!("listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("Failed to bind: {e}");
            std::process::exit(1);
        });

    axum::serve(listener, app).await.unwrap_or_else(|e| {
        tracing::error!("Server error: {e}");
        std::process::exit(1);
    });
}
