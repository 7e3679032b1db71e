use std::sync::Arc;

use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use signup_portal::{config::Config, logging, routes, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting signup portal");

    if !config.oauth.is_configured() {
        tracing::warn!("Google OAuth credentials not set; login is disabled");
    }
    if config.admin.token.is_none() {
        tracing::info!("No admin token configured; signup export is disabled");
    }
    tracing::info!("Signup ledger at {}", config.ledger.path.display());

    let state = Arc::new(AppState::new(config));

    // Build router
    let app = routes::app(state.clone())
        .layer(axum::middleware::from_fn(logging::request_logger))
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = format!("{}:{}", state.config.host, state.config.port);
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
