//! Forward-Auth Server Entry Point
//!
//! Application entry point and server initialization.
//! Uses `anyhow` for startup errors; request-level errors are
//! `forward_auth::ForwardAuthError`.

mod config;

use forward_auth::{OAuth2Client, forward_auth_router};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "server=info,forward_auth=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = config::from_env()?;
    let forward_auth = settings.forward_auth;

    tracing::info!(
        callback_path = %forward_auth.callback_path,
        auth_host = ?forward_auth.auth_host,
        cookie_domains = ?forward_auth.cookie_domains,
        lifetime_secs = forward_auth.lifetime.as_secs(),
        "Forward auth configured"
    );

    let provider = OAuth2Client::new(forward_auth.provider.clone())?;

    // Build router
    let app = forward_auth_router(provider, forward_auth).layer(TraceLayer::new_for_http());

    // Start server
    tracing::info!("Listening on {}", settings.listen_addr);

    let listener = TcpListener::bind(settings.listen_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
