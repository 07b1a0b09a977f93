use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tapline::auth::jwks::KeyCache;
use tapline::auth::{AuthConfig, TokenVerifier};
use tapline::store::sqlite::SqliteStore;
use tapline::{api, config, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "tapline=debug,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = config::load()?;

    tracing::info!("connecting to database...");
    let store = SqliteStore::connect(&cfg.database_url).await?;

    tracing::info!("running migrations...");
    store.migrate().await?;

    let keys = KeyCache::new(cfg.jwks_url.clone(), Duration::from_secs(cfg.jwks_ttl_secs));
    let verifier = TokenVerifier::new(
        AuthConfig {
            issuer: cfg.auth_issuer.clone(),
            audience: cfg.auth_audience.clone(),
        },
        keys,
    );

    let state = Arc::new(AppState {
        store: Arc::new(store),
        verifier,
    });

    let app = api::router(state)
        .route("/healthz", axum::routing::get(|| async { "ok" }))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        // The original service ran with blanket CORS for its single-page
        // frontend; kept wire-compatible here.
        .layer(CorsLayer::permissive())
        .layer(axum::extract::DefaultBodyLimit::max(64 * 1024));

    let addr = SocketAddr::from(([0, 0, 0, 0], cfg.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("tapline listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
