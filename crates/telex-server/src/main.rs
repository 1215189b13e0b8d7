mod config;

use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use telex_api::{AppStateInner, router};
use telex_db::{Database, UserStore};
use telex_rtm::{ChannelRepository, JwtResolver};

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "telex=debug,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env()?;

    // Init database
    let db = Arc::new(Database::open(&config.db_path)?);

    let identity = Arc::new(JwtResolver::new(&config.jwt_secret, UserStore::new(db.clone())));
    let repo = ChannelRepository::new(db, identity);

    let app = router(Arc::new(AppStateInner { repo }))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    info!("Telex server listening on {}", config.addr);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
