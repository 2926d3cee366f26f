use std::env;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::http::{
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    HeaderValue, Method,
};
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use admin_api::config::{load_app_config, AppConfig};
use admin_api::metrics::AuthMetrics;
use admin_api::resolver::PermissionResolver;
use admin_api::seeder;
use admin_api::store::{CredentialStore, PgCredentialStore};
use admin_api::{router, AppState};
use common_auth::TokenService;

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = Arc::new(load_app_config()?);

    let database_url = env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&database_url)
        .await
        .context("Failed to connect to Postgres")?;

    let store: Arc<dyn CredentialStore> = Arc::new(PgCredentialStore::new(pool));
    let tokens = Arc::new(TokenService::new(config.jwt.clone()));
    let resolver = Arc::new(PermissionResolver::new(store.clone()));
    let metrics = Arc::new(AuthMetrics::new()?);

    if config.seed_on_startup {
        let report = seeder::seed_all(store.as_ref())
            .await
            .context("startup seeding failed")?;
        metrics.record_seed(&report);
    }

    let cors = cors_layer(&config);

    let state = AppState {
        store,
        tokens,
        resolver,
        config: config.clone(),
        metrics,
    };
    let app = router(state).layer(cors);

    let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(8086);
    let ip: std::net::IpAddr = host.parse()?;
    let addr = SocketAddr::from((ip, port));

    info!(%addr, "starting admin-api");
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins = config
        .cors_allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(origin = %origin, error = %err, "skipping unparseable CORS origin");
                None
            }
        })
        .collect::<Vec<_>>();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([ACCEPT, CONTENT_TYPE, AUTHORIZATION])
        .allow_credentials(true)
}
