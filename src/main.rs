use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{AppState, router};
use lablink_core::config::{first_non_blank, upstream_timeout_from_env_value};
use lablink_core::constants::{DEFAULT_PLACES_BASE_URL, DEFAULT_SEARCH_COUNTRY};
use lablink_core::{Catalog, CoreConfig, InMemoryBookingStore};

/// Main entry point for the LabLink service
///
/// Resolves configuration from the environment once, loads the catalog and serves the REST
/// API until interrupted.
///
/// # Environment Variables
/// - `LABLINK_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `GOOGLE_PLACES_API_KEY`: places API key (falls back to `NEXT_PUBLIC_GOOGLE_MAPS_API_KEY`)
/// - `PLACES_BASE_URL`: places upstream root (default: "https://places.googleapis.com")
/// - `LABLINK_SEARCH_COUNTRY`: country appended to text queries (default: "Nigeria")
/// - `LABLINK_UPSTREAM_TIMEOUT_SECS`: upstream request timeout (default: 10)
/// - `LABLINK_CATALOG_FILE`: optional YAML catalog override
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - any configuration value is invalid,
/// - the catalog cannot be loaded, or
/// - the server address cannot be bound.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("lablink=info".parse()?)
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr = std::env::var("LABLINK_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    let places_api_key = first_non_blank([
        std::env::var("GOOGLE_PLACES_API_KEY").ok(),
        std::env::var("NEXT_PUBLIC_GOOGLE_MAPS_API_KEY").ok(),
    ]);
    let places_base_url =
        std::env::var("PLACES_BASE_URL").unwrap_or_else(|_| DEFAULT_PLACES_BASE_URL.into());
    let search_country =
        std::env::var("LABLINK_SEARCH_COUNTRY").unwrap_or_else(|_| DEFAULT_SEARCH_COUNTRY.into());
    let upstream_timeout =
        upstream_timeout_from_env_value(std::env::var("LABLINK_UPSTREAM_TIMEOUT_SECS").ok())?;

    let cfg = Arc::new(CoreConfig::new(
        places_api_key,
        places_base_url,
        search_country,
        upstream_timeout,
    )?);

    let catalog_override = std::env::var("LABLINK_CATALOG_FILE")
        .ok()
        .filter(|p| !p.trim().is_empty())
        .map(PathBuf::from);
    let catalog = Arc::new(Catalog::load(catalog_override.as_deref())?);

    let state = AppState::new(cfg, catalog, Arc::new(InMemoryBookingStore::new()))?;
    let app = router(state);

    tracing::info!("++ Starting LabLink REST on {}", rest_addr);

    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("failed to listen for shutdown signal: {e}");
            }
        })
        .await?;

    tracing::info!("-- LabLink REST stopped");
    Ok(())
}
