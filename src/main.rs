use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::AppState;
use census_core::constants::DEFAULT_REST_ADDR;
use census_core::sheet::YamlSheet;
use census_core::{CensusConfig, CensusStore, ConversationService};

/// Main entry point for the census application
///
/// Opens (or creates) the census sheet and serves the REST transport with Swagger UI.
///
/// # Environment Variables
/// - `CENSUS_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `CENSUS_SHEET_PATH`: YAML sheet file (default: "census_sheet.yaml")
/// - `CENSUS_WORKSHEET`: worksheet title stored in the sheet file
/// - `CENSUS_DERIVED_COLUMNS`: `computed` or `formula`
/// - `CENSUS_ROW_GROWTH`: rows added when the sheet is full (default: 50)
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the configuration is invalid or the sheet cannot be opened,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("census=info".parse()?)
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = CensusConfig::from_env_values(
        std::env::var("CENSUS_SHEET_PATH").ok(),
        std::env::var("CENSUS_WORKSHEET").ok(),
        std::env::var("CENSUS_DERIVED_COLUMNS").ok(),
        std::env::var("CENSUS_ROW_GROWTH").ok(),
    )?;
    let rest_addr = std::env::var("CENSUS_REST_ADDR")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_REST_ADDR.into());

    let sheet = YamlSheet::open_or_create(
        cfg.sheet_path(),
        cfg.worksheet().as_str(),
        cfg.row_growth() + 1,
    )?;
    tracing::info!("++ Using census sheet {}", sheet.path().display());

    let store = CensusStore::new(Arc::new(sheet), &cfg);
    let app = api_rest::router(AppState::new(ConversationService::new(store)));

    tracing::info!("++ Starting census REST on {}", rest_addr);
    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
