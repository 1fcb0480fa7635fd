//! amm-price-oracle entry point.
//!
//! Starts the aggregation scheduler and the read API.

use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use amm_price_oracle::api;
use amm_price_oracle::app_state::AppState;
use amm_price_oracle::config::OracleConfig;
use amm_price_oracle::persistence::{MemoryStore, PostgresStore, Store};
use amm_price_oracle::service::{Aggregator, PoolFetcher, PriceEngine, TokenResolver, VolumeRollup};
use amm_price_oracle::source::{
    self, FiatPriceSource, NearRpcClient, PoolSource, PriceApiClient, SwapFeedClient,
    TokenMetadataSource,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = OracleConfig::from_env()?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if config.log_json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
    tracing::info!(addr = %config.listen_addr, contract = %config.contract_id, "starting amm-price-oracle");

    // Build persistence layer
    let store: Arc<dyn Store> = if config.persistence_enabled {
        let pg = PostgresStore::connect(&config).await?;
        pg.migrate().await?;
        tracing::info!("connected to postgres, migrations applied");
        Arc::new(pg)
    } else {
        tracing::warn!("persistence disabled, using in-memory store");
        Arc::new(MemoryStore::new())
    };

    // Build collaborators
    let http = source::http_client(&config)?;
    let chain = Arc::new(NearRpcClient::new(
        http.clone(),
        config.node_url.clone(),
        config.contract_id.clone(),
    ));
    let swaps = Arc::new(SwapFeedClient::new(http.clone(), config.graph_api_url.clone()));
    let prices = Arc::new(PriceApiClient::new(
        http,
        config.helper_url.clone(),
        config.price_api_url.clone(),
    ));

    // Build service layer
    let metadata = Arc::clone(&chain) as Arc<dyn TokenMetadataSource>;
    let pool_source: Arc<dyn PoolSource> = chain;
    let fiat = Arc::clone(&prices) as Arc<dyn FiatPriceSource>;
    let resolver = TokenResolver::new(Arc::clone(&store), metadata);
    let aggregator = Arc::new(Aggregator::new(
        PoolFetcher::new(
            pool_source,
            config.pool_page_size,
            config.pricing.denylist.clone(),
        ),
        VolumeRollup::new(swaps),
        PriceEngine::new(resolver, config.pricing.clone()),
        fiat,
        prices,
        Arc::clone(&store),
    ));
    tokio::spawn(Arc::clone(&aggregator).run(config.cycle_interval()));

    // Build router
    let app = api::build_router()
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(AppState { store });

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
