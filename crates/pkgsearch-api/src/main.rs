//! Package search API server entry point.

use std::sync::Arc;

use pkgsearch_api::{
    config::ApiConfig,
    router::{build_router, AppState},
    search::transform::ResultTransformer,
};
use pkgsearch_solr::client::SolrClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let config = ApiConfig::from_env()?;
    let state = AppState {
        engine: Arc::new(SolrClient::new(&config.solr)?),
        transformer: Arc::new(ResultTransformer::new(&config.public_base_url)),
    };
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    log::info!("listening on {}", config.bind_addr);
    axum::serve(listener, app).await?;
    Ok(())
}
