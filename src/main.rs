use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

mod api;
mod models;
mod services;
mod utils;

use api::aggregator::AggregatorClient;
use models::ChartConfig;
use services::chart_service::{Chart, PngRenderer};
use services::poll_service::{DashboardState, PollDriver};
use utils::Config;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    dotenv::dotenv().ok();

    // Initialize tracing
    let mut filter = EnvFilter::from_default_env();
    for directive in ["streamproc_dashboard=debug", "reqwest=warn", "hyper=warn"] {
        if let Ok(d) = directive.parse() {
            filter = filter.add_directive(d);
        }
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    info!("📈 Starting streamproc dashboard...");

    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return;
        }
    };
    debug!("Configuration: {:?}", config);

    let client = match config.request_timeout {
        Some(timeout) => match AggregatorClient::with_timeout(
            config.base_url.clone(),
            config.endpoint.clone(),
            timeout,
        ) {
            Ok(c) => c,
            Err(e) => {
                error!("Failed to create API client: {}", e);
                return;
            }
        },
        None => AggregatorClient::new(config.base_url.clone(), config.endpoint.clone()),
    };

    let chart_config = ChartConfig::new(config.width, config.height);
    match serde_json::to_string(&chart_config) {
        Ok(json) => debug!("Chart configuration: {}", json),
        Err(e) => debug!("Could not serialize chart configuration: {}", e),
    }

    let chart = Chart::new(chart_config, config.padding_ms, Utc::now().timestamp_millis());
    let renderer = PngRenderer::new(config.output.clone());
    info!("Rendering chart to {}", renderer.output().display());

    let state = Arc::new(Mutex::new(DashboardState::new(chart, Box::new(renderer))));
    let driver = PollDriver::new(client, state, config.interval, config.overlap);

    driver
        .run(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
            info!("Ctrl-C received, shutting down");
        })
        .await;
}
