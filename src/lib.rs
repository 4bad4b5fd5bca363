pub mod api;
pub mod cli;
pub mod clients;
pub mod config;
pub mod db;
pub mod entities;
pub mod models;
pub mod services;
pub mod state;

use std::sync::Arc;
use tokio::signal;

use anyhow::Context;
use cli::{Cli, Commands};
pub use config::Config;
use models::ServiceType;
use services::{LookupError, LookupResult};
use state::SharedState;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

pub async fn run(cli: Cli, config: Config) -> anyhow::Result<()> {
    config.validate()?;
    init_tracing(&config);

    match cli.command() {
        Commands::Serve => run_server(config).await,

        Commands::Init => {
            if Config::create_default_if_missing()? {
                println!("✓ Config file created. Edit config.toml and run again.");
            } else {
                println!("config.toml already exists, leaving it untouched.");
            }
            Ok(())
        }

        Commands::Lookup { service, query } => cmd_lookup(config, service, &query.join(" ")).await,
    }
}

fn init_tracing(config: &Config) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    let registry = tracing_subscriber::registry().with(env_filter);

    if config.general.json_logs {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn run_server(config: Config) -> anyhow::Result<()> {
    info!("geocache v{} starting...", env!("CARGO_PKG_VERSION"));

    let prometheus_handle = if config.observability.metrics_enabled {
        use metrics_exporter_prometheus::PrometheusBuilder;
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("Failed to install Prometheus recorder")?;
        info!("Prometheus metrics recorder initialized");
        Some(handle)
    } else {
        None
    };

    for service in ServiceType::ALL {
        if config.upstream.api_key(service).is_none() {
            warn!(
                "No API key configured for {}; /{} will answer 503",
                service, service
            );
        }
    }

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = api::create_app_state_from_config(config, prometheus_handle).await?;
    let app = api::router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!("🌐 Web Server running at http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Web server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => error!("Error listening for shutdown: {}", e),
    }
}

async fn cmd_lookup(config: Config, service: ServiceType, query: &str) -> anyhow::Result<()> {
    let shared = Arc::new(SharedState::new(config).await?);

    let outcome = shared.lookup_service.lookup(service, query).await;

    println!("{}", render_lookup(service, query, outcome)?);
    Ok(())
}

/// Success is printed as JSON; failure is returned once, with the lookup as context.
fn render_lookup(
    service: ServiceType,
    query: &str,
    outcome: Result<LookupResult, LookupError>,
) -> anyhow::Result<String> {
    let result = outcome.with_context(|| format!("{service} lookup for '{query}' failed"))?;
    Ok(serde_json::to_string_pretty(&result)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use models::Provenance;

    #[test]
    fn test_render_lookup_success_is_json() {
        let outcome = Ok(LookupResult {
            result: serde_json::json!({ "found": 1 }),
            source: Provenance::Cache,
        });

        let rendered = render_lookup(ServiceType::Geocode, "Moscow", outcome).unwrap();
        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(value["source"], "cache");
        assert_eq!(value["result"]["found"], 1);
    }

    #[test]
    fn test_render_lookup_failure_reports_error_once() {
        let err = render_lookup(
            ServiceType::Suggest,
            "ab",
            Err(LookupError::QueryTooShort),
        )
        .unwrap_err();

        let report = format!("{err:#}");
        assert_eq!(
            report,
            "suggest lookup for 'ab' failed: Query must be at least 3 characters"
        );
        assert_eq!(report.matches("at least 3 characters").count(), 1);
    }
}
