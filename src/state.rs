use std::sync::Arc;

use crate::clients::{UpstreamClient, YandexClient};
use crate::config::Config;
use crate::db::Store;
use crate::services::{LookupService, SeaOrmLookupService};

/// Build the HTTP client used for upstream calls. It is shared by every
/// request so connections are pooled.
fn build_shared_http_client(config: &Config) -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(
            config.upstream.request_timeout_seconds,
        ))
        .user_agent(config.upstream.user_agent.clone())
        .pool_max_idle_per_host(10)
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to build shared HTTP client: {e}"))
}

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<Config>,

    pub store: Store,

    pub lookup_service: Arc<dyn LookupService>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let http_client = build_shared_http_client(&config)?;
        let upstream = Arc::new(YandexClient::with_shared_client(
            http_client,
            config.upstream.clone(),
        ));
        Self::with_upstream(config, upstream).await
    }

    pub async fn with_upstream(
        config: Config,
        upstream: Arc<dyn UpstreamClient>,
    ) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        let lookup_service: Arc<dyn LookupService> = Arc::new(SeaOrmLookupService::new(
            store.clone(),
            upstream,
            config.upstream.clone(),
        ));

        Ok(Self {
            config: Arc::new(config),
            store,
            lookup_service,
        })
    }
}
