use reqwest::Client;
use tracing::debug;
use url::Url;

use super::{UpstreamClient, UpstreamError};
use crate::config::UpstreamConfig;
use crate::models::ServiceType;

const SUGGEST_OBJECT_TYPE: &str = "geo";
const SUGGEST_LANGUAGE: &str = "ru_RU";
const SUGGEST_RESULTS: &str = "10";

#[derive(Clone)]
pub struct YandexClient {
    client: Client,
    config: UpstreamConfig,
}

impl YandexClient {
    pub fn new(config: UpstreamConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.request_timeout_seconds))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build upstream HTTP client: {e}"))?;

        Ok(Self::with_shared_client(client, config))
    }

    #[must_use]
    pub const fn with_shared_client(client: Client, config: UpstreamConfig) -> Self {
        Self { client, config }
    }

    fn build_url(
        &self,
        service: ServiceType,
        query: &str,
        api_key: &str,
    ) -> Result<Url, UpstreamError> {
        let mut url =
            Url::parse(self.config.endpoint(service)).map_err(|e| UpstreamError::Request {
                service,
                message: format!("invalid endpoint URL: {e}"),
            })?;

        {
            let mut pairs = url.query_pairs_mut();
            for (name, value) in request_params(service, query, api_key) {
                pairs.append_pair(name, value);
            }
        }

        Ok(url)
    }
}

/// Query parameters sent for each service.
pub(crate) fn request_params<'a>(
    service: ServiceType,
    query: &'a str,
    api_key: &'a str,
) -> Vec<(&'static str, &'a str)> {
    match service {
        ServiceType::Geocode => vec![
            ("apikey", api_key),
            ("geocode", query),
            ("format", "json"),
        ],
        ServiceType::Suggest => vec![
            ("apikey", api_key),
            ("text", query),
            ("type", SUGGEST_OBJECT_TYPE),
            ("lang", SUGGEST_LANGUAGE),
            ("results", SUGGEST_RESULTS),
        ],
    }
}

#[async_trait::async_trait]
impl UpstreamClient for YandexClient {
    async fn fetch(
        &self,
        service: ServiceType,
        query: &str,
    ) -> Result<serde_json::Value, UpstreamError> {
        let api_key = self
            .config
            .api_key(service)
            .ok_or(UpstreamError::MissingCredential(service))?;

        let url = self.build_url(service, query, api_key)?;

        debug!("Fetching {} for '{}'", service, query);

        // The request URL carries the API key, so it is stripped from errors.
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| UpstreamError::Request {
                service,
                message: e.without_url().to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Status {
                service,
                status: status.as_u16(),
            });
        }

        response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| UpstreamError::Decode {
                service,
                message: e.without_url().to_string(),
            })
    }
}
