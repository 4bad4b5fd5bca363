//! `SeaORM`-backed implementation of the `LookupService` trait.

use crate::clients::UpstreamClient;
use crate::config::UpstreamConfig;
use crate::db::{Store, StoreOutcome};
use crate::models::{Provenance, ServiceType};
use crate::services::lookup_service::{LookupError, LookupResult, LookupService, validate_query};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct SeaOrmLookupService {
    store: Store,
    upstream: Arc<dyn UpstreamClient>,
    config: UpstreamConfig,
}

impl SeaOrmLookupService {
    #[must_use]
    pub fn new(store: Store, upstream: Arc<dyn UpstreamClient>, config: UpstreamConfig) -> Self {
        Self {
            store,
            upstream,
            config,
        }
    }

    fn record(service: ServiceType, source: Provenance) {
        metrics::counter!(
            "geocache_lookups_total",
            "service" => service.as_str(),
            "source" => source.as_str()
        )
        .increment(1);
    }
}

#[async_trait]
impl LookupService for SeaOrmLookupService {
    fn is_available(&self, service: ServiceType) -> bool {
        self.config.api_key(service).is_some()
    }

    async fn lookup(
        &self,
        service: ServiceType,
        query: &str,
    ) -> Result<LookupResult, LookupError> {
        if !self.is_available(service) {
            return Err(LookupError::Unavailable(service));
        }

        let query = validate_query(query)?;

        if let Some(cached) = self.store.lookup(query, service).await? {
            debug!("Cache hit for {} '{}'", service, query);
            Self::record(service, Provenance::Cache);
            return Ok(LookupResult {
                result: cached,
                source: Provenance::Cache,
            });
        }

        let payload = self.upstream.fetch(service, query).await.map_err(|e| {
            warn!("Upstream fetch failed for {} '{}': {}", service, query, e);
            e
        })?;

        // A failed write still leaves a valid payload for this caller.
        match self.store.store(query, service, &payload).await {
            Ok(StoreOutcome::Inserted) => info!("Cached {} '{}'", service, query),
            Ok(StoreOutcome::AlreadyExists) => {
                debug!("{} '{}' was cached concurrently, keeping first write", service, query);
            }
            Err(e) => warn!("Failed to cache {} '{}': {}", service, query, e),
        }

        Self::record(service, Provenance::Upstream);
        Ok(LookupResult {
            result: payload,
            source: Provenance::Upstream,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::UpstreamError;
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    #[derive(Default)]
    struct ScriptedUpstream {
        calls: AtomicUsize,
        failing: AtomicBool,
    }

    #[async_trait]
    impl UpstreamClient for ScriptedUpstream {
        async fn fetch(
            &self,
            service: ServiceType,
            query: &str,
        ) -> Result<serde_json::Value, UpstreamError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if self.failing.load(Ordering::SeqCst) {
                return Err(UpstreamError::Status {
                    service,
                    status: 502,
                });
            }
            Ok(json!({ "service": service, "query": query, "call": call }))
        }
    }

    fn keyed_config() -> UpstreamConfig {
        UpstreamConfig {
            geocode_api_key: Some("geo-key".to_string()),
            suggest_api_key: Some("suggest-key".to_string()),
            ..UpstreamConfig::default()
        }
    }

    async fn service_with(
        config: UpstreamConfig,
    ) -> (SeaOrmLookupService, Arc<ScriptedUpstream>, Store) {
        let store = Store::new("sqlite::memory:").await.unwrap();
        let upstream = Arc::new(ScriptedUpstream::default());
        let service = SeaOrmLookupService::new(store.clone(), upstream.clone(), config);
        (service, upstream, store)
    }

    #[tokio::test]
    async fn miss_then_hit_returns_same_payload() {
        let (service, upstream, _) = service_with(keyed_config()).await;

        let first = service.lookup(ServiceType::Geocode, "Moscow").await.unwrap();
        assert_eq!(first.source, Provenance::Upstream);

        let second = service.lookup(ServiceType::Geocode, "Moscow").await.unwrap();
        assert_eq!(second.source, Provenance::Cache);
        assert_eq!(second.result, first.result);
        assert_eq!(upstream.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn surrounding_whitespace_shares_the_key() {
        let (service, upstream, store) = service_with(keyed_config()).await;

        service.lookup(ServiceType::Suggest, "  Kazan ").await.unwrap();
        let again = service.lookup(ServiceType::Suggest, "Kazan").await.unwrap();

        assert_eq!(again.source, Provenance::Cache);
        assert_eq!(again.result["query"], "Kazan");
        assert_eq!(upstream.calls.load(Ordering::SeqCst), 1);
        assert!(store.lookup("  Kazan ", ServiceType::Suggest).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn case_variants_are_distinct_keys() {
        let (service, upstream, _) = service_with(keyed_config()).await;

        service.lookup(ServiceType::Geocode, "moscow").await.unwrap();
        let upper = service.lookup(ServiceType::Geocode, "MOSCOW").await.unwrap();

        assert_eq!(upper.source, Provenance::Upstream);
        assert_eq!(upstream.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn services_do_not_share_entries() {
        let (service, upstream, _) = service_with(keyed_config()).await;

        service.lookup(ServiceType::Geocode, "Moscow").await.unwrap();
        let suggest = service.lookup(ServiceType::Suggest, "Moscow").await.unwrap();

        assert_eq!(suggest.source, Provenance::Upstream);
        assert_eq!(suggest.result["service"], "suggest");
        assert_eq!(upstream.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn short_query_touches_nothing() {
        let (service, upstream, store) = service_with(keyed_config()).await;

        let err = service.lookup(ServiceType::Geocode, "  ab ").await.unwrap_err();

        assert!(matches!(err, LookupError::QueryTooShort));
        assert_eq!(upstream.calls.load(Ordering::SeqCst), 0);
        assert!(store.lookup("ab", ServiceType::Geocode).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn missing_credential_rejects_before_validation() {
        let config = UpstreamConfig {
            suggest_api_key: Some("suggest-key".to_string()),
            ..UpstreamConfig::default()
        };
        let (service, upstream, _) = service_with(config).await;

        assert!(!service.is_available(ServiceType::Geocode));
        for query in ["Moscow", "ab", ""] {
            let err = service.lookup(ServiceType::Geocode, query).await.unwrap_err();
            assert!(matches!(err, LookupError::Unavailable(ServiceType::Geocode)));
        }
        assert_eq!(upstream.calls.load(Ordering::SeqCst), 0);

        let ok = service.lookup(ServiceType::Suggest, "Moscow").await.unwrap();
        assert_eq!(ok.source, Provenance::Upstream);
    }

    #[tokio::test]
    async fn upstream_failure_is_not_cached() {
        let (service, upstream, store) = service_with(keyed_config()).await;
        upstream.failing.store(true, Ordering::SeqCst);

        let err = service.lookup(ServiceType::Geocode, "Moscow").await.unwrap_err();
        assert!(matches!(err, LookupError::Upstream(_)));
        assert_eq!(err.to_string(), "Yandex Geocode error: HTTP 502");
        assert!(store.lookup("Moscow", ServiceType::Geocode).await.unwrap().is_none());

        upstream.failing.store(false, Ordering::SeqCst);
        let retried = service.lookup(ServiceType::Geocode, "Moscow").await.unwrap();
        assert_eq!(retried.source, Provenance::Upstream);
        assert_eq!(upstream.calls.load(Ordering::SeqCst), 2);
    }
}
