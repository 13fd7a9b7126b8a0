//! Application context: the store handle plus one cache per dashboard view.
//!
//! Each view owns its own [`ViewCache`] instance, constructed once at
//! startup with the view's TTL. That keeps cache state explicit and gives
//! every logical query its own freshness clock.

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::Result;
use chrono::{Duration, Utc};

use crate::cache::ViewCache;
use crate::config::AppConfig;
use crate::fetch::fetch_readings;
use crate::frame::WideFrame;
use crate::pipeline::clean;
use crate::store::ReadingStore;

pub struct Dashboard {
    store: Arc<dyn ReadingStore>,
    config: AppConfig,
    raw_cache: ViewCache<WideFrame>,
    chart_cache: ViewCache<WideFrame>,
    current_cache: ViewCache<WideFrame>,
}

impl Dashboard {
    pub fn new(store: Arc<dyn ReadingStore>, config: AppConfig) -> Self {
        let raw_cache = ViewCache::new(config.raw_view.ttl);
        let chart_cache = ViewCache::new(config.chart_view.ttl);
        let current_cache = ViewCache::new(config.current_view.ttl);
        Self {
            store,
            config,
            raw_cache,
            chart_cache,
            current_cache,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    async fn pivoted(&self, lookback: Duration) -> Result<WideFrame> {
        let readings = fetch_readings(
            &*self.store,
            self.config.owner,
            lookback,
            None,
            self.config.store_timeout,
        )
        .await?;
        Ok(WideFrame::pivot(&readings))
    }

    async fn cleaned(&self, lookback: Duration, cadence: Duration) -> Result<WideFrame> {
        let end = Utc::now();
        let start = end - lookback;
        let wide = self.pivoted(lookback).await?;
        clean(&wide, start, end, &self.config.clean_options(cadence))
    }

    /// Recent readings pivoted but not resampled or filtered.
    pub async fn raw_view(&self, force_refresh: bool) -> Result<WideFrame> {
        let lookback = self.config.raw_view.lookback;
        self.raw_cache
            .get(force_refresh, || self.pivoted(lookback))
            .await
    }

    /// Long-lookback cleaned series for the history chart.
    pub async fn chart_view(&self, force_refresh: bool) -> Result<WideFrame> {
        let view = self.config.chart_view.clone();
        self.chart_cache
            .get(force_refresh, || self.cleaned(view.lookback, view.cadence))
            .await
    }

    /// Fine-cadence cleaned series behind the current-temperature readout.
    pub async fn current_view(&self, force_refresh: bool) -> Result<WideFrame> {
        let view = self.config.current_view.clone();
        self.current_cache
            .get(force_refresh, || self.cleaned(view.lookback, view.cadence))
            .await
    }

    /// Latest cleaned value per location, for the current-temperature bar.
    pub async fn current_values(&self, force_refresh: bool) -> Result<BTreeMap<String, f64>> {
        let frame = self.current_view(force_refresh).await?;
        Ok(frame.latest_per_column())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{DataUnavailable, ReadingQuery, ReadingRow};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingStore {
        queries: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl ReadingStore for CountingStore {
        async fn query_readings(
            &self,
            _query: &ReadingQuery,
        ) -> Result<Vec<ReadingRow>, DataUnavailable> {
            self.queries.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(DataUnavailable::new("connection refused"));
            }
            Ok(vec![ReadingRow {
                timestamp: Utc::now() - Duration::minutes(1),
                location: Some("Kitchen".to_string()),
                value: 71.0,
                bias: Some(1.0),
                warning_level: None,
            }])
        }
    }

    fn dashboard(fail: bool) -> (Dashboard, Arc<CountingStore>) {
        let store = Arc::new(CountingStore {
            queries: AtomicUsize::new(0),
            fail,
        });
        let dash = Dashboard::new(store.clone(), AppConfig::from_env());
        (dash, store)
    }

    #[tokio::test]
    async fn test_raw_view_cached_between_calls() {
        let (dash, store) = dashboard(false);

        let first = dash.raw_view(false).await.unwrap();
        let second = dash.raw_view(false).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(store.queries.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_force_refresh_requeries_store() {
        let (dash, store) = dashboard(false);

        dash.raw_view(false).await.unwrap();
        dash.raw_view(true).await.unwrap();

        assert_eq!(store.queries.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_views_have_independent_caches() {
        let (dash, store) = dashboard(false);

        dash.raw_view(false).await.unwrap();
        dash.chart_view(false).await.unwrap();

        assert_eq!(store.queries.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_store_outage_propagates_when_nothing_cached() {
        let (dash, _) = dashboard(true);
        assert!(dash.raw_view(false).await.is_err());
    }

    #[tokio::test]
    async fn test_current_values_bias_corrected() {
        let (dash, _) = dashboard(false);
        let values = dash.current_values(false).await.unwrap();

        assert_eq!(values.get("Kitchen"), Some(&70.0));
    }
}
