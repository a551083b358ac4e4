//! Per-metric readers. A read never fails: provider errors and empty windows
//! both resolve to a missing value, which reports as zero.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::metric::{MetricKind, TimeWindow};
use crate::provider::HealthProvider;

/// Scalar result of one read. Keeps "no data" distinguishable from an
/// observed zero while still defaulting to zero for reporting.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MetricValue(Option<f64>);

impl MetricValue {
    pub fn observed(value: f64) -> Self {
        Self(Some(value))
    }

    pub fn missing() -> Self {
        Self(None)
    }

    pub fn is_observed(&self) -> bool {
        self.0.is_some()
    }

    /// Reported value; zero when nothing was observed
    pub fn value(&self) -> f64 {
        self.0.unwrap_or(0.0)
    }
}

impl From<Option<f64>> for MetricValue {
    fn from(value: Option<f64>) -> Self {
        Self(value)
    }
}

/// Trait for computing a single metric over a time window
#[async_trait::async_trait]
pub trait MetricReader: Send + Sync {
    async fn read(&self, kind: MetricKind, window: &TimeWindow) -> MetricValue;
}

/// Reader backed by a [`HealthProvider`], applying the kind's policy
pub struct ProviderReader {
    provider: Arc<dyn HealthProvider>,
}

impl ProviderReader {
    pub fn new(provider: Arc<dyn HealthProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait::async_trait]
impl MetricReader for ProviderReader {
    async fn read(&self, kind: MetricKind, window: &TimeWindow) -> MetricValue {
        let result = self
            .provider
            .statistic(kind, window, kind.aggregation(), kind.strict_start())
            .await;

        match result {
            Ok(Some(raw)) => MetricValue::observed(raw * kind.scale()),
            Ok(None) => {
                debug!(kind = ?kind, "no samples in window");
                MetricValue::missing()
            }
            Err(e) => {
                warn!(kind = ?kind, error = %e, "metric read failed, reporting as missing");
                MetricValue::missing()
            }
        }
    }
}

/// One reader per metric kind. Always covers every kind.
#[derive(Clone)]
pub struct ReaderSet {
    readers: HashMap<MetricKind, Arc<dyn MetricReader>>,
}

impl ReaderSet {
    /// Use the same reader for every kind
    pub fn uniform(reader: Arc<dyn MetricReader>) -> Self {
        let readers = MetricKind::all()
            .iter()
            .map(|kind| (*kind, reader.clone()))
            .collect();
        Self { readers }
    }

    /// One [`ProviderReader`] instance per kind over a shared provider
    pub fn from_provider(provider: Arc<dyn HealthProvider>) -> Self {
        let readers = MetricKind::all()
            .iter()
            .map(|kind| {
                let reader: Arc<dyn MetricReader> =
                    Arc::new(ProviderReader::new(provider.clone()));
                (*kind, reader)
            })
            .collect();
        Self { readers }
    }

    /// Replace the reader for one kind
    pub fn with(mut self, kind: MetricKind, reader: Arc<dyn MetricReader>) -> Self {
        self.readers.insert(kind, reader);
        self
    }

    pub fn get(&self, kind: MetricKind) -> Option<&Arc<dyn MetricReader>> {
        self.readers.get(&kind)
    }
}
