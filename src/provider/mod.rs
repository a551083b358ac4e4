// src/provider/mod.rs
//! Health data sources that readers query for per-window statistics.

mod export;

pub use export::{Sample, SampleExport};

use crate::metric::{Aggregation, MetricKind, TimeWindow};

/// Errors a health data source can report for a single query
#[derive(Debug)]
pub enum ProviderError {
    /// Read access to this metric has not been granted
    Unauthorized(MetricKind),
    Load(String),
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderError::Unauthorized(kind) => write!(f, "read access denied for {:?}", kind),
            ProviderError::Load(msg) => write!(f, "failed to load samples: {}", msg),
        }
    }
}

impl std::error::Error for ProviderError {}

/// Trait for a source of health samples (abstracts the on-device store)
#[async_trait::async_trait]
pub trait HealthProvider: Send + Sync {
    /// Compute one statistic over the window, in the provider's native unit.
    /// `Ok(None)` means the window holds no samples.
    async fn statistic(
        &self,
        kind: MetricKind,
        window: &TimeWindow,
        aggregation: Aggregation,
        strict_start: bool,
    ) -> Result<Option<f64>, ProviderError>;
}
