use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

use super::{HealthProvider, ProviderError};
use crate::metric::{Aggregation, MetricKind, TimeWindow};

/// One recorded measurement, in the source's native unit
#[derive(Debug, Clone, Deserialize)]
pub struct Sample {
    pub kind: MetricKind,
    pub value: f64,
    pub start: DateTime<Utc>,
    /// Instantaneous samples omit this
    #[serde(default)]
    pub end: Option<DateTime<Utc>>,
}

impl Sample {
    fn end(&self) -> DateTime<Utc> {
        self.end.unwrap_or(self.start)
    }
}

/// Samples exported from a device as JSON, queried in memory
#[derive(Debug, Default, Deserialize)]
pub struct SampleExport {
    #[serde(default)]
    pub samples: Vec<Sample>,
    /// Kinds the user has not granted read access to
    #[serde(default)]
    pub unauthorized: Vec<MetricKind>,
}

impl SampleExport {
    pub fn from_json(json: &str) -> Result<Self, ProviderError> {
        serde_json::from_str(json).map_err(|e| ProviderError::Load(e.to_string()))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ProviderError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ProviderError::Load(format!("{}: {}", path.display(), e)))?;
        let export = Self::from_json(&content)?;
        debug!(
            path = %path.display(),
            samples = export.samples.len(),
            "loaded sample export"
        );
        Ok(export)
    }

    fn in_window<'a>(
        &'a self,
        kind: MetricKind,
        window: &'a TimeWindow,
        strict_start: bool,
    ) -> impl Iterator<Item = f64> + 'a {
        self.samples
            .iter()
            .filter(move |s| s.kind == kind)
            .filter(move |s| {
                if strict_start {
                    window.contains(s.start)
                } else {
                    window.overlaps(s.start, s.end())
                }
            })
            .map(|s| s.value)
    }
}

#[async_trait::async_trait]
impl HealthProvider for SampleExport {
    async fn statistic(
        &self,
        kind: MetricKind,
        window: &TimeWindow,
        aggregation: Aggregation,
        strict_start: bool,
    ) -> Result<Option<f64>, ProviderError> {
        if self.unauthorized.contains(&kind) {
            return Err(ProviderError::Unauthorized(kind));
        }

        let values: Vec<f64> = self.in_window(kind, window, strict_start).collect();
        if values.is_empty() {
            return Ok(None);
        }

        let sum: f64 = values.iter().sum();
        let value = match aggregation {
            Aggregation::CumulativeSum => sum,
            Aggregation::DiscreteAverage => sum / values.len() as f64,
        };
        Ok(Some(value))
    }
}
