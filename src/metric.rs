use chrono::{DateTime, Duration, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Type-safe representation of the collected health metrics
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MetricKind {
    #[serde(rename = "step_count")]
    StepCount,
    #[serde(rename = "heart_rate")]
    HeartRate,
    #[serde(rename = "blood_oxygen")]
    BloodOxygen,
    #[serde(rename = "hrv")]
    Hrv,
    #[serde(rename = "vo2_max")]
    Vo2Max,
    #[serde(rename = "step_length")]
    StepLength,
    #[serde(rename = "elevation_gain")]
    ElevationGain,
}

/// How samples inside a window are folded into one value
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Aggregation {
    CumulativeSum,
    DiscreteAverage,
}

/// How far back a metric looks from "now"
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lookback {
    StartOfDay,
    Hours(i64),
    Days(i64),
}

/// Closed time interval a reader computes its statistic over
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.start && at <= self.end
    }

    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        end >= self.start && start <= self.end
    }
}

impl Lookback {
    /// Resolve against a clock reading. "Start of day" is midnight in the
    /// caller's time zone.
    pub fn resolve<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> TimeWindow {
        let end = now.with_timezone(&Utc);
        let start = match self {
            Lookback::StartOfDay => {
                let midnight = now.date_naive().and_time(NaiveTime::MIN);
                now.timezone()
                    .from_local_datetime(&midnight)
                    .earliest()
                    .map(|d| d.with_timezone(&Utc))
                    // DST gap at midnight: fall back to a 24h window
                    .unwrap_or(end - Duration::hours(24))
            }
            Lookback::Hours(h) => end - Duration::hours(*h),
            Lookback::Days(d) => end - Duration::days(*d),
        };
        TimeWindow { start, end }
    }
}

impl MetricKind {
    /// Lookback window used when reading this metric
    pub fn lookback(&self) -> Lookback {
        match self {
            MetricKind::StepCount => Lookback::StartOfDay,
            MetricKind::HeartRate => Lookback::Hours(1),
            MetricKind::BloodOxygen => Lookback::Hours(1),
            MetricKind::Hrv => Lookback::Days(1),
            MetricKind::Vo2Max => Lookback::Days(7),
            MetricKind::StepLength => Lookback::Hours(1),
            MetricKind::ElevationGain => Lookback::StartOfDay,
        }
    }

    pub fn aggregation(&self) -> Aggregation {
        match self {
            MetricKind::StepCount | MetricKind::ElevationGain => Aggregation::CumulativeSum,
            _ => Aggregation::DiscreteAverage,
        }
    }

    /// Multiplier from provider units to reported units.
    /// Oxygen saturation arrives as a fraction and is reported as percent.
    pub fn scale(&self) -> f64 {
        match self {
            MetricKind::BloodOxygen => 100.0,
            _ => 1.0,
        }
    }

    /// Whether a sample must start inside the window to count, rather than
    /// merely overlap it
    pub fn strict_start(&self) -> bool {
        matches!(self, MetricKind::StepCount | MetricKind::HeartRate)
    }

    /// Key used in the `/player_metric` payload
    pub fn wire_key(&self) -> &'static str {
        match self {
            MetricKind::StepCount => "step_count",
            MetricKind::HeartRate => "heart_rate",
            MetricKind::BloodOxygen => "blood_oxygen_level",
            MetricKind::Hrv => "hrv",
            MetricKind::Vo2Max => "vo_max",
            MetricKind::StepLength => "cadence",
            MetricKind::ElevationGain => "elevation_gain",
        }
    }

    /// Human label with unit, printed by `sync`
    pub fn label(&self) -> &'static str {
        match self {
            MetricKind::StepCount => "steps",
            MetricKind::HeartRate => "heart rate (bpm)",
            MetricKind::BloodOxygen => "blood oxygen (%)",
            MetricKind::Hrv => "HRV (ms)",
            MetricKind::Vo2Max => "VO2 max (L/min)",
            MetricKind::StepLength => "step length (m)",
            MetricKind::ElevationGain => "floors climbed",
        }
    }

    /// All collected metric kinds
    pub fn all() -> &'static [MetricKind] {
        &[
            MetricKind::StepCount,
            MetricKind::HeartRate,
            MetricKind::BloodOxygen,
            MetricKind::Hrv,
            MetricKind::Vo2Max,
            MetricKind::StepLength,
            MetricKind::ElevationGain,
        ]
    }
}
