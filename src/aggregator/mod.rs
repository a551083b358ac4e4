// src/aggregator/mod.rs
//! Fan-out over every metric reader, join, then one submission.

mod snapshot;

pub use snapshot::Snapshot;

use chrono::{DateTime, Local, TimeZone};
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::api::Submitter;
use crate::metric::MetricKind;
use crate::reader::{MetricValue, ReaderSet};
use crate::session::{SessionError, SessionGate};

/// Outcome of one aggregation run
#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionResult {
    /// The endpoint answered; `status` is informational only. Carries the
    /// snapshot that was sent.
    Success { status: u16, snapshot: Snapshot },
    /// No identity was available; nothing was read or sent
    AuthRequired,
    /// The snapshot could not be delivered
    SubmitFailed(String),
}

impl SubmissionResult {
    pub fn is_success(&self) -> bool {
        matches!(self, SubmissionResult::Success { .. })
    }
}

pub struct Aggregator {
    gate: Arc<SessionGate>,
    readers: ReaderSet,
    submitter: Arc<dyn Submitter>,
}

impl Aggregator {
    pub fn new(gate: Arc<SessionGate>, readers: ReaderSet, submitter: Arc<dyn Submitter>) -> Self {
        Self {
            gate,
            readers,
            submitter,
        }
    }

    /// Collect and submit a snapshot for the current local time
    pub async fn run(&self) -> SubmissionResult {
        self.run_at(&Local::now()).await
    }

    /// Collect and submit a snapshot with windows resolved against `now`
    #[tracing::instrument(name = "aggregate", skip(self, now), fields(player_id = tracing::field::Empty))]
    pub async fn run_at<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> SubmissionResult {
        let identity = match self.gate.require_identity() {
            Ok(identity) => identity,
            Err(SessionError::AuthRequired) => {
                info!("no identity, skipping aggregation");
                return SubmissionResult::AuthRequired;
            }
            Err(e) => {
                // An unreadable store is treated as no session
                warn!(error = %e, "identity lookup failed, skipping aggregation");
                return SubmissionResult::AuthRequired;
            }
        };
        tracing::Span::current().record("player_id", identity.player_id.as_str());

        let results = self.collect(now).await;
        let snapshot = Snapshot::assemble(&identity, results);

        let missing = snapshot.missing();
        if !missing.is_empty() {
            debug!(missing = ?missing, "metrics without data reported as zero");
        }

        let payload = snapshot.to_payload();
        match self.submitter.submit(&payload).await {
            Ok(status) => {
                info!(
                    status,
                    missing = missing.len(),
                    "snapshot submitted"
                );
                SubmissionResult::Success { status, snapshot }
            }
            Err(e) => {
                error!(error = %e, "snapshot submission failed");
                SubmissionResult::SubmitFailed(e.to_string())
            }
        }
    }

    /// Read every kind concurrently and wait for all of them
    async fn collect<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> HashMap<MetricKind, MetricValue> {
        let mut futures = Vec::new();

        for kind in MetricKind::all() {
            let kind = *kind;
            let window = kind.lookback().resolve(now);
            if let Some(reader) = self.readers.get(kind) {
                let reader = reader.clone();
                futures.push(async move {
                    let value = reader.read(kind, &window).await;
                    (kind, value)
                });
            }
        }

        join_all(futures).await.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{AuthBackend, SendError};
    use crate::metric::TimeWindow;
    use crate::reader::MetricReader;
    use crate::schema::{
        AuthResponse, LoginResponse, MetricPayload, RegisterRequest, ResetPasswordRequest,
    };
    use crate::session::store::{KeyValueStore, MemoryStore, StoreError};
    use crate::session::{SessionState, PLAYER_ID_KEY, TOKEN_KEY};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    struct NoBackend;

    #[async_trait::async_trait]
    impl AuthBackend for NoBackend {
        async fn login(&self, _u: &str, _p: &str) -> Result<LoginResponse, SendError> {
            Err(SendError::Network("offline".to_string()))
        }
        async fn register(&self, _r: &RegisterRequest) -> Result<AuthResponse, SendError> {
            Err(SendError::Network("offline".to_string()))
        }
        async fn reset_password(
            &self,
            _r: &ResetPasswordRequest,
        ) -> Result<AuthResponse, SendError> {
            Err(SendError::Network("offline".to_string()))
        }
    }

    /// Reader returning fixed per-kind values after an optional delay
    struct ScriptedReader {
        values: HashMap<MetricKind, f64>,
        delay: Duration,
        reads: AtomicUsize,
    }

    impl ScriptedReader {
        fn new(values: &[(MetricKind, f64)]) -> Self {
            Self {
                values: values.iter().copied().collect(),
                delay: Duration::ZERO,
                reads: AtomicUsize::new(0),
            }
        }

        fn delayed(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }
    }

    #[async_trait::async_trait]
    impl MetricReader for ScriptedReader {
        async fn read(&self, kind: MetricKind, _window: &TimeWindow) -> MetricValue {
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.values.get(&kind).copied().into()
        }
    }

    /// Submitter recording payloads; optionally failing every call
    #[derive(Default)]
    struct RecordingSubmitter {
        payloads: Mutex<Vec<MetricPayload>>,
        fail: bool,
    }

    #[async_trait::async_trait]
    impl Submitter for RecordingSubmitter {
        async fn submit(&self, payload: &MetricPayload) -> Result<u16, SendError> {
            self.payloads.lock().unwrap().push(payload.clone());
            if self.fail {
                Err(SendError::Network("connection refused".to_string()))
            } else {
                Ok(200)
            }
        }
    }

    fn scenario_values() -> Vec<(MetricKind, f64)> {
        vec![
            (MetricKind::StepCount, 8000.0),
            (MetricKind::HeartRate, 72.0),
            (MetricKind::BloodOxygen, 97.5),
            (MetricKind::Hrv, 40.0),
            (MetricKind::Vo2Max, 3.1),
            (MetricKind::StepLength, 0.75),
            (MetricKind::ElevationGain, 2.0),
        ]
    }

    fn gate(logged_in: bool) -> Arc<SessionGate> {
        let store = Arc::new(MemoryStore::new());
        if logged_in {
            store
                .put_many(&[(TOKEN_KEY, "abc"), (PLAYER_ID_KEY, "42")])
                .unwrap();
        }
        Arc::new(SessionGate::new(store, Arc::new(NoBackend)))
    }

    fn aggregator(
        logged_in: bool,
        reader: Arc<ScriptedReader>,
        submitter: Arc<RecordingSubmitter>,
    ) -> Aggregator {
        Aggregator::new(gate(logged_in), ReaderSet::uniform(reader), submitter)
    }

    #[tokio::test]
    async fn submits_full_snapshot_with_identity() {
        let reader = Arc::new(ScriptedReader::new(&scenario_values()));
        let submitter = Arc::new(RecordingSubmitter::default());

        let result = aggregator(true, reader.clone(), submitter.clone()).run().await;

        let SubmissionResult::Success { status, snapshot } = result else {
            panic!("expected success, got {:?}", result);
        };
        assert_eq!(status, 200);
        assert_eq!(snapshot.player_id(), "42");
        assert!(snapshot.missing().is_empty());
        assert_eq!(reader.reads.load(Ordering::SeqCst), MetricKind::all().len());
        let payloads = submitter.payloads.lock().unwrap();
        assert_eq!(payloads.len(), 1);
        assert_eq!(
            payloads[0],
            MetricPayload {
                player_id: "42".to_string(),
                step_count: 8000,
                heart_rate: 72,
                blood_oxygen_level: 97,
                hrv: 40.0,
                vo_max: 3.1,
                cadence: 0.75,
                elevation_gain: 2,
            }
        );
    }

    #[tokio::test]
    async fn missing_identity_reads_and_sends_nothing() {
        let reader = Arc::new(ScriptedReader::new(&scenario_values()));
        let submitter = Arc::new(RecordingSubmitter::default());

        let result = aggregator(false, reader.clone(), submitter.clone()).run().await;

        assert_eq!(result, SubmissionResult::AuthRequired);
        assert_eq!(reader.reads.load(Ordering::SeqCst), 0);
        assert!(submitter.payloads.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_login_session_is_fail_closed() {
        let store = Arc::new(MemoryStore::new());
        store
            .put_many(&[(TOKEN_KEY, "stale"), (PLAYER_ID_KEY, "9")])
            .unwrap();
        let gate = Arc::new(SessionGate::new(store, Arc::new(NoBackend)));
        let credentials = crate::session::Credentials {
            email: "a@b.c".to_string(),
            password: "pw".to_string(),
        };
        assert!(gate.login(&credentials).await.is_err());

        let reader = Arc::new(ScriptedReader::new(&scenario_values()));
        let submitter = Arc::new(RecordingSubmitter::default());
        let result = Aggregator::new(gate, ReaderSet::uniform(reader.clone()), submitter.clone())
            .run()
            .await;

        assert_eq!(result, SubmissionResult::AuthRequired);
        assert_eq!(reader.reads.load(Ordering::SeqCst), 0);
        assert!(submitter.payloads.lock().unwrap().is_empty());
    }

    /// Store that keeps whatever it holds: removals always fail
    #[derive(Default)]
    struct UnclearableStore(MemoryStore);

    impl KeyValueStore for UnclearableStore {
        fn get_many(&self, keys: &[&str]) -> Result<Vec<Option<String>>, StoreError> {
            self.0.get_many(keys)
        }

        fn put_many(&self, entries: &[(&str, &str)]) -> Result<(), StoreError> {
            self.0.put_many(entries)
        }

        fn remove_many(&self, _keys: &[&str]) -> Result<(), StoreError> {
            Err(StoreError::Io("disk full".to_string()))
        }
    }

    #[tokio::test]
    async fn failed_login_with_unclearable_store_is_fail_closed() {
        let store = Arc::new(UnclearableStore::default());
        store
            .put_many(&[(TOKEN_KEY, "old"), (PLAYER_ID_KEY, "7")])
            .unwrap();
        let gate = Arc::new(SessionGate::new(store, Arc::new(NoBackend)));
        let credentials = crate::session::Credentials {
            email: "a@b.c".to_string(),
            password: "pw".to_string(),
        };
        assert!(gate.login(&credentials).await.is_err());
        assert_eq!(gate.state(), SessionState::AuthFailed);

        let reader = Arc::new(ScriptedReader::new(&scenario_values()));
        let submitter = Arc::new(RecordingSubmitter::default());
        let result = Aggregator::new(gate, ReaderSet::uniform(reader.clone()), submitter.clone())
            .run()
            .await;

        assert_eq!(result, SubmissionResult::AuthRequired);
        assert_eq!(reader.reads.load(Ordering::SeqCst), 0);
        assert!(submitter.payloads.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn no_data_reports_zero_and_still_succeeds() {
        let reader = Arc::new(ScriptedReader::new(&[(MetricKind::StepCount, 1234.0)]));
        let submitter = Arc::new(RecordingSubmitter::default());

        let result = aggregator(true, reader, submitter.clone()).run().await;

        let SubmissionResult::Success { snapshot, .. } = result else {
            panic!("expected success, got {:?}", result);
        };
        assert!(snapshot.get(MetricKind::StepCount).is_observed());
        assert_eq!(snapshot.missing().len(), MetricKind::all().len() - 1);
        let payload = submitter.payloads.lock().unwrap()[0].clone();
        assert_eq!(payload.step_count, 1234);
        assert_eq!(payload.heart_rate, 0);
        assert_eq!(payload.hrv, 0.0);
    }

    #[tokio::test]
    async fn transport_failure_is_reported_once_without_retry() {
        let reader = Arc::new(ScriptedReader::new(&scenario_values()));
        let submitter = Arc::new(RecordingSubmitter {
            fail: true,
            ..Default::default()
        });

        let result = aggregator(true, reader, submitter.clone()).run().await;

        assert!(matches!(result, SubmissionResult::SubmitFailed(_)));
        assert_eq!(submitter.payloads.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_reader_delays_submission_until_all_complete() {
        let fast = Arc::new(ScriptedReader::new(&scenario_values()));
        let slow = Arc::new(
            ScriptedReader::new(&[(MetricKind::Vo2Max, 4.2)]).delayed(Duration::from_secs(30)),
        );
        let submitter = Arc::new(RecordingSubmitter::default());
        let aggregator = Aggregator::new(
            gate(true),
            ReaderSet::uniform(fast).with(MetricKind::Vo2Max, slow.clone()),
            submitter.clone(),
        );

        let run = tokio::spawn(async move { aggregator.run().await });
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(submitter.payloads.lock().unwrap().is_empty());

        let result = run.await.unwrap();

        assert!(result.is_success());
        assert_eq!(slow.reads.load(Ordering::SeqCst), 1);
        let payloads = submitter.payloads.lock().unwrap();
        assert_eq!(payloads.len(), 1);
        assert!((payloads[0].vo_max - 4.2).abs() < 1e-9);
    }

    #[tokio::test]
    async fn windows_are_resolved_per_kind() {
        struct WindowProbe(Mutex<HashMap<MetricKind, TimeWindow>>);

        #[async_trait::async_trait]
        impl MetricReader for WindowProbe {
            async fn read(&self, kind: MetricKind, window: &TimeWindow) -> MetricValue {
                self.0.lock().unwrap().insert(kind, *window);
                MetricValue::missing()
            }
        }

        let probe = Arc::new(WindowProbe(Mutex::new(HashMap::new())));
        let aggregator = Aggregator::new(
            gate(true),
            ReaderSet::uniform(probe.clone()),
            Arc::new(RecordingSubmitter::default()),
        );
        let now = DateTime::parse_from_rfc3339("2025-03-10T12:00:00Z").unwrap();

        aggregator.run_at(&now).await;

        let windows = probe.0.lock().unwrap();
        let hours = |kind: MetricKind| (windows[&kind].end - windows[&kind].start).num_hours();
        assert_eq!(hours(MetricKind::HeartRate), 1);
        assert_eq!(hours(MetricKind::Hrv), 24);
        assert_eq!(hours(MetricKind::Vo2Max), 7 * 24);
        assert_eq!(hours(MetricKind::StepCount), 12);
    }
}
