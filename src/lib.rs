// src/lib.rs
pub mod aggregator;
pub mod api;
pub mod cli;
pub mod config;
pub mod logging;
pub mod metric;
pub mod provider;
pub mod reader;
pub mod schema;
pub mod session;

// Re-export tracing for use in other modules
pub use tracing;

pub use aggregator::{Aggregator, Snapshot, SubmissionResult};
pub use api::{ApiClient, AuthBackend, CoachBackend, SendError, Submitter};
pub use metric::{MetricKind, TimeWindow};
pub use provider::{HealthProvider, ProviderError, SampleExport};
pub use reader::{MetricReader, MetricValue, ProviderReader, ReaderSet};
pub use session::store::{FileStore, KeyValueStore, MemoryStore};
pub use session::{Credentials, Identity, Profile, SessionError, SessionGate, SessionState};
