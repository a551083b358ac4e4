// src/api/mod.rs
pub mod client;
pub mod sender;

pub use client::ApiClient;
pub use sender::{AuthBackend, CoachBackend, SendError, Submitter};
