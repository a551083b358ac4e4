use anyhow::Result;
use std::sync::Arc;

use super::GlobalArgs;
use crate::api::ApiClient;
use crate::config::{load_or_default, Config};
use crate::session::store::FileStore;
use crate::session::SessionGate;

/// Everything a command needs, resolved from config file and flags
pub struct CommandContext {
    pub config: Config,
    pub client: Arc<ApiClient>,
    pub gate: Arc<SessionGate>,
}

impl CommandContext {
    pub fn new(global: &GlobalArgs) -> Result<Self> {
        let config = load_or_default(&global.config)?
            .with_overrides(global.api_url.clone(), global.session.clone())?;

        let client =
            Arc::new(ApiClient::new(&config.api_url, config.timeout()).map_err(anyhow::Error::msg)?);
        let store = Arc::new(FileStore::new(config.session_file()?));
        let gate = Arc::new(SessionGate::new(store, client.clone()));

        Ok(Self {
            config,
            client,
            gate,
        })
    }
}
