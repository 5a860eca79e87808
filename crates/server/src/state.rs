//! Shared application state.

use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};

use crate::callback::CallbackClient;
use crate::config::Settings;
use crate::storage::StorageClient;

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub storage: Arc<StorageClient>,
    pub callback: CallbackClient,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub async fn new(settings: Settings) -> Result<Self> {
        let storage = Arc::new(StorageClient::new(&settings).await);
        let callback = CallbackClient::new(settings.callback_timeout_sec)?;
        Ok(Self {
            settings: Arc::new(settings),
            storage,
            callback,
            started_at: Utc::now(),
        })
    }
}
