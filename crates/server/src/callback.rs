//! Completion callback client.

use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::error::CallbackError;
use crate::schemas::{CallbackFailurePayload, CallbackSuccessPayload};

const MAX_RETRIES: u32 = 3;
const RETRY_DELAY: Duration = Duration::from_secs(2);

/// POSTs completion payloads to the caller's callback URL.
#[derive(Clone)]
pub struct CallbackClient {
    client: Client,
}

impl CallbackClient {
    pub fn new(timeout_sec: u64) -> Result<Self, CallbackError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_sec))
            .build()
            .map_err(|err| CallbackError(format!("failed to build HTTP client: {err}")))?;
        Ok(Self { client })
    }

    pub async fn send_success(
        &self,
        url: &str,
        payload: &CallbackSuccessPayload,
    ) -> Result<(), CallbackError> {
        self.post(url, payload).await
    }

    pub async fn send_failure(
        &self,
        url: &str,
        payload: &CallbackFailurePayload,
    ) -> Result<(), CallbackError> {
        self.post(url, payload).await
    }

    /// POST with up to three attempts and a fixed delay between them. Any
    /// non-2xx response counts as a failed attempt.
    async fn post<T: Serialize>(&self, url: &str, payload: &T) -> Result<(), CallbackError> {
        let mut last_err = String::new();
        for attempt in 1..=MAX_RETRIES {
            match self.try_post(url, payload).await {
                Ok(status) => {
                    info!("Callback sent to {url}, status={status}");
                    return Ok(());
                }
                Err(err) => {
                    warn!("Callback attempt {attempt}/{MAX_RETRIES} failed: {err}");
                    last_err = err;
                    if attempt < MAX_RETRIES {
                        tokio::time::sleep(RETRY_DELAY).await;
                    }
                }
            }
        }
        error!("Callback failed after {MAX_RETRIES} retries: {last_err}");
        Err(CallbackError(format!(
            "Callback failed after {MAX_RETRIES} retries: {last_err}"
        )))
    }

    async fn try_post<T: Serialize>(&self, url: &str, payload: &T) -> Result<u16, String> {
        let response = self
            .client
            .post(url)
            .json(payload)
            .send()
            .await
            .map_err(|err| err.to_string())?;
        let status = response.status().as_u16();
        response.error_for_status().map_err(|err| err.to_string())?;
        Ok(status)
    }
}
