use std::time::Duration;

use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use super::error::WebhookError;

/// Header carrying the id of the process a notification is about.
pub const PROCESS_ID_HEADER: &str = "X-Process-Id";
/// Header identifying this client to the receiving system.
pub const CLIENT_ID_HEADER: &str = "X-Client-Id";

/// Default value of [`CLIENT_ID_HEADER`].
pub fn default_client_id() -> String {
    format!("process-tracker/{}", env!("CARGO_PKG_VERSION"))
}

/// Capability to POST a JSON body to a URL on behalf of a process.
///
/// Connection pooling, TLS and timeouts belong to the implementation.
#[allow(async_fn_in_trait)]
pub trait WebhookTransport {
    async fn post(&self, url: &str, process_id: &str, body: &Value) -> Result<(), WebhookError>;
}

/// [`WebhookTransport`] over a pooled `reqwest` client.
pub struct HttpTransport {
    client: Client,
    client_id: String,
}

impl HttpTransport {
    pub fn new(client_id: String) -> Result<Self, WebhookError> {
        Self::with_timeouts(client_id, Duration::from_secs(10), Duration::from_secs(30))
    }

    pub fn with_timeouts(
        client_id: String,
        connect_timeout: Duration,
        timeout: Duration,
    ) -> Result<Self, WebhookError> {
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(timeout)
            .build()?;
        Ok(Self { client, client_id })
    }
}

impl WebhookTransport for HttpTransport {
    async fn post(&self, url: &str, process_id: &str, body: &Value) -> Result<(), WebhookError> {
        debug!(%url, %process_id, "posting webhook");
        let response = self
            .client
            .post(url)
            .header(PROCESS_ID_HEADER, process_id)
            .header(CLIENT_ID_HEADER, &self.client_id)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(WebhookError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(())
    }
}
