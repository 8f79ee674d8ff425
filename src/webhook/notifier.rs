use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::client::WebhookTransport;
use super::types::{CountBody, ErrorsBody, InitBody, WebhookEndpoints};
use crate::error::ProcessError;
use crate::process::{ErrorRecord, ProcessResult, ResultBody};

/// Turns lifecycle events of one process into outbound webhook calls.
///
/// The only state it keeps is whether the init notification went out; every
/// other call is refused until it has.
pub struct WebhookNotifier<T> {
    process_id: String,
    endpoints: WebhookEndpoints,
    transport: T,
    initialized: bool,
}

impl<T: WebhookTransport> WebhookNotifier<T> {
    pub fn new(process_id: impl Into<String>, endpoints: WebhookEndpoints, transport: T) -> Self {
        Self {
            process_id: process_id.into(),
            endpoints,
            transport,
            initialized: false,
        }
    }

    /// Notifier for a process whose init notification was sent by an earlier
    /// run.
    pub fn resume(process_id: impl Into<String>, endpoints: WebhookEndpoints, transport: T) -> Self {
        Self {
            initialized: true,
            ..Self::new(process_id, endpoints, transport)
        }
    }

    pub fn process_id(&self) -> &str {
        &self.process_id
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn ensure_initialized(&self) -> Result<(), ProcessError> {
        if !self.initialized {
            return Err(ProcessError::NotInitialized);
        }
        Ok(())
    }

    async fn send(&self, url: &str, body: impl Serialize) -> Result<(), ProcessError> {
        let body: Value =
            serde_json::to_value(body).map_err(|e| ProcessError::InvalidArgument(e.to_string()))?;
        self.transport
            .post(url, &self.process_id, &body)
            .await
            .map_err(|e| {
                warn!(process_id = %self.process_id, %url, error = %e, "webhook delivery failed");
                ProcessError::Delivery(e)
            })
    }

    /// Announces the expected unit count. Must be the first call.
    pub async fn init_webhook(&mut self, count: Option<u64>) -> Result<(), ProcessError> {
        if self.initialized {
            return Err(ProcessError::AlreadyInitialized);
        }
        self.send(&self.endpoints.init, InitBody { count }).await?;
        self.initialized = true;
        Ok(())
    }

    /// Reports `count` newly handled units. Non-positive counts send nothing.
    pub async fn handle_webhook(&self, count: i64) -> Result<(), ProcessError> {
        self.ensure_initialized()?;
        if count <= 0 {
            debug!(process_id = %self.process_id, count, "handle webhook suppressed");
            return Ok(());
        }
        self.send(&self.endpoints.handle, CountBody { count }).await
    }

    /// Reports `count` newly skipped units. Non-positive counts send nothing.
    pub async fn skip_webhook(&self, count: i64) -> Result<(), ProcessError> {
        self.ensure_initialized()?;
        if count <= 0 {
            debug!(process_id = %self.process_id, count, "skip webhook suppressed");
            return Ok(());
        }
        self.send(&self.endpoints.skip, CountBody { count }).await
    }

    /// Reports a batch of errors in one request. An empty batch sends nothing.
    pub async fn error_webhook(&self, errors: &[ErrorRecord]) -> Result<(), ProcessError> {
        self.ensure_initialized()?;
        if errors.is_empty() {
            debug!(process_id = %self.process_id, "error webhook suppressed");
            return Ok(());
        }
        let body = ErrorsBody {
            errors: errors.to_vec(),
        };
        self.send(&self.endpoints.error, body).await
    }

    pub async fn result_webhook(&self, result: &ProcessResult) -> Result<(), ProcessError> {
        self.ensure_initialized()?;
        self.send(&self.endpoints.result, ResultBody::from(result.clone()))
            .await
    }
}
