//! In-memory transport for exercising the notifier without a network.

use std::sync::Mutex;

use serde_json::Value;

use super::client::WebhookTransport;
use super::error::WebhookError;

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub url: String,
    pub process_id: String,
    pub body: Value,
}

#[derive(Default)]
pub struct RecordingTransport {
    calls: Mutex<Vec<RecordedCall>>,
    fail_status: Mutex<Option<u16>>,
}

impl RecordingTransport {
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Makes every following call fail with the given HTTP status.
    pub fn fail_with_status(&self, status: u16) {
        *self.fail_status.lock().unwrap() = Some(status);
    }
}

impl WebhookTransport for RecordingTransport {
    async fn post(&self, url: &str, process_id: &str, body: &Value) -> Result<(), WebhookError> {
        if let Some(status) = *self.fail_status.lock().unwrap() {
            return Err(WebhookError::Api {
                status,
                message: "recording transport failure".into(),
            });
        }
        self.calls.lock().unwrap().push(RecordedCall {
            url: url.to_string(),
            process_id: process_id.to_string(),
            body: body.clone(),
        });
        Ok(())
    }
}
