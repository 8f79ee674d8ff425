//! Errors raised while delivering a webhook.

use thiserror::Error;

/// Failures of the outbound HTTP transport.
///
/// The notifier never retries: these surface to the caller as a delivery
/// failure and the process state stays untouched.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// The endpoint answered with a non-2xx status.
    #[error("endpoint returned status {status}: {message}")]
    Api { status: u16, message: String },

    /// DNS, connection, TLS or timeout failure underneath `reqwest`.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}
