use thiserror::Error;

use crate::process::State;
use crate::webhook::WebhookError;

/// Failures raised by lifecycle operations on a process or a webhook notifier.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid state transition: {from} -> {to}")]
    InvalidTransition { from: State, to: State },

    #[error("Process already initialized")]
    AlreadyInitialized,

    #[error("Process is not initialized")]
    NotInitialized,

    #[error("Process already finished and can not be changed")]
    AlreadyFinished,

    #[error("Webhook delivery failed: {0}")]
    Delivery(#[from] WebhookError),
}

/// Failures of the persistence collaborator.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Corrupt process row: {0}")]
    Corrupt(String),
}

/// Top-level error for the driver and the command line.
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Process not found: {0}")]
    ProcessNotFound(String),

    #[error(transparent)]
    Process(#[from] ProcessError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl TrackerError {
    /// True when the error came from the webhook transport rather than the
    /// process itself.
    pub fn is_delivery(&self) -> bool {
        matches!(self, TrackerError::Process(ProcessError::Delivery(_)))
    }
}
