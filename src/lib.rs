//! Lifecycle tracking for long-running, externally driven batch processes.
//!
//! A [`Process`] counts handled, skipped and failed units, keeps the last
//! errors and records a terminal result. A [`WebhookNotifier`] mirrors those
//! lifecycle events to an external system, and a [`ProcessDriver`] ties the
//! two together with a [`ProcessStore`].

pub mod cli;
pub mod commands;
pub mod config;
pub mod driver;
pub mod error;
pub mod process;
pub mod store;
pub mod ui;
pub mod webhook;

pub use driver::{ProcessDriver, load_process};
pub use error::{ProcessError, StoreError, TrackerError};
pub use process::{
    EntityId, ErrorLog, ErrorRecord, Process, ProcessResult, ProcessSnapshot, ResultValue, State,
};
pub use store::{FileStore, MemoryStore, ProcessStore};
pub use webhook::{HttpTransport, WebhookEndpoints, WebhookError, WebhookNotifier, WebhookTransport};
