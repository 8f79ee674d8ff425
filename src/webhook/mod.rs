pub mod client;
pub mod error;
pub mod notifier;
#[cfg(test)]
pub(crate) mod testing;
pub mod types;

pub use client::{
    CLIENT_ID_HEADER, HttpTransport, PROCESS_ID_HEADER, WebhookTransport, default_client_id,
};
pub use error::WebhookError;
pub use notifier::WebhookNotifier;
pub use types::{CountBody, ErrorsBody, InitBody, WebhookEndpoints};
