//! Request bodies posted to the webhook endpoints.

use serde::{Deserialize, Serialize};

use crate::process::ErrorRecord;

/// Body of the init notification. `count` is null when the expected number
/// of units is unknown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitBody {
    pub count: Option<u64>,
}

/// Body of the handle and skip notifications: the delta since the last call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountBody {
    pub count: i64,
}

/// Body of the error notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorsBody {
    pub errors: Vec<ErrorRecord>,
}

/// URLs the notifier posts each lifecycle event to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookEndpoints {
    pub init: String,
    pub handle: String,
    pub skip: String,
    pub error: String,
    pub result: String,
}

impl WebhookEndpoints {
    /// Endpoints laid out as `<base>/init`, `<base>/handle`, ...
    pub fn under(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            init: format!("{base}/init"),
            handle: format!("{base}/handle"),
            skip: format!("{base}/skip"),
            error: format!("{base}/error"),
            result: format!("{base}/result"),
        }
    }
}
