mod entity;
mod error_log;
mod record;
mod result;
mod snapshot;
mod state;

pub use entity::{Initialization, Process};
pub use error_log::{ERROR_LOG_CAPACITY, ErrorLog};
pub use record::{EntityId, ErrorRecord};
pub use result::{MAX_RESULT_LEN, ProcessResult, ResultBody, ResultValue};
pub use snapshot::{FailedSummary, ProcessRow, ProcessSnapshot, Stamped};
pub use state::State;
