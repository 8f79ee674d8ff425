use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, info};
use uuid::Uuid;

use super::error_log::ErrorLog;
use super::record::ErrorRecord;
use super::result::{MAX_RESULT_LEN, ProcessResult, ResultValue};
use super::snapshot::{FailedSummary, ProcessRow, ProcessSnapshot, Stamped};
use super::state::State;
use crate::error::{ProcessError, StoreError};

/// Recorded call to [`Process::initialize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Initialization {
    /// Expected number of units; `None` when unknown.
    pub expected: Option<u64>,
    pub at: DateTime<Utc>,
}

/// One long-running batch job: its lifecycle state, counters and outcome.
///
/// Mutated by a single driver. Once a result is set only the description
/// may change.
#[derive(Debug, Clone, PartialEq)]
pub struct Process {
    id: String,
    company_id: i64,
    plugin_id: i64,
    description: Option<String>,
    state: State,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    initialization: Option<Initialization>,
    handled: u64,
    skipped: u64,
    failed: u64,
    errors: ErrorLog,
    result: Option<ProcessResult>,
}

impl Process {
    /// Creates a scheduled process with a fresh random id.
    pub fn new(company_id: i64, plugin_id: i64) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), company_id, plugin_id)
    }

    pub fn with_id(id: impl Into<String>, company_id: i64, plugin_id: i64) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            company_id,
            plugin_id,
            description: None,
            state: State::Scheduled,
            created_at: now,
            updated_at: now,
            initialization: None,
            handled: 0,
            skipped: 0,
            failed: 0,
            errors: ErrorLog::new(),
            result: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn company_id(&self) -> i64 {
        self.company_id
    }

    pub fn plugin_id(&self) -> i64 {
        self.plugin_id
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Changes the description. Allowed at any time, including after finish.
    pub fn set_description(&mut self, description: Option<String>) {
        self.description = description;
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn is_initialized(&self) -> bool {
        self.initialization.is_some()
    }

    pub fn initialization(&self) -> Option<Initialization> {
        self.initialization
    }

    /// Expected unit count, `None` when not initialized or unbounded.
    pub fn initialized(&self) -> Option<u64> {
        self.initialization.and_then(|init| init.expected)
    }

    pub fn initialized_at(&self) -> Option<DateTime<Utc>> {
        self.initialization.map(|init| init.at)
    }

    pub fn handled_count(&self) -> u64 {
        self.handled
    }

    pub fn skipped_count(&self) -> u64 {
        self.skipped
    }

    pub fn failed_count(&self) -> u64 {
        self.failed
    }

    pub fn result(&self) -> Option<&ProcessResult> {
        self.result.as_ref()
    }

    pub fn is_finished(&self) -> bool {
        self.result.is_some()
    }

    fn ensure_not_finished(&self) -> Result<(), ProcessError> {
        if self.is_finished() {
            return Err(ProcessError::AlreadyFinished);
        }
        Ok(())
    }

    fn ensure_running(&self) -> Result<(), ProcessError> {
        self.ensure_not_finished()?;
        if !self.is_initialized() {
            return Err(ProcessError::NotInitialized);
        }
        Ok(())
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Records the expected unit count and starts processing. Callable once.
    pub fn initialize(&mut self, expected: Option<u64>) -> Result<(), ProcessError> {
        self.ensure_not_finished()?;
        if self.is_initialized() {
            return Err(ProcessError::AlreadyInitialized);
        }
        let now = Utc::now();
        self.initialization = Some(Initialization { expected, at: now });
        self.state = State::Processing;
        self.updated_at = now;
        info!(process_id = %self.id, ?expected, "process initialized");
        Ok(())
    }

    pub fn set_state(&mut self, state: State) -> Result<(), ProcessError> {
        self.ensure_not_finished()?;
        if !self.state.can_set(state) {
            return Err(ProcessError::InvalidTransition {
                from: self.state,
                to: state,
            });
        }
        debug!(process_id = %self.id, from = %self.state, to = %state, "state changed");
        self.state = state;
        self.touch();
        Ok(())
    }

    /// Like [`set_state`](Self::set_state) but takes the textual tag.
    pub fn set_state_tag(&mut self, tag: &str) -> Result<(), ProcessError> {
        let state = tag.parse::<State>()?;
        self.set_state(state)
    }

    pub fn handle(&mut self) -> Result<(), ProcessError> {
        self.handle_many(1)
    }

    /// Records `count` handled units at once.
    pub fn handle_many(&mut self, count: u64) -> Result<(), ProcessError> {
        self.ensure_running()?;
        self.handled = self.counted(self.handled, count)?;
        self.touch();
        Ok(())
    }

    pub fn skip(&mut self) -> Result<(), ProcessError> {
        self.skip_many(1)
    }

    /// Records `count` skipped units at once.
    pub fn skip_many(&mut self, count: u64) -> Result<(), ProcessError> {
        self.ensure_running()?;
        self.skipped = self.counted(self.skipped, count)?;
        self.touch();
        Ok(())
    }

    /// `counter + count`, provided the three counters still sum without
    /// overflowing.
    fn counted(&self, counter: u64, count: u64) -> Result<u64, ProcessError> {
        self.accounted()
            .and_then(|total| total.checked_add(count))
            .and_then(|_| counter.checked_add(count))
            .ok_or_else(|| ProcessError::InvalidArgument(format!("adding {count} units overflows")))
    }

    fn accounted(&self) -> Option<u64> {
        self.handled
            .checked_add(self.skipped)?
            .checked_add(self.failed)
    }

    pub fn add_error(&mut self, error: ErrorRecord) -> Result<(), ProcessError> {
        self.ensure_running()?;
        self.record_error(error)
    }

    fn record_error(&mut self, error: ErrorRecord) -> Result<(), ProcessError> {
        self.failed = self.counted(self.failed, 1)?;
        self.errors.push(error);
        self.touch();
        Ok(())
    }

    /// Units neither handled, skipped nor failed, when the expected count is
    /// a known positive number.
    fn unaccounted(&self) -> Option<u64> {
        let expected = self.initialized().filter(|n| *n > 0)?;
        let accounted = self.accounted()?;
        expected.checked_sub(accounted).filter(|rest| *rest > 0)
    }

    /// Stops the process abnormally. Every unit not yet accounted for is
    /// counted as failed.
    ///
    /// Unlike the other mutations this does not require initialization: a
    /// process may be aborted before it ever started.
    pub fn terminate(&mut self, error: ErrorRecord) -> Result<(), ProcessError> {
        self.ensure_not_finished()?;
        self.record_error(error)?;
        if let Some(rest) = self.unaccounted() {
            self.failed = self.failed.saturating_add(rest);
        }
        self.state = State::Ended;
        self.result = Some(ProcessResult::Failed);
        self.touch();
        info!(
            process_id = %self.id,
            handled = self.handled,
            skipped = self.skipped,
            failed = self.failed,
            "process terminated"
        );
        Ok(())
    }

    /// Stops the process normally. Every unit not yet accounted for is
    /// counted as skipped.
    pub fn finish(&mut self, value: impl Into<ResultValue>) -> Result<(), ProcessError> {
        self.ensure_running()?;
        let value = value.into();
        let encoded = serde_json::to_string(&value)
            .map_err(|e| ProcessError::InvalidArgument(e.to_string()))?;
        let len = encoded.chars().count();
        if len > MAX_RESULT_LEN {
            return Err(ProcessError::InvalidArgument(format!(
                "serialized result is {len} chars, at most {MAX_RESULT_LEN} allowed"
            )));
        }

        if let Some(rest) = self.unaccounted() {
            self.skipped = self.skipped.saturating_add(rest);
        }
        self.state = State::Ended;
        self.result = Some(ProcessResult::Value(value));
        self.touch();
        info!(
            process_id = %self.id,
            handled = self.handled,
            skipped = self.skipped,
            failed = self.failed,
            "process finished"
        );
        Ok(())
    }

    /// Finishes with an untyped value; only bool, integer and string are
    /// accepted.
    pub fn finish_json(&mut self, value: Value) -> Result<(), ProcessError> {
        self.ensure_running()?;
        let value = ResultValue::try_from(value)?;
        self.finish(value)
    }

    /// Error log, newest first.
    pub fn last_errors(&self) -> Vec<ErrorRecord> {
        self.errors.most_recent_first()
    }

    pub fn snapshot(&self) -> ProcessSnapshot {
        ProcessSnapshot {
            company_id: self.company_id,
            plugin_id: self.plugin_id,
            description: self.description.clone(),
            state: Stamped {
                timestamp: self.updated_at.timestamp(),
                value: self.state,
            },
            initialized: self.initialization.map(|init| Stamped {
                timestamp: init.at.timestamp(),
                value: init.expected,
            }),
            handled: self.handled,
            skipped: self.skipped,
            failed: FailedSummary {
                count: self.failed,
                last: self.errors.to_list(),
            },
            result: self.result.as_ref().map(|result| Stamped {
                timestamp: self.updated_at.timestamp(),
                value: result.value(),
            }),
        }
    }

    pub fn to_row(&self) -> Result<ProcessRow, StoreError> {
        let result = self.result.as_ref().map(serde_json::to_string).transpose()?;
        Ok(ProcessRow {
            id: self.id.clone(),
            company_id: self.company_id,
            plugin_id: self.plugin_id,
            created_at: self.created_at.timestamp(),
            state: self.state.to_string(),
            updated_at: self.updated_at.timestamp(),
            initialized: self.initialized(),
            initialized_at: self.initialized_at().map(|at| at.timestamp()),
            handled: self.handled,
            skipped: self.skipped,
            failed: self.failed,
            errors: serde_json::to_string(&self.errors)?,
            result,
            description: self.description.clone(),
        })
    }

    pub fn from_row(row: ProcessRow) -> Result<Self, StoreError> {
        let state = row
            .state
            .parse::<State>()
            .map_err(|e| StoreError::Corrupt(e.to_string()))?;
        let errors: ErrorLog = serde_json::from_str(&row.errors)?;
        let result: Option<ProcessResult> =
            row.result.as_deref().map(serde_json::from_str).transpose()?;

        if result.is_some() != state.is_terminal() {
            return Err(StoreError::Corrupt(format!(
                "process {} is '{state}' but result is {}",
                row.id,
                if result.is_some() { "set" } else { "missing" }
            )));
        }

        let initialization = match row.initialized_at {
            Some(at) => Some(Initialization {
                expected: row.initialized,
                at: timestamp(at)?,
            }),
            None if row.initialized.is_some() => {
                return Err(StoreError::Corrupt(format!(
                    "process {} has an expected count but no initialization time",
                    row.id
                )));
            }
            None => None,
        };

        let initialized = initialization.is_some();
        let consistent = match state {
            State::Scheduled => !initialized,
            State::Processing | State::PostProcessing => initialized,
            State::Ended => true,
        };
        if !consistent {
            return Err(StoreError::Corrupt(format!(
                "process {} is '{state}' but {}",
                row.id,
                if initialized {
                    "has an initialization time"
                } else {
                    "was never initialized"
                }
            )));
        }

        if row
            .handled
            .checked_add(row.skipped)
            .and_then(|sum| sum.checked_add(row.failed))
            .is_none()
        {
            return Err(StoreError::Corrupt(format!(
                "process {} counters overflow",
                row.id
            )));
        }

        Ok(Self {
            id: row.id,
            company_id: row.company_id,
            plugin_id: row.plugin_id,
            description: row.description,
            state,
            created_at: timestamp(row.created_at)?,
            updated_at: timestamp(row.updated_at)?,
            initialization,
            handled: row.handled,
            skipped: row.skipped,
            failed: row.failed,
            errors,
            result,
        })
    }
}

fn timestamp(secs: i64) -> Result<DateTime<Utc>, StoreError> {
    DateTime::from_timestamp(secs, 0)
        .ok_or_else(|| StoreError::Corrupt(format!("timestamp {secs} out of range")))
}
