use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ProcessError;

/// Longest serialized result a process row can hold.
pub const MAX_RESULT_LEN: usize = 512;

/// Scalar value a driver finishes a process with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResultValue {
    Bool(bool),
    Int(i64),
    String(String),
}

impl ResultValue {
    pub fn to_json(&self) -> Value {
        match self {
            ResultValue::Bool(b) => Value::Bool(*b),
            ResultValue::Int(i) => Value::from(*i),
            ResultValue::String(s) => Value::String(s.clone()),
        }
    }
}

impl TryFrom<Value> for ResultValue {
    type Error = ProcessError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Bool(b) => Ok(ResultValue::Bool(b)),
            Value::String(s) => Ok(ResultValue::String(s)),
            Value::Number(n) if n.is_i64() => n
                .as_i64()
                .map(ResultValue::Int)
                .ok_or_else(|| ProcessError::InvalidArgument(format!("invalid integer {n}"))),
            other => Err(ProcessError::InvalidArgument(format!(
                "finish value should be a 'bool', 'int' or 'string' type, got {other}"
            ))),
        }
    }
}

impl From<bool> for ResultValue {
    fn from(value: bool) -> Self {
        ResultValue::Bool(value)
    }
}

impl From<i64> for ResultValue {
    fn from(value: i64) -> Self {
        ResultValue::Int(value)
    }
}

impl From<&str> for ResultValue {
    fn from(value: &str) -> Self {
        ResultValue::String(value.to_string())
    }
}

impl From<String> for ResultValue {
    fn from(value: String) -> Self {
        ResultValue::String(value)
    }
}

impl fmt::Display for ResultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResultValue::Bool(b) => write!(f, "{b}"),
            ResultValue::Int(i) => write!(f, "{i}"),
            ResultValue::String(s) => f.write_str(s),
        }
    }
}

/// Terminal outcome of a process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "ResultBody", try_from = "ResultBody")]
pub enum ProcessResult {
    Success,
    Failed,
    Url(String),
    /// Bare value passed to `finish`.
    Value(ResultValue),
}

impl ProcessResult {
    pub fn type_tag(&self) -> &'static str {
        match self {
            ProcessResult::Success => "success",
            ProcessResult::Failed => "failed",
            ProcessResult::Url(_) => "url",
            ProcessResult::Value(_) => "value",
        }
    }

    pub fn value(&self) -> Value {
        match self {
            ProcessResult::Success => Value::Bool(true),
            ProcessResult::Failed => Value::Bool(false),
            ProcessResult::Url(url) => Value::String(url.clone()),
            ProcessResult::Value(v) => v.to_json(),
        }
    }
}

/// Wire shape of a result: `{"type": .., "value": ..}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultBody {
    #[serde(rename = "type")]
    pub result_type: String,
    pub value: Value,
}

impl From<ProcessResult> for ResultBody {
    fn from(result: ProcessResult) -> Self {
        Self {
            result_type: result.type_tag().to_string(),
            value: result.value(),
        }
    }
}

impl TryFrom<ResultBody> for ProcessResult {
    type Error = ProcessError;

    fn try_from(body: ResultBody) -> Result<Self, Self::Error> {
        match (body.result_type.as_str(), body.value) {
            ("success", Value::Bool(true)) => Ok(ProcessResult::Success),
            ("failed", Value::Bool(false)) => Ok(ProcessResult::Failed),
            ("url", Value::String(url)) => Ok(ProcessResult::Url(url)),
            ("value", value) => Ok(ProcessResult::Value(ResultValue::try_from(value)?)),
            (tag, value) => Err(ProcessError::InvalidArgument(format!(
                "invalid result '{tag}' with value {value}"
            ))),
        }
    }
}
