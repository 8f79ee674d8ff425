use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ProcessError;

/// Scalar identifier of the entity an error refers to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityId {
    Bool(bool),
    Int(i64),
    String(String),
}

impl EntityId {
    /// Converts a JSON value into an entity id. `null` means "no entity";
    /// compound values and non-integer numbers are rejected.
    pub fn from_json(value: serde_json::Value) -> Result<Option<Self>, ProcessError> {
        use serde_json::Value;

        match value {
            Value::Null => Ok(None),
            Value::Bool(b) => Ok(Some(EntityId::Bool(b))),
            Value::String(s) => Ok(Some(EntityId::String(s))),
            Value::Number(n) => n.as_i64().map(|i| Some(EntityId::Int(i))).ok_or_else(|| {
                ProcessError::InvalidArgument(format!("entity id must be an integer, got {n}"))
            }),
            other => Err(ProcessError::InvalidArgument(format!(
                "entity id must be a scalar, got {other}"
            ))),
        }
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityId::Bool(b) => write!(f, "{b}"),
            EntityId::Int(i) => write!(f, "{i}"),
            EntityId::String(s) => f.write_str(s),
        }
    }
}

impl From<&str> for EntityId {
    fn from(value: &str) -> Self {
        EntityId::String(value.to_string())
    }
}

impl From<String> for EntityId {
    fn from(value: String) -> Self {
        EntityId::String(value)
    }
}

impl From<i64> for EntityId {
    fn from(value: i64) -> Self {
        EntityId::Int(value)
    }
}

impl From<bool> for EntityId {
    fn from(value: bool) -> Self {
        EntityId::Bool(value)
    }
}

/// A single failure reported while a process runs.
///
/// The message is an opaque, already-translated payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorRecord {
    message: String,
    entity_id: Option<EntityId>,
}

impl ErrorRecord {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            entity_id: None,
        }
    }

    pub fn with_entity(message: impl Into<String>, entity_id: impl Into<EntityId>) -> Self {
        Self {
            message: message.into(),
            entity_id: Some(entity_id.into()),
        }
    }

    /// Builds a record from an untyped entity id, as received from a driver
    /// speaking JSON.
    pub fn from_json(
        message: impl Into<String>,
        entity_id: serde_json::Value,
    ) -> Result<Self, ProcessError> {
        Ok(Self {
            message: message.into(),
            entity_id: EntityId::from_json(entity_id)?,
        })
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn entity_id(&self) -> Option<&EntityId> {
        self.entity_id.as_ref()
    }
}
