use std::fmt;

use serde::Serialize;

use crate::convert::ConversionError;

/// Structured error type for the bridge. Replaces stringly-typed errors so
/// handlers can propagate failures with `?` and the dispatcher can fold them
/// into a `CommandResult` with a descriptive message.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "code", content = "detail")]
pub enum BridgeError {
    NotFound { what: String },
    Validation { message: String },
    Conversion { property: String, detail: String },
    Handler { message: String },
}

impl BridgeError {
    /// Conversion failure for a named property, preserving the raw wire value.
    pub fn conversion(property: &str, raw: &str, err: &ConversionError) -> Self {
        BridgeError::Conversion {
            property: property.to_string(),
            detail: format!("cannot apply value '{raw}': {err}"),
        }
    }
}

impl fmt::Display for BridgeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BridgeError::NotFound { what } => write!(f, "{what} not found"),
            BridgeError::Validation { message } => write!(f, "{message}"),
            BridgeError::Conversion { property, detail } => {
                write!(f, "Conversion failed for property '{property}': {detail}")
            }
            BridgeError::Handler { message } => write!(f, "Handler error: {message}"),
        }
    }
}

impl std::error::Error for BridgeError {}

impl From<String> for BridgeError {
    fn from(s: String) -> Self {
        BridgeError::Validation { message: s }
    }
}

impl From<&str> for BridgeError {
    fn from(s: &str) -> Self {
        BridgeError::Validation {
            message: s.to_string(),
        }
    }
}
