//! Error taxonomy for the tankflow engine.
//!
//! Four families, matching how callers are expected to react:
//! - `Validation` — malformed input reading; rejected before evaluation.
//! - `Configuration` — missing/zero tank capacity where a percentage or a
//!   charge is computed; reported instead of dividing by zero.
//! - `Notification` — notifier failure; always recovered locally, never
//!   propagated to ingestion callers.
//! - `Store` — persistence failure; propagated to the caller of whichever
//!   operation touched the store, never retried here.

// ---

/// Errors that can arise in the telemetry/billing engine.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineError {
    /// The input reading is malformed (out-of-range value, unrecognized
    /// status string, missing required field).
    Validation(String),
    /// Tank configuration prevents the computation (zero or missing capacity).
    Configuration(String),
    /// A notification send failed. Recorded, never fatal.
    Notification(String),
    /// The backing store reported an error.
    Store(String),
}

impl EngineError {
    // ---
    pub fn validation(msg: impl Into<String>) -> Self {
        EngineError::Validation(msg.into())
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        EngineError::Configuration(msg.into())
    }

    pub fn notification(msg: impl Into<String>) -> Self {
        EngineError::Notification(msg.into())
    }
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::Validation(msg) => write!(f, "validation error: {}", msg),
            EngineError::Configuration(msg) => write!(f, "configuration error: {}", msg),
            EngineError::Notification(msg) => write!(f, "notification error: {}", msg),
            EngineError::Store(msg) => write!(f, "store error: {}", msg),
        }
    }
}

impl std::error::Error for EngineError {}

impl From<sqlx::Error> for EngineError {
    fn from(e: sqlx::Error) -> Self {
        EngineError::Store(e.to_string())
    }
}

impl From<reqwest::Error> for EngineError {
    fn from(e: reqwest::Error) -> Self {
        EngineError::Notification(e.to_string())
    }
}
