//! Structured error types for simview.
//!
//! Only construction and loading surface errors. Scrolling, measuring,
//! filtering and sorting absorb bad input by clamping or defaulting.

/// All errors that can occur while building or loading a table.
#[derive(Debug, thiserror::Error)]
pub enum SimviewError {
    /// Two column descriptors share the same id.
    #[error("Duplicate column id: {0}")]
    DuplicateColumn(String),

    /// A column estimate that is not a finite positive number.
    #[error("Invalid estimated size {value} for column {column}")]
    InvalidEstimate { column: String, value: f64 },

    /// Table configuration rejected by validation.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A column id that no descriptor declares.
    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    /// JSON (de)serialization error.
    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// General parse error (CLI expressions, JS values).
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SimviewError>;

#[cfg(target_arch = "wasm32")]
impl From<SimviewError> for wasm_bindgen::JsValue {
    fn from(e: SimviewError) -> Self {
        wasm_bindgen::JsValue::from_str(&e.to_string())
    }
}
