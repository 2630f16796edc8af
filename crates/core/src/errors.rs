use thiserror::Error;

/// Unified error type for the entire myfinance-core library.
/// Every public function returns `Result<T, CoreError>`.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Remote store ────────────────────────────────────────────────
    #[error("Store error ({backend}): {message}")]
    Store {
        backend: String,
        message: String,
    },

    #[error("Network error: {0}")]
    Network(String),

    // ── Ledger ──────────────────────────────────────────────────────
    #[error("Validation failed: {0}")]
    ValidationError(String),

    #[error("Position {position} is out of range for a ledger of {len} entries")]
    InvalidPosition { position: usize, len: usize },

    #[error("Position {0} holds a total row, not a line item")]
    NotALineItem(usize),

    #[error("Malformed record: {0}")]
    MalformedRecord(String),

    // ── Serialization / File ────────────────────────────────────────
    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("File I/O error: {0}")]
    FileIO(String),
}

// ── Conversion helpers (From impls) ─────────────────────────────────

impl From<std::io::Error> for CoreError {
    fn from(e: std::io::Error) -> Self {
        CoreError::FileIO(e.to_string())
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        CoreError::Deserialization(e.to_string())
    }
}

impl From<reqwest::Error> for CoreError {
    fn from(e: reqwest::Error) -> Self {
        // API keys travel in the query string; never echo it back.
        let msg = e.to_string();
        let sanitized = if let Some(idx) = msg.find('?') {
            format!("{}?<query redacted>", &msg[..idx])
        } else {
            msg
        };
        CoreError::Network(sanitized)
    }
}
