use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

/// How many records a refresh fetches by default.
pub const DEFAULT_FETCH_LIMIT: usize = 50;

/// Connection details for the Firestore-backed store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FirestoreConfig {
    /// Google Cloud project id (e.g., "myfinance-12345").
    pub project_id: String,

    /// Key of the user's document under `purchases/` (the account e-mail).
    pub user_key: String,

    /// Web API key, sent as the `key` query parameter.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Firebase Auth ID token, sent as a bearer token.
    #[serde(default)]
    pub id_token: Option<String>,
}

/// User-configurable settings, persisted as a small JSON document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Maximum number of records fetched by a ledger refresh.
    #[serde(default = "default_fetch_limit")]
    pub fetch_limit: usize,

    /// Display-theme toggle (dynamic colors on/off).
    #[serde(default)]
    pub dynamic_color: bool,

    /// Remote store connection, if one is configured.
    #[serde(default)]
    pub firestore: Option<FirestoreConfig>,
}

fn default_fetch_limit() -> usize {
    DEFAULT_FETCH_LIMIT
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            fetch_limit: DEFAULT_FETCH_LIMIT,
            dynamic_color: false,
            firestore: None,
        }
    }
}

impl Settings {
    /// Reject settings the session cannot work with.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.fetch_limit == 0 {
            return Err(CoreError::ValidationError(
                "fetch_limit must be at least 1".into(),
            ));
        }
        if let Some(fs) = &self.firestore {
            if fs.project_id.trim().is_empty() || fs.user_key.trim().is_empty() {
                return Err(CoreError::ValidationError(
                    "firestore project_id and user_key must not be empty".into(),
                ));
            }
        }
        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String, CoreError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| CoreError::Serialization(format!("Failed to serialize settings: {e}")))
    }

    /// Load settings from disk. A missing file yields the defaults.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_from_file(path: &str) -> Result<Self, CoreError> {
        match std::fs::read_to_string(path) {
            Ok(json) => Self::from_json(&json),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save_to_file(&self, path: &str) -> Result<(), CoreError> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}
