use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct LoginRequest {
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoadModelRequest {
    pub model_name: String,
}

/// Generic `{success, message?, error?}` acknowledgement.
#[derive(Debug, Deserialize, Default)]
pub struct ActionResponse {
    #[serde(default)]
    pub success: bool,
    pub message: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct ModelsResponse {
    #[serde(default)]
    pub models: Vec<String>,
    pub current_model: Option<String>,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct ModelStatus {
    pub current_model: Option<String>,
    #[serde(default)]
    pub model_loaded: bool,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq, Default)]
pub struct SyncStatus {
    #[serde(default)]
    pub running: bool,
    #[serde(default)]
    pub completed: bool,
    pub error: Option<String>,
}
