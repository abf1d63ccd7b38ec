//! Admin surface of the assistant server: login, model loading, knowledge
//! base sync.
//!
//! These are plain request/response calls plus two timer-driven poll loops.
//! The server keeps the admin session in a cookie, so the client carries a
//! cookie store and must [`AdminClient::login`] before anything else.

use std::error::Error as StdError;
use std::fmt;
use std::future::Future;
use std::time::Duration;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::api::admin::{
    ActionResponse, LoadModelRequest, LoginRequest, ModelStatus, ModelsResponse, SyncStatus,
};
use crate::core::chat_stream::extract_error_detail;
use crate::utils::url::construct_api_url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub interval: Duration,
    pub max_attempts: u32,
}

#[derive(Debug)]
pub enum AdminError {
    Http(String),
    /// The session is missing or expired; log in again.
    Unauthorized,
    /// The server refused the operation and said why.
    Server(String),
    PollExhausted { attempts: u32 },
}

impl fmt::Display for AdminError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdminError::Http(reason) => write!(f, "Request failed: {reason}"),
            AdminError::Unauthorized => write!(f, "Unauthorized: admin login required"),
            AdminError::Server(reason) => write!(f, "{reason}"),
            AdminError::PollExhausted { attempts } => {
                write!(f, "Gave up waiting after {attempts} status checks")
            }
        }
    }
}

impl StdError for AdminError {}

impl From<reqwest::Error> for AdminError {
    fn from(err: reqwest::Error) -> Self {
        AdminError::Http(err.to_string())
    }
}

pub struct AdminClient {
    client: reqwest::Client,
    base_url: String,
    poll: PollSettings,
}

impl AdminClient {
    pub fn new(base_url: impl Into<String>, poll: PollSettings) -> Result<Self, AdminError> {
        let client = reqwest::Client::builder().cookie_store(true).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            poll,
        })
    }

    /// Returns `false` for a wrong password.
    pub async fn login(&self, password: &str) -> Result<bool, AdminError> {
        let response = self
            .client
            .post(self.url("admin/login"))
            .json(&LoginRequest {
                password: password.to_string(),
            })
            .send()
            .await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            return Ok(false);
        }
        let ack: ActionResponse = read_json(response).await?;
        Ok(ack.success)
    }

    pub async fn logout(&self) -> Result<(), AdminError> {
        let response = self.client.post(self.url("admin/logout")).send().await?;
        let _: ActionResponse = read_json(response).await?;
        Ok(())
    }

    pub async fn list_models(&self) -> Result<ModelsResponse, AdminError> {
        self.get_json("api/admin/models").await
    }

    pub async fn model_status(&self) -> Result<ModelStatus, AdminError> {
        self.get_json("api/admin/model_status").await
    }

    pub async fn sync_status(&self) -> Result<SyncStatus, AdminError> {
        self.get_json("api/admin/sync_status").await
    }

    /// Starts loading `model_name` in the background; returns the server's
    /// acknowledgement text.
    pub async fn start_model_load(&self, model_name: &str) -> Result<String, AdminError> {
        let response = self
            .client
            .post(self.url("api/admin/load_model"))
            .json(&LoadModelRequest {
                model_name: model_name.to_string(),
            })
            .send()
            .await?;
        acknowledged(read_json(response).await?, "Model loading started")
    }

    /// Polls until `model_name` is reported as the loaded model.
    pub async fn wait_for_model(&self, model_name: &str) -> Result<ModelStatus, AdminError> {
        poll_until(self.poll, || self.model_status(), |status| {
            let loaded = status.model_loaded && status.current_model.as_deref() == Some(model_name);
            loaded.then(|| Ok(status.clone()))
        })
        .await
    }

    /// Starts the load and waits for it; returns the acknowledgement text.
    pub async fn load_model(&self, model_name: &str) -> Result<String, AdminError> {
        let ack = self.start_model_load(model_name).await?;
        self.wait_for_model(model_name).await?;
        Ok(ack)
    }

    pub async fn start_sync(&self) -> Result<String, AdminError> {
        let response = self.client.post(self.url("api/admin/sync")).send().await?;
        acknowledged(read_json(response).await?, "Sync started")
    }

    /// Polls until the sync either completes or reports an error.
    pub async fn wait_for_sync(&self) -> Result<(), AdminError> {
        poll_until(self.poll, || self.sync_status(), sync_verdict).await
    }

    pub async fn sync(&self) -> Result<String, AdminError> {
        let ack = self.start_sync().await?;
        self.wait_for_sync().await?;
        Ok(ack)
    }

    async fn get_json<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, AdminError> {
        let response = self.client.get(self.url(endpoint)).send().await?;
        read_json(response).await
    }

    fn url(&self, endpoint: &str) -> String {
        construct_api_url(&self.base_url, endpoint)
    }
}

fn sync_verdict(status: &SyncStatus) -> Option<Result<(), AdminError>> {
    if status.running {
        return None;
    }
    if status.completed {
        return Some(Ok(()));
    }
    // Not running and not completed without an error means the background
    // job has not flipped its flag yet.
    status
        .error
        .as_ref()
        .map(|error| Err(AdminError::Server(format!("Sync failed: {error}"))))
}

fn acknowledged(ack: ActionResponse, fallback: &str) -> Result<String, AdminError> {
    if ack.success {
        Ok(ack.message.unwrap_or_else(|| fallback.to_string()))
    } else {
        Err(AdminError::Server(
            ack.error
                .unwrap_or_else(|| "The server rejected the request".to_string()),
        ))
    }
}

async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, AdminError> {
    let status = response.status();
    if status == StatusCode::UNAUTHORIZED {
        return Err(AdminError::Unauthorized);
    }
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(AdminError::Server(
            extract_error_detail(&body).unwrap_or_else(|| format!("HTTP {status}")),
        ));
    }
    Ok(response.json::<T>().await?)
}

/// Calls `probe` every `settings.interval` until `verdict` returns a result.
///
/// The first probe waits one full interval: right after a start request the
/// server may still report the previous run's outcome.
///
/// Failed probes are skipped, matching how a status poll treats a dropped
/// request: the next tick simply tries again.
pub async fn poll_until<T, E, P, Fut, V, R>(
    settings: PollSettings,
    mut probe: P,
    mut verdict: V,
) -> Result<R, AdminError>
where
    P: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: fmt::Display,
    V: FnMut(&T) -> Option<Result<R, AdminError>>,
{
    let start = tokio::time::Instant::now() + settings.interval;
    let mut ticker = tokio::time::interval_at(start, settings.interval);
    for attempt in 1..=settings.max_attempts {
        ticker.tick().await;
        match probe().await {
            Ok(status) => {
                if let Some(result) = verdict(&status) {
                    return result;
                }
            }
            Err(err) => debug!(attempt, error = %err, "Status poll failed; retrying"),
        }
    }
    Err(AdminError::PollExhausted {
        attempts: settings.max_attempts,
    })
}
