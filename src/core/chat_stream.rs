use async_trait::async_trait;
use futures_util::StreamExt;
use tracing::debug;

use crate::api::ChatStreamRequest;
use crate::core::transport::{ByteStream, ChatTransport, TransportError};
use crate::utils::url::construct_api_url;

pub const CHAT_STREAM_ENDPOINT: &str = "api/chat/stream";

/// [`ChatTransport`] over HTTP: POSTs the message and hands back the
/// response body as it arrives.
#[derive(Clone)]
pub struct HttpChatTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpChatTransport {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl ChatTransport for HttpChatTransport {
    async fn open(&self, message: &str) -> Result<ByteStream, TransportError> {
        let url = construct_api_url(&self.base_url, CHAT_STREAM_ENDPOINT);
        debug!(url = %url, "Opening chat stream");

        let request = ChatStreamRequest {
            message: message.to_string(),
        };
        let response = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|err| TransportError::Connect(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Status {
                status: status.as_u16(),
                detail: extract_error_detail(&body),
            });
        }

        Ok(response
            .bytes_stream()
            .map(|chunk| {
                chunk
                    .map(|bytes| bytes.to_vec())
                    .map_err(|err| TransportError::Body(err.to_string()))
            })
            .boxed())
    }
}

/// Pulls a human-readable reason out of an error body such as
/// `{"error":"No model loaded"}`.
pub fn extract_error_detail(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }

    let value = serde_json::from_str::<serde_json::Value>(trimmed).ok()?;
    let summary = value
        .get("error")
        .and_then(|v| match v {
            serde_json::Value::String(s) => Some(s.to_string()),
            serde_json::Value::Object(map) => map
                .get("message")
                .and_then(|message| message.as_str().map(str::to_owned)),
            _ => None,
        })
        .or_else(|| {
            value
                .get("message")
                .and_then(|v| v.as_str().map(str::to_owned))
        })?;

    let collapsed = summary.split_whitespace().collect::<Vec<_>>().join(" ");
    (!collapsed.is_empty()).then_some(collapsed)
}
