//! Streaming chat call, `POST /api/chat`.
//!
//! Unlike [`ApiClient::request`], nothing here inspects the response: the
//! caller receives the raw [`Response`] with its body unread and consumes it
//! incrementally (e.g. via `bytes_stream()`). Status checks are the caller's
//! job too; only a transport failure is reported as an error.

use reqwest::Response;
use serde::Serialize;
use tracing::{debug, warn};

use super::{ApiClient, ApiError};

/// Header the backend uses to report which conversation the reply landed in.
pub const CONVERSATION_ID_HEADER: &str = "x-conversation-id";

/// Arguments for [`ApiClient::chat_stream`].
#[derive(Debug, Clone)]
pub struct ChatStreamRequest {
    pub role_id: u64,
    /// `None` starts a new conversation on the backend.
    pub conversation_id: Option<u64>,
    pub message: String,
}

/// Wire body. Field order is the serialised order.
#[derive(Debug, Serialize)]
struct ChatBody<'a> {
    role_id: u64,
    /// `0` is the backend's "no conversation yet" sentinel.
    conversation_id: u64,
    message: &'a str,
}

impl ChatStreamRequest {
    pub fn new(role_id: u64, conversation_id: Option<u64>, message: impl Into<String>) -> Self {
        Self { role_id, conversation_id, message: message.into() }
    }

    /// JSON body exactly as sent.
    pub fn to_body(&self) -> Result<String, ApiError> {
        let body = ChatBody {
            role_id: self.role_id,
            conversation_id: self.conversation_id.unwrap_or(0),
            message: &self.message,
        };
        serde_json::to_string(&body)
            .map_err(|e| ApiError::Request(format!("failed to encode chat body: {e}")))
    }
}

impl ApiClient {
    /// Send a chat message and hand back the unconsumed streaming response.
    pub async fn chat_stream(&self, req: &ChatStreamRequest) -> Result<Response, ApiError> {
        let url = self.url("/api/chat");
        let body = req.to_body()?;

        debug!(role_id = req.role_id, conversation_id = ?req.conversation_id, "chat stream request");

        self.http()
            .post(&url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| {
                warn!(%url, error = %e, "chat stream request failed (transport)");
                ApiError::Request(e.to_string())
            })
    }
}

/// Conversation id the backend assigned to a chat reply, if it sent one.
pub fn conversation_id_of(response: &Response) -> Option<u64> {
    response
        .headers()
        .get(CONVERSATION_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse().ok())
}
