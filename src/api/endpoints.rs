//! Named bindings for the backend's REST routes.
//!
//! Each method is exactly one [`ApiClient::request`] call, with no retries and no
//! batching. Ids are opaque: anything `Display` is interpolated verbatim.
//!
//! ```text
//! GET    /api/health
//! GET    /api/roles
//! POST   /api/roles
//! GET    /api/roles/{id}
//! PUT    /api/roles/{id}
//! DELETE /api/roles/{id}
//! GET    /api/roles/{role_id}/conversations
//! POST   /api/roles/{role_id}/conversations
//! DELETE /api/conversations/{id}
//! GET    /api/conversations/{id}/messages
//! GET    /api/memories/{role_id}
//! ```

use std::fmt::Display;

use reqwest::Method;
use serde::Serialize;

use super::{ApiClient, ApiError, RequestOptions, ResponseBody};

impl ApiClient {
    /// Backend liveness probe.
    pub async fn health(&self) -> Result<ResponseBody, ApiError> {
        self.request("/api/health", RequestOptions::default()).await
    }

    // ── Roles ──

    pub async fn list_roles(&self) -> Result<ResponseBody, ApiError> {
        self.request("/api/roles", RequestOptions::default()).await
    }

    pub async fn create_role<P: Serialize + ?Sized>(&self, payload: &P) -> Result<ResponseBody, ApiError> {
        let opts = RequestOptions::new(Method::POST).json(payload)?;
        self.request("/api/roles", opts).await
    }

    pub async fn get_role(&self, id: impl Display) -> Result<ResponseBody, ApiError> {
        self.request(&format!("/api/roles/{id}"), RequestOptions::default()).await
    }

    pub async fn update_role<P: Serialize + ?Sized>(
        &self,
        id: impl Display,
        payload: &P,
    ) -> Result<ResponseBody, ApiError> {
        let opts = RequestOptions::new(Method::PUT).json(payload)?;
        self.request(&format!("/api/roles/{id}"), opts).await
    }

    pub async fn delete_role(&self, id: impl Display) -> Result<ResponseBody, ApiError> {
        self.request(&format!("/api/roles/{id}"), RequestOptions::new(Method::DELETE)).await
    }

    // ── Conversations ──

    pub async fn list_conversations(&self, role_id: impl Display) -> Result<ResponseBody, ApiError> {
        self.request(&format!("/api/roles/{role_id}/conversations"), RequestOptions::default())
            .await
    }

    pub async fn create_conversation<P: Serialize + ?Sized>(
        &self,
        role_id: impl Display,
        payload: &P,
    ) -> Result<ResponseBody, ApiError> {
        let opts = RequestOptions::new(Method::POST).json(payload)?;
        self.request(&format!("/api/roles/{role_id}/conversations"), opts).await
    }

    pub async fn delete_conversation(&self, id: impl Display) -> Result<ResponseBody, ApiError> {
        self.request(&format!("/api/conversations/{id}"), RequestOptions::new(Method::DELETE))
            .await
    }

    // ── Messages & memories ──

    pub async fn list_messages(&self, conversation_id: impl Display) -> Result<ResponseBody, ApiError> {
        self.request(
            &format!("/api/conversations/{conversation_id}/messages"),
            RequestOptions::default(),
        )
        .await
    }

    pub async fn list_memories(&self, role_id: impl Display) -> Result<ResponseBody, ApiError> {
        self.request(&format!("/api/memories/{role_id}"), RequestOptions::default()).await
    }
}

#[cfg(test)]
mod tests {
    use super::super::{ApiBase, test_support::serve};
    use super::*;
    use axum::{Json, Router, http::Request, body::Body};
    use serde_json::{Value, json};

    use crate::models::{ConversationInput, RoleInput};

    /// Echoes method, path and body back as JSON for every request.
    async fn echo_client() -> ApiClient {
        let router = Router::new().fallback(|req: Request<Body>| async move {
            let method = req.method().to_string();
            let path = req.uri().path().to_string();
            let bytes = axum::body::to_bytes(req.into_body(), usize::MAX).await.unwrap_or_default();
            let body: Value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
            Json(json!({ "method": method, "path": path, "body": body }))
        });
        ApiClient::new(ApiBase::new(serve(router).await))
    }

    fn seen(body: ResponseBody) -> (String, String, Value) {
        let v = body.into_json().expect("echo returns json");
        (
            v["method"].as_str().unwrap_or_default().to_string(),
            v["path"].as_str().unwrap_or_default().to_string(),
            v["body"].clone(),
        )
    }

    #[tokio::test]
    async fn role_bindings_hit_expected_routes() {
        let c = echo_client().await;
        let input = RoleInput { name: "Mia".into(), ..Default::default() };

        assert_eq!(seen(c.list_roles().await.unwrap()).0, "GET");

        let (m, p, b) = seen(c.create_role(&input).await.unwrap());
        assert_eq!((m.as_str(), p.as_str()), ("POST", "/api/roles"));
        assert_eq!(b["name"], "Mia");

        let (m, p, _) = seen(c.get_role(7).await.unwrap());
        assert_eq!((m.as_str(), p.as_str()), ("GET", "/api/roles/7"));

        let (m, p, b) = seen(c.update_role(7, &input).await.unwrap());
        assert_eq!((m.as_str(), p.as_str()), ("PUT", "/api/roles/7"));
        assert_eq!(b["name"], "Mia");

        let (m, p, b) = seen(c.delete_role(7).await.unwrap());
        assert_eq!((m.as_str(), p.as_str()), ("DELETE", "/api/roles/7"));
        assert_eq!(b, Value::Null);
    }

    #[tokio::test]
    async fn conversation_bindings_hit_expected_routes() {
        let c = echo_client().await;

        let (m, p, _) = seen(c.list_conversations(3).await.unwrap());
        assert_eq!((m.as_str(), p.as_str()), ("GET", "/api/roles/3/conversations"));

        let input = ConversationInput { title: "first".into() };
        let (m, p, b) = seen(c.create_conversation(3, &input).await.unwrap());
        assert_eq!((m.as_str(), p.as_str()), ("POST", "/api/roles/3/conversations"));
        assert_eq!(b, json!({"title": "first"}));

        let (m, p, _) = seen(c.delete_conversation(11).await.unwrap());
        assert_eq!((m.as_str(), p.as_str()), ("DELETE", "/api/conversations/11"));
    }

    #[tokio::test]
    async fn message_memory_and_health_bindings() {
        let c = echo_client().await;

        let (m, p, _) = seen(c.list_messages(11).await.unwrap());
        assert_eq!((m.as_str(), p.as_str()), ("GET", "/api/conversations/11/messages"));

        let (m, p, _) = seen(c.list_memories(3).await.unwrap());
        assert_eq!((m.as_str(), p.as_str()), ("GET", "/api/memories/3"));

        let (_, p, _) = seen(c.health().await.unwrap());
        assert_eq!(p, "/api/health");
    }

    #[tokio::test]
    async fn ids_pass_through_unmodified() {
        let c = echo_client().await;
        let (_, p, _) = seen(c.get_role("abc-123").await.unwrap());
        assert_eq!(p, "/api/roles/abc-123");
    }

    #[tokio::test]
    async fn raw_json_payload_is_forwarded() {
        let c = echo_client().await;
        let payload = json!({"name": "x", "extra": [1, 2]});
        let (_, _, b) = seen(c.create_role(&payload).await.unwrap());
        assert_eq!(b, payload);
    }
}
