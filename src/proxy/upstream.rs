//! HTTP client for calling workflow endpoints.
//! Calls are made once; a failed workflow call is never retried.

use std::time::Duration;

use axum::http::StatusCode;
use serde_json::Value;

use crate::errors::{body_message, AppError};
use crate::vault::WorkflowCredential;

pub const AUTH_HEADER: &str = "x-auth-token";

pub struct UpstreamClient {
    client: reqwest::Client,
}

/// Status plus the decoded body. `body` is `None` when the workflow answered
/// with something that is not JSON (or nothing at all).
#[derive(Debug)]
pub struct UpstreamReply {
    pub status: StatusCode,
    pub body: Option<Value>,
}

impl UpstreamReply {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Best-effort error text from the workflow body.
    pub fn message(&self) -> Option<String> {
        self.body.as_ref().and_then(body_message)
    }
}

impl UpstreamClient {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .use_rustls_tls()
            .pool_max_idle_per_host(8)
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(5))
            .build()?;

        Ok(Self { client })
    }

    /// POST `body` as JSON to the workflow, attaching its secret.
    pub async fn post_json(
        &self,
        credential: &WorkflowCredential,
        body: &Value,
    ) -> Result<UpstreamReply, AppError> {
        let resp = self
            .client
            .post(credential.url())
            .header(AUTH_HEADER, credential.token())
            .json(body)
            .send()
            .await
            .map_err(|e| {
                // reqwest includes the full URL in its error; keep only the host
                tracing::warn!(
                    "Workflow request to {} failed: {}",
                    credential.display_host(),
                    e.without_url()
                );
                AppError::Transport(format!("request to {} failed", credential.display_host()))
            })?;

        let status = resp.status();

        let bytes = resp.bytes().await.map_err(|e| {
            tracing::warn!("Failed reading workflow response: {}", e.without_url());
            AppError::Transport("failed reading workflow response".into())
        })?;

        let body = if bytes.is_empty() {
            None
        } else {
            serde_json::from_slice(&bytes).ok()
        };

        Ok(UpstreamReply { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_attaches_secret_header_and_json_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/flow"))
            .and(header(AUTH_HEADER, "s3cret"))
            .and(body_json(json!({"id_solicitud": "ABC123"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"PLACA": "XYZ"}])))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = UpstreamClient::new(Duration::from_secs(5)).unwrap();
        let cred = WorkflowCredential::new(format!("{}/flow", mock_server.uri()), "s3cret");

        let reply = client
            .post_json(&cred, &json!({"id_solicitud": "ABC123"}))
            .await
            .unwrap();

        assert!(reply.is_success());
        assert_eq!(reply.body.unwrap()[0]["PLACA"], "XYZ");
    }

    #[tokio::test]
    async fn test_non_json_body_is_none() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502).set_body_string("<html>502</html>"))
            .mount(&mock_server)
            .await;

        let client = UpstreamClient::new(Duration::from_secs(5)).unwrap();
        let cred = WorkflowCredential::new(mock_server.uri(), "t");
        let reply = client.post_json(&cred, &json!({})).await.unwrap();

        assert_eq!(reply.status, StatusCode::BAD_GATEWAY);
        assert!(reply.body.is_none());
        assert!(reply.message().is_none());
    }

    #[test]
    fn test_message_prefers_message_then_mensaje() {
        let reply = UpstreamReply {
            status: StatusCode::FORBIDDEN,
            body: Some(json!({"mensaje": "Código inválido"})),
        };
        assert_eq!(reply.message().as_deref(), Some("Código inválido"));

        let reply = UpstreamReply {
            status: StatusCode::FORBIDDEN,
            body: Some(json!({"message": "Denied", "mensaje": "Negado"})),
        };
        assert_eq!(reply.message().as_deref(), Some("Denied"));
    }

    #[tokio::test]
    async fn test_unreachable_upstream_is_transport_error() {
        let client = UpstreamClient::new(Duration::from_secs(2)).unwrap();
        let cred = WorkflowCredential::new("http://127.0.0.1:1/flow?sig=abc", "t");
        let err = client.post_json(&cred, &json!({})).await.unwrap_err();
        assert!(matches!(err, AppError::Transport(_)));
        assert!(!err.to_string().contains("sig=abc"));
    }
}
