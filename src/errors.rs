use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::vault::ResolveError;

/// Errors surfaced by the proxy routes.
///
/// Only `Validation` and `Upstream` carry text back to the caller. Everything
/// else is logged here and answered with a generic 500.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("upstream returned {status}: {message}")]
    Upstream { status: StatusCode, message: String },

    #[error("configuration error: {0}")]
    Configuration(#[from] ResolveError),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Error text carried by a workflow or portal body: `message`, `mensaje` or
/// `error`, skipping blank values.
pub fn body_message(body: &serde_json::Value) -> Option<String> {
    ["message", "mensaje", "error"]
        .iter()
        .filter_map(|key| body.get(*key).and_then(serde_json::Value::as_str))
        .find(|s| !s.trim().is_empty())
        .map(str::to_string)
}

pub const CONFIGURATION_MESSAGE: &str = "Server configuration error";
pub const INTERNAL_MESSAGE: &str = "Internal server error";

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, msg) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Upstream { status, message } => {
                tracing::warn!("workflow responded {}: {}", status, message);
                (*status, message.clone())
            }
            AppError::Configuration(e) => {
                tracing::error!("Configuration error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    CONFIGURATION_MESSAGE.to_string(),
                )
            }
            AppError::Transport(e) => {
                tracing::error!("Workflow transport error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    INTERNAL_MESSAGE.to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {:#}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    INTERNAL_MESSAGE.to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": true,
            "message": msg,
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_message_skips_blank_values() {
        assert_eq!(
            body_message(&json!({ "message": "", "mensaje": "Código vencido" })).as_deref(),
            Some("Código vencido")
        );
        assert_eq!(body_message(&json!({ "message": "  " })), None);
        assert_eq!(body_message(&json!({ "error": true })), None);
    }
    use crate::vault::Operation;

    async fn body_of(resp: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_upstream_status_is_relayed() {
        let resp = AppError::Upstream {
            status: StatusCode::FORBIDDEN,
            message: "Usuario bloqueado".into(),
        }
        .into_response();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        let body = body_of(resp).await;
        assert_eq!(body["error"], true);
        assert_eq!(body["message"], "Usuario bloqueado");
    }

    #[tokio::test]
    async fn test_configuration_error_is_generic() {
        let resp = AppError::from(ResolveError::NotConfigured(
            Operation::AuthLogin,
            "AUTH_LOGIN_URL".into(),
        ))
        .into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_of(resp).await;
        assert_eq!(body["message"], CONFIGURATION_MESSAGE);
        assert!(!body.to_string().contains("AUTH_LOGIN_URL"));
    }

    #[tokio::test]
    async fn test_internal_error_does_not_leak_details() {
        let resp = AppError::Internal(anyhow::anyhow!("connection reset by peer at 10.0.0.4"))
            .into_response();
        let body = body_of(resp).await;
        assert_eq!(body["message"], INTERNAL_MESSAGE);
        assert!(!body.to_string().contains("10.0.0.4"));
    }
}
