//! Typed client for the portal's proxy routes.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;

use crate::dashboard::forms::{PersonForm, VehicleForm};
use crate::dashboard::EntryApi;
use crate::errors::body_message;
use crate::models::document::{Document, DocumentUpload};
use crate::models::entry::{Person, Vehicle};
use crate::models::session::LoginCredentials;
use crate::session::AuthBackend;

pub const CONNECT_MESSAGE: &str = "Could not connect to the server. Try again later.";

#[derive(Debug, Error)]
pub enum ClientError {
    /// Rejected before any request was made.
    #[error("{0}")]
    Validation(String),

    /// The portal (or the workflow behind it) answered with a non-OK status.
    #[error("portal returned {status}: {}", .message.as_deref().unwrap_or("<no message>"))]
    Upstream { status: u16, message: Option<String> },

    /// Network failure or a body that could not be decoded.
    #[error("transport error: {0}")]
    Transport(String),
}

impl ClientError {
    /// Text to show inline, with `fallback` for upstream errors that carried
    /// no message of their own.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            ClientError::Validation(msg) => msg.clone(),
            ClientError::Upstream {
                message: Some(msg), ..
            } => msg.clone(),
            ClientError::Upstream { message: None, .. } => fallback.to_string(),
            ClientError::Transport(_) => CONNECT_MESSAGE.to_string(),
        }
    }
}

pub struct PortalClient {
    client: reqwest::Client,
    base_url: String,
}

impl PortalClient {
    pub fn new(base_url: impl Into<String>) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .use_rustls_tls()
            .timeout(Duration::from_secs(60))
            .connect_timeout(Duration::from_secs(5))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Value, ClientError> {
        let url = format!("{}{}", self.base_url, path);
        let resp = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        let status = resp.status();
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        let parsed: Option<Value> = serde_json::from_slice(&bytes).ok();

        if !status.is_success() {
            let message = parsed.as_ref().and_then(body_message);
            tracing::debug!("{} answered {}", path, status);
            return Err(ClientError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        parsed.ok_or_else(|| ClientError::Transport(format!("{} returned a non-JSON body", path)))
    }

    async fn post_as<T: DeserializeOwned>(&self, path: &str, body: &Value) -> Result<T, ClientError> {
        let value = self.post(path, body).await?;
        serde_json::from_value(value)
            .map_err(|e| ClientError::Transport(format!("unexpected response from {}: {}", path, e)))
    }
}

#[derive(Deserialize)]
struct PeopleResponse {
    #[serde(default)]
    personas: Vec<Person>,
}

#[derive(Deserialize)]
struct VehiclesResponse {
    #[serde(default)]
    vehiculos: Vec<Vehicle>,
}

#[derive(Deserialize)]
struct DocumentsResponse {
    #[serde(default)]
    documentos: Vec<Document>,
}

#[derive(Deserialize)]
struct SavedResponse {
    id: String,
}

#[async_trait]
impl AuthBackend for PortalClient {
    async fn login(&self, credentials: &LoginCredentials) -> Result<Value, ClientError> {
        let body = serde_json::to_value(credentials)
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        self.post("/api/auth/login", &body).await
    }
}

#[async_trait]
impl EntryApi for PortalClient {
    async fn validate_request(&self, code: &str) -> Result<(), ClientError> {
        self.post("/api/solicitudes/validar", &json!({ "id_solicitud": code }))
            .await
            .map(|_| ())
    }

    async fn list_people(&self, request_id: &str) -> Result<Vec<Person>, ClientError> {
        let resp: PeopleResponse = self
            .post_as("/api/personas/consultar", &json!({ "id_solicitud": request_id }))
            .await?;
        Ok(resp.personas)
    }

    async fn list_vehicles(&self, request_id: &str) -> Result<Vec<Vehicle>, ClientError> {
        let resp: VehiclesResponse = self
            .post_as("/api/vehiculos/consultar", &json!({ "id_solicitud": request_id }))
            .await?;
        Ok(resp.vehiculos)
    }

    async fn save_person(
        &self,
        request_id: &str,
        person_id: Option<&str>,
        form: &PersonForm,
    ) -> Result<String, ClientError> {
        let resp: SavedResponse = self
            .post_as("/api/personas/registrar", &form.to_wire(request_id, person_id))
            .await?;
        Ok(resp.id)
    }

    async fn save_vehicle(
        &self,
        request_id: &str,
        vehicle_id: Option<&str>,
        form: &VehicleForm,
    ) -> Result<String, ClientError> {
        let resp: SavedResponse = self
            .post_as("/api/vehiculos/registrar", &form.to_wire(request_id, vehicle_id))
            .await?;
        Ok(resp.id)
    }

    async fn upload_document(&self, upload: &DocumentUpload) -> Result<(), ClientError> {
        self.post("/api/documentos/subir", &upload.to_wire())
            .await
            .map(|_| ())
    }

    async fn list_documents(
        &self,
        request_id: &str,
        person_id: &str,
    ) -> Result<Vec<Document>, ClientError> {
        let resp: DocumentsResponse = self
            .post_as(
                "/api/documentos/consultar",
                &json!({ "id_solicitud": request_id, "id_persona": person_id }),
            )
            .await?;
        Ok(resp.documentos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_mapping() {
        let upstream = ClientError::Upstream {
            status: 403,
            message: Some("Código vencido".into()),
        };
        assert_eq!(upstream.user_message("fallback"), "Código vencido");

        let bare = ClientError::Upstream {
            status: 500,
            message: None,
        };
        assert_eq!(bare.user_message("fallback"), "fallback");

        let transport = ClientError::Transport("dns".into());
        assert_eq!(transport.user_message("fallback"), CONNECT_MESSAGE);
    }

    #[tokio::test]
    async fn test_blank_portal_message_falls_back() {
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/solicitudes/validar"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({ "message": "" })))
            .mount(&server)
            .await;

        let client = PortalClient::new(server.uri()).unwrap();
        let err = client.validate_request("ABC123").await.unwrap_err();
        assert!(matches!(err, ClientError::Upstream { status: 403, message: None }));
        assert_eq!(err.user_message("Invalid or unauthorized code."), "Invalid or unauthorized code.");
    }
}
