pub mod configured;

use std::fmt;

use thiserror::Error;
use zeroize::Zeroizing;

/// Logical names of the workflow endpoints the portal talks to.
/// Each one is configured server-side as `<NAME>_URL` + `<NAME>_TOKEN`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    AuthLogin,
    ValidateRequest,
    ListPeople,
    ListVehicles,
    RegisterPerson,
    RegisterVehicle,
    UploadDocument,
    ListDocuments,
}

impl Operation {
    pub const ALL: [Operation; 8] = [
        Operation::AuthLogin,
        Operation::ValidateRequest,
        Operation::ListPeople,
        Operation::ListVehicles,
        Operation::RegisterPerson,
        Operation::RegisterVehicle,
        Operation::UploadDocument,
        Operation::ListDocuments,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Operation::AuthLogin => "AUTH_LOGIN",
            Operation::ValidateRequest => "VALIDAR_SOLICITUD",
            Operation::ListPeople => "LISTAR_PERSONAS",
            Operation::ListVehicles => "LISTAR_VEHICULOS",
            Operation::RegisterPerson => "REGISTRAR_PERSONA",
            Operation::RegisterVehicle => "REGISTRAR_VEHICULO",
            Operation::UploadDocument => "SUBIR_DOCUMENTO",
            Operation::ListDocuments => "VER_ADJUNTOS",
        }
    }

    pub fn url_var(&self) -> String {
        format!("{}_URL", self.name())
    }

    pub fn token_var(&self) -> String {
        format!("{}_TOKEN", self.name())
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Endpoint URL plus the static secret sent as `x-auth-token`.
///
/// Logic App trigger URLs embed a signature in the query string, so the URL
/// is treated as secret material too: `Debug` only shows the host.
#[derive(Clone)]
pub struct WorkflowCredential {
    url: Zeroizing<String>,
    token: Zeroizing<String>,
}

impl WorkflowCredential {
    pub fn new(url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            url: Zeroizing::new(url.into()),
            token: Zeroizing::new(token.into()),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// Host portion of the endpoint, safe to log.
    pub fn display_host(&self) -> String {
        url::Url::parse(&self.url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_else(|| "<invalid url>".to_string())
    }
}

impl fmt::Debug for WorkflowCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkflowCredential")
            .field("host", &self.display_host())
            .field("token", &"****")
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("workflow {0} is not configured (missing {1})")]
    NotConfigured(Operation, String),
}

/// Abstraction over where workflow credentials come from.
/// The server only ever resolves; nothing here is exposed to clients.
pub trait CredentialResolver: Send + Sync {
    fn resolve(&self, op: Operation) -> Result<WorkflowCredential, ResolveError>;

    /// Operations that currently resolve.
    fn configured(&self) -> Vec<Operation> {
        Operation::ALL
            .into_iter()
            .filter(|op| self.resolve(*op).is_ok())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_var_names() {
        assert_eq!(Operation::AuthLogin.url_var(), "AUTH_LOGIN_URL");
        assert_eq!(Operation::ListDocuments.token_var(), "VER_ADJUNTOS_TOKEN");
    }

    #[test]
    fn test_debug_hides_secret_material() {
        let cred = WorkflowCredential::new(
            "https://prod-04.example.logic.azure.com/workflows/abc?sig=topsecret",
            "tok-123",
        );
        let dbg = format!("{:?}", cred);
        assert!(dbg.contains("prod-04.example.logic.azure.com"));
        assert!(!dbg.contains("topsecret"));
        assert!(!dbg.contains("tok-123"));
    }
}
