use super::EntryApi;
use crate::client::ClientError;

pub const EMPTY_CODE_MESSAGE: &str = "Please enter the request code.";
pub const INVALID_CODE_MESSAGE: &str = "Invalid or unauthorized code.";
pub const UNREACHABLE_MESSAGE: &str = "Could not connect to the server.";

pub fn dashboard_path(code: &str) -> String {
    format!("/dashboard?solicitud={}", urlencoding::encode(code))
}

/// Validate an access code and return the dashboard path to navigate to.
pub async fn enter_code<A: EntryApi + ?Sized>(api: &A, code: &str) -> Result<String, String> {
    let code = code.trim();
    if code.is_empty() {
        return Err(EMPTY_CODE_MESSAGE.to_string());
    }

    match api.validate_request(code).await {
        Ok(()) => Ok(dashboard_path(code)),
        Err(ClientError::Transport(e)) => {
            tracing::warn!("request code validation unreachable: {}", e);
            Err(UNREACHABLE_MESSAGE.to_string())
        }
        Err(e) => {
            tracing::debug!("request code rejected: {}", e);
            Err(e.user_message(INVALID_CODE_MESSAGE))
        }
    }
}
