use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::Json;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::errors::AppError;
use crate::proxy::transform;
use crate::vault::Operation;
use crate::AppState;

// ── Body validation ──────────────────────────────────────────

fn parse_body(raw: &Bytes) -> Result<Value, AppError> {
    match serde_json::from_slice::<Value>(raw) {
        Ok(v @ Value::Object(_)) => Ok(v),
        _ => Err(AppError::Validation("Invalid JSON body".into())),
    }
}

/// Missing, `null` and blank strings all count as absent.
fn is_present(body: &Value, key: &str) -> bool {
    match body.get(key) {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(_) => true,
    }
}

fn require(body: &Value, keys: &[&str], message: &str) -> Result<(), AppError> {
    if keys.iter().all(|k| is_present(body, k)) {
        Ok(())
    } else {
        Err(AppError::Validation(message.to_string()))
    }
}

/// Keep the caller's id on updates, mint one on creation.
fn assign_id(body: &mut Value, key: &str) -> String {
    let id = match body.get(key).and_then(Value::as_str).map(str::trim) {
        Some(existing) if !existing.is_empty() => existing.to_string(),
        _ => Uuid::new_v4().to_string(),
    };
    body[key] = Value::String(id.clone());
    id
}

// ── Forwarding ───────────────────────────────────────────────

/// Resolve, forward, and turn a non-OK workflow answer into `AppError::Upstream`.
/// Returns the decoded body of a successful call, if it had one.
async fn relay(
    state: &AppState,
    op: Operation,
    body: &Value,
    fallback: &str,
) -> Result<Option<Value>, AppError> {
    let credential = state.credentials.resolve(op)?;

    tracing::debug!("forwarding {} to {}", op, credential.display_host());
    let reply = state.upstream.post_json(&credential, body).await?;

    if !reply.is_success() {
        return Err(AppError::Upstream {
            status: reply.status,
            message: reply.message().unwrap_or_else(|| fallback.to_string()),
        });
    }

    Ok(reply.body)
}

// ── Handlers ─────────────────────────────────────────────────

/// POST /api/auth/login: check credentials against the login workflow.
#[tracing::instrument(skip_all)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    raw: Bytes,
) -> Result<Json<Value>, AppError> {
    let body = parse_body(&raw)?;
    require(
        &body,
        &["usuario", "password"],
        "Username and password are required",
    )?;

    let forward = json!({
        "usuario": body["usuario"],
        "password": body["password"],
    });

    let data = relay(&state, Operation::AuthLogin, &forward, "Authentication error")
        .await?
        .ok_or_else(|| anyhow::anyhow!("login workflow answered without a JSON body"))?;

    Ok(Json(data))
}

/// POST /api/documentos/consultar: attachments stored for a person.
#[tracing::instrument(skip_all)]
pub async fn list_documents(
    State(state): State<Arc<AppState>>,
    raw: Bytes,
) -> Result<Json<Value>, AppError> {
    let body = parse_body(&raw)?;
    require(
        &body,
        &["id_solicitud", "id_persona"],
        "Request id and person id are required",
    )?;

    let forward = json!({
        "id_solicitud": body["id_solicitud"],
        "id_persona": body["id_persona"],
    });

    let data = relay(
        &state,
        Operation::ListDocuments,
        &forward,
        "Failed to look up documents",
    )
    .await?;

    let documentos = data.as_ref().map(transform::documents).unwrap_or_default();
    Ok(Json(json!({ "success": true, "documentos": documentos })))
}

/// POST /api/solicitudes/validar: check an access-request code.
#[tracing::instrument(skip_all)]
pub async fn validate_request(
    State(state): State<Arc<AppState>>,
    raw: Bytes,
) -> Result<Json<Value>, AppError> {
    let body = parse_body(&raw)?;
    require(&body, &["id_solicitud"], "Request code is required")?;

    let forward = json!({ "id_solicitud": body["id_solicitud"] });
    relay(
        &state,
        Operation::ValidateRequest,
        &forward,
        "Invalid or unauthorized code.",
    )
    .await?;

    Ok(Json(json!({ "success": true, "id_solicitud": body["id_solicitud"] })))
}

/// POST /api/personas/consultar
#[tracing::instrument(skip_all)]
pub async fn list_people(
    State(state): State<Arc<AppState>>,
    raw: Bytes,
) -> Result<Json<Value>, AppError> {
    let body = parse_body(&raw)?;
    require(&body, &["id_solicitud"], "Request id is required")?;

    let forward = json!({ "id_solicitud": body["id_solicitud"] });
    let data = relay(&state, Operation::ListPeople, &forward, "Failed to load people").await?;

    let personas = data.as_ref().map(transform::people).unwrap_or_default();
    tracing::debug!("listed {} people", personas.len());
    Ok(Json(json!({ "success": true, "personas": personas })))
}

/// POST /api/vehiculos/consultar
#[tracing::instrument(skip_all)]
pub async fn list_vehicles(
    State(state): State<Arc<AppState>>,
    raw: Bytes,
) -> Result<Json<Value>, AppError> {
    let body = parse_body(&raw)?;
    require(&body, &["id_solicitud"], "Request id is required")?;

    let forward = json!({ "id_solicitud": body["id_solicitud"] });
    let data = relay(
        &state,
        Operation::ListVehicles,
        &forward,
        "Failed to load vehicles",
    )
    .await?;

    let vehiculos = data.as_ref().map(transform::vehicles).unwrap_or_default();
    tracing::debug!("listed {} vehicles", vehiculos.len());
    Ok(Json(json!({ "success": true, "vehiculos": vehiculos })))
}

/// POST /api/personas/registrar: create or update a person.
#[tracing::instrument(skip_all)]
pub async fn register_person(
    State(state): State<Arc<AppState>>,
    raw: Bytes,
) -> Result<Json<Value>, AppError> {
    let mut body = parse_body(&raw)?;
    require(
        &body,
        &["id_solicitud", "nombre", "apellidos", "cedula", "cargo"],
        "Request id, first name, last name, document number and role are required",
    )?;

    let id = assign_id(&mut body, "id_persona");
    relay(
        &state,
        Operation::RegisterPerson,
        &body,
        "Failed to register person",
    )
    .await?;

    tracing::info!(person_id = %id, "person saved");
    Ok(Json(json!({ "success": true, "id": id })))
}

/// POST /api/vehiculos/registrar: create or update a vehicle.
#[tracing::instrument(skip_all)]
pub async fn register_vehicle(
    State(state): State<Arc<AppState>>,
    raw: Bytes,
) -> Result<Json<Value>, AppError> {
    let mut body = parse_body(&raw)?;
    require(
        &body,
        &["id_solicitud", "placa", "marca", "modelo", "color", "conductores"],
        "Request id, plate, brand, model, color and drivers are required",
    )?;

    let id = assign_id(&mut body, "id_vehiculo");
    relay(
        &state,
        Operation::RegisterVehicle,
        &body,
        "Failed to register vehicle",
    )
    .await?;

    tracing::info!(vehicle_id = %id, "vehicle saved");
    Ok(Json(json!({ "success": true, "id": id })))
}

/// POST /api/documentos/subir: attach a base64 file to a person or vehicle.
#[tracing::instrument(skip_all)]
pub async fn upload_document(
    State(state): State<Arc<AppState>>,
    raw: Bytes,
) -> Result<Json<Value>, AppError> {
    let body = parse_body(&raw)?;
    require(
        &body,
        &["id_solicitud", "tipo_documento", "archivoNombre", "archivoBase64"],
        "Request id, document type, file name and file content are required",
    )?;

    if is_present(&body, "id_persona") == is_present(&body, "id_vehiculo") {
        return Err(AppError::Validation(
            "Exactly one of person id or vehicle id is required".into(),
        ));
    }

    let encoded = body["archivoBase64"].as_str().unwrap_or_default();
    if STANDARD.decode(encoded.trim()).is_err() {
        return Err(AppError::Validation("File content is not valid base64".into()));
    }

    relay(
        &state,
        Operation::UploadDocument,
        &body,
        "Failed to upload document",
    )
    .await?;

    tracing::info!(
        document_type = %body["tipo_documento"].as_str().unwrap_or_default(),
        "document uploaded"
    );
    Ok(Json(json!({ "success": true })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presence_rules() {
        let body = json!({"a": "x", "b": "  ", "c": null, "d": 0});
        assert!(is_present(&body, "a"));
        assert!(!is_present(&body, "b"));
        assert!(!is_present(&body, "c"));
        assert!(is_present(&body, "d"));
        assert!(!is_present(&body, "missing"));
    }

    #[test]
    fn test_assign_id_keeps_existing() {
        let mut body = json!({"id_vehiculo": "v-1"});
        assert_eq!(assign_id(&mut body, "id_vehiculo"), "v-1");

        let mut body = json!({"id_vehiculo": ""});
        let minted = assign_id(&mut body, "id_vehiculo");
        assert!(Uuid::parse_str(&minted).is_ok());
        assert_eq!(body["id_vehiculo"], minted);
    }

    #[test]
    fn test_parse_body_rejects_non_objects() {
        assert!(parse_body(&Bytes::from_static(b"[1,2]")).is_err());
        assert!(parse_body(&Bytes::from_static(b"not json")).is_err());
        assert!(parse_body(&Bytes::from_static(b"{}")).is_ok());
    }
}
