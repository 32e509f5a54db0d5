use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::entry::EntryKind;

pub const PERSON_DOCUMENT_TYPES: &[&str] = &[
    "ARL",
    "EPS",
    "AFP",
    "Cert. Espacios Confinado",
    "Cert. Trabajo en Alturas",
    "Concepto médico",
    "Documento de identidad",
    "Licencia de conducción",
];

pub const VEHICLE_DOCUMENT_TYPES: &[&str] = &[
    "SOAT",
    "Póliza todo riesgo",
    "RUNT",
    "TARJETA DE PROPIEDAD",
    "Revisión técnico mecánica",
    "Licencia de tránsito",
];

pub const REQUIRED_PERSON_DOCUMENTS: &[&str] = &["ARL", "EPS", "AFP", "Documento de identidad"];

pub const REQUIRED_VEHICLE_DOCUMENTS: &[&str] =
    &["SOAT", "TARJETA DE PROPIEDAD", "Revisión técnico mecánica"];

pub fn document_types(kind: EntryKind) -> &'static [&'static str] {
    match kind {
        EntryKind::Person => PERSON_DOCUMENT_TYPES,
        EntryKind::Vehicle => VEHICLE_DOCUMENT_TYPES,
    }
}

pub fn required_documents(kind: EntryKind) -> &'static [&'static str] {
    match kind {
        EntryKind::Person => REQUIRED_PERSON_DOCUMENTS,
        EntryKind::Vehicle => REQUIRED_VEHICLE_DOCUMENTS,
    }
}

/// A stored attachment as returned by the documents lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Base64 file body.
    pub content: String,
    pub name: String,
    #[serde(rename = "tipo_adjunto")]
    pub document_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentOwner {
    Person(String),
    Vehicle(String),
}

impl DocumentOwner {
    pub fn id(&self) -> &str {
        match self {
            DocumentOwner::Person(id) | DocumentOwner::Vehicle(id) => id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentUpload {
    pub request_id: String,
    pub owner: DocumentOwner,
    pub document_type: String,
    pub file_name: String,
    pub content_base64: String,
}

impl DocumentUpload {
    /// Body for `POST /api/documentos/subir`.
    pub fn to_wire(&self) -> Value {
        let mut body = json!({
            "id_solicitud": self.request_id,
            "tipo_documento": self.document_type,
            "archivoNombre": self.file_name,
            "archivoBase64": self.content_base64,
        });
        let (key, id) = match &self.owner {
            DocumentOwner::Person(id) => ("id_persona", id),
            DocumentOwner::Vehicle(id) => ("id_vehiculo", id),
        };
        body[key] = Value::String(id.clone());
        body
    }
}
