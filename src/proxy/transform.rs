//! Maps workflow payloads onto the portal's fixed schema.
//!
//! Workflows are not consistent about shape or casing: list endpoints answer
//! with an array or a bare object, person ids live in `guid0`, `Title` or
//! `id_persona`, vehicle fields are UPPERCASE. Callers past this module only
//! ever see `Person`, `Vehicle` and `Document`.

use serde_json::Value;

use crate::models::document::Document;
use crate::models::entry::{split_drivers, ApprovalStatus, Person, Vehicle};

/// Records of a list payload. A bare object counts as one record, an empty
/// object or `null` as none.
pub fn records(payload: &Value) -> Vec<&Value> {
    match payload {
        Value::Array(items) => items.iter().filter(|v| v.is_object()).collect(),
        Value::Object(map) if !map.is_empty() => vec![payload],
        _ => Vec::new(),
    }
}

/// First non-empty value among `keys`, matching key names case-insensitively.
/// Numbers are accepted and rendered as text.
fn field(record: &Value, keys: &[&str]) -> Option<String> {
    let map = record.as_object()?;
    keys.iter().find_map(|key| {
        map.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .and_then(|(_, v)| match v {
                Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
    })
}

fn text(record: &Value, keys: &[&str]) -> String {
    field(record, keys).unwrap_or_default()
}

pub fn person(record: &Value) -> Person {
    Person {
        id: text(record, &["guid0", "Title", "id_persona"]),
        first_name: text(record, &["Nombre"]),
        last_name: text(record, &["Apellidos"]),
        document_number: text(record, &["C_x002e_C", "cedula"]),
        role: text(record, &["Cargo"]),
        company: text(record, &["empresa"]),
        email: field(record, &["correo", "email"]),
        arl: field(record, &["arl"]),
        eps: field(record, &["eps"]),
        afp: field(record, &["afp"]),
        confined_spaces_cert: field(record, &["certificadoConfinados"]),
        heights_cert: field(record, &["certificadoAltura"]),
        heights_assessment: field(record, &["conceptoAltura"]),
        entry_assessment: field(record, &["conceptoIngreso"]),
        status: ApprovalStatus::from_upstream(
            field(record, &["Estado", "ESTADO_ACTIVIDAD"]).as_deref(),
        ),
    }
}

pub fn vehicle(record: &Value) -> Vehicle {
    Vehicle {
        id: text(record, &["ID_VEHICULO"]),
        plate: text(record, &["PLACA"]),
        brand: text(record, &["MARCA"]),
        model: text(record, &["MODELO"]),
        color: text(record, &["COLOR"]),
        drivers: split_drivers(&text(record, &["CONDUCTORES"])),
        status: ApprovalStatus::from_upstream(field(record, &["ESTADO"]).as_deref()),
    }
}

pub fn people(payload: &Value) -> Vec<Person> {
    records(payload).into_iter().map(person).collect()
}

pub fn vehicles(payload: &Value) -> Vec<Vehicle> {
    records(payload).into_iter().map(vehicle).collect()
}

/// Unwraps the `Datos` array of a documents lookup. Anything else is an
/// empty list.
pub fn documents(payload: &Value) -> Vec<Document> {
    let datos = payload.as_object().and_then(|map| {
        map.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case("Datos"))
            .map(|(_, v)| v)
    });

    let Some(Value::Array(items)) = datos else {
        return Vec::new();
    };

    items
        .iter()
        .filter(|v| v.is_object())
        .map(|item| Document {
            content: text(item, &["content"]),
            name: text(item, &["name"]),
            document_type: text(item, &["tipo_adjunto"]),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_person_id_fallbacks() {
        let with_guid = json!({"guid0": "g-1", "Title": "t-1", "Nombre": "Ana"});
        assert_eq!(person(&with_guid).id, "g-1");

        let with_title = json!({"Title": "t-1", "Nombre": "Ana"});
        assert_eq!(person(&with_title).id, "t-1");

        let with_own = json!({"id_persona": "p-1"});
        assert_eq!(person(&with_own).id, "p-1");
    }

    #[test]
    fn test_person_fields_and_status() {
        let raw = json!({
            "guid0": "g-1",
            "Nombre": "Ana",
            "Apellidos": "Ruiz",
            "C_x002e_C": 1020304050_u64,
            "Cargo": "Soldadora",
            "empresa": "Metálicas SAS",
            "ESTADO_ACTIVIDAD": "APROBADO"
        });
        let p = person(&raw);
        assert_eq!(p.full_name(), "Ana Ruiz");
        assert_eq!(p.document_number, "1020304050");
        assert_eq!(p.company, "Metálicas SAS");
        assert_eq!(p.status, ApprovalStatus::Approved);
        assert!(p.email.is_none());
    }

    #[test]
    fn test_vehicle_uppercase_fields() {
        let raw = json!([{
            "ID_VEHICULO": "v-9",
            "PLACA": "ACB-123",
            "MARCA": "Toyota",
            "MODELO": "Hilux",
            "CONDUCTORES": "Juan Pérez; María González",
            "ESTADO": "PENDIENTE"
        }]);
        let list = vehicles(&raw);
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].plate, "ACB-123");
        assert_eq!(list[0].color, "");
        assert_eq!(list[0].drivers, vec!["Juan Pérez", "María González"]);
        assert_eq!(list[0].status, ApprovalStatus::Pending);
    }

    #[test]
    fn test_single_object_and_empty_payloads() {
        assert_eq!(people(&json!({"guid0": "x"})).len(), 1);
        assert!(people(&json!({})).is_empty());
        assert!(people(&json!([])).is_empty());
        assert!(people(&Value::Null).is_empty());
    }

    #[test]
    fn test_documents_unwrap_datos() {
        let payload = json!({
            "Datos": [
                {"content": "JVBERi0=", "name": "arl.pdf", "tipo_adjunto": "ARL"},
                {"Content": "AAAA", "NAME": "eps.pdf", "TIPO_ADJUNTO": "EPS"}
            ]
        });
        let docs = documents(&payload);
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[1].name, "eps.pdf");
        assert_eq!(docs[1].document_type, "EPS");

        assert!(documents(&json!({"mensaje": "sin datos"})).is_empty());
        assert!(documents(&json!({"Datos": "nope"})).is_empty());
    }
}
