use serde_json::{json, Value};

use crate::models::entry::{Person, Vehicle};

/// General-information form for a person.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersonForm {
    pub first_name: String,
    pub last_name: String,
    pub document_number: String,
    pub email: String,
    pub role: String,
    pub arl: String,
    pub eps: String,
    pub afp: String,
    pub confined_spaces_cert: String,
    pub heights_cert: String,
    pub heights_assessment: String,
    pub entry_assessment: String,
}

/// General-information form for a vehicle. `drivers` is semicolon separated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VehicleForm {
    pub plate: String,
    pub brand: String,
    pub model: String,
    pub color: String,
    pub drivers: String,
}

fn blank(value: &str) -> bool {
    value.trim().is_empty()
}

fn missing_message(missing: &[&str]) -> Result<(), String> {
    if missing.is_empty() {
        Ok(())
    } else {
        Err(format!("Required fields missing: {}", missing.join(", ")))
    }
}

fn with_id(mut body: Value, key: &str, id: Option<&str>) -> Value {
    if let Some(id) = id.filter(|id| !id.is_empty()) {
        body[key] = Value::String(id.to_string());
    }
    body
}

impl PersonForm {
    /// Pre-fill for edit mode.
    pub fn from_person(person: &Person) -> Self {
        let opt = |v: &Option<String>| v.clone().unwrap_or_default();
        Self {
            first_name: person.first_name.clone(),
            last_name: person.last_name.clone(),
            document_number: person.document_number.clone(),
            email: opt(&person.email),
            role: person.role.clone(),
            arl: opt(&person.arl),
            eps: opt(&person.eps),
            afp: opt(&person.afp),
            confined_spaces_cert: opt(&person.confined_spaces_cert),
            heights_cert: opt(&person.heights_cert),
            heights_assessment: opt(&person.heights_assessment),
            entry_assessment: opt(&person.entry_assessment),
        }
    }

    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("first name", &self.first_name),
            ("last name", &self.last_name),
            ("document number", &self.document_number),
            ("role", &self.role),
        ]
        .into_iter()
        .filter(|(_, v)| blank(v))
        .map(|(name, _)| name)
        .collect()
    }

    pub fn validate(&self) -> Result<(), String> {
        missing_message(&self.missing_fields())
    }

    /// Body for `POST /api/personas/registrar`.
    pub fn to_wire(&self, request_id: &str, person_id: Option<&str>) -> Value {
        let body = json!({
            "id_solicitud": request_id,
            "nombre": self.first_name.trim(),
            "apellidos": self.last_name.trim(),
            "cedula": self.document_number.trim(),
            "correo": self.email.trim(),
            "cargo": self.role.trim(),
            "arl": self.arl,
            "eps": self.eps,
            "afp": self.afp,
            "certificadoConfinados": self.confined_spaces_cert,
            "certificadoAltura": self.heights_cert,
            "conceptoAltura": self.heights_assessment,
            "conceptoIngreso": self.entry_assessment,
        });
        with_id(body, "id_persona", person_id)
    }
}

impl VehicleForm {
    pub fn from_vehicle(vehicle: &Vehicle) -> Self {
        Self {
            plate: vehicle.plate.clone(),
            brand: vehicle.brand.clone(),
            model: vehicle.model.clone(),
            color: vehicle.color.clone(),
            drivers: vehicle.drivers.join("; "),
        }
    }

    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("plate", &self.plate),
            ("brand", &self.brand),
            ("model", &self.model),
            ("color", &self.color),
            ("drivers", &self.drivers),
        ]
        .into_iter()
        .filter(|(_, v)| blank(v))
        .map(|(name, _)| name)
        .collect()
    }

    pub fn validate(&self) -> Result<(), String> {
        missing_message(&self.missing_fields())
    }

    /// Body for `POST /api/vehiculos/registrar`.
    pub fn to_wire(&self, request_id: &str, vehicle_id: Option<&str>) -> Value {
        let body = json!({
            "id_solicitud": request_id,
            "placa": self.plate.trim().to_uppercase(),
            "marca": self.brand.trim(),
            "modelo": self.model.trim(),
            "color": self.color.trim(),
            "conductores": self.drivers.trim(),
        });
        with_id(body, "id_vehiculo", vehicle_id)
    }
}
