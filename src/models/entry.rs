use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ApprovalStatus {
    Approved,
    #[default]
    Pending,
}

impl ApprovalStatus {
    /// Workflows report `APROBADO` for approved entries; anything else is pending.
    pub fn from_upstream(raw: Option<&str>) -> Self {
        match raw {
            Some(s) if s.trim().eq_ignore_ascii_case("APROBADO") => ApprovalStatus::Approved,
            _ => ApprovalStatus::Pending,
        }
    }
}

/// Which list the dashboard is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    #[default]
    Person,
    Vehicle,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryKind::Person => f.write_str("person"),
            EntryKind::Vehicle => f.write_str("vehicle"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Person {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub document_number: String,
    pub role: String,
    #[serde(default)]
    pub company: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arl: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eps: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub afp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confined_spaces_cert: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heights_cert: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heights_assessment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_assessment: Option<String>,
    pub status: ApprovalStatus,
}

impl Person {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: String,
    pub plate: String,
    pub brand: String,
    pub model: String,
    #[serde(default)]
    pub color: String,
    pub drivers: Vec<String>,
    pub status: ApprovalStatus,
}

/// Splits the semicolon separated driver list used by the vehicle form.
pub fn split_drivers(raw: &str) -> Vec<String> {
    raw.split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty() && *s != "-")
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    Person(Person),
    Vehicle(Vehicle),
}

impl Entry {
    pub fn id(&self) -> &str {
        match self {
            Entry::Person(p) => &p.id,
            Entry::Vehicle(v) => &v.id,
        }
    }

    pub fn kind(&self) -> EntryKind {
        match self {
            Entry::Person(_) => EntryKind::Person,
            Entry::Vehicle(_) => EntryKind::Vehicle,
        }
    }

    pub fn status(&self) -> ApprovalStatus {
        match self {
            Entry::Person(p) => p.status,
            Entry::Vehicle(v) => v.status,
        }
    }
}
