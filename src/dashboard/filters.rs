use crate::models::entry::{ApprovalStatus, Person, Vehicle};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Approved,
    Pending,
}

impl StatusFilter {
    fn accepts(&self, status: ApprovalStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Approved => status == ApprovalStatus::Approved,
            StatusFilter::Pending => status != ApprovalStatus::Approved,
        }
    }
}

/// Table filters: free text plus approval status.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filters {
    pub text: String,
    pub status: StatusFilter,
}

fn contains(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

impl Filters {
    pub fn is_active(&self) -> bool {
        !self.text.trim().is_empty() || self.status != StatusFilter::All
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    fn needle(&self) -> Option<String> {
        let t = self.text.trim();
        (!t.is_empty()).then(|| t.to_lowercase())
    }

    /// Text matches first name, last name or document number.
    pub fn matches_person(&self, person: &Person) -> bool {
        let text_ok = match self.needle() {
            None => true,
            Some(n) => {
                contains(&person.first_name, &n)
                    || contains(&person.last_name, &n)
                    || contains(&person.full_name(), &n)
                    || contains(&person.document_number, &n)
            }
        };
        text_ok && self.status.accepts(person.status)
    }

    /// Text matches plate or brand.
    pub fn matches_vehicle(&self, vehicle: &Vehicle) -> bool {
        let text_ok = match self.needle() {
            None => true,
            Some(n) => contains(&vehicle.plate, &n) || contains(&vehicle.brand, &n),
        };
        text_ok && self.status.accepts(vehicle.status)
    }
}
