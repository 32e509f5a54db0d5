//! Dashboard controller: the request's people and vehicles, their filters,
//! and the create/edit dialog with its tabs.
//!
//! The controller owns no I/O of its own; everything goes through an
//! [`EntryApi`], normally the [`PortalClient`](crate::client::PortalClient).

pub mod code;
pub mod documents;
pub mod filters;
pub mod forms;
pub mod state;

use async_trait::async_trait;

use crate::client::ClientError;
use crate::models::document::{required_documents, Document, DocumentOwner, DocumentUpload};
use crate::models::entry::{Entry, EntryKind, Person, Vehicle};

use documents::{Notice, PickedFile};
use filters::Filters;
use forms::{PersonForm, VehicleForm};
use state::{Dialog, Phase, Tab};

pub const ENTRY_CODE_PATH: &str = "/code";
pub const NO_RECORDS_MESSAGE: &str = "No records found";
pub const NO_MATCHES_MESSAGE: &str = "No records match the filters";
pub const NO_REQUEST_MESSAGE: &str = "No request code is loaded";

/// Portal operations the dashboard needs.
#[async_trait]
pub trait EntryApi: Send + Sync {
    async fn validate_request(&self, code: &str) -> Result<(), ClientError>;
    async fn list_people(&self, request_id: &str) -> Result<Vec<Person>, ClientError>;
    async fn list_vehicles(&self, request_id: &str) -> Result<Vec<Vehicle>, ClientError>;
    /// Returns the id of the saved person.
    async fn save_person(
        &self,
        request_id: &str,
        person_id: Option<&str>,
        form: &PersonForm,
    ) -> Result<String, ClientError>;
    async fn save_vehicle(
        &self,
        request_id: &str,
        vehicle_id: Option<&str>,
        form: &VehicleForm,
    ) -> Result<String, ClientError>;
    async fn upload_document(&self, upload: &DocumentUpload) -> Result<(), ClientError>;
    async fn list_documents(
        &self,
        request_id: &str,
        person_id: &str,
    ) -> Result<Vec<Document>, ClientError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MountOutcome {
    Ready,
    Redirect(&'static str),
}

pub struct DashboardController<A> {
    api: A,
    request_id: Option<String>,
    kind: EntryKind,
    phase: Phase,
    people: Vec<Person>,
    vehicles: Vec<Vehicle>,
    error: Option<String>,
    filters: Filters,
    dialog: Option<Dialog>,
}

fn request_code(query: &str) -> Option<String> {
    url::form_urlencoded::parse(query.trim_start_matches('?').as_bytes())
        .find(|(k, _)| k == "solicitud")
        .map(|(_, v)| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl<A: EntryApi> DashboardController<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            request_id: None,
            kind: EntryKind::default(),
            phase: Phase::Unresolved,
            people: Vec::new(),
            vehicles: Vec::new(),
            error: None,
            filters: Filters::default(),
            dialog: None,
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }

    pub fn people(&self) -> &[Person] {
        &self.people
    }

    pub fn vehicles(&self) -> &[Vehicle] {
        &self.vehicles
    }

    /// Message for the error panel, if the last fetch failed.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn filters(&self) -> &Filters {
        &self.filters
    }

    pub fn filters_mut(&mut self) -> &mut Filters {
        &mut self.filters
    }

    pub fn dialog(&self) -> Option<&Dialog> {
        self.dialog.as_ref()
    }

    /// Resolve the request code from `query` (`?solicitud=...`) and load the
    /// active list. Without a code the caller must navigate to the code entry
    /// page.
    pub async fn mount(&mut self, query: &str) -> MountOutcome {
        let Some(code) = request_code(query) else {
            tracing::debug!("dashboard opened without a request code");
            return MountOutcome::Redirect(ENTRY_CODE_PATH);
        };
        self.request_id = Some(code);
        self.refresh().await;
        MountOutcome::Ready
    }

    pub async fn set_kind(&mut self, kind: EntryKind) {
        self.kind = kind;
        self.filters.reset();
        self.refresh().await;
    }

    pub async fn refresh(&mut self) {
        self.load(self.kind).await;
    }

    /// Fetch the list for `kind`. Only the active kind drives the error panel.
    #[tracing::instrument(skip(self))]
    async fn load(&mut self, kind: EntryKind) {
        let Some(request_id) = self.request_id.clone() else {
            return;
        };
        self.phase = Phase::Loading;
        if kind == self.kind {
            self.error = None;
        }

        let result = match kind {
            EntryKind::Person => self
                .api
                .list_people(&request_id)
                .await
                .map(|people| self.people = people),
            EntryKind::Vehicle => self
                .api
                .list_vehicles(&request_id)
                .await
                .map(|vehicles| self.vehicles = vehicles),
        };

        if let Err(e) = result {
            tracing::warn!("failed to load entries: {}", e);
            let fallback = match kind {
                EntryKind::Person => "Failed to load people",
                EntryKind::Vehicle => "Failed to load vehicles",
            };
            if kind == self.kind {
                self.error = Some(e.user_message(fallback));
            }
        }
        self.phase = Phase::Ready;
    }

    pub fn open_create(&mut self) {
        self.dialog = Some(Dialog::create(self.kind));
    }

    pub fn open_edit(&mut self, entry: Entry) {
        self.dialog = Some(Dialog::edit(entry));
    }

    pub fn select_tab(&mut self, tab: Tab) -> bool {
        match self.dialog.as_mut() {
            Some(dialog) => dialog.select(tab),
            None => false,
        }
    }

    pub fn close_dialog(&mut self) {
        self.dialog = None;
    }

    /// Save the person dialog's general information. Returns whether it was
    /// saved.
    pub async fn submit_person(&mut self, form: &PersonForm, advance: bool) -> bool {
        let Some((request_id, existing)) = self.begin_submit(EntryKind::Person, form.validate())
        else {
            return false;
        };
        let result = self
            .api
            .save_person(&request_id, existing.as_deref(), form)
            .await;
        self.finish_submit(result, advance, "Failed to save the person")
            .await
    }

    pub async fn submit_vehicle(&mut self, form: &VehicleForm, advance: bool) -> bool {
        let Some((request_id, existing)) = self.begin_submit(EntryKind::Vehicle, form.validate())
        else {
            return false;
        };
        let result = self
            .api
            .save_vehicle(&request_id, existing.as_deref(), form)
            .await;
        self.finish_submit(result, advance, "Failed to save the vehicle")
            .await
    }

    fn begin_submit(
        &mut self,
        kind: EntryKind,
        validation: Result<(), String>,
    ) -> Option<(String, Option<String>)> {
        let dialog = self.dialog.as_mut()?;
        let Some(request_id) = self.request_id.clone() else {
            dialog.error = Some(NO_REQUEST_MESSAGE.to_string());
            return None;
        };
        if dialog.kind != kind {
            dialog.error = Some(format!("This dialog edits a {}, not a {}", dialog.kind, kind));
            return None;
        }
        if let Err(msg) = validation {
            dialog.error = Some(msg);
            return None;
        }
        dialog.error = None;
        dialog.loading = true;
        Some((request_id, dialog.child_id.clone()))
    }

    async fn finish_submit(
        &mut self,
        result: Result<String, ClientError>,
        advance: bool,
        fallback: &str,
    ) -> bool {
        let Some(dialog) = self.dialog.as_mut() else {
            return false;
        };
        dialog.loading = false;

        let id = match result {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!("save failed: {}", e);
                dialog.error = Some(e.user_message(fallback));
                return false;
            }
        };
        dialog.child_id = Some(id);
        let saved_kind = dialog.kind;

        self.load(saved_kind).await;

        if advance {
            self.select_tab(Tab::Attachments);
        } else {
            self.close_dialog();
        }
        true
    }

    /// Upload one attachment for the entry in the open dialog.
    pub async fn upload_document(
        &mut self,
        document_type: &str,
        file: Option<PickedFile<'_>>,
    ) -> bool {
        let Some(request_id) = self.request_id.clone() else {
            return false;
        };
        let Some(dialog) = self.dialog.as_mut() else {
            return false;
        };
        let Some(child_id) = dialog.child_id.clone() else {
            dialog.attachments.notice =
                Some(Notice::Error("Save the general information first".into()));
            return false;
        };
        let owner = match dialog.kind {
            EntryKind::Person => DocumentOwner::Person(child_id),
            EntryKind::Vehicle => DocumentOwner::Vehicle(child_id),
        };

        let upload =
            match documents::prepare_upload(dialog.kind, &request_id, owner, document_type, file) {
                Ok(upload) => upload,
                Err(msg) => {
                    dialog.attachments.notice = Some(Notice::Error(msg));
                    return false;
                }
            };

        dialog.attachments.loading = true;
        dialog.attachments.notice = None;
        let result = self.api.upload_document(&upload).await;
        dialog.attachments.loading = false;

        match result {
            Ok(()) => {
                tracing::info!("uploaded {} for {}", upload.document_type, upload.owner.id());
                dialog.attachments.notice = Some(Notice::Success(format!(
                    "Document \"{}\" uploaded",
                    upload.document_type
                )));
                dialog
                    .attachments
                    .uploaded
                    .push((upload.document_type, upload.file_name));
                true
            }
            Err(e) => {
                dialog.attachments.notice =
                    Some(Notice::Error(e.user_message("Failed to upload the document")));
                false
            }
        }
    }

    /// Fetch stored documents for the person in the open dialog.
    pub async fn load_documents(&mut self) {
        let Some(request_id) = self.request_id.clone() else {
            return;
        };
        let Some(dialog) = self.dialog.as_mut() else {
            return;
        };
        if dialog.kind != EntryKind::Person {
            return;
        }
        let Some(person_id) = dialog.child_id.clone() else {
            return;
        };

        dialog.attachments.loading = true;
        let result = self.api.list_documents(&request_id, &person_id).await;
        dialog.attachments.loading = false;

        match result {
            Ok(docs) => dialog.attachments.stored = docs,
            Err(e) => {
                dialog.attachments.notice =
                    Some(Notice::Error(e.user_message("Failed to load documents")));
            }
        }
    }

    /// Required document types not yet uploaded or stored for the open entry.
    pub fn missing_required_documents(&self) -> Vec<&'static str> {
        let Some(dialog) = &self.dialog else {
            return Vec::new();
        };
        required_documents(dialog.kind)
            .iter()
            .copied()
            .filter(|t| !dialog.attachments.has_type(t))
            .collect()
    }

    /// Entries of the active kind that pass the filters.
    pub fn visible_entries(&self) -> Vec<Entry> {
        match self.kind {
            EntryKind::Person => self
                .people
                .iter()
                .filter(|p| self.filters.matches_person(p))
                .cloned()
                .map(Entry::Person)
                .collect(),
            EntryKind::Vehicle => self
                .vehicles
                .iter()
                .filter(|v| self.filters.matches_vehicle(v))
                .cloned()
                .map(Entry::Vehicle)
                .collect(),
        }
    }

    /// Placeholder text for an empty table, `None` when rows are shown.
    pub fn empty_message(&self) -> Option<&'static str> {
        if !self.visible_entries().is_empty() {
            return None;
        }
        if self.filters.is_active() {
            Some(NO_MATCHES_MESSAGE)
        } else {
            Some(NO_RECORDS_MESSAGE)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::entry::ApprovalStatus;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeApi {
        people: Vec<Person>,
        fail_lists: bool,
        fail_save: bool,
        calls: Mutex<Vec<String>>,
    }

    impl FakeApi {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: String) {
            self.calls.lock().unwrap().push(call);
        }
    }

    #[async_trait]
    impl EntryApi for FakeApi {
        async fn validate_request(&self, code: &str) -> Result<(), ClientError> {
            self.record(format!("validate {}", code));
            Ok(())
        }

        async fn list_people(&self, request_id: &str) -> Result<Vec<Person>, ClientError> {
            self.record(format!("people {}", request_id));
            if self.fail_lists {
                return Err(ClientError::Upstream {
                    status: 502,
                    message: None,
                });
            }
            Ok(self.people.clone())
        }

        async fn list_vehicles(&self, request_id: &str) -> Result<Vec<Vehicle>, ClientError> {
            self.record(format!("vehicles {}", request_id));
            Ok(vec![])
        }

        async fn save_person(
            &self,
            _request_id: &str,
            person_id: Option<&str>,
            _form: &PersonForm,
        ) -> Result<String, ClientError> {
            self.record(format!("save_person {:?}", person_id));
            if self.fail_save {
                return Err(ClientError::Upstream {
                    status: 500,
                    message: Some("Workflow unavailable".into()),
                });
            }
            Ok(person_id.unwrap_or("p-new").to_string())
        }

        async fn save_vehicle(
            &self,
            _request_id: &str,
            vehicle_id: Option<&str>,
            _form: &VehicleForm,
        ) -> Result<String, ClientError> {
            self.record(format!("save_vehicle {:?}", vehicle_id));
            Ok("v-new".into())
        }

        async fn upload_document(&self, upload: &DocumentUpload) -> Result<(), ClientError> {
            self.record(format!("upload {} {}", upload.document_type, upload.owner.id()));
            Ok(())
        }

        async fn list_documents(
            &self,
            _request_id: &str,
            person_id: &str,
        ) -> Result<Vec<Document>, ClientError> {
            self.record(format!("documents {}", person_id));
            Ok(vec![Document {
                content: "JVBERi0=".into(),
                name: "eps.pdf".into(),
                document_type: "EPS".into(),
            }])
        }
    }

    fn person_form() -> PersonForm {
        PersonForm {
            first_name: "Ana".into(),
            last_name: "Ruiz".into(),
            document_number: "1020".into(),
            role: "Soldadora".into(),
            ..Default::default()
        }
    }

    fn ana() -> Person {
        Person {
            id: "p-1".into(),
            first_name: "Ana".into(),
            last_name: "Ruiz".into(),
            status: ApprovalStatus::Approved,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_mount_without_code_redirects() {
        let mut dash = DashboardController::new(FakeApi::default());
        assert_eq!(dash.mount("").await, MountOutcome::Redirect("/code"));
        assert_eq!(dash.mount("?solicitud=%20").await, MountOutcome::Redirect("/code"));
        assert_eq!(dash.phase(), Phase::Unresolved);
        assert!(dash.api().calls().is_empty());
    }

    #[tokio::test]
    async fn test_mount_loads_people() {
        let api = FakeApi {
            people: vec![ana()],
            ..Default::default()
        };
        let mut dash = DashboardController::new(api);
        assert_eq!(dash.mount("?solicitud=ABC%20123").await, MountOutcome::Ready);
        assert_eq!(dash.request_id(), Some("ABC 123"));
        assert_eq!(dash.phase(), Phase::Ready);
        assert_eq!(dash.people().len(), 1);
        assert_eq!(dash.empty_message(), None);
        assert_eq!(dash.api().calls(), vec!["people ABC 123"]);
    }

    #[tokio::test]
    async fn test_fetch_failure_keeps_previous_list() {
        let mut dash = DashboardController::new(FakeApi {
            people: vec![ana()],
            ..Default::default()
        });
        dash.mount("solicitud=R1").await;

        dash.api.fail_lists = true;
        dash.refresh().await;
        assert_eq!(dash.error(), Some("Failed to load people"));
        assert_eq!(dash.people().len(), 1);
        assert_eq!(dash.phase(), Phase::Ready);
    }

    #[tokio::test]
    async fn test_set_kind_resets_filters() {
        let mut dash = DashboardController::new(FakeApi::default());
        dash.mount("solicitud=R1").await;
        dash.filters_mut().text = "ana".into();
        assert_eq!(dash.empty_message(), Some(NO_MATCHES_MESSAGE));

        dash.set_kind(EntryKind::Vehicle).await;
        assert!(!dash.filters().is_active());
        assert_eq!(dash.empty_message(), Some(NO_RECORDS_MESSAGE));
        assert_eq!(dash.api().calls(), vec!["people R1", "vehicles R1"]);
    }

    #[tokio::test]
    async fn test_create_then_advance_to_attachments() {
        let mut dash = DashboardController::new(FakeApi::default());
        dash.mount("solicitud=R1").await;
        dash.open_create();
        assert!(!dash.select_tab(Tab::Attachments));

        assert!(dash.submit_person(&person_form(), true).await);
        let dialog = dash.dialog().unwrap();
        assert_eq!(dialog.child_id.as_deref(), Some("p-new"));
        assert_eq!(dialog.tab, Tab::Attachments);
        assert!(!dialog.loading);

        // a second save updates the same person
        assert!(dash.submit_person(&person_form(), false).await);
        assert!(dash.dialog().is_none());
        assert!(dash.api().calls().contains(&"save_person Some(\"p-new\")".to_string()));
    }

    #[tokio::test]
    async fn test_invalid_form_makes_no_call() {
        let mut dash = DashboardController::new(FakeApi::default());
        dash.mount("solicitud=R1").await;
        dash.open_create();

        assert!(!dash.submit_person(&PersonForm::default(), true).await);
        let dialog = dash.dialog().unwrap();
        assert!(dialog.error.as_deref().unwrap().starts_with("Required fields missing"));
        assert_eq!(dash.api().calls(), vec!["people R1"]);
    }

    #[tokio::test]
    async fn test_save_failure_keeps_dialog_open() {
        let mut dash = DashboardController::new(FakeApi {
            fail_save: true,
            ..Default::default()
        });
        dash.mount("solicitud=R1").await;
        dash.open_create();

        assert!(!dash.submit_person(&person_form(), true).await);
        let dialog = dash.dialog().unwrap();
        assert_eq!(dialog.error.as_deref(), Some("Workflow unavailable"));
        assert!(!dialog.loading);
        assert_eq!(dialog.tab, Tab::General);
        assert!(dialog.child_id.is_none());
    }

    #[tokio::test]
    async fn test_upload_and_required_documents() {
        let mut dash = DashboardController::new(FakeApi::default());
        dash.mount("solicitud=R1").await;
        dash.open_edit(Entry::Person(ana()));

        dash.load_documents().await;
        assert_eq!(dash.missing_required_documents(), vec!["ARL", "AFP", "Documento de identidad"]);

        let ok = dash
            .upload_document(
                "ARL",
                Some(PickedFile {
                    name: "arl.pdf",
                    bytes: b"%PDF",
                }),
            )
            .await;
        assert!(ok);
        let dialog = dash.dialog().unwrap();
        assert_eq!(dialog.attachments.uploaded, vec![("ARL".to_string(), "arl.pdf".to_string())]);
        assert!(matches!(dialog.attachments.notice, Some(Notice::Success(_))));
        assert_eq!(dash.missing_required_documents(), vec!["AFP", "Documento de identidad"]);
    }

    #[tokio::test]
    async fn test_upload_requires_saved_entry() {
        let mut dash = DashboardController::new(FakeApi::default());
        dash.mount("solicitud=R1").await;
        dash.set_kind(EntryKind::Vehicle).await;
        dash.open_create();

        let ok = dash
            .upload_document(
                "SOAT",
                Some(PickedFile {
                    name: "soat.pdf",
                    bytes: b"x",
                }),
            )
            .await;
        assert!(!ok);
        assert!(!dash.api().calls().iter().any(|c| c.starts_with("upload")));
    }

    #[tokio::test]
    async fn test_save_reloads_the_edited_kind() {
        let mut dash = DashboardController::new(FakeApi {
            people: vec![ana()],
            ..Default::default()
        });
        dash.mount("solicitud=R1").await;
        dash.set_kind(EntryKind::Vehicle).await;

        dash.open_edit(Entry::Person(ana()));
        assert!(dash.submit_person(&person_form(), false).await);

        assert_eq!(
            dash.api().calls(),
            vec!["people R1", "vehicles R1", "save_person Some(\"p-1\")", "people R1"]
        );
        assert_eq!(dash.kind(), EntryKind::Vehicle);
        assert_eq!(dash.error(), None);
    }

    #[tokio::test]
    async fn test_submit_explains_rejection() {
        let mut dash = DashboardController::new(FakeApi::default());
        dash.open_create();
        assert!(!dash.submit_person(&person_form(), false).await);
        assert_eq!(dash.dialog().unwrap().error.as_deref(), Some(NO_REQUEST_MESSAGE));

        dash.mount("solicitud=R1").await;
        dash.open_create();
        let vehicle = VehicleForm {
            plate: "ACB123".into(),
            brand: "Toyota".into(),
            model: "Hilux".into(),
            color: "Blanco".into(),
            drivers: "Juan".into(),
        };
        assert!(!dash.submit_vehicle(&vehicle, false).await);
        assert_eq!(
            dash.dialog().unwrap().error.as_deref(),
            Some("This dialog edits a person, not a vehicle")
        );
        assert!(!dash.api().calls().iter().any(|c| c.starts_with("save")));
    }
}
