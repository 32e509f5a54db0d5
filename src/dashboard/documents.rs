use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::models::document::{document_types, Document, DocumentOwner, DocumentUpload};
use crate::models::entry::EntryKind;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Success(String),
    Error(String),
}

/// A file picked by the user.
#[derive(Debug, Clone, Copy)]
pub struct PickedFile<'a> {
    pub name: &'a str,
    pub bytes: &'a [u8],
}

/// Attachments tab state for the open dialog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttachmentState {
    /// `(document type, file name)` uploaded during this dialog.
    pub uploaded: Vec<(String, String)>,
    /// Documents already stored for the entry.
    pub stored: Vec<Document>,
    pub notice: Option<Notice>,
    pub loading: bool,
}

impl AttachmentState {
    pub fn has_type(&self, document_type: &str) -> bool {
        self.uploaded.iter().any(|(t, _)| t == document_type)
            || self.stored.iter().any(|d| d.document_type == document_type)
    }
}

/// Validate the picker and build the upload. Errors are inline messages.
pub fn prepare_upload(
    kind: EntryKind,
    request_id: &str,
    owner: DocumentOwner,
    document_type: &str,
    file: Option<PickedFile<'_>>,
) -> Result<DocumentUpload, String> {
    if document_type.trim().is_empty() {
        return Err("Please select a document type".into());
    }
    if !document_types(kind).contains(&document_type) {
        return Err(format!("Unknown document type for a {}: {}", kind, document_type));
    }
    let Some(file) = file else {
        return Err("Please select a file".into());
    };
    if file.bytes.is_empty() {
        return Err("The selected file is empty".into());
    }

    Ok(DocumentUpload {
        request_id: request_id.to_string(),
        owner,
        document_type: document_type.to_string(),
        file_name: file.name.to_string(),
        content_base64: STANDARD.encode(file.bytes),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prepare_upload_encodes_file() {
        let upload = prepare_upload(
            EntryKind::Person,
            "ABC123",
            DocumentOwner::Person("p-1".into()),
            "ARL",
            Some(PickedFile {
                name: "arl.pdf",
                bytes: b"%PDF-1.4",
            }),
        )
        .unwrap();
        assert_eq!(upload.content_base64, "JVBERi0xLjQ=");
        assert_eq!(upload.owner.id(), "p-1");
    }

    #[test]
    fn test_prepare_upload_validation_order() {
        let owner = || DocumentOwner::Vehicle("v-1".into());
        let file = Some(PickedFile {
            name: "a.pdf",
            bytes: b"x",
        });

        assert_eq!(
            prepare_upload(EntryKind::Vehicle, "R", owner(), "", file).unwrap_err(),
            "Please select a document type"
        );
        assert!(prepare_upload(EntryKind::Vehicle, "R", owner(), "ARL", file)
            .unwrap_err()
            .starts_with("Unknown document type"));
        assert_eq!(
            prepare_upload(EntryKind::Vehicle, "R", owner(), "SOAT", None).unwrap_err(),
            "Please select a file"
        );
    }
}
