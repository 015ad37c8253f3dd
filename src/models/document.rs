use std::collections::HashMap;

use chrono::NaiveDateTime;
use serde::Serialize;
use utoipa::ToSchema;

use crate::entities::document_file;
use crate::services::storage::IncomingFile;

/// Signer ids as submitted (unfiltered) plus optional per-document roles.
#[derive(Debug, Clone, Default)]
pub struct SignerSelection {
    pub ids: Vec<i64>,
    pub roles: HashMap<i64, String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignerAssignment {
    pub signer_id: i32,
    pub jabatan: Option<String>,
}

impl SignerSelection {
    pub fn new(ids: impl IntoIterator<Item = i64>) -> Self {
        Self {
            ids: ids.into_iter().collect(),
            roles: HashMap::new(),
        }
    }

    pub fn with_role(mut self, signer_id: i64, jabatan: impl Into<String>) -> Self {
        self.roles.insert(signer_id, jabatan.into());
        self
    }

    /// Positive, in-range ids in submission order, first occurrence wins.
    pub fn assignments(&self) -> Vec<SignerAssignment> {
        let mut seen = Vec::new();
        let mut out = Vec::new();

        for &raw in &self.ids {
            let Ok(signer_id) = i32::try_from(raw) else { continue };
            if signer_id <= 0 || seen.contains(&signer_id) {
                continue;
            }
            seen.push(signer_id);

            let jabatan = self
                .roles
                .get(&raw)
                .map(|r| r.trim())
                .filter(|r| !r.is_empty())
                .map(str::to_string);
            out.push(SignerAssignment { signer_id, jabatan });
        }

        out
    }
}

#[derive(Debug, Clone)]
pub struct NewDocument {
    pub number: String,
    pub title: String,
    pub signers: SignerSelection,
    pub files: Vec<IncomingFile>,
}

#[derive(Debug, Clone)]
pub struct DocumentUpdate {
    pub number: String,
    pub title: String,
    /// `None` keeps the current signer set; `Some` replaces it entirely.
    pub signers: Option<SignerSelection>,
    /// Appended; existing files are kept.
    pub files: Vec<IncomingFile>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct DocumentView {
    pub id: i32,
    pub nomor_dokumen: String,
    pub judul: String,
    #[schema(value_type = String)]
    pub created_at: NaiveDateTime,
    /// Stored name of the first attached file.
    pub file_jpg: Option<String>,
    pub files: Vec<FileView>,
    pub signers: Vec<DocumentSignerView>,
    pub signer_names: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct FileView {
    pub id: i32,
    pub file_name: String,
    pub file_path: String,
    pub file_type: String,
    pub file_size: i64,
    #[schema(value_type = String)]
    pub uploaded_at: NaiveDateTime,
}

impl From<document_file::Model> for FileView {
    fn from(model: document_file::Model) -> Self {
        Self {
            id: model.id,
            file_name: model.file_name,
            file_path: model.file_path,
            file_type: model.file_type,
            file_size: model.file_size,
            uploaded_at: model.uploaded_at,
        }
    }
}

/// A signer as shown on one document; `jabatan` is the per-document role when set.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct DocumentSignerView {
    pub id: i32,
    pub nama: String,
    pub jabatan: Option<String>,
    pub bio: Option<String>,
    pub foto_url: Option<String>,
}
