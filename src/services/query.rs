//! Read side: documents with their signers and files, and signer lookups.

use std::collections::HashMap;

use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect,
};

use crate::entities::{document, document_file, document_signer, signer};
use crate::error::AppError;
use crate::models::document::{DocumentSignerView, DocumentView, FileView};
use crate::models::signer::{photo_url, SignerView};
use crate::pagination::Pagination;

#[derive(Clone)]
pub struct QueryService {
    db: DatabaseConnection,
    public_base_url: String,
}

impl QueryService {
    pub fn new(db: DatabaseConnection, public_base_url: impl Into<String>) -> Self {
        Self {
            db,
            public_base_url: public_base_url.into(),
        }
    }

    /// Newest first. Without pagination parameters every document is returned.
    pub async fn list_documents(&self, pagination: &Pagination) -> Result<Vec<DocumentView>, AppError> {
        let mut query = document::Entity::find()
            .order_by_desc(document::Column::CreatedAt)
            .order_by_desc(document::Column::Id);

        if pagination.is_requested() {
            query = query.limit(pagination.limit()).offset(pagination.offset());
        }

        let documents = query.all(&self.db).await?;
        Ok(assemble(&self.db, documents, &self.public_base_url).await?)
    }

    pub async fn get_document(&self, id: i32) -> Result<DocumentView, AppError> {
        load_document(&self.db, id, &self.public_base_url)
            .await?
            .ok_or_else(|| AppError::NotFound("Document not found".to_string()))
    }

    /// Trimmed, case-insensitive match. A miss is `None`, not an error.
    pub async fn verify_by_number(&self, number: &str) -> Result<Option<DocumentView>, AppError> {
        let key = document::number_key(number);
        if key.is_empty() {
            return Ok(None);
        }

        let found = document::Entity::find()
            .filter(document::Column::NomorKey.eq(key))
            .one(&self.db)
            .await?;

        match found {
            Some(doc) => Ok(assemble(&self.db, vec![doc], &self.public_base_url)
                .await?
                .pop()),
            None => Ok(None),
        }
    }

    pub async fn list_signers(&self) -> Result<Vec<SignerView>, AppError> {
        let signers = signer::Entity::find()
            .order_by_asc(signer::Column::Nama)
            .order_by_asc(signer::Column::Id)
            .all(&self.db)
            .await?;

        Ok(signers
            .into_iter()
            .map(|s| SignerView::from_model(s, &self.public_base_url))
            .collect())
    }

    /// A numeric key is tried as an id first; otherwise, or when no signer has
    /// that id, it is an exact name (lowest id wins).
    pub async fn get_signer(&self, key: &str) -> Result<SignerView, AppError> {
        let key = key.trim();
        let by_id = match key.parse::<i32>() {
            Ok(id) => signer::Entity::find_by_id(id).one(&self.db).await?,
            Err(_) => None,
        };
        let found = match by_id {
            Some(found) => Some(found),
            None => {
                signer::Entity::find()
                    .filter(signer::Column::Nama.eq(key))
                    .order_by_asc(signer::Column::Id)
                    .one(&self.db)
                    .await?
            }
        };

        found
            .map(|s| SignerView::from_model(s, &self.public_base_url))
            .ok_or_else(|| AppError::NotFound("Signer not found".to_string()))
    }
}

pub(crate) async fn load_document<C: ConnectionTrait>(
    conn: &C,
    id: i32,
    public_base_url: &str,
) -> Result<Option<DocumentView>, DbErr> {
    match document::Entity::find_by_id(id).one(conn).await? {
        Some(doc) => Ok(assemble(conn, vec![doc], public_base_url).await?.pop()),
        None => Ok(None),
    }
}

/// Builds views for `documents`, keeping their order. Signers come back sorted by
/// name, files in upload order. Associations whose signer is gone are skipped.
pub(crate) async fn assemble<C: ConnectionTrait>(
    conn: &C,
    documents: Vec<document::Model>,
    public_base_url: &str,
) -> Result<Vec<DocumentView>, DbErr> {
    if documents.is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<i32> = documents.iter().map(|d| d.id).collect();

    let links = document_signer::Entity::find()
        .filter(document_signer::Column::DocumentId.is_in(ids.clone()))
        .find_also_related(signer::Entity)
        .all(conn)
        .await?;

    let files = document_file::Entity::find()
        .filter(document_file::Column::DocumentId.is_in(ids))
        .order_by_asc(document_file::Column::Id)
        .all(conn)
        .await?;

    let mut signers_by_doc: HashMap<i32, Vec<DocumentSignerView>> = HashMap::new();
    for (link, signer) in links {
        let Some(signer) = signer else { continue };
        signers_by_doc
            .entry(link.document_id)
            .or_default()
            .push(DocumentSignerView {
                id: signer.id,
                foto_url: signer.photo.as_deref().map(|p| photo_url(public_base_url, p)),
                jabatan: link.jabatan.or(signer.jabatan),
                nama: signer.nama,
                bio: signer.bio,
            });
    }

    let mut files_by_doc: HashMap<i32, Vec<FileView>> = HashMap::new();
    for file in files {
        files_by_doc
            .entry(file.document_id)
            .or_default()
            .push(FileView::from(file));
    }

    Ok(documents
        .into_iter()
        .map(|doc| {
            let mut signers = signers_by_doc.remove(&doc.id).unwrap_or_default();
            signers.sort_by(|a, b| a.nama.cmp(&b.nama).then(a.id.cmp(&b.id)));
            let files = files_by_doc.remove(&doc.id).unwrap_or_default();

            DocumentView {
                id: doc.id,
                nomor_dokumen: doc.nomor_dokumen,
                judul: doc.judul,
                created_at: doc.created_at,
                file_jpg: files.first().map(|f| f.file_path.clone()),
                signer_names: signers.iter().map(|s| s.nama.clone()).collect(),
                signers,
                files,
            }
        })
        .collect())
}
