//! Document lifecycle: a document row, its signer associations and its files
//! change together or not at all.
//!
//! Every mutation runs in one transaction. Files are written to the content
//! directory while the transaction is open; if anything fails before commit the
//! transaction is rolled back and the files written during the attempt are
//! deleted again. Physical files of deleted rows are removed only after commit.

use std::future::Future;
use std::time::Duration;

use sea_orm::sqlx::error::DatabaseError;
use sea_orm::sqlx::sqlite::SqliteError;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QuerySelect, RuntimeErr, Set, SqlErr, TransactionTrait,
};
use tracing::{info, warn};

use crate::entities::{document, document_file, document_signer, signer};
use crate::error::AppError;
use crate::models::document::{DocumentUpdate, DocumentView, NewDocument, SignerAssignment};
use crate::services::query::assemble;
use crate::services::storage::{FileStore, IncomingFile, StoreOutcome, UploadPolicy};
use crate::services::{finish, required};

const NUMBER_TAKEN: &str = "document number already exists";

/// Attempts per write when SQLite reports a lost lock race.
const WRITE_ATTEMPTS: u32 = 3;
const RETRY_BACKOFF: Duration = Duration::from_millis(25);
const SQLITE_BUSY: i32 = 5;

#[derive(Clone)]
pub struct DocumentService {
    db: DatabaseConnection,
    files: FileStore,
    txn_timeout: Duration,
    public_base_url: String,
}

impl DocumentService {
    pub fn new(
        db: DatabaseConnection,
        files: FileStore,
        txn_timeout: Duration,
        public_base_url: impl Into<String>,
    ) -> Self {
        Self {
            db,
            files,
            txn_timeout,
            public_base_url: public_base_url.into(),
        }
    }

    pub async fn create(&self, input: NewDocument) -> Result<DocumentView, AppError> {
        let number = required(&input.number, "document number required")?;
        let title = required(&input.title, "title required")?;
        let assignments = input.signers.assignments();
        if assignments.is_empty() {
            return Err(AppError::Validation("at least one signer required".to_string()));
        }

        let (number, title) = (number.as_str(), title.as_str());
        let (assignments, files) = (assignments.as_slice(), input.files.as_slice());
        let view = retry_when_busy("create document", move || async move {
            let mut written = Vec::new();
            let result = self
                .create_in_txn(number, title, assignments, files, &mut written)
                .await;
            self.settle(result, &written).await
        })
        .await?;

        info!(id = view.id, number = %view.nomor_dokumen, files = view.files.len(), "document created");
        Ok(view)
    }

    async fn create_in_txn(
        &self,
        number: &str,
        title: &str,
        assignments: &[SignerAssignment],
        files: &[IncomingFile],
        written: &mut Vec<String>,
    ) -> Result<DocumentView, AppError> {
        let txn = self.db.begin().await?;

        let result = self
            .bounded(async {
                let key = document::number_key(number);
                ensure_number_free(&txn, &key, None).await?;
                ensure_signers_exist(&txn, assignments).await?;

                let doc = document::ActiveModel {
                    nomor_dokumen: Set(number.to_string()),
                    nomor_key: Set(key),
                    judul: Set(title.to_string()),
                    created_at: Set(chrono::Utc::now().naive_utc()),
                    ..Default::default()
                }
                .insert(&txn)
                .await
                .map_err(number_conflict)?;

                self.attach_files(&txn, doc.id, files, written).await?;
                insert_signers(&txn, doc.id, assignments).await?;

                let mut views = assemble(&txn, vec![doc], &self.public_base_url).await?;
                views
                    .pop()
                    .ok_or_else(|| AppError::InternalServerError("created document vanished".to_string()))
            })
            .await;

        finish(txn, result).await
    }

    /// Renames and retitles in place. A provided signer selection replaces the
    /// whole set; new files are appended.
    pub async fn update(&self, id: i32, input: DocumentUpdate) -> Result<DocumentView, AppError> {
        let number = required(&input.number, "document number required")?;
        let title = required(&input.title, "title required")?;
        let assignments = match &input.signers {
            Some(selection) => {
                let assignments = selection.assignments();
                if assignments.is_empty() {
                    return Err(AppError::Validation("at least one signer required".to_string()));
                }
                Some(assignments)
            }
            None => None,
        };

        let (number, title) = (number.as_str(), title.as_str());
        let (assignments, files) = (assignments.as_deref(), input.files.as_slice());
        let view = retry_when_busy("update document", move || async move {
            let mut written = Vec::new();
            let result = self
                .update_in_txn(id, number, title, assignments, files, &mut written)
                .await;
            self.settle(result, &written).await
        })
        .await?;

        info!(id, number = %view.nomor_dokumen, files = view.files.len(), "document updated");
        Ok(view)
    }

    async fn update_in_txn(
        &self,
        id: i32,
        number: &str,
        title: &str,
        assignments: Option<&[SignerAssignment]>,
        files: &[IncomingFile],
        written: &mut Vec<String>,
    ) -> Result<DocumentView, AppError> {
        let txn = self.db.begin().await?;

        let result = self
            .bounded(async {
                let existing = find_document(&txn, id).await?;
                let key = document::number_key(number);
                ensure_number_free(&txn, &key, Some(id)).await?;
                if let Some(assignments) = assignments {
                    ensure_signers_exist(&txn, assignments).await?;
                }

                let mut active: document::ActiveModel = existing.into();
                active.nomor_dokumen = Set(number.to_string());
                active.nomor_key = Set(key);
                active.judul = Set(title.to_string());
                let doc = active.update(&txn).await.map_err(number_conflict)?;

                if let Some(assignments) = assignments {
                    document_signer::Entity::delete_many()
                        .filter(document_signer::Column::DocumentId.eq(id))
                        .exec(&txn)
                        .await?;
                    insert_signers(&txn, id, assignments).await?;
                }

                self.attach_files(&txn, id, files, written).await?;

                let mut views = assemble(&txn, vec![doc], &self.public_base_url).await?;
                views
                    .pop()
                    .ok_or_else(|| AppError::InternalServerError("updated document vanished".to_string()))
            })
            .await;

        finish(txn, result).await
    }

    /// Removes the document with its associations and file rows, then its files.
    pub async fn delete(&self, id: i32) -> Result<(), AppError> {
        let txn = self.db.begin().await?;

        let result = self
            .bounded(async {
                let doc = find_document(&txn, id).await?;
                let stored: Vec<String> = document_file::Entity::find()
                    .select_only()
                    .column(document_file::Column::FilePath)
                    .filter(document_file::Column::DocumentId.eq(id))
                    .into_tuple()
                    .all(&txn)
                    .await?;

                document_signer::Entity::delete_many()
                    .filter(document_signer::Column::DocumentId.eq(id))
                    .exec(&txn)
                    .await?;
                document_file::Entity::delete_many()
                    .filter(document_file::Column::DocumentId.eq(id))
                    .exec(&txn)
                    .await?;
                document::Entity::delete_by_id(id).exec(&txn).await?;

                Ok::<_, AppError>((doc, stored))
            })
            .await;

        let (doc, stored) = finish(txn, result).await?;
        self.files.remove_all(&stored).await;

        info!(id, number = %doc.nomor_dokumen, files = stored.len(), "document deleted");
        Ok(())
    }

    /// Detaches one file from a document and deletes it from the content directory.
    pub async fn remove_file(&self, document_id: i32, file_id: i32) -> Result<(), AppError> {
        let txn = self.db.begin().await?;

        let result = self
            .bounded(async {
                let file = document_file::Entity::find_by_id(file_id)
                    .filter(document_file::Column::DocumentId.eq(document_id))
                    .one(&txn)
                    .await?
                    .ok_or_else(|| AppError::NotFound("File not found".to_string()))?;

                document_file::Entity::delete_by_id(file.id).exec(&txn).await?;
                Ok::<_, AppError>(file)
            })
            .await;

        let file = finish(txn, result).await?;
        self.files.remove(&file.file_path).await;

        info!(document_id, file_id, name = %file.file_path, "document file removed");
        Ok(())
    }

    async fn bounded<T>(
        &self,
        work: impl Future<Output = Result<T, AppError>>,
    ) -> Result<T, AppError> {
        tokio::time::timeout(self.txn_timeout, work).await?
    }

    /// Stores each acceptable file and records it. Rejected files are skipped.
    async fn attach_files<C: ConnectionTrait>(
        &self,
        conn: &C,
        document_id: i32,
        files: &[IncomingFile],
        written: &mut Vec<String>,
    ) -> Result<(), AppError> {
        for (ordinal, file) in files.iter().enumerate() {
            let stored = match self.files.store(file, &UploadPolicy::DOCUMENTS, ordinal).await? {
                StoreOutcome::Stored(stored) => stored,
                StoreOutcome::Rejected(reason) => {
                    warn!(document_id, file = %file.original_name, %reason, "attachment skipped");
                    continue;
                }
            };
            written.push(stored.stored_name.clone());

            document_file::ActiveModel {
                document_id: Set(document_id),
                file_name: Set(stored.original_name),
                file_path: Set(stored.stored_name),
                file_type: Set(stored.file_type),
                file_size: Set(i64::try_from(stored.size).unwrap_or(i64::MAX)),
                uploaded_at: Set(chrono::Utc::now().naive_utc()),
                ..Default::default()
            }
            .insert(conn)
            .await?;
        }

        Ok(())
    }

    /// On failure, deletes every file written during the attempt.
    async fn settle<T>(&self, result: Result<T, AppError>, written: &[String]) -> Result<T, AppError> {
        if let Err(err) = &result {
            if !written.is_empty() {
                warn!(error = %err, files = written.len(), "discarding files from failed write");
                self.files.remove_all(written).await;
            }
        }
        result
    }
}

/// Runs `attempt` again when it failed on SQLite lock contention. A retried
/// create re-runs the number check and so reports the winner's number as a
/// conflict.
async fn retry_when_busy<T, F, Fut>(operation: &str, mut attempt: F) -> Result<T, AppError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AppError>>,
{
    let mut tries = 1;
    loop {
        match attempt().await {
            Err(err) if tries < WRITE_ATTEMPTS && is_busy(&err) => {
                warn!(operation, tries, "database busy, retrying");
                tokio::time::sleep(RETRY_BACKOFF * tries).await;
                tries += 1;
            }
            result => return result,
        }
    }
}

/// SQLite answers a write that lost a lock race with SQLITE_BUSY (or one of its
/// extended codes) instead of queueing it.
fn is_busy(err: &AppError) -> bool {
    let AppError::DatabaseError(DbErr::Conn(runtime) | DbErr::Exec(runtime) | DbErr::Query(runtime)) =
        err
    else {
        return false;
    };
    let RuntimeErr::SqlxError(sea_orm::sqlx::Error::Database(db_err)) = runtime else {
        return false;
    };

    db_err
        .try_downcast_ref::<SqliteError>()
        .and_then(|e| e.code())
        .and_then(|code| code.parse::<i32>().ok())
        .is_some_and(|code| code & 0xff == SQLITE_BUSY)
}

async fn find_document<C: ConnectionTrait>(conn: &C, id: i32) -> Result<document::Model, AppError> {
    document::Entity::find_by_id(id)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::NotFound("Document not found".to_string()))
}

async fn ensure_number_free<C: ConnectionTrait>(
    conn: &C,
    key: &str,
    except: Option<i32>,
) -> Result<(), AppError> {
    let mut query = document::Entity::find().filter(document::Column::NomorKey.eq(key));
    if let Some(id) = except {
        query = query.filter(document::Column::Id.ne(id));
    }

    match query.one(conn).await? {
        Some(_) => Err(AppError::Conflict(NUMBER_TAKEN.to_string())),
        None => Ok(()),
    }
}

async fn ensure_signers_exist<C: ConnectionTrait>(
    conn: &C,
    assignments: &[SignerAssignment],
) -> Result<(), AppError> {
    let ids: Vec<i32> = assignments.iter().map(|a| a.signer_id).collect();
    let known: Vec<i32> = signer::Entity::find()
        .select_only()
        .column(signer::Column::Id)
        .filter(signer::Column::Id.is_in(ids.clone()))
        .into_tuple()
        .all(conn)
        .await?;

    match ids.into_iter().find(|id| !known.contains(id)) {
        Some(missing) => Err(AppError::Validation(format!("unknown signer id {}", missing))),
        None => Ok(()),
    }
}

async fn insert_signers<C: ConnectionTrait>(
    conn: &C,
    document_id: i32,
    assignments: &[SignerAssignment],
) -> Result<(), AppError> {
    if assignments.is_empty() {
        return Ok(());
    }

    let rows = assignments.iter().map(|a| document_signer::ActiveModel {
        document_id: Set(document_id),
        signer_id: Set(a.signer_id),
        jabatan: Set(a.jabatan.clone()),
        ..Default::default()
    });
    document_signer::Entity::insert_many(rows).exec(conn).await?;

    Ok(())
}

/// A unique violation on the document row can only be the number.
fn number_conflict(err: DbErr) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => AppError::Conflict(NUMBER_TAKEN.to_string()),
        _ => AppError::DatabaseError(err),
    }
}
