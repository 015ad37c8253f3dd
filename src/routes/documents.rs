use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::Json,
};

use crate::error::AppError;
use crate::models::document::{DocumentUpdate, DocumentView, NewDocument};
use crate::pagination::Pagination;
use crate::routes::form::FormData;
use crate::routes::response::{ApiResponse, ErrorResponse, MessageResponse};
use crate::state::AppState;

const DOCUMENT_FILES: &[&str] = &["files", "file"];

#[utoipa::path(
    get,
    path = "/documents",
    params(Pagination),
    responses(
        (status = 200, description = "Documents, newest first", body = ApiResponse<Vec<DocumentView>>),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Documents"
)]
pub async fn list_documents(
    State(state): State<AppState>,
    Query(pagination): Query<Pagination>,
) -> Result<Json<ApiResponse<Vec<DocumentView>>>, AppError> {
    let documents = state.queries.list_documents(&pagination).await?;
    Ok(ApiResponse::ok(documents))
}

#[utoipa::path(
    get,
    path = "/documents/{id}",
    params(("id" = i32, Path, description = "Document ID")),
    responses(
        (status = 200, description = "Document with signers and files", body = ApiResponse<DocumentView>),
        (status = 404, description = "Document not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Documents"
)]
pub async fn get_document(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<DocumentView>>, AppError> {
    let document = state.queries.get_document(id).await?;
    Ok(ApiResponse::ok(document))
}

#[utoipa::path(
    post,
    path = "/documents",
    request_body(content = Vec<u8>, content_type = "multipart/form-data",
        description = "nomor_dokumen, judul, signers (repeatable), signer_roles (JSON object), files (repeatable)"),
    responses(
        (status = 201, description = "Document created", body = ApiResponse<DocumentView>),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 409, description = "Document number already exists", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Documents"
)]
pub async fn create_document(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<DocumentView>>), AppError> {
    let mut form = FormData::collect(multipart).await?;

    let input = NewDocument {
        number: form.text("nomor_dokumen").unwrap_or_default().to_string(),
        title: form.text("judul").unwrap_or_default().to_string(),
        signers: form.signer_selection()?.unwrap_or_default(),
        files: form.take_files(DOCUMENT_FILES),
    };

    let document = state.documents.create(input).await?;
    Ok((
        StatusCode::CREATED,
        ApiResponse::with_message("Document created", document),
    ))
}

#[utoipa::path(
    put,
    path = "/documents/{id}",
    params(("id" = i32, Path, description = "Document ID")),
    request_body(content = Vec<u8>, content_type = "multipart/form-data",
        description = "nomor_dokumen, judul, optional signers (replaces the set), signer_roles, files (appended)"),
    responses(
        (status = 200, description = "Document updated", body = ApiResponse<DocumentView>),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 404, description = "Document not found", body = ErrorResponse),
        (status = 409, description = "Document number already exists", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Documents"
)]
pub async fn update_document(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    multipart: Multipart,
) -> Result<Json<ApiResponse<DocumentView>>, AppError> {
    let mut form = FormData::collect(multipart).await?;

    let input = DocumentUpdate {
        number: form.text("nomor_dokumen").unwrap_or_default().to_string(),
        title: form.text("judul").unwrap_or_default().to_string(),
        signers: form.signer_selection()?,
        files: form.take_files(DOCUMENT_FILES),
    };

    let document = state.documents.update(id, input).await?;
    Ok(ApiResponse::with_message("Document updated", document))
}

#[utoipa::path(
    delete,
    path = "/documents/{id}",
    params(("id" = i32, Path, description = "Document ID")),
    responses(
        (status = 200, description = "Document, associations and files deleted", body = MessageResponse),
        (status = 404, description = "Document not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Documents"
)]
pub async fn delete_document(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<MessageResponse>, AppError> {
    state.documents.delete(id).await?;
    Ok(MessageResponse::ok("Document deleted"))
}

#[utoipa::path(
    delete,
    path = "/documents/{id}/files/{file_id}",
    params(
        ("id" = i32, Path, description = "Document ID"),
        ("file_id" = i32, Path, description = "File ID")
    ),
    responses(
        (status = 200, description = "File removed", body = MessageResponse),
        (status = 404, description = "File not found on this document", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Documents"
)]
pub async fn remove_document_file(
    State(state): State<AppState>,
    Path((id, file_id)): Path<(i32, i32)>,
) -> Result<Json<MessageResponse>, AppError> {
    state.documents.remove_file(id, file_id).await?;
    Ok(MessageResponse::ok("File removed"))
}
