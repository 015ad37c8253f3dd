use axum::{
    extract::{Path, State},
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

use crate::entities::document_file;
use crate::error::AppError;
use crate::services::storage::{content_type_for, is_bare_name};
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/files/{name}",
    params(("name" = String, Path, description = "Stored file name")),
    responses(
        (status = 200, description = "File content", content_type = "application/octet-stream"),
        (status = 400, description = "Invalid file name"),
        (status = 404, description = "File not found")
    ),
    tag = "Files"
)]
pub async fn download_document_file(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Response, AppError> {
    if !is_bare_name(&name) {
        return Err(AppError::BadRequest("Invalid file name".to_string()));
    }

    let record = document_file::Entity::find()
        .filter(document_file::Column::FilePath.eq(&name))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("File not found".to_string()))?;

    let bytes = state.document_files.read(&name).await?;
    Ok(file_response(
        bytes,
        &record.file_type,
        "attachment",
        &record.file_name,
    ))
}

#[utoipa::path(
    get,
    path = "/files/signers/{name}",
    params(("name" = String, Path, description = "Stored photo name")),
    responses(
        (status = 200, description = "Photo content", content_type = "image/*"),
        (status = 400, description = "Invalid file name"),
        (status = 404, description = "Photo not found")
    ),
    tag = "Files"
)]
pub async fn download_signer_photo(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Response, AppError> {
    let bytes = state.photos.read(&name).await?;
    Ok(file_response(bytes, content_type_for(&name), "inline", &name))
}

fn file_response(bytes: Vec<u8>, content_type: &str, disposition: &str, file_name: &str) -> Response {
    let content_type = HeaderValue::from_str(content_type)
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));
    let disposition = HeaderValue::from_str(&format!(
        "{}; filename=\"{}\"",
        disposition,
        header_safe(file_name)
    ))
    .unwrap_or_else(|_| HeaderValue::from_static("attachment"));

    (
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_DISPOSITION, disposition),
            (header::X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff")),
            (
                header::CACHE_CONTROL,
                HeaderValue::from_static("no-cache, must-revalidate"),
            ),
        ],
        bytes,
    )
        .into_response()
}

/// Original names are untrusted display strings; keep them printable ASCII without quotes.
fn header_safe(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            ' '..='~' if c != '"' && c != '\\' => c,
            _ => '_',
        })
        .collect();

    if cleaned.trim().is_empty() {
        "download".to_string()
    } else {
        cleaned
    }
}
