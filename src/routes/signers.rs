use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::Json,
};

use crate::error::AppError;
use crate::models::signer::{NewSigner, SignerUpdate, SignerView};
use crate::routes::form::FormData;
use crate::routes::response::{ApiResponse, ErrorResponse, MessageResponse};
use crate::state::AppState;

const PHOTO_FIELDS: &[&str] = &["photo", "foto"];

#[utoipa::path(
    get,
    path = "/signers",
    responses(
        (status = 200, description = "All signers ordered by name", body = ApiResponse<Vec<SignerView>>)
    ),
    tag = "Signers"
)]
pub async fn list_signers(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<SignerView>>>, AppError> {
    Ok(ApiResponse::ok(state.queries.list_signers().await?))
}

#[utoipa::path(
    get,
    path = "/signers/{id}",
    params(("id" = String, Path, description = "Numeric signer ID or exact name")),
    responses(
        (status = 200, description = "Signer", body = ApiResponse<SignerView>),
        (status = 404, description = "Signer not found", body = ErrorResponse)
    ),
    tag = "Signers"
)]
pub async fn get_signer(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<ApiResponse<SignerView>>, AppError> {
    Ok(ApiResponse::ok(state.queries.get_signer(&key).await?))
}

#[utoipa::path(
    post,
    path = "/signers",
    request_body(content = Vec<u8>, content_type = "multipart/form-data",
        description = "nama, jabatan, bio, links (JSON array or repeated links[]), photo/foto"),
    responses(
        (status = 201, description = "Signer created", body = ApiResponse<SignerView>),
        (status = 400, description = "Validation failed", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Signers"
)]
pub async fn create_signer(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<SignerView>>), AppError> {
    let mut form = FormData::collect(multipart).await?;

    let input = NewSigner {
        nama: form.text("nama").unwrap_or_default().to_string(),
        jabatan: form.text("jabatan").map(str::to_string),
        bio: form.text("bio").map(str::to_string),
        links: form.links(),
        photo: form.take_file(PHOTO_FIELDS),
    };

    let signer = state.signers.create(input).await?;
    Ok((
        StatusCode::CREATED,
        ApiResponse::with_message("Signer created", signer),
    ))
}

#[utoipa::path(
    put,
    path = "/signers/{id}",
    params(("id" = i32, Path, description = "Signer ID")),
    request_body(content = Vec<u8>, content_type = "multipart/form-data",
        description = "nama, jabatan, bio, links, photo/foto, remove_photo; omitted fields stay unchanged"),
    responses(
        (status = 200, description = "Signer updated", body = ApiResponse<SignerView>),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 404, description = "Signer not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Signers"
)]
pub async fn update_signer(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    multipart: Multipart,
) -> Result<Json<ApiResponse<SignerView>>, AppError> {
    let mut form = FormData::collect(multipart).await?;

    let input = SignerUpdate {
        nama: form.text("nama").unwrap_or_default().to_string(),
        jabatan: form.text("jabatan").map(str::to_string),
        bio: form.text("bio").map(str::to_string),
        links: form.links(),
        remove_photo: form.flag("remove_photo"),
        photo: form.take_file(PHOTO_FIELDS),
    };

    let signer = state.signers.update(id, input).await?;
    Ok(ApiResponse::with_message("Signer updated", signer))
}

#[utoipa::path(
    delete,
    path = "/signers/{id}",
    params(("id" = i32, Path, description = "Signer ID")),
    responses(
        (status = 200, description = "Signer and its document associations deleted", body = MessageResponse),
        (status = 404, description = "Signer not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Signers"
)]
pub async fn delete_signer(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<MessageResponse>, AppError> {
    state.signers.delete(id).await?;
    Ok(MessageResponse::ok("Signer deleted"))
}
