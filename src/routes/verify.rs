use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::error::AppError;
use crate::models::document::DocumentView;
use crate::routes::response::ErrorResponse;
use crate::state::AppState;

#[derive(Deserialize, IntoParams)]
pub struct VerifyQuery {
    /// Document number; surrounding whitespace and case are ignored.
    pub nomor_dokumen: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct VerifyResponse {
    pub success: bool,
    pub found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document: Option<DocumentView>,
}

#[utoipa::path(
    get,
    path = "/verify",
    params(VerifyQuery),
    responses(
        (status = 200, description = "Document is authentic", body = VerifyResponse),
        (status = 400, description = "Missing document number", body = ErrorResponse),
        (status = 404, description = "No document with this number", body = VerifyResponse)
    ),
    tag = "Verification"
)]
pub async fn verify(
    State(state): State<AppState>,
    Query(query): Query<VerifyQuery>,
) -> Result<(StatusCode, Json<VerifyResponse>), AppError> {
    let number = query.nomor_dokumen.unwrap_or_default();
    if number.trim().is_empty() {
        return Err(AppError::BadRequest("nomor_dokumen is required".to_string()));
    }

    let response = match state.queries.verify_by_number(&number).await? {
        Some(document) => (
            StatusCode::OK,
            VerifyResponse {
                success: true,
                found: true,
                message: None,
                document: Some(document),
            },
        ),
        None => (
            StatusCode::NOT_FOUND,
            VerifyResponse {
                success: false,
                found: false,
                message: Some("Document not found".to_string()),
                document: None,
            },
        ),
    };

    Ok((response.0, Json(response.1)))
}
