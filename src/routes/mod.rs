mod auth;
mod documents;
mod files;
pub mod form;
mod home;
pub mod response;
mod signers;
mod verify;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::middleware::auth::auth_middleware;
use crate::models::document::{DocumentSignerView, DocumentView, FileView};
use crate::models::signer::{LinkItem, SignerView};
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(
        home::root,
        verify::verify,
        signers::list_signers,
        signers::get_signer,
        files::download_document_file,
        files::download_signer_photo,
        auth::login,
        auth::refresh,
        auth::logout,
        auth::me,
        documents::list_documents,
        documents::get_document,
        documents::create_document,
        documents::update_document,
        documents::delete_document,
        documents::remove_document_file,
        signers::create_signer,
        signers::update_signer,
        signers::delete_signer,
    ),
    components(
        schemas(
            auth::LoginRequest,
            auth::LoginResponse,
            auth::RefreshRequest,
            auth::RefreshResponse,
            auth::UserProfile,
            verify::VerifyResponse,
            response::MessageResponse,
            response::ErrorResponse,
            DocumentView,
            DocumentSignerView,
            FileView,
            SignerView,
            LinkItem,
        )
    ),
    tags(
        (name = "General", description = "Service information"),
        (name = "Verification", description = "Public document verification by number"),
        (name = "Files", description = "Download of document files and signer photos"),
        (name = "Authentication", description = "Login, token refresh and logout"),
        (name = "Documents", description = "Document management (admin)"),
        (name = "Signers", description = "Signer lookup (public) and management (admin)")
    ),
    info(
        title = "Document Verification API",
        version = "0.1.0",
        description = "Publishes official documents with their signers and lets anyone verify a document by its number",
    ),
    modifiers(&SecurityAddon)
)]
struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            utoipa::openapi::security::SecurityScheme::Http(
                utoipa::openapi::security::Http::new(
                    utoipa::openapi::security::HttpAuthScheme::Bearer,
                ),
            ),
        );
    }
}

pub fn create_routes(state: AppState) -> Router {
    let swagger_router: Router = SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
        .into();

    // Admin routes, bearer token required
    let protected_routes = Router::new()
        .route("/auth/me", get(auth::me))
        .route(
            "/documents",
            get(documents::list_documents).post(documents::create_document),
        )
        .route(
            "/documents/{id}",
            get(documents::get_document)
                .put(documents::update_document)
                .delete(documents::delete_document),
        )
        .route(
            "/documents/{id}/files/{file_id}",
            delete(documents::remove_document_file),
        )
        .route("/signers", post(signers::create_signer))
        .route(
            "/signers/{id}",
            put(signers::update_signer).delete(signers::delete_signer),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let public_routes = Router::new()
        .route("/", get(home::root))
        .route("/verify", get(verify::verify))
        .route("/signers", get(signers::list_signers))
        .route("/signers/{id}", get(signers::get_signer))
        .route("/files/{name}", get(files::download_document_file))
        .route("/files/signers/{name}", get(files::download_signer_photo))
        .route("/auth/login", post(auth::login))
        .route("/auth/refresh", post(auth::refresh))
        .route("/auth/logout", post(auth::logout));

    let max_request_bytes = state.config.max_request_bytes;
    let app_routes = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state);

    Router::new()
        .merge(swagger_router)
        .merge(app_routes)
        .layer(DefaultBodyLimit::max(max_request_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
