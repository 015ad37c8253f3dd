#![allow(dead_code)]

use std::time::Duration;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
    Argon2,
};
use axum::{
    body::Body,
    http::{header, Request},
    Router,
};
use doc_verifier::entities::{signer, user};
use doc_verifier::middleware::auth::issue_access_token;
use doc_verifier::services::storage::IncomingFile;
use doc_verifier::{create_routes, AppState, Config};
use migration::{Migrator, MigratorTrait};
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, Set};
use tempfile::TempDir;

pub const JWT_SECRET: &str = "test-secret";
pub const BASE_URL: &str = "http://verify.test";
pub const PDF: &[u8] = b"%PDF-1.4\n1 0 obj\n<<>>\nendobj\n%%EOF";
pub const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0x0D];

pub struct TestApp {
    pub state: AppState,
    pub content: TempDir,
    /// Holds the database file for apps built by [`setup_shared`].
    database: Option<TempDir>,
}

/// One in-memory SQLite connection, so the database lives as long as the pool
/// and concurrent transactions queue for it.
pub async fn connect() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(30))
        .sqlx_logging(false);

    let db = Database::connect(options).await.expect("connect sqlite");
    Migrator::up(&db, None).await.expect("run migrations");
    db
}

pub async fn setup() -> TestApp {
    setup_with(|_| {}).await
}

/// Like [`setup`], with `adjust` applied to the config before the state is built.
pub async fn setup_with(adjust: impl FnOnce(&mut Config)) -> TestApp {
    let db = connect().await;
    build(db, None, adjust).await
}

/// A file-backed database behind a pool of several connections, so
/// transactions really overlap.
pub async fn setup_shared() -> TestApp {
    let database = tempfile::tempdir().expect("tempdir");
    let url = format!("sqlite://{}?mode=rwc", database.path().join("app.db").display());

    let mut options = ConnectOptions::new(url);
    options
        .max_connections(4)
        .acquire_timeout(Duration::from_secs(30))
        .sqlx_logging(false);

    let db = Database::connect(options).await.expect("connect sqlite file");
    Migrator::up(&db, None).await.expect("run migrations");
    build(db, Some(database), |_| {}).await
}

async fn build(
    db: DatabaseConnection,
    database: Option<TempDir>,
    adjust: impl FnOnce(&mut Config),
) -> TestApp {
    let content = tempfile::tempdir().expect("tempdir");

    let mut config = Config::new("sqlite::memory:", JWT_SECRET);
    config.content_dir = content.path().to_path_buf();
    config.public_base_url = BASE_URL.to_string();
    config.io_timeout = Duration::from_secs(5);
    config.db_timeout = Duration::from_secs(10);
    adjust(&mut config);

    let state = AppState::new(db, config).await.expect("state");
    TestApp {
        state,
        content,
        database,
    }
}

impl TestApp {
    pub fn db(&self) -> &DatabaseConnection {
        &self.state.db
    }

    pub fn router(&self) -> Router {
        create_routes(self.state.clone())
    }

    /// Regular files directly in the document content directory.
    pub fn stored_files(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(self.content.path())
            .expect("read content dir")
            .filter_map(Result::ok)
            .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    /// Waits for writes still running on the blocking pool to clean up after
    /// themselves, then lists what is left.
    pub async fn settled_files(&self) -> Vec<String> {
        for _ in 0..200 {
            let files = self.stored_files();
            if files.is_empty() {
                return files;
            }
            tokio::time::sleep(Duration::from_millis(25)).await;
        }
        self.stored_files()
    }

    pub fn stored_photos(&self) -> Vec<String> {
        std::fs::read_dir(self.content.path().join("signers"))
            .expect("read photo dir")
            .filter_map(Result::ok)
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect()
    }

    pub async fn seed_signer(&self, nama: &str) -> signer::Model {
        self.seed_signer_with(nama, None, None).await
    }

    pub async fn seed_signer_with(
        &self,
        nama: &str,
        jabatan: Option<&str>,
        links_json: Option<&str>,
    ) -> signer::Model {
        signer::ActiveModel {
            nama: Set(nama.to_string()),
            jabatan: Set(jabatan.map(str::to_string)),
            bio: Set(None),
            photo: Set(None),
            links_json: Set(links_json.map(str::to_string)),
            created_at: Set(chrono::Utc::now().naive_utc()),
            ..Default::default()
        }
        .insert(self.db())
        .await
        .expect("seed signer")
    }

    pub async fn seed_admin(&self, username: &str, password: &str) -> user::Model {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .expect("hash")
            .to_string();

        user::ActiveModel {
            username: Set(username.to_string()),
            password: Set(hash),
            created_at: Set(chrono::Utc::now().naive_utc()),
            ..Default::default()
        }
        .insert(self.db())
        .await
        .expect("seed admin")
    }

    pub async fn admin_token(&self) -> String {
        let admin = self.seed_admin("admin", "correct horse").await;
        issue_access_token(JWT_SECRET, &admin).expect("token")
    }
}

pub fn pdf(name: &str) -> IncomingFile {
    IncomingFile::new(name, PDF)
}

/// Hand-built multipart body.
pub struct MultipartBody {
    boundary: &'static str,
    body: Vec<u8>,
}

impl MultipartBody {
    pub fn new() -> Self {
        Self {
            boundary: "----docverifierboundary",
            body: Vec::new(),
        }
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                self.boundary, name, value
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, file_name: &str, bytes: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                self.boundary, name, file_name
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(bytes);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    pub fn request(mut self, method: &str, uri: &str, token: Option<&str>) -> Request<Body> {
        self.body
            .extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());

        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", self.boundary),
            );
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        builder.body(Body::from(self.body)).expect("request")
    }
}

pub fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    bare("GET", uri, token)
}

pub fn bare(method: &str, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).expect("request")
}

pub fn json(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

pub async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body")
        .to_vec()
}

pub async fn body_json(response: axum::response::Response) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).expect("json body")
}
