use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::config::Config;
use crate::error::AppError;
use crate::services::ingestion::DocumentService;
use crate::services::query::QueryService;
use crate::services::signers::SignerService;
use crate::services::storage::FileStore;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: Arc<Config>,
    pub documents: DocumentService,
    pub signers: SignerService,
    pub queries: QueryService,
    pub document_files: FileStore,
    pub photos: FileStore,
}

impl AppState {
    /// Opens the content directories and wires the services onto `db`.
    pub async fn new(db: DatabaseConnection, config: Config) -> Result<Self, AppError> {
        let document_files = FileStore::open(&config.content_dir, config.io_timeout).await?;
        let photos = FileStore::open(config.photo_dir(), config.io_timeout).await?;
        let base_url = config.public_base_url.clone();

        Ok(Self {
            documents: DocumentService::new(
                db.clone(),
                document_files.clone(),
                config.db_timeout,
                base_url.clone(),
            ),
            signers: SignerService::new(db.clone(), photos.clone(), base_url.clone()),
            queries: QueryService::new(db.clone(), base_url),
            document_files,
            photos,
            config: Arc::new(config),
            db,
        })
    }
}
