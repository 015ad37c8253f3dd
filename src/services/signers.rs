use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use tracing::info;

use crate::entities::{document_signer, signer};
use crate::error::AppError;
use crate::models::signer::{encode_links, NewSigner, SignerUpdate, SignerView};
use crate::services::storage::{FileStore, IncomingFile, StoreOutcome, UploadPolicy};
use crate::services::{finish, optional, required};

#[derive(Clone)]
pub struct SignerService {
    db: DatabaseConnection,
    photos: FileStore,
    public_base_url: String,
}

impl SignerService {
    pub fn new(db: DatabaseConnection, photos: FileStore, public_base_url: impl Into<String>) -> Self {
        Self {
            db,
            photos,
            public_base_url: public_base_url.into(),
        }
    }

    pub async fn create(&self, input: NewSigner) -> Result<SignerView, AppError> {
        let nama = required(&input.nama, "name required")?;
        let links_json = encode_links(input.links)?;
        let photo = match &input.photo {
            Some(file) => Some(self.store_photo(file).await?),
            None => None,
        };

        let inserted = signer::ActiveModel {
            nama: Set(nama),
            jabatan: Set(optional(input.jabatan)),
            bio: Set(optional(input.bio)),
            photo: Set(photo.clone()),
            links_json: Set(links_json),
            created_at: Set(chrono::Utc::now().naive_utc()),
            ..Default::default()
        }
        .insert(&self.db)
        .await;

        let model = match inserted {
            Ok(model) => model,
            Err(err) => {
                if let Some(photo) = &photo {
                    self.photos.remove(photo).await;
                }
                return Err(err.into());
            }
        };

        info!(id = model.id, nama = %model.nama, "signer created");
        Ok(SignerView::from_model(model, &self.public_base_url))
    }

    /// `None` fields keep their stored value. A new photo replaces the old one,
    /// `remove_photo` clears it; the previous file is deleted after the row is saved.
    pub async fn update(&self, id: i32, input: SignerUpdate) -> Result<SignerView, AppError> {
        let nama = required(&input.nama, "name required")?;
        let links_json = input.links.map(|links| encode_links(Some(links))).transpose()?;

        let existing = signer::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Signer not found".to_string()))?;

        let new_photo = match &input.photo {
            Some(file) => Some(self.store_photo(file).await?),
            None => None,
        };
        let old_photo = existing.photo.clone();

        let mut active: signer::ActiveModel = existing.into();
        active.nama = Set(nama);
        if let Some(jabatan) = input.jabatan {
            active.jabatan = Set(optional(Some(jabatan)));
        }
        if let Some(bio) = input.bio {
            active.bio = Set(optional(Some(bio)));
        }
        if let Some(links_json) = links_json {
            active.links_json = Set(links_json);
        }
        if new_photo.is_some() {
            active.photo = Set(new_photo.clone());
        } else if input.remove_photo {
            active.photo = Set(None);
        }

        let model = match active.update(&self.db).await {
            Ok(model) => model,
            Err(err) => {
                if let Some(photo) = &new_photo {
                    self.photos.remove(photo).await;
                }
                return Err(err.into());
            }
        };

        if let Some(old) = old_photo.filter(|old| model.photo.as_ref() != Some(old)) {
            self.photos.remove(&old).await;
        }

        info!(id, nama = %model.nama, "signer updated");
        Ok(SignerView::from_model(model, &self.public_base_url))
    }

    /// Deletes the signer and every association to it, then its photo.
    pub async fn delete(&self, id: i32) -> Result<(), AppError> {
        let txn = self.db.begin().await?;

        let result = async {
            let existing = signer::Entity::find_by_id(id)
                .one(&txn)
                .await?
                .ok_or_else(|| AppError::NotFound("Signer not found".to_string()))?;

            let detached = document_signer::Entity::delete_many()
                .filter(document_signer::Column::SignerId.eq(id))
                .exec(&txn)
                .await?;
            signer::Entity::delete_by_id(id).exec(&txn).await?;

            Ok::<_, AppError>((existing, detached.rows_affected))
        }
        .await;

        let (existing, detached) = finish(txn, result).await?;
        if let Some(photo) = &existing.photo {
            self.photos.remove(photo).await;
        }

        info!(id, nama = %existing.nama, detached, "signer deleted");
        Ok(())
    }

    async fn store_photo(&self, file: &IncomingFile) -> Result<String, AppError> {
        match self.photos.store(file, &UploadPolicy::PHOTOS, 0).await? {
            StoreOutcome::Stored(stored) => Ok(stored.stored_name),
            StoreOutcome::Rejected(reason) => Err(AppError::Validation(format!("photo rejected: {}", reason))),
        }
    }
}
