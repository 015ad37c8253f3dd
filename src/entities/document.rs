use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Deserialize, Serialize)]
#[sea_orm(table_name = "documents")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub nomor_dokumen: String,
    /// Trimmed, lower-cased `nomor_dokumen`. Uniqueness is enforced on this column.
    #[sea_orm(unique)]
    pub nomor_key: String,
    pub judul: String,
    pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::document_signer::Entity")]
    DocumentSigner,
    #[sea_orm(has_many = "super::document_file::Entity")]
    DocumentFile,
}

impl Related<super::document_signer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DocumentSigner.def()
    }
}

impl Related<super::document_file::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DocumentFile.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Key used for uniqueness and verification lookups.
pub fn number_key(number: &str) -> String {
    number.trim().to_lowercase()
}
