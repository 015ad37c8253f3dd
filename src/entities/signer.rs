use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Deserialize, Serialize)]
#[sea_orm(table_name = "signers")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub nama: String,
    pub jabatan: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub bio: Option<String>,
    /// Stored name of the photo inside the signer photo directory.
    pub photo: Option<String>,
    /// Links exactly as submitted; normalized on read.
    #[sea_orm(column_type = "Text", nullable)]
    pub links_json: Option<String>,
    pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::document_signer::Entity")]
    DocumentSigner,
}

impl Related<super::document_signer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DocumentSigner.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
