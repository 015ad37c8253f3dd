use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Deserialize, Serialize)]
#[sea_orm(table_name = "document_signers")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub document_id: i32,
    pub signer_id: i32,
    /// Role shown for this signer on this document only.
    pub jabatan: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::document::Entity",
        from = "Column::DocumentId",
        to = "super::document::Column::Id",
        on_delete = "Cascade"
    )]
    Document,
    #[sea_orm(
        belongs_to = "super::signer::Entity",
        from = "Column::SignerId",
        to = "super::signer::Column::Id",
        on_delete = "Cascade"
    )]
    Signer,
}

impl Related<super::document::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Document.def()
    }
}

impl Related<super::signer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Signer.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
