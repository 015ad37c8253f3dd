use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(DocumentSigners::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DocumentSigners::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(DocumentSigners::DocumentId).integer().not_null())
                    .col(ColumnDef::new(DocumentSigners::SignerId).integer().not_null())
                    .col(ColumnDef::new(DocumentSigners::Jabatan).string())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_document_signers_document")
                            .from(DocumentSigners::Table, DocumentSigners::DocumentId)
                            .to(Documents::Table, Documents::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_document_signers_signer")
                            .from(DocumentSigners::Table, DocumentSigners::SignerId)
                            .to(Signers::Table, Signers::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_document_signers_pair")
                    .table(DocumentSigners::Table)
                    .col(DocumentSigners::DocumentId)
                    .col(DocumentSigners::SignerId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(DocumentSigners::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum DocumentSigners {
    Table,
    Id,
    DocumentId,
    SignerId,
    Jabatan,
}

#[derive(DeriveIden)]
enum Documents {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Signers {
    Table,
    Id,
}
