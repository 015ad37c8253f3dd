use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(DocumentFiles::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DocumentFiles::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(DocumentFiles::DocumentId).integer().not_null())
                    .col(ColumnDef::new(DocumentFiles::FileName).string().not_null())
                    .col(ColumnDef::new(DocumentFiles::FilePath).string().not_null().unique_key())
                    .col(ColumnDef::new(DocumentFiles::FileType).string().not_null())
                    .col(ColumnDef::new(DocumentFiles::FileSize).big_integer().not_null())
                    .col(ColumnDef::new(DocumentFiles::UploadedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_document_files_document")
                            .from(DocumentFiles::Table, DocumentFiles::DocumentId)
                            .to(Documents::Table, Documents::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_document_files_document_id")
                    .table(DocumentFiles::Table)
                    .col(DocumentFiles::DocumentId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(DocumentFiles::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum DocumentFiles {
    Table,
    Id,
    DocumentId,
    FileName,
    FilePath,
    FileType,
    FileSize,
    UploadedAt,
}

#[derive(DeriveIden)]
enum Documents {
    Table,
    Id,
}
