use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Signers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Signers::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Signers::Nama).string().not_null())
                    .col(ColumnDef::new(Signers::Jabatan).string())
                    .col(ColumnDef::new(Signers::Bio).text())
                    .col(ColumnDef::new(Signers::Photo).string())
                    .col(ColumnDef::new(Signers::LinksJson).text())
                    .col(ColumnDef::new(Signers::CreatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_signers_nama")
                    .table(Signers::Table)
                    .col(Signers::Nama)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Signers::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Signers {
    Table,
    Id,
    Nama,
    Jabatan,
    Bio,
    Photo,
    LinksJson,
    CreatedAt,
}
