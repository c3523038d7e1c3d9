//! Migration to create the product_options table (choice groups per product)

use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ProductOptions::Table)
                    .if_not_exists()
                    .col(pk_auto(ProductOptions::Id))
                    .col(string(ProductOptions::ProductId).not_null())
                    .col(integer(ProductOptions::Position).not_null())
                    .col(string(ProductOptions::Name).not_null())
                    .col(text(ProductOptions::Choices).not_null())
                    .col(boolean(ProductOptions::AllowMulti).default(false))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_product_options_product_id")
                            .from(ProductOptions::Table, ProductOptions::ProductId)
                            .to(Products::Table, Products::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_product_options_product_id")
                    .table(ProductOptions::Table)
                    .col(ProductOptions::ProductId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ProductOptions::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ProductOptions {
    Table,
    Id,
    ProductId,
    Position,
    Name,
    Choices,
    AllowMulti,
}

#[derive(DeriveIden)]
enum Products {
    Table,
    Id,
}
