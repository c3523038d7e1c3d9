//! Migration to create the products table (the menu catalog)

use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Products::Table)
                    .if_not_exists()
                    .col(string(Products::Id).primary_key())
                    .col(string(Products::Name).not_null())
                    .col(string(Products::Category).not_null())
                    .col(string_null(Products::Topic))
                    .col(big_integer(Products::PriceCents).not_null())
                    .col(text_null(Products::Description))
                    .col(string_null(Products::Allergens))
                    .col(boolean(Products::IsAvailable).default(true))
                    .col(timestamp_with_time_zone(Products::CreatedAt).default(Expr::current_timestamp()))
                    .to_owned(),
            )
            .await?;

        // Menu listing groups available products by category
        manager
            .create_index(
                Index::create()
                    .name("idx_products_category")
                    .table(Products::Table)
                    .col(Products::Category)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Products::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Products {
    Table,
    Id,
    Name,
    Category,
    Topic,
    PriceCents,
    Description,
    Allergens,
    IsAvailable,
    CreatedAt,
}
