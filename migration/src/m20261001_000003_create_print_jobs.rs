//! Migration to create the print_jobs table (kitchen fulfilment queue)

use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PrintJobs::Table)
                    .if_not_exists()
                    .col(string(PrintJobs::Id).primary_key())
                    .col(string(PrintJobs::OrderId).not_null())
                    .col(text(PrintJobs::PayloadText).not_null())
                    .col(string(PrintJobs::Status).not_null())
                    .col(timestamp_with_time_zone(PrintJobs::CreatedAt).default(Expr::current_timestamp()))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_print_jobs_order_id")
                            .from(PrintJobs::Table, PrintJobs::OrderId)
                            .to(Orders::Table, Orders::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // At most one fulfilment job per order
        manager
            .create_index(
                Index::create()
                    .name("idx_print_jobs_order_id")
                    .table(PrintJobs::Table)
                    .col(PrintJobs::OrderId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_print_jobs_status")
                    .table(PrintJobs::Table)
                    .col(PrintJobs::Status)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PrintJobs::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum PrintJobs {
    Table,
    Id,
    OrderId,
    PayloadText,
    Status,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Orders {
    Table,
    Id,
}
