//! Migration to create the orders and order_items tables
//!
//! Pickup codes are unique per calendar day among orders that are not
//! cancelled. The partial index enforces this at insert time, underneath
//! the allocator's own lookup.

use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Orders::Table)
                    .if_not_exists()
                    .col(string(Orders::Id).primary_key())
                    .col(string(Orders::CustomerName).not_null())
                    .col(string(Orders::CustomerClass).not_null())
                    .col(string_null(Orders::Note))
                    .col(string_null(Orders::PickupTime))
                    .col(big_integer(Orders::TotalCents).not_null())
                    .col(string_len(Orders::PickupCode, 4).not_null())
                    .col(string(Orders::Status).not_null())
                    .col(date(Orders::OrderDay).not_null())
                    .col(timestamp_with_time_zone(Orders::CreatedAt).default(Expr::current_timestamp()))
                    .col(timestamp_with_time_zone(Orders::UpdatedAt).default(Expr::current_timestamp()))
                    .to_owned(),
            )
            .await?;

        // Dashboard filters by status
        manager
            .create_index(
                Index::create()
                    .name("idx_orders_status")
                    .table(Orders::Table)
                    .col(Orders::Status)
                    .to_owned(),
            )
            .await?;

        // Partial unique index: Postgres and SQLite share this syntax
        manager
            .get_connection()
            .execute_unprepared(
                "CREATE UNIQUE INDEX IF NOT EXISTS idx_orders_day_pickup_code_active \
                 ON orders (order_day, pickup_code) WHERE status <> 'cancelled'",
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(OrderItems::Table)
                    .if_not_exists()
                    .col(pk_auto(OrderItems::Id))
                    .col(string(OrderItems::OrderId).not_null())
                    .col(integer(OrderItems::Position).not_null())
                    .col(string_null(OrderItems::ProductId))
                    .col(string(OrderItems::NameSnapshot).not_null())
                    .col(big_integer(OrderItems::PriceCentsSnapshot).not_null())
                    .col(integer(OrderItems::Qty).not_null())
                    .col(string_null(OrderItems::TopicSnapshot))
                    .col(string_null(OrderItems::SelectedOptions))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_order_items_order_id")
                            .from(OrderItems::Table, OrderItems::OrderId)
                            .to(Orders::Table, Orders::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_order_items_order_id")
                    .table(OrderItems::Table)
                    .col(OrderItems::OrderId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(OrderItems::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Orders::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Orders {
    Table,
    Id,
    CustomerName,
    CustomerClass,
    Note,
    PickupTime,
    TotalCents,
    PickupCode,
    Status,
    OrderDay,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum OrderItems {
    Table,
    Id,
    OrderId,
    Position,
    ProductId,
    NameSnapshot,
    PriceCentsSnapshot,
    Qty,
    TopicSnapshot,
    SelectedOptions,
}
