//! Migration to create the settings singleton and provision its only row

use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Settings::Table)
                    .if_not_exists()
                    .col(integer(Settings::Id).primary_key())
                    .col(string(Settings::OrderStartTime).not_null())
                    .col(string(Settings::OrderEndTime).not_null())
                    .col(string(Settings::PickupStartTime).not_null())
                    .col(string(Settings::PickupEndTime).not_null())
                    .col(boolean(Settings::OrderingEnabled).default(true))
                    .col(boolean(Settings::PickupTimeRequired).default(false))
                    .col(big_integer(Settings::LifetimeRevenueCents).default(0))
                    .col(big_integer(Settings::PeriodRevenueCents).default(0))
                    .to_owned(),
            )
            .await?;

        let seed = Query::insert()
            .into_table(Settings::Table)
            .columns([
                Settings::Id,
                Settings::OrderStartTime,
                Settings::OrderEndTime,
                Settings::PickupStartTime,
                Settings::PickupEndTime,
                Settings::OrderingEnabled,
                Settings::PickupTimeRequired,
                Settings::LifetimeRevenueCents,
                Settings::PeriodRevenueCents,
            ])
            .values_panic([
                1.into(),
                "00:00".into(),
                "10:00".into(),
                "12:00".into(),
                "14:00".into(),
                true.into(),
                false.into(),
                0i64.into(),
                0i64.into(),
            ])
            .to_owned();

        manager.exec_stmt(seed).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Settings::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Settings {
    Table,
    Id,
    OrderStartTime,
    OrderEndTime,
    PickupStartTime,
    PickupEndTime,
    OrderingEnabled,
    PickupTimeRequired,
    LifetimeRevenueCents,
    PeriodRevenueCents,
}
