//! `SeaORM` Entity for settings table
//!
//! Singleton: the only row has id 1 and is provisioned by migration.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "settings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i32,
    pub order_start_time: String,
    pub order_end_time: String,
    pub pickup_start_time: String,
    pub pickup_end_time: String,
    pub ordering_enabled: bool,
    pub pickup_time_required: bool,
    pub lifetime_revenue_cents: i64,
    pub period_revenue_cents: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
