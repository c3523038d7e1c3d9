//! SeaORM Entity for orders table

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub customer_name: String,
    pub customer_class: String,
    pub note: Option<String>,
    /// Requested pickup time of day, `HH:MM`
    pub pickup_time: Option<String>,
    /// Sum of snapshot price x quantity over the line items, minor units
    pub total_cents: i64,
    /// Four-digit code, unique per `order_day` among non-cancelled orders
    pub pickup_code: String,
    /// See `models::order::OrderStatus`
    pub status: String,
    /// Local calendar day the order was placed on
    pub order_day: Date,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::order_items::Entity")]
    OrderItems,
    #[sea_orm(has_one = "super::print_jobs::Entity")]
    PrintJob,
}

impl Related<super::order_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItems.def()
    }
}

impl Related<super::print_jobs::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PrintJob.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
