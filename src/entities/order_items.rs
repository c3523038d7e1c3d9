//! SeaORM Entity for order_items table
//!
//! Name, price and topic are snapshots taken when the order was placed and
//! are never updated afterwards.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "order_items")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub order_id: String,
    /// Position within the order, starting at 0
    pub position: i32,
    /// Source product; may point at a product that no longer exists
    pub product_id: Option<String>,
    pub name_snapshot: String,
    pub price_cents_snapshot: i64,
    pub qty: i32,
    pub topic_snapshot: Option<String>,
    /// Free-text summary of chosen variants/add-ons
    pub selected_options: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::orders::Entity",
        from = "Column::OrderId",
        to = "super::orders::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Order,
}

impl Related<super::orders::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Order.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
