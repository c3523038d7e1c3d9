//! SeaORM Entity for products table
//!
//! The authoritative menu catalog. Orders never read prices from anywhere else.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub category: String,
    /// Optional sub-category printed next to the item on kitchen tickets
    pub topic: Option<String>,
    /// Unit price in minor currency units
    pub price_cents: i64,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub allergens: Option<String>,
    pub is_available: bool,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::product_options::Entity")]
    Options,
}

impl Related<super::product_options::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Options.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
