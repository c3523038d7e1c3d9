//! `SeaORM` Entity prelude

pub use super::feedback::Entity as Feedback;
pub use super::order_items::Entity as OrderItems;
pub use super::orders::Entity as Orders;
pub use super::print_jobs::Entity as PrintJobs;
pub use super::product_options::Entity as ProductOptions;
pub use super::products::Entity as Products;
pub use super::settings::Entity as Settings;
