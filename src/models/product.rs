//! Product catalog request/response models

use serde::{Deserialize, Serialize};

use crate::entities::{product_options, products};
use crate::models::order::format_minor_units;

/// Max product name length
pub const MAX_PRODUCT_NAME_LENGTH: usize = 80;

/// Products in this category get a drink choice built from the drinks category
pub const MENU_CATEGORY: &str = "Menu";
pub const DRINKS_CATEGORY: &str = "Bevande";
pub const DRINK_OPTION_NAME: &str = "Bevanda";

/// A product with its choice groups, in display order
#[derive(Debug, Clone, PartialEq)]
pub struct ProductWithOptions {
    pub product: products::Model,
    pub options: Vec<product_options::Model>,
}

/// One choice group in a product request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductOptionRequest {
    pub name: String,
    pub choices: Vec<String>,
    #[serde(default)]
    pub allow_multi: bool,
}

impl ProductOptionRequest {
    fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Option name cannot be empty".to_string());
        }
        if self.choices.is_empty() {
            return Err(format!("Option {} needs at least one choice", self.name.trim()));
        }
        for choice in &self.choices {
            if choice.trim().is_empty() || choice.contains(',') {
                return Err(format!(
                    "Invalid choice in option {}: {:?}",
                    self.name.trim(),
                    choice
                ));
            }
        }
        Ok(())
    }
}

/// Request body for creating or replacing a product
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductRequest {
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub topic: Option<String>,
    pub price_cents: i64,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub allergens: Option<String>,
    #[serde(default = "default_available")]
    pub is_available: bool,
    /// Replaces every existing choice group
    #[serde(default)]
    pub options: Vec<ProductOptionRequest>,
}

fn default_available() -> bool {
    true
}

impl ProductRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Product name cannot be empty".to_string());
        }
        if self.name.chars().count() > MAX_PRODUCT_NAME_LENGTH {
            return Err(format!(
                "Product name cannot exceed {} characters",
                MAX_PRODUCT_NAME_LENGTH
            ));
        }
        if self.category.trim().is_empty() {
            return Err("Category cannot be empty".to_string());
        }
        if self.price_cents < 0 {
            return Err("price_cents cannot be negative".to_string());
        }
        self.options.iter().try_for_each(ProductOptionRequest::validate)
    }
}

/// Request body for POST /api/staff/products/{id}/availability
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityRequest {
    pub is_available: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductOptionView {
    pub name: String,
    pub choices: Vec<String>,
    pub allow_multi: bool,
}

impl From<product_options::Model> for ProductOptionView {
    fn from(model: product_options::Model) -> Self {
        Self {
            choices: split_choices(&model.choices),
            name: model.name,
            allow_multi: model.allow_multi,
        }
    }
}

/// Stored form is comma-separated
pub fn join_choices(choices: &[String]) -> String {
    choices
        .iter()
        .map(|c| c.trim())
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn split_choices(stored: &str) -> Vec<String> {
    stored
        .split(',')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductResponse {
    pub id: String,
    pub name: String,
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    pub price_cents: i64,
    /// Display amount, e.g. "1.50"
    pub price: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allergens: Option<String>,
    pub is_available: bool,
    pub options: Vec<ProductOptionView>,
}

impl From<ProductWithOptions> for ProductResponse {
    fn from(ProductWithOptions { product: model, options }: ProductWithOptions) -> Self {
        Self {
            price: format_minor_units(model.price_cents),
            id: model.id,
            name: model.name,
            category: model.category,
            topic: model.topic,
            price_cents: model.price_cents,
            description: model.description,
            allergens: model.allergens,
            is_available: model.is_available,
            options: options.into_iter().map(ProductOptionView::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuCategory {
    pub name: String,
    pub products: Vec<ProductResponse>,
}

/// Response for GET /api/menu
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuResponse {
    pub categories: Vec<MenuCategory>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductListResponse {
    pub products: Vec<ProductResponse>,
}
