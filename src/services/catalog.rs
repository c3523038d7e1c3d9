//! Product catalog
//!
//! Order lines snapshot name and price at creation, so edits and deletes
//! here never reach into existing orders.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, FixedOffset};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use tracing::{debug, info};

use crate::entities::{
    prelude::{ProductOptions, Products},
    product_options, products,
};
use crate::error::{OrderError, OrderResult};
use crate::models::order::non_blank;
use crate::models::product::{
    join_choices, MenuCategory, ProductOptionRequest, ProductRequest, ProductResponse,
    ProductWithOptions, DRINKS_CATEGORY, DRINK_OPTION_NAME, MENU_CATEGORY,
};

/// Available products grouped by category, categories and names sorted
pub async fn list_menu(db: &DatabaseConnection) -> OrderResult<Vec<MenuCategory>> {
    let products = Products::find()
        .filter(products::Column::IsAvailable.eq(true))
        .order_by_asc(products::Column::Category)
        .order_by_asc(products::Column::Name)
        .all(db)
        .await?;
    let products = attach_options(db, products).await?;

    let mut grouped: BTreeMap<String, Vec<ProductResponse>> = BTreeMap::new();
    for product in products {
        grouped
            .entry(product.product.category.clone())
            .or_default()
            .push(ProductResponse::from(product));
    }

    Ok(grouped
        .into_iter()
        .map(|(name, products)| MenuCategory { name, products })
        .collect())
}

/// Every product, including unavailable ones
pub async fn list_products(db: &DatabaseConnection) -> OrderResult<Vec<ProductWithOptions>> {
    let products = Products::find()
        .order_by_asc(products::Column::Category)
        .order_by_asc(products::Column::Name)
        .all(db)
        .await?;

    attach_options(db, products).await
}

pub async fn get_product<C: ConnectionTrait>(db: &C, id: &str) -> OrderResult<ProductWithOptions> {
    let product = Products::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| OrderError::ProductNotFound(id.to_string()))?;
    let options = load_options(db, id).await?;
    Ok(ProductWithOptions { product, options })
}

pub async fn create_product(
    db: &DatabaseConnection,
    request: &ProductRequest,
    now: DateTime<FixedOffset>,
) -> OrderResult<ProductWithOptions> {
    request.validate().map_err(OrderError::InvalidRequest)?;

    let txn = db.begin().await?;

    let product = products::ActiveModel {
        id: Set(uuid::Uuid::new_v4().to_string()),
        name: Set(request.name.trim().to_string()),
        category: Set(request.category.trim().to_string()),
        topic: Set(non_blank(request.topic.as_deref())),
        price_cents: Set(request.price_cents),
        description: Set(non_blank(request.description.as_deref())),
        allergens: Set(non_blank(request.allergens.as_deref())),
        is_available: Set(request.is_available),
        created_at: Set(now),
    }
    .insert(&txn)
    .await?;

    let groups = option_groups(&txn, &product.category, &request.options).await?;
    let options = replace_options(&txn, &product.id, &groups).await?;

    txn.commit().await?;

    info!(
        product_id = %product.id,
        name = %product.name,
        price_cents = product.price_cents,
        options = options.len(),
        "Product created"
    );
    Ok(ProductWithOptions { product, options })
}

/// Replace every editable field of a product, option groups included
pub async fn update_product(
    db: &DatabaseConnection,
    id: &str,
    request: &ProductRequest,
) -> OrderResult<ProductWithOptions> {
    request.validate().map_err(OrderError::InvalidRequest)?;

    let txn = db.begin().await?;

    let mut product = get_product(&txn, id).await?.product.into_active_model();
    product.name = Set(request.name.trim().to_string());
    product.category = Set(request.category.trim().to_string());
    product.topic = Set(non_blank(request.topic.as_deref()));
    product.price_cents = Set(request.price_cents);
    product.description = Set(non_blank(request.description.as_deref()));
    product.allergens = Set(non_blank(request.allergens.as_deref()));
    product.is_available = Set(request.is_available);
    let product = product.update(&txn).await?;

    let groups = option_groups(&txn, &product.category, &request.options).await?;
    let options = replace_options(&txn, &product.id, &groups).await?;

    txn.commit().await?;

    info!(product_id = %product.id, price_cents = product.price_cents, options = options.len(), "Product updated");
    Ok(ProductWithOptions { product, options })
}

pub async fn set_availability(
    db: &DatabaseConnection,
    id: &str,
    is_available: bool,
) -> OrderResult<ProductWithOptions> {
    let ProductWithOptions { product, options } = get_product(db, id).await?;
    let mut product = product.into_active_model();
    product.is_available = Set(is_available);

    let product = product.update(db).await?;
    info!(product_id = %product.id, is_available, "Product availability changed");
    Ok(ProductWithOptions { product, options })
}

pub async fn delete_product(db: &DatabaseConnection, id: &str) -> OrderResult<()> {
    let txn = db.begin().await?;

    ProductOptions::delete_many()
        .filter(product_options::Column::ProductId.eq(id))
        .exec(&txn)
        .await?;
    let result = Products::delete_by_id(id).exec(&txn).await?;
    if result.rows_affected == 0 {
        txn.rollback().await?;
        return Err(OrderError::ProductNotFound(id.to_string()));
    }

    txn.commit().await?;

    info!(product_id = %id, "Product deleted");
    Ok(())
}

/// Requested groups, plus the drink choice for menu products. A client-sent
/// drink group is dropped in favour of one built from the current drinks.
async fn option_groups<C: ConnectionTrait>(
    db: &C,
    category: &str,
    requested: &[ProductOptionRequest],
) -> OrderResult<Vec<ProductOptionRequest>> {
    if category != MENU_CATEGORY {
        return Ok(requested.to_vec());
    }

    let mut groups: Vec<ProductOptionRequest> = requested
        .iter()
        .filter(|group| group.name.trim() != DRINK_OPTION_NAME)
        .cloned()
        .collect();

    let drinks: Vec<String> = Products::find()
        .filter(products::Column::Category.eq(DRINKS_CATEGORY))
        .filter(products::Column::IsAvailable.eq(true))
        .order_by_asc(products::Column::Name)
        .all(db)
        .await?
        .into_iter()
        .map(|drink| drink.name)
        .collect();

    if drinks.is_empty() {
        debug!("No available drinks, menu product gets no drink choice");
    } else {
        groups.push(ProductOptionRequest {
            name: DRINK_OPTION_NAME.to_string(),
            choices: drinks,
            allow_multi: false,
        });
    }

    Ok(groups)
}

async fn replace_options<C: ConnectionTrait>(
    db: &C,
    product_id: &str,
    groups: &[ProductOptionRequest],
) -> OrderResult<Vec<product_options::Model>> {
    ProductOptions::delete_many()
        .filter(product_options::Column::ProductId.eq(product_id))
        .exec(db)
        .await?;

    let mut options = Vec::with_capacity(groups.len());
    for (position, group) in groups.iter().enumerate() {
        let option = product_options::ActiveModel {
            product_id: Set(product_id.to_string()),
            position: Set(position as i32),
            name: Set(group.name.trim().to_string()),
            choices: Set(join_choices(&group.choices)),
            allow_multi: Set(group.allow_multi),
            ..Default::default()
        }
        .insert(db)
        .await?;
        options.push(option);
    }

    Ok(options)
}

async fn load_options<C: ConnectionTrait>(
    db: &C,
    product_id: &str,
) -> OrderResult<Vec<product_options::Model>> {
    Ok(ProductOptions::find()
        .filter(product_options::Column::ProductId.eq(product_id))
        .order_by_asc(product_options::Column::Position)
        .all(db)
        .await?)
}

/// Load option groups for a batch of products, keeping the batch order
async fn attach_options<C: ConnectionTrait>(
    db: &C,
    products: Vec<products::Model>,
) -> OrderResult<Vec<ProductWithOptions>> {
    if products.is_empty() {
        return Ok(Vec::new());
    }

    let product_ids: Vec<String> = products.iter().map(|p| p.id.clone()).collect();
    let options = ProductOptions::find()
        .filter(product_options::Column::ProductId.is_in(product_ids))
        .order_by_asc(product_options::Column::ProductId)
        .order_by_asc(product_options::Column::Position)
        .all(db)
        .await?;

    let mut by_product: HashMap<String, Vec<product_options::Model>> = HashMap::new();
    for option in options {
        by_product.entry(option.product_id.clone()).or_default().push(option);
    }

    Ok(products
        .into_iter()
        .map(|product| {
            let options = by_product.remove(&product.id).unwrap_or_default();
            ProductWithOptions { product, options }
        })
        .collect())
}
