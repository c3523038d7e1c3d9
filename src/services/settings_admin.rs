//! Settings singleton administration
//!
//! Revenue counters are only ever overwritten by the explicit resets here;
//! finalization adds to them in place.

use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, QueryFilter, Set,
};
use tracing::{info, warn};

use crate::entities::{prelude::Settings, settings};
use crate::error::{OrderError, OrderResult};
use crate::models::settings::UpdateSettingsRequest;
use crate::services::order_repository::{self, SETTINGS_ID};

pub async fn get_settings(db: &DatabaseConnection) -> OrderResult<settings::Model> {
    order_repository::get_settings(db).await
}

/// Replace windows and flags. Revenue is left alone.
pub async fn update_settings(
    db: &DatabaseConnection,
    request: &UpdateSettingsRequest,
) -> OrderResult<settings::Model> {
    request.validate().map_err(OrderError::InvalidRequest)?;

    let mut model = order_repository::get_settings(db).await?.into_active_model();
    model.order_start_time = Set(request.order_start_time.trim().to_string());
    model.order_end_time = Set(request.order_end_time.trim().to_string());
    model.pickup_start_time = Set(request.pickup_start_time.trim().to_string());
    model.pickup_end_time = Set(request.pickup_end_time.trim().to_string());
    model.ordering_enabled = Set(request.ordering_enabled);
    model.pickup_time_required = Set(request.pickup_time_required);

    let updated = model.update(db).await?;
    info!(
        order_window = %format!("{}-{}", updated.order_start_time, updated.order_end_time),
        pickup_window = %format!("{}-{}", updated.pickup_start_time, updated.pickup_end_time),
        ordering_enabled = updated.ordering_enabled,
        pickup_time_required = updated.pickup_time_required,
        "Settings updated"
    );
    Ok(updated)
}

pub async fn reset_lifetime_revenue(db: &DatabaseConnection) -> OrderResult<settings::Model> {
    reset_counter(db, settings::Column::LifetimeRevenueCents).await
}

pub async fn reset_period_revenue(db: &DatabaseConnection) -> OrderResult<settings::Model> {
    reset_counter(db, settings::Column::PeriodRevenueCents).await
}

async fn reset_counter(
    db: &DatabaseConnection,
    column: settings::Column,
) -> OrderResult<settings::Model> {
    let before = order_repository::get_settings(db).await?;

    Settings::update_many()
        .col_expr(column, Expr::value(0i64))
        .filter(settings::Column::Id.eq(SETTINGS_ID))
        .exec(db)
        .await?;

    let previous = match column {
        settings::Column::LifetimeRevenueCents => before.lifetime_revenue_cents,
        _ => before.period_revenue_cents,
    };
    warn!(counter = ?column, previous_cents = previous, "Revenue counter reset");

    order_repository::get_settings(db).await
}
