//! Anonymous customer feedback

use chrono::{DateTime, FixedOffset};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, QueryOrder, Set};
use tracing::info;

use crate::entities::{feedback, prelude::Feedback};
use crate::error::{OrderError, OrderResult};
use crate::models::feedback::FeedbackRequest;

pub async fn submit_feedback(
    db: &DatabaseConnection,
    request: &FeedbackRequest,
    now: DateTime<FixedOffset>,
) -> OrderResult<feedback::Model> {
    request.validate().map_err(OrderError::InvalidRequest)?;

    let entry = feedback::ActiveModel {
        id: Set(uuid::Uuid::new_v4().to_string()),
        text: Set(request.text.trim().to_string()),
        created_at: Set(now),
    }
    .insert(db)
    .await?;

    info!(feedback_id = %entry.id, "Feedback received");
    Ok(entry)
}

/// Newest first
pub async fn list_feedback(db: &DatabaseConnection) -> OrderResult<Vec<feedback::Model>> {
    Ok(Feedback::find()
        .order_by_desc(feedback::Column::CreatedAt)
        .all(db)
        .await?)
}

pub async fn delete_feedback(db: &DatabaseConnection, id: &str) -> OrderResult<()> {
    let result = Feedback::delete_by_id(id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(OrderError::FeedbackNotFound(id.to_string()));
    }

    info!(feedback_id = %id, "Feedback deleted");
    Ok(())
}
