//! Kitchen print queue
//!
//! Jobs are created by finalization; the print station polls the queued
//! ones and acknowledges each after printing.

use std::collections::HashMap;

use sea_orm::{
    sea_query::Expr, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
};
use tracing::{debug, info};

use crate::entities::{
    orders, print_jobs,
    prelude::{Orders, PrintJobs},
};
use crate::error::{OrderError, OrderResult};
use crate::models::print_job::{PrintJobStatus, PrintJobView};

/// Queued jobs, oldest first, with their order's pickup code
pub async fn list_queued_jobs(db: &DatabaseConnection) -> OrderResult<Vec<PrintJobView>> {
    let jobs = PrintJobs::find()
        .filter(print_jobs::Column::Status.eq(PrintJobStatus::Queued.as_str()))
        .order_by_asc(print_jobs::Column::CreatedAt)
        .all(db)
        .await?;

    if jobs.is_empty() {
        return Ok(Vec::new());
    }

    let order_ids: Vec<String> = jobs.iter().map(|j| j.order_id.clone()).collect();
    let codes: HashMap<String, String> = Orders::find()
        .filter(orders::Column::Id.is_in(order_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|o| (o.id, o.pickup_code))
        .collect();

    Ok(jobs
        .into_iter()
        .map(|job| {
            let code = codes.get(&job.order_id).cloned().unwrap_or_default();
            PrintJobView::new(job, code)
        })
        .collect())
}

/// Acknowledge a printed job. Repeating the call is harmless.
pub async fn mark_printed(db: &DatabaseConnection, job_id: &str) -> OrderResult<()> {
    let result = PrintJobs::update_many()
        .col_expr(
            print_jobs::Column::Status,
            Expr::value(PrintJobStatus::Printed.as_str()),
        )
        .filter(print_jobs::Column::Id.eq(job_id))
        .filter(print_jobs::Column::Status.eq(PrintJobStatus::Queued.as_str()))
        .exec(db)
        .await?;

    if result.rows_affected == 1 {
        info!(job_id = %job_id, "Print job marked printed");
        return Ok(());
    }

    match PrintJobs::find_by_id(job_id).one(db).await? {
        Some(_) => {
            debug!(job_id = %job_id, "Print job already printed");
            Ok(())
        }
        None => Err(OrderError::JobNotFound(job_id.to_string())),
    }
}
