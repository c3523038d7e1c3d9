//! Print queue (kitchen fulfilment job) models

use serde::{Deserialize, Serialize};

use crate::entities::print_jobs;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrintJobStatus {
    Queued,
    Printed,
}

impl PrintJobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrintJobStatus::Queued => "queued",
            PrintJobStatus::Printed => "printed",
        }
    }
}

impl std::fmt::Display for PrintJobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrintJobView {
    pub id: String,
    pub order_id: String,
    pub pickup_code: String,
    pub payload_text: String,
    pub status: String,
    pub created_at: String,
}

impl PrintJobView {
    pub fn new(job: print_jobs::Model, pickup_code: String) -> Self {
        Self {
            id: job.id,
            order_id: job.order_id,
            pickup_code,
            payload_text: job.payload_text,
            status: job.status,
            created_at: job.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrintJobListResponse {
    pub jobs: Vec<PrintJobView>,
}
