pub mod checkout;
pub mod feedback;
pub mod order;
pub mod print_job;
pub mod product;
pub mod settings;

use serde::{Deserialize, Serialize};

/// Error body returned by every endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}
