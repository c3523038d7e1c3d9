//! Customer feedback models

use serde::{Deserialize, Serialize};

use crate::entities::feedback;

/// Max feedback length, in characters
pub const MAX_FEEDBACK_LENGTH: usize = 2000;

/// Request body for POST /api/feedback
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackRequest {
    pub text: String,
}

impl FeedbackRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.text.trim().is_empty() {
            return Err("Feedback cannot be empty".to_string());
        }
        if self.text.chars().count() > MAX_FEEDBACK_LENGTH {
            return Err(format!(
                "Feedback cannot exceed {} characters",
                MAX_FEEDBACK_LENGTH
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackResponse {
    pub id: String,
    pub text: String,
    pub created_at: String,
}

impl From<feedback::Model> for FeedbackResponse {
    fn from(model: feedback::Model) -> Self {
        Self {
            id: model.id,
            text: model.text,
            created_at: model.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackListResponse {
    pub feedback: Vec<FeedbackResponse>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_and_oversized_feedback_rejected() {
        let request = |text: &str| FeedbackRequest {
            text: text.to_string(),
        };

        assert!(request("Great lasagne today").validate().is_ok());
        assert!(request("").validate().is_err());
        assert!(request(" \n\t ").validate().is_err());
        assert!(request(&"x".repeat(MAX_FEEDBACK_LENGTH + 1)).validate().is_err());
    }
}
