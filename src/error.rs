use serde::Serialize;

/// Failures of the filter → allocate → render pipeline.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlanError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Render(String),
}

impl PlanError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn render(message: impl Into<String>) -> Self {
        Self::Render(message.into())
    }

    /// Error code reported over IPC.
    pub fn code(&self) -> &'static str {
        match self {
            PlanError::Validation(_) => "validation_failed",
            PlanError::Render(_) => "render_failed",
        }
    }
}

/// Non-fatal condition attached to a successful generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Warning {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl Warning {
    pub fn allocation_overflow(unassigned: &[String], total_capacity: u64) -> Self {
        Self {
            code: "allocation_overflow".to_string(),
            message: format!(
                "{} students could not be placed (total capacity {})",
                unassigned.len(),
                total_capacity
            ),
            details: Some(serde_json::json!({
                "unassignedCount": unassigned.len(),
                "totalCapacity": total_capacity,
            })),
        }
    }

    pub fn duplicate_ids(dropped: usize) -> Self {
        Self {
            code: "duplicate_ids".to_string(),
            message: format!("{} duplicate student ids were ignored", dropped),
            details: Some(serde_json::json!({ "droppedCount": dropped })),
        }
    }
}
