//! Error type shared by the API layer, the CLI and the TUI.

use crate::auth::DenyReason;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: u64 },
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Conflict(String),
    #[error("Access denied: {0}")]
    AccessDenied(#[from] DenyReason),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Data file error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),
}

impl AppError {
    pub fn not_found(entity: &'static str, id: u64) -> Self {
        AppError::NotFound { entity, id }
    }

    /// Whether the message is meant for the user as-is. Everything else is
    /// reported generically and logged.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            AppError::NotFound { .. } | AppError::Validation(_) | AppError::Conflict(_) | AppError::AccessDenied(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
