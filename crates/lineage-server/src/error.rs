//! Error types for the HTTP layer.
//!
//! Domain and store errors are mapped onto status codes here; handlers just
//! propagate them with `?`.

use crate::config::ConfigError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use lineage_domain::{EditError, TreeError};
use lineage_store::StoreError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;

/// Error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
}

/// Application error type
#[derive(Debug, Error)]
pub enum AppError {
    /// Tree id did not match any stored tree
    #[error("Family tree not found")]
    TreeNotFound(String),

    /// Relationship command rejected
    #[error(transparent)]
    Edit(#[from] EditError),

    /// Tree or member operation rejected
    #[error(transparent)]
    Tree(#[from] TreeError),

    /// Storage failure
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Malformed or incomplete request
    #[error("{0}")]
    BadRequest(String),
}

impl AppError {
    /// HTTP status for this error
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::TreeNotFound(_) => StatusCode::NOT_FOUND,
            AppError::Edit(EditError::NotFound(_)) => StatusCode::NOT_FOUND,
            AppError::Edit(_) => StatusCode::BAD_REQUEST,
            AppError::Tree(TreeError::MemberNotFound(_)) => StatusCode::NOT_FOUND,
            AppError::Tree(_) => StatusCode::BAD_REQUEST,
            AppError::Store(StoreError::NotFound(_)) => StatusCode::NOT_FOUND,
            AppError::Store(StoreError::Duplicate(_)) => StatusCode::CONFLICT,
            AppError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "Request failed");
        }

        let body = Json(ErrorResponse {
            error: self.to_string(),
        });
        (status, body).into_response()
    }
}

/// Server startup error
#[derive(Debug, Error)]
pub enum ServerError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Database could not be opened
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Server binding error
    #[error("Failed to bind server: {0}")]
    Bind(#[from] std::io::Error),

    /// Server error
    #[error("Server error: {0}")]
    Server(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use lineage_domain::{MemberId, RelationMode, RelationType};

    #[test]
    fn test_status_mapping() {
        let id = MemberId::from("m");
        assert_eq!(AppError::TreeNotFound("t".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::from(EditError::NotFound(id.clone())).status(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::from(EditError::InvalidRelationType {
                mode: RelationMode::Spouse,
                relation_type: RelationType::Blood,
            })
            .status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::from(EditError::RelationLimit(id.clone())).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AppError::from(TreeError::MissingName).status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::from(TreeError::MemberNotFound(id)).status(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::from(StoreError::InvalidData("bad".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_messages_pass_through() {
        let err = AppError::from(EditError::RelationLimit(MemberId::from("kid")));
        assert_eq!(err.to_string(), "Member kid already has two blood parents");
    }
}
