use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

use crate::auth::repo::DirectoryError;

/// Every failure a handler can surface, with its HTTP mapping.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid role. Use 'farmer' or 'consumer'")]
    InvalidRole,
    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<String>),
    #[error("Invalid value for {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },
    #[error("{}", .0.body_text())]
    InvalidBody(#[from] JsonRejection),
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Invalid or expired token")]
    Unauthenticated,
    #[error("Access denied for this role")]
    Forbidden,
    #[error("{0}")]
    NotFound(String),
    #[error("Mobile number already registered")]
    Conflict,
    #[error("Service temporarily unavailable, please try again later")]
    Unavailable,
    #[error("Upstream service error: {0}")]
    Upstream(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidRole | AppError::MissingFields(_) | AppError::InvalidField { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AppError::InvalidBody(rejection) => rejection.status(),
            AppError::InvalidCredentials => StatusCode::BAD_REQUEST,
            AppError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict => StatusCode::CONFLICT,
            AppError::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            AppError::InvalidRole => "invalid_role",
            AppError::MissingFields(_) => "missing_fields",
            AppError::InvalidField { .. } => "invalid_field",
            AppError::InvalidBody(_) => "invalid_body",
            AppError::InvalidCredentials => "invalid_credentials",
            AppError::Unauthenticated => "unauthenticated",
            AppError::Forbidden => "forbidden",
            AppError::NotFound(_) => "not_found",
            AppError::Conflict => "conflict",
            AppError::Unavailable => "unavailable",
            AppError::Upstream(_) => "upstream",
            AppError::Internal(_) => "internal",
        }
    }
}

impl From<DirectoryError> for AppError {
    fn from(e: DirectoryError) -> Self {
        match e {
            DirectoryError::Conflict => AppError::Conflict,
            DirectoryError::Unavailable(_) => AppError::Unavailable,
            DirectoryError::Other(e) => AppError::Internal(e),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            AppError::MissingFields(fields) => json!({
                "kind": self.kind(),
                "detail": self.to_string(),
                "missing": fields,
            }),
            AppError::Internal(e) => {
                error!(error = ?e, "internal error");
                json!({ "kind": self.kind(), "detail": "Internal server error" })
            }
            _ => json!({ "kind": self.kind(), "detail": self.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_lists_names_in_detail() {
        let err = AppError::MissingFields(vec!["age".into(), "village".into()]);
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.to_string(), "Missing required fields: age, village");
    }

    #[test]
    fn directory_errors_map_to_distinct_statuses() {
        let conflict: AppError = DirectoryError::Conflict.into();
        assert_eq!(conflict.status(), StatusCode::CONFLICT);

        let down: AppError = DirectoryError::Unavailable("connection refused".into()).into();
        assert_eq!(down.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(down.kind(), "unavailable");
    }

    #[tokio::test]
    async fn internal_error_hides_details() {
        let resp = AppError::Internal(anyhow::anyhow!("db password is hunter2")).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(!text.contains("hunter2"));
        assert!(text.contains("internal"));
    }
}
