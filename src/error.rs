use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

use crate::{auth::password::PasswordError, db::StoreError};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Upload(anyhow::Error),

    #[error("{0}")]
    Internal(#[from] anyhow::Error),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::Conflict(_) | ApiError::InvalidCredentials => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Upload(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn unauthorized() -> Self {
        ApiError::Unauthorized("Unauthorized".into())
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Duplicate => ApiError::Conflict("User already exists".into()),
            other => ApiError::Internal(anyhow::Error::new(other)),
        }
    }
}

impl From<PasswordError> for ApiError {
    fn from(e: PasswordError) -> Self {
        ApiError::Internal(anyhow::Error::new(e))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::Upload(e) | ApiError::Internal(e) => {
                error!(error = ?e, %status, "request failed");
                let msg = e.to_string();
                if msg.trim().is_empty() {
                    "Internal server error".to_string()
                } else {
                    msg
                }
            }
            other => {
                warn!(%status, message = %other, "request rejected");
                other.to_string()
            }
        };

        (status, Json(json!({ "message": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response_status(err: ApiError) -> StatusCode {
        err.into_response().status()
    }

    async fn response_message(err: ApiError) -> String {
        let body = axum::body::to_bytes(err.into_response().into_body(), usize::MAX)
            .await
            .unwrap();
        let v: serde_json::Value = serde_json::from_slice(&body).unwrap();
        v["message"].as_str().unwrap().to_string()
    }

    #[test]
    fn client_errors_map_to_400() {
        assert_eq!(
            response_status(ApiError::Validation("x".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            response_status(ApiError::Conflict("x".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            response_status(ApiError::InvalidCredentials),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn unauthorized_and_not_found() {
        assert_eq!(
            response_status(ApiError::unauthorized()),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            response_status(ApiError::NotFound("Book not found!".into())),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn collaborator_failures_map_to_500() {
        assert_eq!(
            response_status(ApiError::Upload(anyhow::anyhow!("bucket gone"))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            response_status(StoreError::Database(sqlx::Error::PoolTimedOut).into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn duplicate_store_error_is_conflict() {
        let err: ApiError = StoreError::Duplicate.into();
        assert!(matches!(err, ApiError::Conflict(_)));
    }

    #[test]
    fn unusable_password_hash_is_internal() {
        let err: ApiError = crate::auth::password::verify_password("x", "garbage")
            .unwrap_err()
            .into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn internal_message_falls_back_when_empty() {
        assert_eq!(
            response_message(ApiError::Internal(anyhow::anyhow!(""))).await,
            "Internal server error"
        );
        assert_eq!(
            response_message(ApiError::Internal(anyhow::anyhow!("disk full"))).await,
            "disk full"
        );
    }
}
