use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

use crate::auth::services::AccountError;

/// `{status, message, data}` wrapper used for every response body.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub status: u16,
    pub message: String,
    pub data: Option<T>,
}

pub struct ApiResponse<T> {
    status: StatusCode,
    message: &'static str,
    data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(status: StatusCode, message: &'static str, data: T) -> Self {
        Self {
            status,
            message,
            data,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let body = Envelope {
            status: self.status.as_u16(),
            message: self.message.to_string(),
            data: Some(self.data),
        };
        (self.status, Json(body)).into_response()
    }
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn internal() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Envelope::<()> {
            status: self.status.as_u16(),
            message: self.message,
            data: None,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<AccountError> for ApiError {
    fn from(e: AccountError) -> Self {
        match e {
            AccountError::PolicyViolation(p) => Self::bad_request(p.to_string()),
            AccountError::AccountExists => Self::new(StatusCode::CONFLICT, e.to_string()),
            AccountError::AccountNotFound => Self::new(StatusCode::NOT_FOUND, e.to_string()),
            AccountError::InvalidCredentials => {
                Self::new(StatusCode::UNAUTHORIZED, e.to_string())
            }
            AccountError::StorageFailure(_) | AccountError::Internal(_) => {
                // details stay in the logs
                error!(error = %e, "request failed");
                Self::internal()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{policy::PolicyError, repo::StoreError};

    #[test]
    fn maps_domain_errors_to_status_codes() {
        let cases = [
            (
                AccountError::PolicyViolation(PolicyError::TooShort { min: 8 }),
                StatusCode::BAD_REQUEST,
            ),
            (AccountError::AccountExists, StatusCode::CONFLICT),
            (AccountError::AccountNotFound, StatusCode::NOT_FOUND),
            (AccountError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (
                AccountError::StorageFailure(StoreError::Database(sqlx::Error::PoolTimedOut)),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                AccountError::Internal(anyhow::anyhow!("boom")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status, status);
        }
    }

    #[test]
    fn storage_details_are_not_echoed() {
        let err = ApiError::from(AccountError::StorageFailure(StoreError::Database(
            sqlx::Error::Protocol("relation \"accounts\" does not exist".into()),
        )));
        assert_eq!(err.message, "internal server error");
    }

    #[test]
    fn envelope_shape() {
        let ok = serde_json::to_value(Envelope {
            status: 200,
            message: "ok".into(),
            data: Some(serde_json::json!({"token": "t"})),
        })
        .unwrap();
        assert_eq!(ok["data"]["token"], "t");

        let failed = serde_json::to_value(Envelope::<()> {
            status: 409,
            message: "email already registered".into(),
            data: None,
        })
        .unwrap();
        assert!(failed["data"].is_null());
        assert_eq!(failed["status"], 409);
    }
}
