use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{instrument, warn};

use crate::{
    auth::dto::{LoginRequest, LoginResponse, PublicAccount, RegisterRequest},
    response::{ApiError, ApiResponse},
    state::AppState,
};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<ApiResponse<PublicAccount>, ApiError> {
    let Json(payload) = payload.inspect_err(|e| warn!(error = %e, "malformed register body"))?;

    let name = payload.name.trim();
    let email = payload.email.trim();
    if name.is_empty() {
        return Err(ApiError::bad_request("name is required"));
    }
    if !is_valid_email(email) {
        warn!(email = %email, "invalid email");
        return Err(ApiError::bad_request("invalid email"));
    }

    let account = state
        .accounts
        .register(name, email, &payload.password)
        .await?;

    Ok(ApiResponse::new(
        StatusCode::CREATED,
        "successfully create user",
        account,
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<ApiResponse<LoginResponse>, ApiError> {
    let Json(payload) = payload.inspect_err(|e| warn!(error = %e, "malformed login body"))?;

    let token = state
        .accounts
        .login(payload.email.trim(), &payload.password)
        .await?;

    Ok(ApiResponse::new(
        StatusCode::OK,
        "successfully login to account",
        LoginResponse { token },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_shape() {
        assert!(is_valid_email("jamalunyu@gmail.com"));
        assert!(is_valid_email("Jamal.Unyu+tag@mail.example.org"));
        for bad in ["", "jamal", "jamal@", "@gmail.com", "jamal@gmail", "ja mal@gmail.com"] {
            assert!(!is_valid_email(bad), "{bad:?}");
        }
    }
}
