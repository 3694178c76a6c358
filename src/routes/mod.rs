pub mod auth;
pub mod health;
pub mod menus;
pub mod preferences;
pub mod schedules;
pub mod suggestions;
pub mod users;

use axum::{http::StatusCode, Json};
use serde_json::{json, Value};

use crate::services::users::AccountError;

/// Error half of every handler result: a status and `{ "error": "..." }`.
pub type ApiError = (StatusCode, Json<Value>);

pub(crate) fn error(status: StatusCode, message: impl std::fmt::Display) -> ApiError {
    (status, Json(json!({ "error": message.to_string() })))
}

pub(crate) fn bad_request(message: impl std::fmt::Display) -> ApiError {
    error(StatusCode::BAD_REQUEST, message)
}

pub(crate) fn not_found(what: &str) -> ApiError {
    error(StatusCode::NOT_FOUND, format!("{what} not found"))
}

/// Logs the cause; the client gets a fixed body with no database details.
pub(crate) fn internal(e: anyhow::Error) -> ApiError {
    tracing::error!("request failed: {e:#}");
    error(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
}

impl From<AccountError> for (StatusCode, Json<Value>) {
    fn from(e: AccountError) -> Self {
        let status = match &e {
            AccountError::Validation(_) => StatusCode::BAD_REQUEST,
            AccountError::EmailTaken => StatusCode::CONFLICT,
            AccountError::Forbidden(_) => StatusCode::FORBIDDEN,
            AccountError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AccountError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        match e {
            AccountError::Internal(inner) => internal(inner),
            other => error(status, other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_internal_error_hides_cause() {
        let (status, Json(body)) =
            internal(anyhow::anyhow!("relation \"users\" does not exist at 10.0.0.5:5432"));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "error": "Internal server error" }));
    }

    #[test]
    fn test_account_errors_map_to_status() {
        let (status, Json(body)) = ApiError::from(AccountError::EmailTaken);
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "User with this email already exists");

        let (status, _) = ApiError::from(AccountError::Validation("bad".into()));
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, Json(body)) =
            ApiError::from(AccountError::Internal(anyhow::anyhow!("pool timed out")));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Internal server error");
    }
}
