//! API error types and helpers.
//!
//! # Purpose and responsibility
//! Centralizes HTTP error response construction so every endpoint returns the
//! same `{code, message, request_id}` shape, and maps the core error taxonomy
//! onto status codes in one place.
//!
//! # Key invariants and assumptions
//! - Error responses include a stable `code` and human-readable `message`.
//! - Out-of-scope and missing records both map to `404 not_found`.
//!
//! # Security considerations
//! - Store failures log details server-side but return a generic message.
//! - Session verification failures never echo the token.
use crate::api::types::ErrorResponse;
use crate::auth::SessionError;
use crate::error::CoreError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::IntoResponse;

/// Structured API error returned by handlers.
///
/// # Invariants
/// - `status` must match the semantics of `body.code`.
///
/// # Example
/// ```rust
/// use axum::http::StatusCode;
/// use enforcer::api::error::ApiError;
/// use enforcer::api::types::ErrorResponse;
///
/// let err = ApiError {
///     status: StatusCode::NOT_FOUND,
///     body: ErrorResponse {
///         code: "not_found".to_string(),
///         message: "missing".to_string(),
///         request_id: None,
///     },
/// };
/// ```
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorResponse,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status, Json(self.body)).into_response()
    }
}

fn api_error(status: StatusCode, code: &str, message: &str) -> ApiError {
    ApiError {
        status,
        body: ErrorResponse {
            code: code.to_string(),
            message: message.to_string(),
            request_id: None,
        },
    }
}

/// Build a 404 Not Found error.
pub fn api_not_found(message: &str) -> ApiError {
    api_error(StatusCode::NOT_FOUND, "not_found", message)
}

/// Build a 409 Conflict error.
pub fn api_conflict(message: &str) -> ApiError {
    api_error(StatusCode::CONFLICT, "conflict", message)
}

/// Build a 503 error for a failing store collaborator.
///
/// The detail is logged; clients only learn that a retry may help.
pub fn api_store_unavailable(err: &dyn std::error::Error) -> ApiError {
    tracing::error!(error = %err, "enforcement store unavailable");
    api_error(
        StatusCode::SERVICE_UNAVAILABLE,
        "store_unavailable",
        "storage temporarily unavailable, retry later",
    )
}

/// Build a 401 Unauthorized error.
pub fn api_unauthorized(message: &str) -> ApiError {
    api_error(StatusCode::UNAUTHORIZED, "unauthorized", message)
}

/// Build a 403 Forbidden error.
pub fn api_forbidden(message: &str) -> ApiError {
    api_error(StatusCode::FORBIDDEN, "forbidden", message)
}

/// Build a 400 Bad Request validation error.
pub fn api_validation_error(message: &str) -> ApiError {
    api_error(StatusCode::BAD_REQUEST, "validation_error", message)
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let message = err.to_string();
        match err {
            CoreError::InvalidHardwareId { .. } => {
                api_error(StatusCode::BAD_REQUEST, "invalid_hardware_id", &message)
            }
            CoreError::DuplicateHardwareId => {
                api_error(StatusCode::BAD_REQUEST, "duplicate_hardware_id", &message)
            }
            CoreError::MissingLockMessage => {
                api_error(StatusCode::BAD_REQUEST, "missing_lock_message", &message)
            }
            CoreError::Validation(_) => api_validation_error(&message),
            CoreError::NotAvailable => api_not_found("not found"),
            CoreError::NoScope => api_forbidden("no active vendor account for this session"),
            CoreError::AdminOnly => api_forbidden("super admin required"),
            CoreError::VendorOnly => api_forbidden("vendor session required"),
            CoreError::Conflict(_) => api_conflict(&message),
            CoreError::StoreUnavailable(inner) => api_store_unavailable(&inner),
        }
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Missing => api_unauthorized("missing bearer token"),
            SessionError::Invalid(_) => api_unauthorized("invalid session"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ImeiSlot;
    use crate::store::StoreError;

    #[test]
    fn api_error_helpers_build_expected_codes() {
        let not_found = api_not_found("missing");
        assert_eq!(not_found.status, StatusCode::NOT_FOUND);
        assert_eq!(not_found.body.code, "not_found");

        let conflict = api_conflict("taken");
        assert_eq!(conflict.status, StatusCode::CONFLICT);
        assert_eq!(conflict.body.code, "conflict");

        let unauthorized = api_unauthorized("nope");
        assert_eq!(unauthorized.status, StatusCode::UNAUTHORIZED);
        assert_eq!(unauthorized.body.code, "unauthorized");

        let forbidden = api_forbidden("nope");
        assert_eq!(forbidden.status, StatusCode::FORBIDDEN);
        assert_eq!(forbidden.body.code, "forbidden");

        let validation = api_validation_error("bad");
        assert_eq!(validation.status, StatusCode::BAD_REQUEST);
        assert_eq!(validation.body.code, "validation_error");
    }

    #[test]
    fn core_errors_map_to_status_codes() {
        let cases = [
            (
                CoreError::InvalidHardwareId {
                    slot: ImeiSlot::Secondary,
                },
                StatusCode::BAD_REQUEST,
                "invalid_hardware_id",
            ),
            (
                CoreError::DuplicateHardwareId,
                StatusCode::BAD_REQUEST,
                "duplicate_hardware_id",
            ),
            (
                CoreError::MissingLockMessage,
                StatusCode::BAD_REQUEST,
                "missing_lock_message",
            ),
            (CoreError::NotAvailable, StatusCode::NOT_FOUND, "not_found"),
            (CoreError::NoScope, StatusCode::FORBIDDEN, "forbidden"),
            (CoreError::AdminOnly, StatusCode::FORBIDDEN, "forbidden"),
            (CoreError::VendorOnly, StatusCode::FORBIDDEN, "forbidden"),
            (
                CoreError::Conflict("x".to_string()),
                StatusCode::CONFLICT,
                "conflict",
            ),
        ];
        for (err, status, code) in cases {
            let api = ApiError::from(err);
            assert_eq!(api.status, status);
            assert_eq!(api.body.code, code);
        }
    }

    #[test]
    fn store_failures_are_generic_503s() {
        let api = ApiError::from(CoreError::StoreUnavailable(StoreError::Unexpected(
            anyhow::anyhow!("connection reset by 10.0.0.7"),
        )));
        assert_eq!(api.status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(api.body.code, "store_unavailable");
        assert!(!api.body.message.contains("10.0.0.7"));
    }

    #[test]
    fn invalid_imei_message_names_the_slot() {
        let api = ApiError::from(CoreError::InvalidHardwareId {
            slot: ImeiSlot::Primary,
        });
        assert!(api.body.message.contains("imei1"));
    }
}
