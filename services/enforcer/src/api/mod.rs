//! Enforcement HTTP API module.
//!
//! # Purpose
//! Exposes route handler modules and the shared helpers that turn a request's
//! session into a resolved actor and parse path identifiers.
pub mod agent;
pub mod dashboard;
pub mod devices;
pub mod error;
pub mod openapi;
pub mod system;
pub mod types;
pub mod vendors;

use crate::api::error::{ApiError, api_not_found};
use crate::app::AppState;
use crate::auth::{Actor, SessionIdentity};
use axum::http::HeaderMap;
use std::str::FromStr;

/// Verify the bearer session. Does not require a tenant scope.
pub(crate) fn session_identity(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<SessionIdentity, ApiError> {
    state.sessions.verify_headers(headers).map_err(|err| {
        tracing::debug!(error = %err, "session rejected");
        ApiError::from(err)
    })
}

/// Verify the session and resolve it into an actor with a scope.
///
/// Runs on every request so vendor status changes apply immediately.
pub(crate) async fn resolve_actor(state: &AppState, headers: &HeaderMap) -> Result<Actor, ApiError> {
    let identity = session_identity(state, headers)?;
    Ok(state
        .resolver
        .resolve(state.store.as_ref(), identity)
        .await?)
}

/// Parse an id from a path segment. Malformed ids look like missing records.
pub(crate) fn parse_id<T: FromStr>(raw: &str) -> Result<T, ApiError> {
    raw.parse().map_err(|_| api_not_found("not found"))
}
