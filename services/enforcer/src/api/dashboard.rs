//! Session and dashboard handlers.
use crate::api::error::ApiError;
use crate::api::types::MeResponse;
use crate::api::{resolve_actor, session_identity};
use crate::app::AppState;
use crate::auth::Role;
use crate::registry::DashboardStats;
use axum::Json;
use axum::extract::State;
use axum::http::HeaderMap;

#[utoipa::path(
    get,
    path = "/v1/me",
    tag = "session",
    responses(
        (status = 200, description = "Resolved caller identity", body = MeResponse),
        (status = 401, description = "Missing or invalid session", body = crate::api::types::ErrorResponse)
    )
)]
/// Report the caller's role and vendor record.
///
/// Works for pending and suspended vendors too, so a shop can see why it has
/// no access yet.
pub(crate) async fn me(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<MeResponse>, ApiError> {
    let identity = session_identity(&state, &headers)?;
    let role = state.resolver.resolve_role(&identity);
    let vendor = match role {
        Role::SuperAdmin => None,
        Role::Vendor => {
            state
                .resolver
                .lookup_vendor(state.store.as_ref(), &identity)
                .await?
        }
    };
    Ok(Json(MeResponse {
        subject: identity.subject,
        role,
        phone: identity.phone,
        email: identity.email,
        anonymous: identity.anonymous,
        vendor,
    }))
}

#[utoipa::path(
    get,
    path = "/v1/dashboard/stats",
    tag = "session",
    responses(
        (status = 200, description = "Device totals for the caller's scope", body = DashboardStats),
        (status = 403, description = "No vendor scope", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn dashboard_stats(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<DashboardStats>, ApiError> {
    let actor = resolve_actor(&state, &headers).await?;
    Ok(Json(state.registry.stats(&actor).await?))
}
