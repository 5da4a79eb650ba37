//! Vendor API handlers.
//!
//! # Purpose and responsibility
//! Public shop registration plus the super-admin review endpoints.
use crate::api::error::{ApiError, api_validation_error};
use crate::api::types::{VendorListQuery, VendorListResponse, VendorStatusRequest};
use crate::api::{parse_id, resolve_actor};
use crate::app::AppState;
use crate::model::{Vendor, VendorStatus};
use crate::vendors::VendorRegistration;
use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use emilock_common::ids::VendorId;

#[utoipa::path(
    post,
    path = "/v1/vendors",
    tag = "vendors",
    request_body = VendorRegistration,
    responses(
        (status = 201, description = "Vendor registered, pending review", body = Vendor),
        (status = 400, description = "Missing fields", body = crate::api::types::ErrorResponse),
        (status = 409, description = "Mobile already registered", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn register_vendor(
    State(state): State<AppState>,
    Json(body): Json<VendorRegistration>,
) -> Result<impl IntoResponse, ApiError> {
    let vendor = state.vendors.register(body).await?;
    Ok((StatusCode::CREATED, Json(vendor)))
}

#[utoipa::path(
    get,
    path = "/v1/vendors",
    tag = "vendors",
    params(VendorListQuery),
    responses(
        (status = 200, description = "All vendors", body = VendorListResponse),
        (status = 403, description = "Super admin required", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn list_vendors(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<VendorListQuery>,
) -> Result<Json<VendorListResponse>, ApiError> {
    let actor = resolve_actor(&state, &headers).await?;
    let status = match query.status.as_deref().filter(|s| !s.is_empty()) {
        Some(raw) => Some(
            VendorStatus::parse(raw)
                .ok_or_else(|| api_validation_error(&format!("unknown vendor status: {raw}")))?,
        ),
        None => None,
    };
    let items = state
        .vendors
        .list(&actor, status, query.search.as_deref())
        .await?;
    Ok(Json(VendorListResponse { items }))
}

#[utoipa::path(
    get,
    path = "/v1/vendors/{vendor_id}",
    tag = "vendors",
    params(("vendor_id" = String, Path, description = "Vendor identifier")),
    responses(
        (status = 200, description = "Vendor record", body = Vendor),
        (status = 404, description = "Vendor not found", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn get_vendor(
    Path(vendor_id): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vendor>, ApiError> {
    let actor = resolve_actor(&state, &headers).await?;
    let id: VendorId = parse_id(&vendor_id)?;
    Ok(Json(state.vendors.get(&actor, &id).await?))
}

#[utoipa::path(
    post,
    path = "/v1/vendors/{vendor_id}/status",
    tag = "vendors",
    params(("vendor_id" = String, Path, description = "Vendor identifier")),
    request_body = VendorStatusRequest,
    responses(
        (status = 200, description = "Vendor status updated", body = Vendor),
        (status = 400, description = "Transition not allowed", body = crate::api::types::ErrorResponse),
        (status = 403, description = "Super admin required", body = crate::api::types::ErrorResponse),
        (status = 404, description = "Vendor not found", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn set_vendor_status(
    Path(vendor_id): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<VendorStatusRequest>,
) -> Result<Json<Vendor>, ApiError> {
    let actor = resolve_actor(&state, &headers).await?;
    let id: VendorId = parse_id(&vendor_id)?;
    Ok(Json(state.vendors.set_status(&actor, &id, body.status).await?))
}
