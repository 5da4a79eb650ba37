//! Device API handlers.
//!
//! # Purpose and responsibility
//! Enrollment, scoped listing and lookup, lock commands, lock-screen message
//! suggestions, and provisioning manifests.
//!
//! # Key invariants and assumptions
//! - Every handler resolves the actor from the request's session first.
//! - Devices outside the actor's scope are reported exactly like missing ones.
//! - IMEI input is normalized (digits only, first 15) before validation.
//!   Text with no digits at all is rejected, never treated as a blank slot.
use crate::api::error::ApiError;
use crate::api::types::{DeviceListResponse, LockRequest, OverlayMessageResponse};
use crate::api::{parse_id, resolve_actor};
use crate::app::AppState;
use crate::enforcement::LockCommand;
use crate::error::{CoreError, ImeiSlot};
use crate::model::Device;
use crate::overlay::{OverlayRequest, compose_or_fallback};
use crate::provisioning::ProvisioningManifest;
use crate::registry::{DeviceEnrollment, DeviceQuery};
use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use emilock_common::ids::DeviceId;
use emilock_common::imei;

#[utoipa::path(
    get,
    path = "/v1/devices",
    tag = "devices",
    params(DeviceQuery),
    responses(
        (status = 200, description = "Devices visible to the caller", body = DeviceListResponse),
        (status = 401, description = "Missing or invalid session", body = crate::api::types::ErrorResponse),
        (status = 403, description = "No vendor scope", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn list_devices(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<DeviceQuery>,
) -> Result<Json<DeviceListResponse>, ApiError> {
    let actor = resolve_actor(&state, &headers).await?;
    let items = state.registry.list(&actor, &query).await?;
    Ok(Json(DeviceListResponse { items }))
}

#[utoipa::path(
    post,
    path = "/v1/devices",
    tag = "devices",
    request_body = DeviceEnrollment,
    responses(
        (status = 201, description = "Device enrolled", body = Device),
        (status = 400, description = "Invalid hardware id or fields", body = crate::api::types::ErrorResponse),
        (status = 403, description = "Vendor session required", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn enroll_device(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(mut body): Json<DeviceEnrollment>,
) -> Result<impl IntoResponse, ApiError> {
    let actor = resolve_actor(&state, &headers).await?;
    body.imei1 = normalize_imei_field(&body.imei1, ImeiSlot::Primary)?;
    body.imei2 = normalize_imei_field(&body.imei2, ImeiSlot::Secondary)?;
    let device = state.registry.create(&actor, body).await?;
    Ok((StatusCode::CREATED, Json(device)))
}

/// Only an empty or whitespace field means "no IMEI in this slot".
fn normalize_imei_field(raw: &str, slot: ImeiSlot) -> Result<String, CoreError> {
    let digits = imei::normalize_input(raw);
    if digits.is_empty() && !raw.trim().is_empty() {
        return Err(CoreError::InvalidHardwareId { slot });
    }
    Ok(digits)
}

#[utoipa::path(
    get,
    path = "/v1/devices/{device_id}",
    tag = "devices",
    params(("device_id" = String, Path, description = "Device identifier")),
    responses(
        (status = 200, description = "Device record", body = Device),
        (status = 404, description = "Device not found", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn get_device(
    Path(device_id): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Device>, ApiError> {
    let actor = resolve_actor(&state, &headers).await?;
    let id: DeviceId = parse_id(&device_id)?;
    Ok(Json(state.registry.get(&actor, &id).await?))
}

#[utoipa::path(
    post,
    path = "/v1/devices/{device_id}/lock",
    tag = "devices",
    params(("device_id" = String, Path, description = "Device identifier")),
    request_body = LockRequest,
    responses(
        (status = 200, description = "Device locked", body = Device),
        (status = 400, description = "Lock message missing", body = crate::api::types::ErrorResponse),
        (status = 404, description = "Device not found", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn lock_device(
    Path(device_id): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<LockRequest>,
) -> Result<Json<Device>, ApiError> {
    let actor = resolve_actor(&state, &headers).await?;
    let id: DeviceId = parse_id(&device_id)?;
    let device = state
        .registry
        .update_enforcement(&actor, &id, LockCommand::lock(body.message))
        .await?;
    Ok(Json(device))
}

#[utoipa::path(
    post,
    path = "/v1/devices/{device_id}/unlock",
    tag = "devices",
    params(("device_id" = String, Path, description = "Device identifier")),
    responses(
        (status = 200, description = "Device unlocked", body = Device),
        (status = 404, description = "Device not found", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn unlock_device(
    Path(device_id): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Device>, ApiError> {
    let actor = resolve_actor(&state, &headers).await?;
    let id: DeviceId = parse_id(&device_id)?;
    let device = state
        .registry
        .update_enforcement(&actor, &id, LockCommand::Unlock)
        .await?;
    Ok(Json(device))
}

#[utoipa::path(
    post,
    path = "/v1/devices/{device_id}/overlay-message",
    tag = "devices",
    params(("device_id" = String, Path, description = "Device identifier")),
    responses(
        (status = 200, description = "Suggested lock-screen message", body = OverlayMessageResponse),
        (status = 404, description = "Device not found", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn overlay_message(
    Path(device_id): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<OverlayMessageResponse>, ApiError> {
    let actor = resolve_actor(&state, &headers).await?;
    let id: DeviceId = parse_id(&device_id)?;
    let device = state.registry.get(&actor, &id).await?;
    let vendor = state
        .store
        .get_vendor(&device.vendor_id)
        .await
        .map_err(CoreError::from)?
        .ok_or(CoreError::NotAvailable)?;
    let request = OverlayRequest::for_device(&device, &vendor);
    let overlay_message = compose_or_fallback(state.overlay.as_ref(), &request).await;
    Ok(Json(OverlayMessageResponse { overlay_message }))
}

#[utoipa::path(
    get,
    path = "/v1/devices/{device_id}/provisioning",
    tag = "devices",
    params(("device_id" = String, Path, description = "Device identifier")),
    responses(
        (status = 200, description = "Enrollment manifest", body = ProvisioningManifest),
        (status = 404, description = "Device not found", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn provisioning_manifest(
    Path(device_id): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ProvisioningManifest>, ApiError> {
    let actor = resolve_actor(&state, &headers).await?;
    let id: DeviceId = parse_id(&device_id)?;
    let device = state.registry.get(&actor, &id).await?;
    Ok(Json(state.provisioning.manifest(&device)))
}
