//! Device agent handler.
//!
//! # Purpose and responsibility
//! The on-device agent polls this endpoint to learn whether it should show
//! the lock screen. It carries no session; knowing the opaque device id is
//! the capability, as it is for the enrollment manifest the agent was
//! provisioned with.
use crate::api::error::ApiError;
use crate::api::parse_id;
use crate::api::types::AgentDeviceState;
use crate::app::AppState;
use axum::Json;
use axum::extract::{Path, State};
use emilock_common::ids::DeviceId;

#[utoipa::path(
    get,
    path = "/v1/agent/devices/{device_id}/state",
    tag = "agent",
    params(("device_id" = String, Path, description = "Device identifier")),
    responses(
        (status = 200, description = "Current enforcement state", body = AgentDeviceState),
        (status = 404, description = "Device not found", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn device_state(
    Path(device_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<AgentDeviceState>, ApiError> {
    let id: DeviceId = parse_id(&device_id)?;
    let device = state.registry.agent_view(&id).await?;
    Ok(Json(AgentDeviceState::from(&device)))
}
