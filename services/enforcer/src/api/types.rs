//! HTTP API request/response types.
//!
//! # Purpose
//! Defines shared payload shapes for the enforcement REST API and OpenAPI
//! schema generation.
use crate::auth::Role;
use crate::model::{Device, DeviceStatus, Vendor, VendorStatus};
use emilock_common::ids::DeviceId;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct SystemInfo {
    pub service: String,
    pub api_version: String,
    pub storage_backend: String,
    pub durable_storage: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct HealthStatus {
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    pub request_id: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DeviceListResponse {
    pub items: Vec<Device>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct VendorListResponse {
    pub items: Vec<Vendor>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct VendorListQuery {
    /// `pending`, `active`, or `suspended`.
    pub status: Option<String>,
    /// Case-insensitive match on shop or owner name, or part of the mobile.
    pub search: Option<String>,
}

/// Lock command body. The message may be blank only to be rejected.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LockRequest {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct VendorStatusRequest {
    pub status: VendorStatus,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OverlayMessageResponse {
    pub overlay_message: String,
}

/// Who the caller is, as the service sees it.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub subject: String,
    pub role: Role,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub anonymous: bool,
    /// The vendor record registered under the session's phone, in any status.
    pub vendor: Option<Vendor>,
}

/// What the on-device agent needs to enforce.
#[derive(Debug, Serialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AgentDeviceState {
    #[schema(value_type = String)]
    pub device_id: DeviceId,
    pub is_locked: bool,
    pub status: DeviceStatus,
    pub lock_message: String,
}

impl From<&Device> for AgentDeviceState {
    fn from(device: &Device) -> Self {
        Self {
            device_id: device.id,
            is_locked: device.is_locked,
            status: device.status,
            lock_message: device.lock_message.clone(),
        }
    }
}
