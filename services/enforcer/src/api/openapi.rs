//! OpenAPI schema aggregation for the enforcement API.
//!
//! # Purpose
//! Collects all routes and schema types into a single OpenAPI document for docs
//! and client generation.
use crate::api::{
    agent, dashboard, devices, system,
    types::{
        AgentDeviceState, DeviceListResponse, ErrorResponse, HealthStatus, LockRequest,
        MeResponse, OverlayMessageResponse, SystemInfo, VendorListResponse, VendorStatusRequest,
    },
    vendors,
};
use crate::auth::Role;
use crate::model::{Device, DeviceStatus, KycAssets, Vendor, VendorStatus};
use crate::provisioning::{AdminExtras, ProvisioningManifest};
use crate::registry::{DashboardStats, DeviceEnrollment};
use crate::vendors::VendorRegistration;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "emilock-enforcer",
        version = "v1",
        description = "Device enrollment and EMI lock enforcement API"
    ),
    paths(
        system::system_info,
        system::system_health,
        dashboard::me,
        dashboard::dashboard_stats,
        vendors::register_vendor,
        vendors::list_vendors,
        vendors::get_vendor,
        vendors::set_vendor_status,
        devices::list_devices,
        devices::enroll_device,
        devices::get_device,
        devices::lock_device,
        devices::unlock_device,
        devices::overlay_message,
        devices::provisioning_manifest,
        agent::device_state
    ),
    components(schemas(
        SystemInfo,
        HealthStatus,
        ErrorResponse,
        MeResponse,
        Role,
        DashboardStats,
        Vendor,
        VendorStatus,
        KycAssets,
        VendorRegistration,
        VendorListResponse,
        VendorStatusRequest,
        Device,
        DeviceStatus,
        DeviceEnrollment,
        DeviceListResponse,
        LockRequest,
        OverlayMessageResponse,
        ProvisioningManifest,
        AdminExtras,
        AgentDeviceState
    )),
    tags(
        (name = "system", description = "Service metadata and health"),
        (name = "session", description = "Caller identity and dashboard"),
        (name = "vendors", description = "Vendor onboarding and review"),
        (name = "devices", description = "Device enrollment and enforcement"),
        (name = "agent", description = "On-device agent polling")
    )
)]
pub struct ApiDoc;
