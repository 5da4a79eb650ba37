//! Document-store collaborator for vendor and device records.
//!
//! # Purpose
//! Defines the narrow storage contract the enforcement core relies on:
//! insert with store-assigned id, get by id, equality-filtered query, and
//! field-level patch. No ordering, joins, or multi-record transactions are
//! assumed.
//!
//! # Notes
//! Implementations surface failures as [`StoreError`]; the core never retries.
use crate::model::{
    Device, DeviceFilter, EnforcementPatch, NewDevice, NewVendor, Vendor, VendorFilter,
    VendorPatch,
};
use async_trait::async_trait;
use emilock_common::ids::{DeviceId, VendorId};
use thiserror::Error;

pub mod memory;
pub mod postgres;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Unexpected(err.into())
    }
}

impl From<sqlx::migrate::MigrateError> for StoreError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        StoreError::Unexpected(err.into())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Conflict reason reported when a vendor mobile is already registered.
pub const CONFLICT_VENDOR_MOBILE: &str = "vendor mobile exists";
/// Conflict reason reported when a generated customer id collides.
pub const CONFLICT_CUSTOMER_ID: &str = "customer id exists";

#[async_trait]
pub trait EnforcementStore: Send + Sync {
    async fn insert_vendor(&self, vendor: NewVendor) -> StoreResult<Vendor>;
    async fn get_vendor(&self, id: &VendorId) -> StoreResult<Option<Vendor>>;
    async fn query_vendors(&self, filter: &VendorFilter) -> StoreResult<Vec<Vendor>>;
    async fn update_vendor(&self, id: &VendorId, patch: VendorPatch) -> StoreResult<Vendor>;

    async fn insert_device(&self, device: NewDevice) -> StoreResult<Device>;
    async fn get_device(&self, id: &DeviceId) -> StoreResult<Option<Device>>;
    async fn query_devices(&self, filter: &DeviceFilter) -> StoreResult<Vec<Device>>;
    /// Atomically write the enforcement fields of one device.
    async fn update_device_enforcement(
        &self,
        id: &DeviceId,
        patch: &EnforcementPatch,
    ) -> StoreResult<Device>;

    async fn health_check(&self) -> StoreResult<()>;
    fn is_durable(&self) -> bool;
    fn backend_name(&self) -> &'static str;
}
