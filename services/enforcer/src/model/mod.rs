//! Enforcement data model.
//!
//! # Purpose
//! Typed vendor (tenant) and device records plus the store-facing insert,
//! filter, and patch shapes. Untyped client input is converted into these
//! types at the registry boundary and never flows further as raw JSON.
mod device;
mod vendor;

pub use device::{
    Device, DeviceFilter, DeviceStatus, EnforcementPatch, EnforcementState, NewDevice,
};
pub use vendor::{KycAssets, NewVendor, Vendor, VendorFilter, VendorPatch, VendorStatus};
