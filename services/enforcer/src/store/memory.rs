//! In-memory implementation of the enforcement store.
//!
//! # Purpose
//! Implements [`EnforcementStore`] with `HashMap`s guarded by
//! `tokio::sync::RwLock`. It exists for:
//! - local development and tests (no external dependencies)
//! - single-node demos where durability is not required
//!
//! # Durability and consistency
//! - **Not durable**: all state is lost on process restart.
//! - Each operation runs under one lock, so an enforcement patch is applied
//!   as a single read-modify-write and concurrent commands for the same device
//!   resolve last-write-wins.
//! - Listings are snapshots taken under a read lock.
//!
//! # Uniqueness
//! Vendor `mobile` and device `customer_id` are unique, mirroring the unique
//! indexes of the Postgres backend.
use super::{
    CONFLICT_CUSTOMER_ID, CONFLICT_VENDOR_MOBILE, EnforcementStore, StoreError, StoreResult,
};
use crate::model::{
    Device, DeviceFilter, EnforcementPatch, NewDevice, NewVendor, Vendor, VendorFilter,
    VendorPatch, VendorStatus,
};
use async_trait::async_trait;
use chrono::Utc;
use emilock_common::ids::{DeviceId, VendorId};
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Rows keyed by id, plus the order in which they were inserted.
///
/// Query results follow insertion order so listings are stable for a given
/// snapshot of the store.
#[derive(Debug)]
struct Table<K, V> {
    rows: HashMap<K, V>,
    order: Vec<K>,
}

impl<K: Eq + Hash + Copy, V: Clone> Table<K, V> {
    fn new() -> Self {
        Self {
            rows: HashMap::new(),
            order: Vec::new(),
        }
    }

    fn insert(&mut self, key: K, value: V) {
        if self.rows.insert(key, value).is_none() {
            self.order.push(key);
        }
    }

    fn scan(&self, mut keep: impl FnMut(&V) -> bool) -> Vec<V> {
        self.order
            .iter()
            .filter_map(|key| self.rows.get(key))
            .filter(|row| keep(row))
            .cloned()
            .collect()
    }
}

/// In-memory enforcement store.
///
/// Cloning shares the underlying tables, so one instance can back both the
/// HTTP state and test assertions.
#[derive(Clone)]
pub struct InMemoryStore {
    vendors: Arc<RwLock<Table<VendorId, Vendor>>>,
    devices: Arc<RwLock<Table<DeviceId, Device>>>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            vendors: Arc::new(RwLock::new(Table::new())),
            devices: Arc::new(RwLock::new(Table::new())),
        }
    }
}

#[async_trait]
impl EnforcementStore for InMemoryStore {
    async fn insert_vendor(&self, vendor: NewVendor) -> StoreResult<Vendor> {
        let mut vendors = self.vendors.write().await;
        if vendors.rows.values().any(|v| v.mobile == vendor.mobile) {
            return Err(StoreError::Conflict(CONFLICT_VENDOR_MOBILE.into()));
        }
        let record = Vendor {
            id: VendorId::new(),
            shop_name: vendor.shop_name,
            owner_name: vendor.owner_name,
            mobile: vendor.mobile,
            email: vendor.email,
            status: VendorStatus::Pending,
            kyc_assets: vendor.kyc_assets,
            join_date: vendor.join_date,
            created_at: Utc::now(),
        };
        vendors.insert(record.id, record.clone());
        metrics::gauge!("emilock_vendors_total").set(vendors.rows.len() as f64);
        Ok(record)
    }

    async fn get_vendor(&self, id: &VendorId) -> StoreResult<Option<Vendor>> {
        Ok(self.vendors.read().await.rows.get(id).cloned())
    }

    async fn query_vendors(&self, filter: &VendorFilter) -> StoreResult<Vec<Vendor>> {
        Ok(self.vendors.read().await.scan(|v| filter.matches(v)))
    }

    async fn update_vendor(&self, id: &VendorId, patch: VendorPatch) -> StoreResult<Vendor> {
        let mut vendors = self.vendors.write().await;
        let vendor = vendors
            .rows
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound("vendor".into()))?;
        if let Some(status) = patch.status {
            vendor.status = status;
        }
        Ok(vendor.clone())
    }

    async fn insert_device(&self, device: NewDevice) -> StoreResult<Device> {
        let mut devices = self.devices.write().await;
        if devices
            .rows
            .values()
            .any(|d| d.customer_id == device.customer_id)
        {
            return Err(StoreError::Conflict(CONFLICT_CUSTOMER_ID.into()));
        }
        let record = Device::enrolled(DeviceId::new(), device, Utc::now());
        devices.insert(record.id, record.clone());
        metrics::gauge!("emilock_devices_total").set(devices.rows.len() as f64);
        Ok(record)
    }

    async fn get_device(&self, id: &DeviceId) -> StoreResult<Option<Device>> {
        Ok(self.devices.read().await.rows.get(id).cloned())
    }

    async fn query_devices(&self, filter: &DeviceFilter) -> StoreResult<Vec<Device>> {
        Ok(self.devices.read().await.scan(|d| filter.matches(d)))
    }

    async fn update_device_enforcement(
        &self,
        id: &DeviceId,
        patch: &EnforcementPatch,
    ) -> StoreResult<Device> {
        let mut devices = self.devices.write().await;
        let device = devices
            .rows
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound("device".into()))?;
        device.apply_enforcement(patch);
        Ok(device.clone())
    }

    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }

    fn is_durable(&self) -> bool {
        false
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
