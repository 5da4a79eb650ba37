//! Device records and enforcement state.
//!
//! # Purpose
//! Defines the enrolled-device record, its store-facing insert and filter
//! shapes, and the single enforcement patch type through which the lock
//! state changes.
//!
//! # Key invariants
//! - `is_locked` and `status` are two views of one [`EnforcementState`]; they
//!   are only ever written together by [`Device::apply_enforcement`].
//! - `is_locked == true` implies a non-empty `lock_message`.
//! - `vendor_id` is fixed at insert time; no patch type carries it.
use chrono::{DateTime, NaiveDate, Utc};
use emilock_common::ids::{DeviceId, VendorId};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Display/query view of the enforcement flag.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DeviceStatus {
    Active,
    Locked,
}

impl DeviceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceStatus::Active => "active",
            DeviceStatus::Locked => "locked",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "active" => Some(DeviceStatus::Active),
            "locked" => Some(DeviceStatus::Locked),
            _ => None,
        }
    }
}

/// Canonical enforcement state. `Locked` always carries its message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnforcementState {
    Active,
    Locked { message: String },
}

impl EnforcementState {
    pub fn status(&self) -> DeviceStatus {
        match self {
            EnforcementState::Active => DeviceStatus::Active,
            EnforcementState::Locked { .. } => DeviceStatus::Locked,
        }
    }

    pub fn is_locked(&self) -> bool {
        matches!(self, EnforcementState::Locked { .. })
    }

    pub fn lock_message(&self) -> &str {
        match self {
            EnforcementState::Active => "",
            EnforcementState::Locked { message } => message,
        }
    }
}

/// A validated enforcement write.
///
/// Only the lock state machine can construct one, so no other write path can
/// touch `is_locked`, `status`, or `lock_message`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnforcementPatch {
    state: EnforcementState,
    at: DateTime<Utc>,
}

impl EnforcementPatch {
    pub(crate) fn new(state: EnforcementState, at: DateTime<Utc>) -> Self {
        Self { state, at }
    }

    pub fn state(&self) -> &EnforcementState {
        &self.state
    }

    pub fn at(&self) -> DateTime<Utc> {
        self.at
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    #[schema(value_type = String)]
    pub id: DeviceId,
    pub imei1: String,
    /// Empty when the handset has a single slot.
    pub imei2: String,
    pub customer_id: String,
    pub customer_name: String,
    pub mobile: String,
    pub email: String,
    pub model: String,
    #[schema(value_type = String)]
    pub vendor_id: VendorId,
    pub vendor_mobile: String,
    pub emi_amount: f64,
    pub emi_months: u32,
    pub due_date: NaiveDate,
    pub is_locked: bool,
    pub status: DeviceStatus,
    pub lock_message: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub locked_at: Option<DateTime<Utc>>,
}

impl Device {
    /// Build the initial record for a fresh enrollment. Always `Active`.
    pub fn enrolled(id: DeviceId, new: NewDevice, now: DateTime<Utc>) -> Self {
        Self {
            id,
            imei1: new.imei1,
            imei2: new.imei2,
            customer_id: new.customer_id,
            customer_name: new.customer_name,
            mobile: new.mobile,
            email: new.email,
            model: new.model,
            vendor_id: new.vendor_id,
            vendor_mobile: new.vendor_mobile,
            emi_amount: new.emi_amount,
            emi_months: new.emi_months,
            due_date: new.due_date,
            is_locked: false,
            status: DeviceStatus::Active,
            lock_message: String::new(),
            created_at: now,
            updated_at: now,
            locked_at: None,
        }
    }

    pub fn enforcement_state(&self) -> EnforcementState {
        if self.is_locked {
            EnforcementState::Locked {
                message: self.lock_message.clone(),
            }
        } else {
            EnforcementState::Active
        }
    }

    /// Write every enforcement field from one patch.
    pub fn apply_enforcement(&mut self, patch: &EnforcementPatch) {
        let state = patch.state();
        self.is_locked = state.is_locked();
        self.status = state.status();
        self.lock_message = state.lock_message().to_string();
        self.locked_at = state.is_locked().then(|| patch.at());
        self.updated_at = patch.at();
    }
}

/// Device fields handed to the store at enrollment.
///
/// Deliberately has no enforcement fields: a new record always starts active.
#[derive(Debug, Clone, PartialEq)]
pub struct NewDevice {
    pub imei1: String,
    pub imei2: String,
    pub customer_id: String,
    pub customer_name: String,
    pub mobile: String,
    pub email: String,
    pub model: String,
    pub vendor_id: VendorId,
    pub vendor_mobile: String,
    pub emi_amount: f64,
    pub emi_months: u32,
    pub due_date: NaiveDate,
}

/// Equality filters over device fields. `None` matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceFilter {
    pub vendor_id: Option<VendorId>,
    pub status: Option<DeviceStatus>,
    pub customer_id: Option<String>,
}

impl DeviceFilter {
    pub fn matches(&self, device: &Device) -> bool {
        self.vendor_id.is_none_or(|v| device.vendor_id == v)
            && self.status.is_none_or(|s| device.status == s)
            && self
                .customer_id
                .as_ref()
                .is_none_or(|c| &device.customer_id == c)
    }
}
