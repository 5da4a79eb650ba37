//! Device registry.
//!
//! # Purpose
//! Enrollment, scoped reads, dashboard totals, and the entry point for lock
//! commands. Every read and write goes through the actor's [`Scope`], so a
//! vendor never sees or changes another vendor's devices.
//!
//! # Key invariants
//! - Validation (required fields, IMEI checksums, amounts, lock message)
//!   happens before any store access.
//! - `vendor_id` and `vendor_mobile` come from the resolved actor, never from
//!   the request body.
//! - The IMEI pair is stored sorted so slot numbering does not depend on
//!   entry order.
//! - Out-of-scope and missing devices both yield [`CoreError::NotAvailable`].
//! - Store failures are surfaced as [`CoreError::StoreUnavailable`]; nothing
//!   is retried except a customer-id collision on insert.
use crate::auth::{Actor, Scope};
use crate::enforcement::{self, LockCommand};
use crate::error::{CoreError, CoreResult, ImeiSlot};
use crate::model::{Device, DeviceStatus, NewDevice, VendorFilter};
use crate::store::{CONFLICT_CUSTOMER_ID, EnforcementStore, StoreError};
use chrono::{Months, NaiveDate, Utc};
use emilock_common::ids::DeviceId;
use emilock_common::imei;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};

pub const CUSTOMER_ID_PREFIX: &str = "EMI-";
pub const CUSTOMER_ID_LEN: usize = 9;
pub const DEFAULT_EMI_MONTHS: u32 = 12;
/// Longest schedule accepted: thirty years of monthly installments.
pub const MAX_EMI_MONTHS: u32 = 360;
const CUSTOMER_ID_ATTEMPTS: usize = 5;
const CUSTOMER_ID_ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Client-supplied enrollment fields.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeviceEnrollment {
    pub customer_name: String,
    pub mobile: String,
    #[serde(default)]
    pub email: String,
    pub model: String,
    pub imei1: String,
    #[serde(default)]
    pub imei2: String,
    pub emi_amount: f64,
    #[serde(default)]
    pub emi_months: Option<u32>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DeviceQuery {
    /// Case-insensitive match on customer name or model, substring on IMEIs.
    pub search: Option<String>,
    /// `active` or `locked`.
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema, PartialEq, Eq)]
pub struct DashboardStats {
    pub total: usize,
    pub locked: usize,
    pub active: usize,
    /// Vendor count; only reported to super admins.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vendors: Option<usize>,
}

type CustomerIdSource = Arc<dyn Fn() -> String + Send + Sync>;

#[derive(Clone)]
pub struct DeviceRegistry {
    store: Arc<dyn EnforcementStore>,
    customer_ids: CustomerIdSource,
}

impl DeviceRegistry {
    pub fn new(store: Arc<dyn EnforcementStore>) -> Self {
        Self {
            store,
            customer_ids: Arc::new(generate_customer_id),
        }
    }

    /// Replace the customer-id generator.
    pub fn with_customer_id_source(
        mut self,
        source: impl Fn() -> String + Send + Sync + 'static,
    ) -> Self {
        self.customer_ids = Arc::new(source);
        self
    }

    /// Enroll a device for the acting vendor. New records always start active.
    pub async fn create(&self, actor: &Actor, fields: DeviceEnrollment) -> CoreResult<Device> {
        let vendor = actor.vendor_record().ok_or(CoreError::VendorOnly)?;
        let validated = validate_enrollment(fields, Utc::now().date_naive())?;

        for attempt in 1..=CUSTOMER_ID_ATTEMPTS {
            let customer_id = (self.customer_ids)();
            let new = NewDevice {
                imei1: validated.imei1.clone(),
                imei2: validated.imei2.clone(),
                customer_id,
                customer_name: validated.customer_name.clone(),
                mobile: validated.mobile.clone(),
                email: validated.email.clone(),
                model: validated.model.clone(),
                vendor_id: vendor.id,
                vendor_mobile: vendor.mobile.clone(),
                emi_amount: validated.emi_amount,
                emi_months: validated.emi_months,
                due_date: validated.due_date,
            };
            match self.store.insert_device(new).await {
                Ok(device) => {
                    metrics::counter!("emilock_devices_enrolled_total").increment(1);
                    tracing::info!(
                        device_id = %device.id,
                        vendor_id = %vendor.id,
                        customer_id = %device.customer_id,
                        "device enrolled"
                    );
                    return Ok(device);
                }
                Err(StoreError::Conflict(reason)) if reason == CONFLICT_CUSTOMER_ID => {
                    tracing::debug!(attempt, "customer id collision, regenerating");
                }
                Err(err) => return Err(store_unavailable(err)),
            }
        }
        Err(CoreError::Conflict(
            "could not allocate a unique customer id".to_string(),
        ))
    }

    /// Devices visible to `actor`, in store order.
    pub async fn list(&self, actor: &Actor, query: &DeviceQuery) -> CoreResult<Vec<Device>> {
        let mut filter = actor.scope().device_filter();
        if let Some(status) = query.status.as_deref().filter(|s| !s.is_empty()) {
            filter.status = Some(DeviceStatus::parse(status).ok_or_else(|| {
                CoreError::Validation(format!("unknown device status: {status}"))
            })?);
        }
        let devices = self
            .store
            .query_devices(&filter)
            .await
            .map_err(store_unavailable)?;
        let scope = actor.scope();
        let needle = query
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);
        Ok(devices
            .into_iter()
            .filter(|device| scope.permits(device))
            .filter(|device| needle.as_deref().is_none_or(|n| matches_search(device, n)))
            .collect())
    }

    /// One device, if it exists and is inside the actor's scope.
    pub async fn get(&self, actor: &Actor, id: &DeviceId) -> CoreResult<Device> {
        let device = self
            .store
            .get_device(id)
            .await
            .map_err(store_unavailable)?
            .ok_or(CoreError::NotAvailable)?;
        ensure_in_scope(actor.scope(), &device)?;
        Ok(device)
    }

    /// Apply a lock or unlock command to a device in the actor's scope.
    pub async fn update_enforcement(
        &self,
        actor: &Actor,
        id: &DeviceId,
        command: LockCommand,
    ) -> CoreResult<Device> {
        let target = command.target()?;
        let device = self.get(actor, id).await?;
        let Some(patch) = enforcement::transition(&device.enforcement_state(), target, Utc::now())
        else {
            tracing::debug!(device_id = %device.id, command = command.name(), "enforcement unchanged");
            return Ok(device);
        };
        let updated = self
            .store
            .update_device_enforcement(&device.id, &patch)
            .await
            .map_err(|err| match err {
                StoreError::NotFound(_) => CoreError::NotAvailable,
                other => store_unavailable(other),
            })?;
        metrics::counter!("emilock_lock_commands_total", "command" => command.name()).increment(1);
        tracing::info!(
            device_id = %updated.id,
            command = command.name(),
            role = actor.role().as_str(),
            "enforcement state changed"
        );
        Ok(updated)
    }

    /// Totals over the actor's scoped device listing.
    pub async fn stats(&self, actor: &Actor) -> CoreResult<DashboardStats> {
        let devices = self.list(actor, &DeviceQuery::default()).await?;
        let locked = devices.iter().filter(|d| d.is_locked).count();
        let vendors = if actor.is_super_admin() {
            Some(
                self.store
                    .query_vendors(&VendorFilter::default())
                    .await
                    .map_err(store_unavailable)?
                    .len(),
            )
        } else {
            None
        };
        Ok(DashboardStats {
            total: devices.len(),
            locked,
            active: devices.len() - locked,
            vendors,
        })
    }

    /// Unscoped lookup for the on-device agent, which holds the opaque id.
    pub async fn agent_view(&self, id: &DeviceId) -> CoreResult<Device> {
        self.store
            .get_device(id)
            .await
            .map_err(store_unavailable)?
            .ok_or(CoreError::NotAvailable)
    }
}

fn ensure_in_scope(scope: Scope, device: &Device) -> CoreResult<()> {
    if scope.permits(device) {
        return Ok(());
    }
    metrics::counter!("emilock_scope_denials_total").increment(1);
    tracing::warn!(device_id = %device.id, "device outside actor scope");
    Err(CoreError::NotAvailable)
}

fn store_unavailable(err: StoreError) -> CoreError {
    tracing::error!(error = %err, "store operation failed");
    CoreError::StoreUnavailable(err)
}

fn matches_search(device: &Device, needle: &str) -> bool {
    device.customer_name.to_lowercase().contains(needle)
        || device.model.to_lowercase().contains(needle)
        || device.imei1.contains(needle)
        || (!device.imei2.is_empty() && device.imei2.contains(needle))
}

/// `EMI-` followed by nine characters from `[0-9A-Z]`.
pub fn generate_customer_id() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..CUSTOMER_ID_LEN)
        .map(|_| CUSTOMER_ID_ALPHABET[rng.gen_range(0..CUSTOMER_ID_ALPHABET.len())] as char)
        .collect();
    format!("{CUSTOMER_ID_PREFIX}{suffix}")
}

#[derive(Debug, Clone, PartialEq)]
struct ValidatedEnrollment {
    customer_name: String,
    mobile: String,
    email: String,
    model: String,
    imei1: String,
    imei2: String,
    emi_amount: f64,
    emi_months: u32,
    due_date: NaiveDate,
}

fn required(value: String, field: &str) -> CoreResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

fn validate_enrollment(fields: DeviceEnrollment, today: NaiveDate) -> CoreResult<ValidatedEnrollment> {
    let customer_name = required(fields.customer_name, "customerName")?;
    let mobile = required(fields.mobile, "mobile")?;
    let model = required(fields.model, "model")?;

    let (imei1, imei2) = normalize_imei_pair(fields.imei1.trim(), fields.imei2.trim())?;

    if !fields.emi_amount.is_finite() || fields.emi_amount < 0.0 {
        return Err(CoreError::Validation(
            "emiAmount must be a non-negative number".to_string(),
        ));
    }
    let emi_months = fields.emi_months.unwrap_or(DEFAULT_EMI_MONTHS);
    if !(1..=MAX_EMI_MONTHS).contains(&emi_months) {
        return Err(CoreError::Validation(format!(
            "emiMonths must be between 1 and {MAX_EMI_MONTHS}"
        )));
    }
    let due_date = match fields.due_date {
        Some(date) => date,
        None => today
            .checked_add_months(Months::new(1))
            .ok_or_else(|| CoreError::Validation("dueDate out of range".to_string()))?,
    };

    Ok(ValidatedEnrollment {
        customer_name,
        mobile,
        email: fields.email.trim().to_string(),
        model,
        imei1,
        imei2,
        emi_amount: fields.emi_amount,
        emi_months,
        due_date,
    })
}

/// Validate both slots and return them in lexicographic order.
fn normalize_imei_pair(imei1: &str, imei2: &str) -> CoreResult<(String, String)> {
    if !imei::validate(imei1) {
        return Err(CoreError::InvalidHardwareId {
            slot: ImeiSlot::Primary,
        });
    }
    if imei2.is_empty() {
        return Ok((imei1.to_string(), String::new()));
    }
    if !imei::validate(imei2) {
        return Err(CoreError::InvalidHardwareId {
            slot: ImeiSlot::Secondary,
        });
    }
    if imei1 == imei2 {
        return Err(CoreError::DuplicateHardwareId);
    }
    let (low, high) = if imei2 < imei1 {
        (imei2, imei1)
    } else {
        (imei1, imei2)
    };
    Ok((low.to_string(), high.to_string()))
}
