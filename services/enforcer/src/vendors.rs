//! Vendor onboarding and review.
//!
//! # Purpose
//! Shops register themselves and wait in `pending` until a super admin
//! approves them. Approval, suspension, and reinstatement all go through
//! [`VendorOnboarding::set_status`].
//!
//! # Key invariants
//! - Vendor mobiles are normalized to E.164 before storage so the identity
//!   resolver can match any spelling of the same number. Anything that does
//!   not normalize to `+` and 8 to 15 digits is rejected.
//! - No transition leads back into `pending`.
//! - Scope is re-derived per request, so a suspension applies to the
//!   vendor's next call without any session invalidation.
use crate::auth::Actor;
use crate::error::{CoreError, CoreResult};
use crate::model::{KycAssets, NewVendor, Vendor, VendorFilter, VendorPatch, VendorStatus};
use crate::store::{CONFLICT_VENDOR_MOBILE, EnforcementStore, StoreError};
use chrono::Utc;
use emilock_common::ids::VendorId;
use emilock_common::phone;
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;

/// Fields a shop submits when registering.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VendorRegistration {
    pub shop_name: String,
    pub owner_name: String,
    pub mobile: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub kyc_assets: KycAssets,
}

#[derive(Clone)]
pub struct VendorOnboarding {
    store: Arc<dyn EnforcementStore>,
    default_country_code: String,
}

impl VendorOnboarding {
    pub fn new(store: Arc<dyn EnforcementStore>, default_country_code: &str) -> Self {
        Self {
            store,
            default_country_code: default_country_code.to_string(),
        }
    }

    pub async fn register(&self, fields: VendorRegistration) -> CoreResult<Vendor> {
        let shop_name = required(&fields.shop_name, "shopName")?;
        let owner_name = required(&fields.owner_name, "ownerName")?;
        let mobile = phone::normalize_e164(&fields.mobile, &self.default_country_code)
            .ok_or_else(|| CoreError::Validation("mobile must be a valid phone number".to_string()))?;
        let vendor = self
            .store
            .insert_vendor(NewVendor {
                shop_name,
                owner_name,
                mobile,
                email: fields.email.trim().to_string(),
                kyc_assets: fields.kyc_assets,
                join_date: Utc::now().date_naive(),
            })
            .await
            .map_err(|err| match err {
                StoreError::Conflict(reason) if reason == CONFLICT_VENDOR_MOBILE => {
                    CoreError::Conflict("mobile already registered".to_string())
                }
                other => CoreError::StoreUnavailable(other),
            })?;
        tracing::info!(vendor_id = %vendor.id, "vendor registered");
        Ok(vendor)
    }

    /// Super-admin listing. `search` matches shop and owner names
    /// case-insensitively and the mobile by digit substring.
    pub async fn list(
        &self,
        actor: &Actor,
        status: Option<VendorStatus>,
        search: Option<&str>,
    ) -> CoreResult<Vec<Vendor>> {
        if !actor.is_super_admin() {
            return Err(CoreError::AdminOnly);
        }
        let vendors = self
            .store
            .query_vendors(&VendorFilter {
                mobile: None,
                status,
            })
            .await?;
        let needle = search
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty());
        Ok(match needle {
            Some(needle) => vendors
                .into_iter()
                .filter(|vendor| matches_search(vendor, &needle))
                .collect(),
            None => vendors,
        })
    }

    /// A super admin may read any vendor; a vendor only itself.
    pub async fn get(&self, actor: &Actor, id: &VendorId) -> CoreResult<Vendor> {
        let is_self = actor.vendor_record().is_some_and(|v| v.id == *id);
        if !actor.is_super_admin() && !is_self {
            return Err(CoreError::NotAvailable);
        }
        self.store
            .get_vendor(id)
            .await?
            .ok_or(CoreError::NotAvailable)
    }

    pub async fn set_status(
        &self,
        actor: &Actor,
        id: &VendorId,
        status: VendorStatus,
    ) -> CoreResult<Vendor> {
        if !actor.is_super_admin() {
            return Err(CoreError::AdminOnly);
        }
        if status == VendorStatus::Pending {
            return Err(CoreError::Validation(
                "vendors cannot be returned to pending".to_string(),
            ));
        }
        let current = self
            .store
            .get_vendor(id)
            .await?
            .ok_or(CoreError::NotAvailable)?;
        if current.status == status {
            return Ok(current);
        }
        let updated = self
            .store
            .update_vendor(
                id,
                VendorPatch {
                    status: Some(status),
                },
            )
            .await
            .map_err(|err| match err {
                StoreError::NotFound(_) => CoreError::NotAvailable,
                other => CoreError::StoreUnavailable(other),
            })?;
        tracing::info!(
            vendor_id = %updated.id,
            from = current.status.as_str(),
            to = updated.status.as_str(),
            "vendor status changed"
        );
        Ok(updated)
    }
}

fn required(value: &str, field: &str) -> CoreResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

fn matches_search(vendor: &Vendor, needle: &str) -> bool {
    vendor.shop_name.to_lowercase().contains(needle)
        || vendor.owner_name.to_lowercase().contains(needle)
        || vendor.mobile.contains(needle)
}
