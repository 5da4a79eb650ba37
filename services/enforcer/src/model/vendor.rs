//! Vendor (tenant) records.
//!
//! # Purpose
//! A vendor is a shop that enrolls customer devices. Its `mobile` is the key
//! the identity resolver uses to bind a session to a tenant.
use chrono::{DateTime, NaiveDate, Utc};
use emilock_common::ids::VendorId;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum VendorStatus {
    Pending,
    Active,
    Suspended,
}

impl VendorStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VendorStatus::Pending => "pending",
            VendorStatus::Active => "active",
            VendorStatus::Suspended => "suspended",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(VendorStatus::Pending),
            "active" => Some(VendorStatus::Active),
            "suspended" => Some(VendorStatus::Suspended),
            _ => None,
        }
    }
}

/// References to identity-document images uploaded during registration.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct KycAssets {
    pub id_front: Option<String>,
    pub id_back: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Vendor {
    #[schema(value_type = String)]
    pub id: VendorId,
    pub shop_name: String,
    pub owner_name: String,
    pub mobile: String,
    pub email: String,
    pub status: VendorStatus,
    pub kyc_assets: KycAssets,
    pub join_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

/// Vendor fields supplied at registration; the store assigns id and timestamps.
#[derive(Debug, Clone)]
pub struct NewVendor {
    pub shop_name: String,
    pub owner_name: String,
    pub mobile: String,
    pub email: String,
    pub kyc_assets: KycAssets,
    pub join_date: NaiveDate,
}

/// Equality filters over vendor fields. `None` matches everything.
#[derive(Debug, Clone, Default)]
pub struct VendorFilter {
    pub mobile: Option<String>,
    pub status: Option<VendorStatus>,
}

impl VendorFilter {
    pub fn by_mobile(mobile: impl Into<String>) -> Self {
        Self {
            mobile: Some(mobile.into()),
            status: None,
        }
    }

    pub fn matches(&self, vendor: &Vendor) -> bool {
        self.mobile.as_ref().is_none_or(|m| &vendor.mobile == m)
            && self.status.is_none_or(|s| vendor.status == s)
    }
}

#[derive(Debug, Clone, Default)]
pub struct VendorPatch {
    pub status: Option<VendorStatus>,
}
