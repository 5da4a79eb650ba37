//! Provisioning manifest builder.
//!
//! # Purpose
//! Projects a device record into the JSON payload a factory-reset handset
//! scans during device-owner enrollment. The payload names the admin
//! component and agent package, and carries the device's identity fields so
//! the agent can bind itself to the record on first boot.
//!
//! # Key invariants
//! - Pure and read-only: building a manifest never touches the store.
//! - Deterministic: the same device snapshot and origin always serialize to
//!   the same bytes (struct field order fixes key order).
use crate::config::ProvisioningConfig;
use crate::model::Device;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, ToSchema, PartialEq, Eq)]
pub struct ProvisioningManifest {
    #[serde(rename = "android.app.extra.PROVISIONING_DEVICE_ADMIN_COMPONENT_NAME")]
    pub admin_component: String,
    #[serde(rename = "android.app.extra.PROVISIONING_DEVICE_ADMIN_PACKAGE_DOWNLOAD_LOCATION")]
    pub package_download_location: String,
    #[serde(rename = "android.app.extra.PROVISIONING_DEVICE_ADMIN_SIGNATURE_CHECKSUM")]
    pub signature_checksum: String,
    #[serde(rename = "android.app.extra.PROVISIONING_ADMIN_EXTRAS_BUNDLE")]
    pub admin_extras: AdminExtras,
}

/// Device identity handed to the agent on first boot.
#[derive(Debug, Clone, Serialize, ToSchema, PartialEq, Eq)]
pub struct AdminExtras {
    #[serde(rename = "customerName")]
    pub customer_name: String,
    pub mobile: String,
    pub email: String,
    pub imei1: String,
    pub imei2: String,
    pub server_url: String,
    pub project_id: String,
}

#[derive(Debug, Clone)]
pub struct ProvisioningBuilder {
    admin_component: String,
    package_url: String,
    signature_checksum: String,
    project_id: String,
    server_origin: String,
}

impl ProvisioningBuilder {
    pub fn from_config(config: &ProvisioningConfig) -> Self {
        Self {
            admin_component: config.admin_component.clone(),
            package_url: config.package_url.clone(),
            signature_checksum: config.signature_checksum.clone(),
            project_id: config.project_id.clone(),
            server_origin: config.server_origin.trim_end_matches('/').to_string(),
        }
    }

    /// Origin the service was configured to advertise.
    pub fn server_origin(&self) -> &str {
        &self.server_origin
    }

    pub fn build(&self, device: &Device, server_origin: &str) -> ProvisioningManifest {
        ProvisioningManifest {
            admin_component: self.admin_component.clone(),
            package_download_location: self.package_url.clone(),
            signature_checksum: self.signature_checksum.clone(),
            admin_extras: AdminExtras {
                customer_name: device.customer_name.clone(),
                mobile: device.mobile.clone(),
                email: device.email.clone(),
                imei1: device.imei1.clone(),
                imei2: device.imei2.clone(),
                server_url: server_origin.to_string(),
                project_id: self.project_id.clone(),
            },
        }
    }

    /// Manifest against the configured origin.
    pub fn manifest(&self, device: &Device) -> ProvisioningManifest {
        self.build(device, &self.server_origin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DEFAULT_AGENT_COMPONENT, DEFAULT_AGENT_PACKAGE_URL, DEFAULT_PROJECT_ID};
    use crate::model::NewDevice;
    use chrono::{NaiveDate, Utc};
    use emilock_common::ids::{DeviceId, VendorId};

    fn builder() -> ProvisioningBuilder {
        ProvisioningBuilder::from_config(&ProvisioningConfig {
            server_origin: "https://emi.example.com/".to_string(),
            project_id: DEFAULT_PROJECT_ID.to_string(),
            admin_component: DEFAULT_AGENT_COMPONENT.to_string(),
            package_url: DEFAULT_AGENT_PACKAGE_URL.to_string(),
            signature_checksum: "I5YvS0O5hXY46mb01BlRjq4oJJGs2kuUcHvVkAPEXlg".to_string(),
        })
    }

    fn device() -> Device {
        Device::enrolled(
            DeviceId::new(),
            NewDevice {
                imei1: "123000000000002".to_string(),
                imei2: "991000000000001".to_string(),
                customer_id: "EMI-ABC123XYZ".to_string(),
                customer_name: "Rajesh Kumar".to_string(),
                mobile: "+919000000001".to_string(),
                email: "rajesh@example.com".to_string(),
                model: "Narzo 60".to_string(),
                vendor_id: VendorId::new(),
                vendor_mobile: "+919000000002".to_string(),
                emi_amount: 1500.0,
                emi_months: 12,
                due_date: NaiveDate::from_ymd_opt(2026, 11, 18).expect("date"),
            },
            Utc::now(),
        )
    }

    #[test]
    fn manifest_is_deterministic() {
        let builder = builder();
        let device = device();
        let first = serde_json::to_vec(&builder.build(&device, "https://a.example")).expect("json");
        let second =
            serde_json::to_vec(&builder.build(&device, "https://a.example")).expect("json");
        assert_eq!(first, second);
    }

    #[test]
    fn manifest_has_fixed_keys_and_device_identity() {
        let value = serde_json::to_value(builder().manifest(&device())).expect("json");
        assert_eq!(
            value["android.app.extra.PROVISIONING_DEVICE_ADMIN_COMPONENT_NAME"],
            DEFAULT_AGENT_COMPONENT
        );
        assert_eq!(
            value["android.app.extra.PROVISIONING_DEVICE_ADMIN_PACKAGE_DOWNLOAD_LOCATION"],
            DEFAULT_AGENT_PACKAGE_URL
        );
        assert!(value
            .get("android.app.extra.PROVISIONING_DEVICE_ADMIN_SIGNATURE_CHECKSUM")
            .is_some());
        let extras = &value["android.app.extra.PROVISIONING_ADMIN_EXTRAS_BUNDLE"];
        assert_eq!(extras["customerName"], "Rajesh Kumar");
        assert_eq!(extras["imei1"], "123000000000002");
        assert_eq!(extras["imei2"], "991000000000001");
        assert_eq!(extras["server_url"], "https://emi.example.com");
        assert_eq!(extras["project_id"], DEFAULT_PROJECT_ID);
        assert_eq!(extras.as_object().map(|o| o.len()), Some(7));
    }

    #[test]
    fn enforcement_state_does_not_change_the_manifest() {
        let builder = builder();
        let mut device = device();
        let before = builder.manifest(&device);
        device.is_locked = true;
        device.lock_message = "Pay".to_string();
        assert_eq!(builder.manifest(&device), before);
    }
}
