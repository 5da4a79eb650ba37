//! Tenant identity resolution.
//!
//! # Purpose
//! The single place that decides who an authenticated session is: a platform
//! owner ([`Role::SuperAdmin`]) or a shop ([`Role::Vendor`]), and which device
//! records that actor may see or change ([`Scope`]).
//!
//! # Key invariants
//! - SuperAdmin iff the session's phone or email is on the owner allowlist,
//!   the trusted issuer set `role = "super_admin"`, or the session is
//!   anonymous and the anonymous bypass is explicitly enabled.
//! - Every other actor must map to an `active` vendor record by mobile.
//!   Unknown, `pending`, and `suspended` vendors get [`CoreError::NoScope`].
//! - Resolution runs on every request; nothing is cached between calls, so a
//!   suspension takes effect on the vendor's next request.
use crate::auth::session::SessionIdentity;
use crate::config::OwnerConfig;
use crate::error::{CoreError, CoreResult};
use crate::model::{Device, DeviceFilter, Vendor, VendorFilter, VendorStatus};
use crate::store::EnforcementStore;
use emilock_common::ids::VendorId;
use emilock_common::phone;
use serde::Serialize;
use std::collections::HashSet;
use utoipa::ToSchema;

/// Role claim value that grants SuperAdmin when issued by the trusted issuer.
pub const SUPER_ADMIN_ROLE_CLAIM: &str = "super_admin";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    SuperAdmin,
    Vendor,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "super_admin",
            Role::Vendor => "vendor",
        }
    }
}

/// Which device records an actor may touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    All,
    Vendor(VendorId),
}

impl Scope {
    pub fn permits(&self, device: &Device) -> bool {
        match self {
            Scope::All => true,
            Scope::Vendor(vendor_id) => device.vendor_id == *vendor_id,
        }
    }

    /// Store filter that yields exactly the devices this scope permits.
    pub fn device_filter(&self) -> DeviceFilter {
        match self {
            Scope::All => DeviceFilter::default(),
            Scope::Vendor(vendor_id) => DeviceFilter {
                vendor_id: Some(*vendor_id),
                ..DeviceFilter::default()
            },
        }
    }
}

/// A fully resolved caller.
#[derive(Debug, Clone)]
pub struct Actor {
    identity: SessionIdentity,
    role: Role,
    scope: Scope,
    vendor: Option<Vendor>,
}

impl Actor {
    pub fn super_admin(identity: SessionIdentity) -> Self {
        Self {
            identity,
            role: Role::SuperAdmin,
            scope: Scope::All,
            vendor: None,
        }
    }

    pub fn vendor(identity: SessionIdentity, vendor: Vendor) -> Self {
        Self {
            identity,
            role: Role::Vendor,
            scope: Scope::Vendor(vendor.id),
            vendor: Some(vendor),
        }
    }

    pub fn identity(&self) -> &SessionIdentity {
        &self.identity
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    /// The vendor tenant record, for vendor actors.
    pub fn vendor_record(&self) -> Option<&Vendor> {
        self.vendor.as_ref()
    }

    pub fn is_super_admin(&self) -> bool {
        self.role == Role::SuperAdmin
    }
}

#[derive(Debug, Clone)]
pub struct TenantIdentityResolver {
    admin_phones: HashSet<String>,
    admin_emails: HashSet<String>,
    allow_anonymous_admin: bool,
    default_country_code: String,
}

impl TenantIdentityResolver {
    pub fn from_config(config: &OwnerConfig) -> Self {
        let admin_phones = config
            .phones
            .iter()
            .filter_map(|raw| phone::normalize(raw, &config.default_country_code))
            .collect();
        let admin_emails = config
            .emails
            .iter()
            .map(|raw| normalize_email(raw))
            .filter(|email| !email.is_empty())
            .collect();
        if config.allow_anonymous_admin {
            tracing::warn!("anonymous sessions are treated as super admin");
        }
        Self {
            admin_phones,
            admin_emails,
            allow_anonymous_admin: config.allow_anonymous_admin,
            default_country_code: config.default_country_code.clone(),
        }
    }

    pub fn normalize_phone(&self, raw: &str) -> Option<String> {
        phone::normalize(raw, &self.default_country_code)
    }

    /// Role from session attributes alone. A `Vendor` result still needs a
    /// tenant record before it carries any scope.
    pub fn resolve_role(&self, identity: &SessionIdentity) -> Role {
        let phone_match = identity
            .phone
            .as_deref()
            .and_then(|raw| self.normalize_phone(raw))
            .is_some_and(|phone| self.admin_phones.contains(&phone));
        let email_match = identity
            .email
            .as_deref()
            .map(normalize_email)
            .is_some_and(|email| self.admin_emails.contains(&email));
        let role_claim = identity.role_claim.as_deref() == Some(SUPER_ADMIN_ROLE_CLAIM);
        let anonymous_bypass = identity.anonymous && self.allow_anonymous_admin;
        if phone_match || email_match || role_claim || anonymous_bypass {
            Role::SuperAdmin
        } else {
            Role::Vendor
        }
    }

    /// Vendor record registered under the session's phone, in any status.
    pub async fn lookup_vendor(
        &self,
        store: &dyn EnforcementStore,
        identity: &SessionIdentity,
    ) -> CoreResult<Option<Vendor>> {
        let Some(mobile) = identity
            .phone
            .as_deref()
            .and_then(|raw| self.normalize_phone(raw))
        else {
            return Ok(None);
        };
        let mut vendors = store
            .query_vendors(&VendorFilter::by_mobile(mobile))
            .await?;
        Ok(vendors.pop())
    }

    /// Resolve a session into an actor with a usable scope.
    pub async fn resolve(
        &self,
        store: &dyn EnforcementStore,
        identity: SessionIdentity,
    ) -> CoreResult<Actor> {
        if self.resolve_role(&identity) == Role::SuperAdmin {
            return Ok(Actor::super_admin(identity));
        }
        match self.lookup_vendor(store, &identity).await? {
            Some(vendor) if vendor.status == VendorStatus::Active => {
                Ok(Actor::vendor(identity, vendor))
            }
            Some(vendor) => {
                metrics::counter!("emilock_scope_denials_total").increment(1);
                tracing::info!(
                    vendor_id = %vendor.id,
                    status = vendor.status.as_str(),
                    "vendor without active status denied scope"
                );
                Err(CoreError::NoScope)
            }
            None => {
                metrics::counter!("emilock_scope_denials_total").increment(1);
                tracing::info!(subject = %identity.subject, "session maps to no vendor");
                Err(CoreError::NoScope)
            }
        }
    }
}

fn normalize_email(raw: &str) -> String {
    raw.trim().to_ascii_lowercase()
}
