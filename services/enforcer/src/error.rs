//! Error taxonomy of the enforcement core.
//!
//! Out-of-scope and missing devices share [`CoreError::NotAvailable`] so a
//! caller cannot learn whether another tenant's record exists.
use crate::store::StoreError;
use thiserror::Error;

/// Which IMEI slot failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImeiSlot {
    Primary,
    Secondary,
}

impl std::fmt::Display for ImeiSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImeiSlot::Primary => f.write_str("imei1"),
            ImeiSlot::Secondary => f.write_str("imei2"),
        }
    }
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("{slot} is not a valid 15-digit IMEI")]
    InvalidHardwareId { slot: ImeiSlot },
    #[error("imei1 and imei2 must differ")]
    DuplicateHardwareId,
    #[error("lock message is required")]
    MissingLockMessage,
    #[error("not available")]
    NotAvailable,
    #[error("actor has no tenant scope")]
    NoScope,
    #[error("super admin required")]
    AdminOnly,
    #[error("vendor session required")]
    VendorOnly,
    #[error("{0}")]
    Validation(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("store unavailable")]
    StoreUnavailable(#[source] StoreError),
}

impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        CoreError::StoreUnavailable(err)
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
