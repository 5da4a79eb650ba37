// Shared identifiers and hardware/phone helpers used across emilock crates.
pub mod imei;
pub mod phone;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid id: {0}")]
    InvalidId(String),
}

pub mod ids {
    // Strongly typed IDs so vendor and device keys cannot be swapped.
    use super::{Error, Result};
    use serde::{Deserialize, Serialize};
    use std::fmt;
    use std::str::FromStr;
    use uuid::Uuid;

    macro_rules! id_type {
        ($name:ident) => {
            #[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
            #[serde(transparent)]
            pub struct $name(Uuid);

            impl $name {
                // Store-assigned ids are random v4 UUIDs.
                pub fn new() -> Self {
                    Self(Uuid::new_v4())
                }

                // Wrap an existing UUID when decoding from storage.
                pub fn from_uuid(uuid: Uuid) -> Self {
                    Self(uuid)
                }

                pub fn as_uuid(&self) -> Uuid {
                    self.0
                }
            }

            impl Default for $name {
                fn default() -> Self {
                    Self::new()
                }
            }

            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    write!(f, "{}", self.0)
                }
            }

            impl FromStr for $name {
                type Err = Error;

                fn from_str(input: &str) -> Result<Self> {
                    let uuid =
                        Uuid::parse_str(input).map_err(|_| Error::InvalidId(input.into()))?;
                    Ok(Self(uuid))
                }
            }
        };
    }

    id_type!(VendorId);
    id_type!(DeviceId);
}

#[cfg(test)]
mod tests {
    use super::Error;
    use super::ids::{DeviceId, VendorId};
    use std::str::FromStr;

    #[test]
    fn vendor_id_round_trip() {
        let vendor = VendorId::new();
        let parsed = VendorId::from_str(&vendor.to_string()).expect("parse");
        assert_eq!(vendor, parsed);
    }

    #[test]
    fn device_id_rejects_invalid_input() {
        let err = DeviceId::from_str("not-a-uuid").expect_err("invalid");
        assert!(matches!(err, Error::InvalidId(s) if s == "not-a-uuid"));
    }

    #[test]
    fn distinct_ids_are_unique() {
        assert_ne!(DeviceId::new(), DeviceId::new());
    }
}
