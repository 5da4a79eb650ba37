//! IMEI validation and input cleanup.
//!
//! # Purpose
//! Checks 15-digit hardware identifiers with the Luhn-style checksum used by
//! handset manufacturers, and cleans raw operator input before validation.
//!
//! # Key invariants
//! - Only exactly 15 ASCII digits can be valid; there is no partial validity.
//! - Digits at odd indices (0-based, left to right) are doubled, and doubled
//!   values above 9 have 9 subtracted; the total must be a multiple of 10.
//!
//! # Examples
//! ```rust
//! use emilock_common::imei;
//!
//! assert!(imei::validate("490154203237518"));
//! assert!(!imei::validate("490154203237519"));
//! assert_eq!(imei::normalize_input("4901-5420 3237-518"), "490154203237518");
//! ```

/// Number of digits in an IMEI.
pub const IMEI_LEN: usize = 15;

/// Return `true` if `candidate` is a well-formed, checksum-valid IMEI.
pub fn validate(candidate: &str) -> bool {
    let bytes = candidate.as_bytes();
    if bytes.len() != IMEI_LEN || !bytes.iter().all(u8::is_ascii_digit) {
        return false;
    }
    let sum: u32 = bytes
        .iter()
        .enumerate()
        .map(|(index, byte)| {
            let digit = u32::from(byte - b'0');
            if index % 2 == 1 {
                let doubled = digit * 2;
                if doubled > 9 { doubled - 9 } else { doubled }
            } else {
                digit
            }
        })
        .sum();
    sum % 10 == 0
}

/// Strip every non-digit and keep at most the first 15 digits.
///
/// This mirrors what operator-facing forms do with typed or scanned input.
/// The result still has to pass [`validate`].
pub fn normalize_input(raw: &str) -> String {
    raw.chars()
        .filter(char::is_ascii_digit)
        .take(IMEI_LEN)
        .collect()
}
