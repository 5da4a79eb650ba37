//! Phone number normalization.
//!
//! # Purpose
//! Vendor records, owner allowlists, and session identities all carry phone
//! numbers typed in different shapes (`8077550043`, `+91 80775 50043`,
//! `918077550043`). Everything that compares phone numbers goes through
//! [`normalize`] so those spellings match.
//!
//! # Examples
//! ```rust
//! use emilock_common::phone;
//!
//! assert_eq!(phone::normalize("80775 50043", "+91").as_deref(), Some("+918077550043"));
//! assert_eq!(phone::normalize("+91-8077550043", "+91").as_deref(), Some("+918077550043"));
//! assert_eq!(phone::normalize("n/a", "+91"), None);
//! ```

/// Length of a national subscriber number without country code.
const NATIONAL_LEN: usize = 10;
/// Digit bounds of a dialable E.164 number, country code included.
const E164_MIN_DIGITS: usize = 8;
const E164_MAX_DIGITS: usize = 15;

/// Canonicalize `raw` to `+<country><subscriber>` form.
///
/// - A leading `+` is kept and all other non-digits are dropped.
/// - A bare 10-digit number is prefixed with `default_country_code`.
/// - A number that already starts with the country code digits gets a `+`.
///
/// Returns `None` when no digits remain.
pub fn normalize(raw: &str, default_country_code: &str) -> Option<String> {
    let trimmed = raw.trim();
    let explicit_plus = trimmed.starts_with('+');
    let digits: String = trimmed.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    if explicit_plus {
        return Some(format!("+{digits}"));
    }
    let country: String = default_country_code
        .chars()
        .filter(char::is_ascii_digit)
        .collect();
    if digits.len() == NATIONAL_LEN {
        return Some(format!("+{country}{digits}"));
    }
    if !country.is_empty()
        && digits.len() == NATIONAL_LEN + country.len()
        && digits.starts_with(&country)
    {
        return Some(format!("+{digits}"));
    }
    Some(digits)
}

/// Return `true` if `candidate` is `+` followed by 8 to 15 digits with no
/// leading zero.
pub fn is_e164(candidate: &str) -> bool {
    let Some(digits) = candidate.strip_prefix('+') else {
        return false;
    };
    (E164_MIN_DIGITS..=E164_MAX_DIGITS).contains(&digits.len())
        && digits.bytes().all(|b| b.is_ascii_digit())
        && !digits.starts_with('0')
}

/// [`normalize`], keeping only results that are dialable E.164 numbers.
pub fn normalize_e164(raw: &str, default_country_code: &str) -> Option<String> {
    normalize(raw, default_country_code).filter(|number| is_e164(number))
}
