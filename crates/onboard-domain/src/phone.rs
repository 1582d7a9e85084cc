//! E.164 phone numbers.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Maximum number of digits after the leading `+` (ITU-T E.164).
pub const MAX_E164_DIGITS: usize = 15;

static E164_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"^\+[1-9][0-9]{{1,{}}}$", MAX_E164_DIGITS - 1)).unwrap()
});

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PhoneError {
    #[error("phone number is required")]
    Empty,
    #[error("invalid phone number format, use E.164 (e.g. +919876543210)")]
    NotE164,
}

/// Canonical E.164 phone number: `+` followed by 2 to 15 digits, first digit 1-9.
///
/// The only way to build one is through [`Phone::parse`] or [`Phone::normalize`],
/// so a `Phone` in hand is always canonical.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Phone(String);

impl Phone {
    /// Validate an already-canonical E.164 string.
    pub fn parse(raw: &str) -> Result<Self, PhoneError> {
        if raw.is_empty() {
            return Err(PhoneError::Empty);
        }
        if !E164_PATTERN.is_match(raw) {
            return Err(PhoneError::NotE164);
        }
        Ok(Self(raw.to_owned()))
    }

    /// Normalize user input then validate it.
    ///
    /// Drops every character except digits and `+`. Input without a leading `+`
    /// is treated as a national number and gets `+<default_country_code>` prepended.
    pub fn normalize(raw: &str, default_country_code: &str) -> Result<Self, PhoneError> {
        let kept: String = raw
            .chars()
            .filter(|c| c.is_ascii_digit() || *c == '+')
            .collect();
        if kept.is_empty() {
            return Err(PhoneError::Empty);
        }
        if kept.starts_with('+') {
            Self::parse(&kept)
        } else {
            Self::parse(&format!("+{default_country_code}{kept}"))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Digits without the leading `+`, as messaging providers expect them.
    pub fn digits(&self) -> &str {
        &self.0[1..]
    }
}

impl fmt::Display for Phone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Phone {
    type Error = PhoneError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Phone> for String {
    fn from(phone: Phone) -> Self {
        phone.0
    }
}

impl AsRef<str> for Phone {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
