use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Document revision counted in tenths and displayed as `major.minor`.
///
/// Every re-upload advances the counter by one, so `1.0` becomes `1.1`, `1.9` becomes `2.0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Revision(u32);

impl Revision {
    pub const INITIAL: Revision = Revision(10);

    pub const fn from_tenths(tenths: u32) -> Self {
        Self(tenths)
    }

    pub const fn tenths(self) -> u32 {
        self.0
    }

    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }

    pub fn label(self) -> String {
        format!("{}.{}", self.0 / 10, self.0 % 10)
    }

    /// Parse a decimal label such as `"1.0"`, `"2"` or a legacy `"1.15"`.
    ///
    /// Labels with more than one fractional digit are rounded half-up to the nearest tenth
    /// using the digits themselves, never a float.
    pub fn parse(raw: &str) -> Result<Self, RevisionParseError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(RevisionParseError::Empty);
        }

        let (major, fraction) = trimmed.split_once('.').unwrap_or((trimmed, ""));
        let is_digits = |part: &str| part.bytes().all(|byte| byte.is_ascii_digit());
        if major.is_empty() || !is_digits(major) || !is_digits(fraction) {
            return Err(RevisionParseError::Invalid(trimmed.to_string()));
        }

        let overflow = || RevisionParseError::Overflow(trimmed.to_string());
        let major: u32 = major.parse().map_err(|_| overflow())?;

        let mut digits = fraction.bytes().map(|byte| u32::from(byte - b'0'));
        let tenth = digits.next().unwrap_or(0);
        let round_up = digits.next().map_or(false, |hundredth| hundredth >= 5);

        major
            .checked_mul(10)
            .and_then(|value| value.checked_add(tenth))
            .and_then(|value| value.checked_add(u32::from(round_up)))
            .map(Self)
            .ok_or_else(overflow)
    }
}

impl Default for Revision {
    fn default() -> Self {
        Self::INITIAL
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.0 / 10, self.0 % 10)
    }
}

impl Serialize for Revision {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.label())
    }
}

impl<'de> Deserialize<'de> for Revision {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Revision::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RevisionParseError {
    #[error("revision label is empty")]
    Empty,
    #[error("'{0}' is not a decimal revision label")]
    Invalid(String),
    #[error("revision '{0}' is out of range")]
    Overflow(String),
}
