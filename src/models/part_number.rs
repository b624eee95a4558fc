use serde::{Deserialize, Serialize};
use std::fmt;

use crate::utils::error::AppError;

/// A non-empty electronic component part number as typed by the user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PartNumber(String);

impl PartNumber {
    pub fn new(raw: impl AsRef<str>) -> Result<Self, AppError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(AppError::Validation("Part number is required".to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Length in characters, not bytes.
    pub fn len(&self) -> usize {
        self.0.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// A new part number with the last `count` characters removed, or `None`
    /// if that would leave nothing.
    pub fn trimmed(&self, count: usize) -> Option<PartNumber> {
        let keep = self.len().checked_sub(count).filter(|keep| *keep >= 1)?;
        Some(PartNumber(self.0.chars().take(keep).collect()))
    }

    /// The candidate sequence tried against a vendor: the original followed by
    /// up to `extra_trims` progressively shorter prefixes, never shorter than
    /// one character.
    pub fn variations(&self, extra_trims: usize) -> Vec<PartNumber> {
        let mut variations = vec![self.clone()];
        for count in 1..=extra_trims {
            match self.trimmed(count) {
                Some(candidate) => variations.push(candidate),
                None => break,
            }
        }
        variations
    }
}

impl fmt::Display for PartNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PartNumber {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for PartNumber {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        PartNumber::new(value)
    }
}

impl From<PartNumber> for String {
    fn from(value: PartNumber) -> Self {
        value.0
    }
}
