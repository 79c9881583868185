use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::model::section::{ParseSectionError, SectionId};

/// Rejected visitor input. State is never mutated when one of these is returned.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum InputError {
    #[error("challenge index must be non-negative, got {0}")]
    NegativeChallengeIndex(i64),

    #[error("challenge index must be an integer, got {0:?}")]
    MalformedChallengeIndex(String),

    #[error("challenge index {0} is out of range")]
    ChallengeIndexOutOfRange(i64),

    #[error(transparent)]
    UnknownSection(#[from] ParseSectionError),
}

/// Validated, non-negative index of a quest challenge.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChallengeIndex(u32);

impl ChallengeIndex {
    #[must_use]
    pub fn new(index: u32) -> Self {
        Self(index)
    }

    #[must_use]
    pub fn value(&self) -> u32 {
        self.0
    }

    /// Validate a raw signed index as delivered by the presentation layer.
    ///
    /// # Errors
    ///
    /// Returns `InputError::NegativeChallengeIndex` for values below zero and
    /// `InputError::ChallengeIndexOutOfRange` for values that do not fit in `u32`.
    pub fn from_raw(raw: i64) -> Result<Self, InputError> {
        if raw < 0 {
            return Err(InputError::NegativeChallengeIndex(raw));
        }
        u32::try_from(raw)
            .map(Self)
            .map_err(|_| InputError::ChallengeIndexOutOfRange(raw))
    }
}

impl fmt::Debug for ChallengeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChallengeIndex({})", self.0)
    }
}

impl fmt::Display for ChallengeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ChallengeIndex {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s
            .trim()
            .parse::<i64>()
            .map_err(|_| InputError::MalformedChallengeIndex(s.to_string()))?;
        Self::from_raw(raw)
    }
}

/// Parse a section name coming from a link or a progress-tracker item.
///
/// # Errors
///
/// Returns `InputError::UnknownSection` if the name is not a known section.
pub fn parse_section(raw: &str) -> Result<SectionId, InputError> {
    raw.parse::<SectionId>().map_err(InputError::from)
}
