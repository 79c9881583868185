use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier for one of the twelve guided-content sections.
///
/// Variants are declared in the page's top-to-bottom order, so the derived
/// `Ord` matches document order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionId {
    Welcome,
    Classes,
    Objects,
    Methods,
    Variables,
    Control,
    Inheritance,
    Encapsulation,
    Polymorphism,
    Exceptions,
    Collections,
    Quest,
}

impl SectionId {
    /// Number of known sections.
    pub const COUNT: usize = 12;

    /// Every section in document order.
    pub const ALL: [SectionId; Self::COUNT] = [
        SectionId::Welcome,
        SectionId::Classes,
        SectionId::Objects,
        SectionId::Methods,
        SectionId::Variables,
        SectionId::Control,
        SectionId::Inheritance,
        SectionId::Encapsulation,
        SectionId::Polymorphism,
        SectionId::Exceptions,
        SectionId::Collections,
        SectionId::Quest,
    ];

    /// Stable wire name, also used as the anchor id on the page.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SectionId::Welcome => "welcome",
            SectionId::Classes => "classes",
            SectionId::Objects => "objects",
            SectionId::Methods => "methods",
            SectionId::Variables => "variables",
            SectionId::Control => "control",
            SectionId::Inheritance => "inheritance",
            SectionId::Encapsulation => "encapsulation",
            SectionId::Polymorphism => "polymorphism",
            SectionId::Exceptions => "exceptions",
            SectionId::Collections => "collections",
            SectionId::Quest => "quest",
        }
    }

    /// Zero-based position in document order.
    #[must_use]
    pub fn ordinal(self) -> usize {
        self as usize
    }

    /// Look up a section by its wire name, returning `None` for unknown names.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|id| id.as_str() == name)
    }
}

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string is not one of the known section names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseSectionError {
    raw: String,
}

impl ParseSectionError {
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for ParseSectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown section id: {:?}", self.raw)
    }
}

impl std::error::Error for ParseSectionError {}

impl FromStr for SectionId {
    type Err = ParseSectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let name = trimmed.strip_prefix('#').unwrap_or(trimmed);
        Self::from_name(name).ok_or_else(|| ParseSectionError { raw: s.to_string() })
    }
}
