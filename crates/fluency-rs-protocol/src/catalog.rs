//! Proficiency levels, skills, and subjects that index the test catalog.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error returned when a catalog value cannot be parsed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown {kind}: {value}")]
pub struct ParseCatalogError {
    /// Which catalog axis failed to parse.
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

impl ParseCatalogError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// CEFR proficiency level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CefrLevel {
    A1,
    A2,
    B1,
    B2,
    C1,
    C2,
}

impl CefrLevel {
    /// All levels in ascending order.
    pub const ALL: [CefrLevel; 6] = [
        CefrLevel::A1,
        CefrLevel::A2,
        CefrLevel::B1,
        CefrLevel::B2,
        CefrLevel::C1,
        CefrLevel::C2,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CefrLevel::A1 => "A1",
            CefrLevel::A2 => "A2",
            CefrLevel::B1 => "B1",
            CefrLevel::B2 => "B2",
            CefrLevel::C1 => "C1",
            CefrLevel::C2 => "C2",
        }
    }
}

impl fmt::Display for CefrLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CefrLevel {
    type Err = ParseCatalogError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_uppercase();
        CefrLevel::ALL
            .into_iter()
            .find(|level| level.as_str() == normalized)
            .ok_or_else(|| ParseCatalogError::new("cefr level", value))
    }
}

/// Language skill a test exercises, independent of subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Skill {
    Reading,
    Writing,
    Listening,
    Speaking,
}

impl Skill {
    pub const ALL: [Skill; 4] = [
        Skill::Reading,
        Skill::Writing,
        Skill::Listening,
        Skill::Speaking,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Skill::Reading => "reading",
            Skill::Writing => "writing",
            Skill::Listening => "listening",
            Skill::Speaking => "speaking",
        }
    }
}

impl fmt::Display for Skill {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Skill {
    type Err = ParseCatalogError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        Skill::ALL
            .into_iter()
            .find(|skill| skill.as_str() == normalized)
            .ok_or_else(|| ParseCatalogError::new("skill", value))
    }
}

/// Academic domain of a test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Subject {
    English,
    Math,
    Science,
    History,
    /// Bahasa Malaysia.
    Bahasa,
    Mandarin,
}

impl Subject {
    pub const ALL: [Subject; 6] = [
        Subject::English,
        Subject::Math,
        Subject::Science,
        Subject::History,
        Subject::Bahasa,
        Subject::Mandarin,
    ];

    /// Identifier used in storage and on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Subject::English => "english",
            Subject::Math => "math",
            Subject::Science => "science",
            Subject::History => "history",
            Subject::Bahasa => "bahasa",
            Subject::Mandarin => "mandarin",
        }
    }

    /// Human readable name used in generation prompts.
    pub fn display_name(&self) -> &'static str {
        match self {
            Subject::English => "English",
            Subject::Math => "Mathematics",
            Subject::Science => "Science",
            Subject::History => "History",
            Subject::Bahasa => "Bahasa Malaysia",
            Subject::Mandarin => "Mandarin",
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Subject {
    type Err = ParseCatalogError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        Subject::ALL
            .into_iter()
            .find(|subject| subject.as_str() == normalized)
            .ok_or_else(|| ParseCatalogError::new("subject", value))
    }
}

#[cfg(test)]
mod tests {
    use super::{CefrLevel, Skill, Subject};
    use pretty_assertions::assert_eq;

    #[test]
    fn levels_parse_case_insensitively() {
        assert_eq!("b2".parse::<CefrLevel>().expect("level"), CefrLevel::B2);
        assert_eq!(" C1 ".parse::<CefrLevel>().expect("level"), CefrLevel::C1);
        assert!("D1".parse::<CefrLevel>().is_err());
    }

    #[test]
    fn levels_are_ordered() {
        assert!(CefrLevel::A1 < CefrLevel::C2);
        assert!(CefrLevel::B1 < CefrLevel::B2);
    }

    #[test]
    fn catalog_serializes_to_storage_names() {
        assert_eq!(
            serde_json::to_string(&CefrLevel::A2).expect("json"),
            "\"A2\""
        );
        assert_eq!(
            serde_json::to_string(&Skill::Listening).expect("json"),
            "\"listening\""
        );
        assert_eq!(
            serde_json::to_string(&Subject::Bahasa).expect("json"),
            "\"bahasa\""
        );
    }

    #[test]
    fn unknown_subject_reports_kind() {
        let err = "geography".parse::<Subject>().unwrap_err();
        assert_eq!(err.to_string(), "unknown subject: geography");
    }
}
