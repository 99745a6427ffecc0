//! Enumerations and field types for design tasks.
//!
//! This module defines the closed sets the tracker is built around: the five
//! lifecycle statuses that form the board columns, and the week labels used
//! as a secondary grouping key.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Lifecycle status of a design task. The sole grouping key for board columns.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Status {
    #[serde(rename = "Yet to start")]
    YetToStart,
    #[serde(rename = "Not started yet")]
    NotStartedYet,
    #[serde(rename = "In progress")]
    InProgress,
    #[serde(rename = "On hold")]
    OnHold,
    #[serde(rename = "Completed")]
    Completed,
}

/// Board columns, left to right.
pub const BOARD_ORDER: [Status; 5] = [
    Status::YetToStart,
    Status::NotStartedYet,
    Status::InProgress,
    Status::OnHold,
    Status::Completed,
];

/// Option order in the detail editor's status selector.
pub const EDITOR_STATUS_ORDER: [Status; 5] = [
    Status::Completed,
    Status::InProgress,
    Status::OnHold,
    Status::YetToStart,
    Status::NotStartedYet,
];

impl Status {
    /// The display label, which is also the wire representation.
    pub fn label(self) -> &'static str {
        match self {
            Status::YetToStart => "Yet to start",
            Status::NotStartedYet => "Not started yet",
            Status::InProgress => "In progress",
            Status::OnHold => "On hold",
            Status::Completed => "Completed",
        }
    }

    /// Parse a status label; unknown strings yield `None`.
    pub fn parse(s: &str) -> Option<Status> {
        BOARD_ORDER.iter().copied().find(|st| st.label() == s)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Week grouping key: four canonical labels plus free text for anything else.
///
/// The wire format is the bare label string, so `Other` round-trips arbitrary
/// labels coming from the backend without loss.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum WeekLabel {
    Week1,
    Week2,
    Week3,
    Week4,
    Other(String),
}

/// Canonical week labels in display order.
pub const CANONICAL_WEEKS: [WeekLabel; 4] = [
    WeekLabel::Week1,
    WeekLabel::Week2,
    WeekLabel::Week3,
    WeekLabel::Week4,
];

impl WeekLabel {
    pub fn label(&self) -> &str {
        match self {
            WeekLabel::Week1 => "Week 1",
            WeekLabel::Week2 => "Week 2",
            WeekLabel::Week3 => "Week 3",
            WeekLabel::Week4 => "Week 4",
            WeekLabel::Other(s) => s,
        }
    }

    /// Parse any label string; non-canonical text becomes `Other`.
    pub fn parse(s: &str) -> WeekLabel {
        match s {
            "Week 1" => WeekLabel::Week1,
            "Week 2" => WeekLabel::Week2,
            "Week 3" => WeekLabel::Week3,
            "Week 4" => WeekLabel::Week4,
            other => WeekLabel::Other(other.to_string()),
        }
    }

    pub fn is_canonical(&self) -> bool {
        !matches!(self, WeekLabel::Other(_))
    }

    /// The key a task falls under when the board groups by week. Blank labels
    /// collapse into a shared "Other" group.
    pub fn group_key(&self) -> &str {
        match self {
            WeekLabel::Other(s) if s.trim().is_empty() => "Other",
            other => other.label(),
        }
    }
}

impl fmt::Display for WeekLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for WeekLabel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for WeekLabel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(WeekLabel::parse(&s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_labels_round_trip() {
        for status in BOARD_ORDER {
            assert_eq!(Status::parse(status.label()), Some(status));
        }
        assert_eq!(Status::parse("Done"), None);
    }

    #[test]
    fn test_status_wire_format_is_label() {
        let json = serde_json::to_string(&Status::InProgress).unwrap();
        assert_eq!(json, "\"In progress\"");
        let back: Status = serde_json::from_str("\"Yet to start\"").unwrap();
        assert_eq!(back, Status::YetToStart);
    }

    #[test]
    fn test_week_label_parse() {
        assert_eq!(WeekLabel::parse("Week 2"), WeekLabel::Week2);
        assert_eq!(
            WeekLabel::parse("Sprint 9"),
            WeekLabel::Other("Sprint 9".to_string())
        );
        assert!(WeekLabel::parse("Week 4").is_canonical());
        assert!(!WeekLabel::parse("week 4").is_canonical());
    }

    #[test]
    fn test_week_label_group_key_collapses_blank() {
        assert_eq!(WeekLabel::Other(String::new()).group_key(), "Other");
        assert_eq!(WeekLabel::Other("  ".to_string()).group_key(), "Other");
        assert_eq!(WeekLabel::Other("Sprint 9".to_string()).group_key(), "Sprint 9");
        assert_eq!(WeekLabel::Week1.group_key(), "Week 1");
    }

    #[test]
    fn test_week_label_wire_format() {
        let json = serde_json::to_string(&WeekLabel::Week3).unwrap();
        assert_eq!(json, "\"Week 3\"");
        let back: WeekLabel = serde_json::from_str("\"Pilot\"").unwrap();
        assert_eq!(back, WeekLabel::Other("Pilot".to_string()));
    }
}
