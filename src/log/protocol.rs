//! Training protocol tags attached to logged sets

use std::fmt;

use serde::{Deserialize, Serialize};

/// Technique a set was performed with.
///
/// Built-in tags cover the common intensity techniques; anything else is kept
/// as a user-defined tag (lowercased, trimmed) so comparisons stay
/// case-insensitive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Protocol {
    #[default]
    Standard,
    DropSet,
    MyoReps,
    RestPause,
    Superset,
    TwentyOne,
    Custom(String),
}

impl Protocol {
    pub const STANDARD_TAG: &'static str = "standard";

    /// Parse a tag as stored in the log. Empty input is the standard protocol.
    pub fn from_tag(tag: &str) -> Self {
        let normalized = tag.trim().to_lowercase();
        match normalized.as_str() {
            "" | "standard" => Protocol::Standard,
            "drop_set" | "dropset" => Protocol::DropSet,
            "myo_reps" | "myoreps" => Protocol::MyoReps,
            "rest_pause" | "restpause" => Protocol::RestPause,
            "superset" => Protocol::Superset,
            "21s" | "twentyone" => Protocol::TwentyOne,
            _ => Protocol::Custom(normalized),
        }
    }

    pub fn as_tag(&self) -> &str {
        match self {
            Protocol::Standard => Self::STANDARD_TAG,
            Protocol::DropSet => "drop_set",
            Protocol::MyoReps => "myo_reps",
            Protocol::RestPause => "rest_pause",
            Protocol::Superset => "superset",
            Protocol::TwentyOne => "21s",
            Protocol::Custom(tag) => tag.as_str(),
        }
    }

    /// Short badge text; the standard protocol has none
    pub fn badge(&self) -> Option<&str> {
        match self {
            Protocol::Standard => None,
            Protocol::DropSet => Some("Drop"),
            Protocol::MyoReps => Some("Myo"),
            Protocol::RestPause => Some("RP"),
            Protocol::Superset => Some("SS"),
            Protocol::TwentyOne => Some("21s"),
            Protocol::Custom(tag) => Some(tag.as_str()),
        }
    }

    pub fn is_builtin(&self) -> bool {
        !matches!(self, Protocol::Custom(_))
    }

    /// All built-in protocols, for listings
    pub fn builtins() -> &'static [Protocol] {
        &[
            Protocol::Standard,
            Protocol::DropSet,
            Protocol::MyoReps,
            Protocol::RestPause,
            Protocol::Superset,
            Protocol::TwentyOne,
        ]
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_tag())
    }
}

impl From<String> for Protocol {
    fn from(tag: String) -> Self {
        Protocol::from_tag(&tag)
    }
}

impl From<Protocol> for String {
    fn from(protocol: Protocol) -> Self {
        protocol.as_tag().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_tag_builtins() {
        assert_eq!(Protocol::from_tag("drop_set"), Protocol::DropSet);
        assert_eq!(Protocol::from_tag("MYO_REPS"), Protocol::MyoReps);
        assert_eq!(Protocol::from_tag(" rest_pause "), Protocol::RestPause);
        assert_eq!(Protocol::from_tag("21s"), Protocol::TwentyOne);
    }

    #[test]
    fn test_empty_tag_is_standard() {
        assert_eq!(Protocol::from_tag(""), Protocol::Standard);
        assert_eq!(Protocol::from_tag("   "), Protocol::Standard);
        assert_eq!(Protocol::default(), Protocol::Standard);
    }

    #[test]
    fn test_custom_tag_case_insensitive() {
        let a = Protocol::from_tag("Cluster");
        let b = Protocol::from_tag("CLUSTER");
        assert_eq!(a, b);
        assert_eq!(a.as_tag(), "cluster");
        assert!(!a.is_builtin());
    }

    #[test]
    fn test_badges() {
        assert_eq!(Protocol::Standard.badge(), None);
        assert_eq!(Protocol::DropSet.badge(), Some("Drop"));
        assert_eq!(Protocol::from_tag("tempo").badge(), Some("tempo"));
    }

    #[test]
    fn test_serde_round_trip_as_string() {
        let json = serde_json::to_string(&Protocol::RestPause).unwrap();
        assert_eq!(json, "\"rest_pause\"");
        let back: Protocol = serde_json::from_str("\"Superset\"").unwrap();
        assert_eq!(back, Protocol::Superset);
    }
}
