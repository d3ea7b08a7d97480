//! Enumeration types for the Throwdown challenge tracker.

use serde::{Deserialize, Serialize};

/// The kind of a logged activity.
///
/// The serialized names match the document's JSON wire format, including the
/// synthetic `weigh-in-total` kind used for cumulative weight-loss grants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ActivityKind {
    /// A completed workout session. Flat point value.
    #[serde(rename = "workout")]
    Workout,

    /// Steps walked, in units of 5,000. Points scale with the unit count.
    #[serde(rename = "steps5k")]
    Steps5k,

    /// Active minutes, in units of 10. Points scale with the unit count.
    #[serde(rename = "active10Min")]
    Active10Min,

    /// A personal record. Flat bonus value.
    #[serde(rename = "pr")]
    PersonalRecord,

    /// Synthetic activity recording a cumulative weight-loss grant.
    ///
    /// Never logged directly by a caller: the store appends one of these
    /// whenever a weigh-in unlocks new loss points. Its `value` is the total
    /// loss in pounds at grant time, and summing the `points` of all
    /// `WeighInTotal` activities for a player gives the lifetime loss points
    /// already awarded.
    #[serde(rename = "weigh-in-total")]
    WeighInTotal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_names_match_document_format() {
        let json = serde_json::to_string(&ActivityKind::WeighInTotal).ok();
        assert_eq!(json.as_deref(), Some("\"weigh-in-total\""));
        let json = serde_json::to_string(&ActivityKind::Active10Min).ok();
        assert_eq!(json.as_deref(), Some("\"active10Min\""));
    }

    #[test]
    fn wire_names_roundtrip() {
        for kind in [
            ActivityKind::Workout,
            ActivityKind::Steps5k,
            ActivityKind::Active10Min,
            ActivityKind::PersonalRecord,
            ActivityKind::WeighInTotal,
        ] {
            let json = serde_json::to_string(&kind).ok().unwrap_or_default();
            let back: Result<ActivityKind, _> = serde_json::from_str(&json);
            assert_eq!(back.ok(), Some(kind));
        }
    }
}
