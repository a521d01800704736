//! Condition — a guard that must be true for the automation to proceed.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::error::{HubError, ValidationError};

/// A predicate that must hold for the automation actions to execute.
///
/// Conditions are evaluated *after* the trigger fires. All conditions
/// in an automation must be satisfied (logical AND).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Condition {
    /// Requires a room's active scene to be the given one.
    RoomSceneIs { room: String, scene: String },
    /// Requires the current time to be within a window.
    TimeRange {
        /// Start of the window, `HH:MM` in 24-hour format.
        after: String,
        /// End of the window, `HH:MM` in 24-hour format. May be earlier
        /// than `after` for windows spanning midnight.
        before: String,
    },
}

/// Parse an `HH:MM` time of day.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidTimeOfDay`] for anything else.
pub fn parse_time_of_day(value: &str) -> Result<NaiveTime, HubError> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .map_err(|_| ValidationError::InvalidTimeOfDay(value.to_string()).into())
}

impl Condition {
    /// Check that time windows are well formed.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Validation`] on an unparsable time of day.
    pub fn validate(&self) -> Result<(), HubError> {
        match self {
            Self::RoomSceneIs { room, scene } if room.is_empty() || scene.is_empty() => {
                Err(ValidationError::EmptyName.into())
            }
            Self::RoomSceneIs { .. } => Ok(()),
            Self::TimeRange { after, before } => {
                parse_time_of_day(after)?;
                parse_time_of_day(before)?;
                Ok(())
            }
        }
    }

    /// Whether `at` falls in a [`Condition::TimeRange`] window (start
    /// inclusive, end exclusive). Other conditions return `None`.
    #[must_use]
    pub fn time_range_contains(&self, at: NaiveTime) -> Option<bool> {
        let Self::TimeRange { after, before } = self else {
            return None;
        };
        let (Ok(start), Ok(end)) = (parse_time_of_day(after), parse_time_of_day(before)) else {
            return Some(false);
        };
        Some(if start <= end {
            start <= at && at < end
        } else {
            at >= start || at < end
        })
    }
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RoomSceneIs { room, scene } => write!(f, "room_scene_is({room}, {scene})"),
            Self::TimeRange { after, before } => write!(f, "time_range({after}..{before})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(after: &str, before: &str) -> Condition {
        Condition::TimeRange {
            after: after.to_string(),
            before: before.to_string(),
        }
    }

    fn at(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn should_contain_time_inside_daytime_window() {
        let c = range("08:00", "22:00");
        assert_eq!(c.time_range_contains(at(8, 0)), Some(true));
        assert_eq!(c.time_range_contains(at(21, 59)), Some(true));
        assert_eq!(c.time_range_contains(at(22, 0)), Some(false));
    }

    #[test]
    fn should_wrap_around_midnight_when_end_precedes_start() {
        let c = range("22:00", "06:00");
        assert_eq!(c.time_range_contains(at(23, 30)), Some(true));
        assert_eq!(c.time_range_contains(at(5, 0)), Some(true));
        assert_eq!(c.time_range_contains(at(12, 0)), Some(false));
    }

    #[test]
    fn should_return_none_for_non_time_conditions() {
        let c = Condition::RoomSceneIs {
            room: "hall".to_string(),
            scene: "night".to_string(),
        };
        assert_eq!(c.time_range_contains(at(12, 0)), None);
    }

    #[test]
    fn should_reject_malformed_time_of_day() {
        let result = range("8 o'clock", "22:00").validate();
        assert!(matches!(
            result,
            Err(HubError::Validation(ValidationError::InvalidTimeOfDay(_)))
        ));
    }

    #[test]
    fn should_display_conditions() {
        assert_eq!(range("08:00", "22:00").to_string(), "time_range(08:00..22:00)");
    }

    #[test]
    fn should_deserialize_room_scene_is_from_tagged_json() {
        let json = serde_json::json!({
            "type": "room_scene_is",
            "room": "living",
            "scene": "evening"
        });
        let c: Condition = serde_json::from_value(json).unwrap();
        assert!(matches!(c, Condition::RoomSceneIs { scene, .. } if scene == "evening"));
    }
}
