//! Action — the effect performed when an automation fires.

use serde::{Deserialize, Serialize};

use crate::id::DeviceId;

/// An operation to execute when the automation's trigger fires and
/// all conditions are satisfied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    /// Select the active scene of every light in a room.
    SetRoomScene { room: String, scene: String },
    /// Create a scene on every light in a room.
    CreateScene {
        room: String,
        scene: String,
        /// Seconds before the scene expires; `None` uses the hub default,
        /// `Some(0)` never expires.
        #[serde(default)]
        ttl_secs: Option<u64>,
        /// Target brightness; without it the light's current state is used.
        #[serde(default)]
        brightness: Option<i32>,
        #[serde(default)]
        priority: i32,
        #[serde(default)]
        transparent: bool,
    },
    DeleteScene { room: String, scene: String },
    /// Step a scene's brightness on every light in a room.
    AdjustBrightness { room: String, scene: String, step: i32 },
    SwitchOutlet { device: DeviceId, on: bool },
    /// Turn on the first outlet of the room that is off.
    SwitchFirstOffOn { room: String },
    /// Turn off the last outlet of the room that is on.
    SwitchLastOnOff { room: String },
    /// Mute or unmute a sensor; a disabled sensor still tracks its state
    /// but emits no motion or contact events.
    SetSensorEnabled { device: DeviceId, enabled: bool },
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SetRoomScene { room, scene } => write!(f, "set_room_scene({room}, {scene})"),
            Self::CreateScene { room, scene, .. } => write!(f, "create_scene({room}, {scene})"),
            Self::DeleteScene { room, scene } => write!(f, "delete_scene({room}, {scene})"),
            Self::AdjustBrightness { room, scene, step } => {
                write!(f, "adjust_brightness({room}, {scene}, {step:+})")
            }
            Self::SwitchOutlet { device, on } => write!(f, "switch_outlet({device}, {on})"),
            Self::SwitchFirstOffOn { room } => write!(f, "switch_first_off_on({room})"),
            Self::SwitchLastOnOff { room } => write!(f, "switch_last_on_off({room})"),
            Self::SetSensorEnabled { device, enabled } => {
                write!(f, "set_sensor_enabled({device}, {enabled})")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_display_adjust_brightness_with_signed_step() {
        let a = Action::AdjustBrightness {
            room: "living".to_string(),
            scene: "day".to_string(),
            step: -20,
        };
        assert_eq!(a.to_string(), "adjust_brightness(living, day, -20)");
    }

    #[test]
    fn should_deserialize_create_scene_with_defaults() {
        let json = serde_json::json!({
            "type": "create_scene",
            "room": "hall",
            "scene": "_motion"
        });
        let a: Action = serde_json::from_value(json).unwrap();
        assert_eq!(
            a,
            Action::CreateScene {
                room: "hall".to_string(),
                scene: "_motion".to_string(),
                ttl_secs: None,
                brightness: None,
                priority: 0,
                transparent: false,
            }
        );
    }

    #[test]
    fn should_deserialize_switch_outlet_from_tagged_json() {
        let json = serde_json::json!({
            "type": "switch_outlet",
            "device": "plug-1",
            "on": true
        });
        let a: Action = serde_json::from_value(json).unwrap();
        assert!(matches!(a, Action::SwitchOutlet { on: true, .. }));
    }

    #[test]
    fn should_deserialize_set_sensor_enabled_from_tagged_json() {
        let json = serde_json::json!({
            "type": "set_sensor_enabled",
            "device": "pir-1",
            "enabled": false
        });
        let a: Action = serde_json::from_value(json).unwrap();
        assert_eq!(a.to_string(), "set_sensor_enabled(pir-1, false)");
    }
}
