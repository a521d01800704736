//! Event — an immutable record of something that happened in the hub.
//!
//! Events are published for every merged state delta, every semantic
//! gesture, sensor transitions and scene lifecycle changes. Each kind has a
//! stable snake_case [`name`](EventKind::name) for forwarding to sinks.

use serde::{Deserialize, Serialize};

use crate::gesture::Gesture;
use crate::id::{DeviceId, EventId};
use crate::time::{Timestamp, now};

/// What happened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    /// An inbound delta was merged into the device's state.
    StateMerged { delta: serde_json::Value },
    /// A remote produced a semantic gesture.
    Gesture { gesture: Gesture },
    /// A motion sensor changed presence.
    Motion { present: bool },
    /// An open/close sensor changed.
    Contact { open: bool },
    SceneCreated { scene: String },
    /// A scene was removed, explicitly or by its expiry timer.
    SceneDeleted { scene: String, expired: bool },
    RoomSceneSelected { room: String, scene: String },
    OutletSwitched { on: bool },
}

impl EventKind {
    /// Stable event name, e.g. `pressed_on`, `motion_gone`, `scene_created`.
    #[must_use]
    pub fn name(&self) -> String {
        match self {
            Self::StateMerged { .. } => "state_changed".to_string(),
            Self::Gesture { gesture } => gesture.to_string(),
            Self::Motion { present: true } => "motion".to_string(),
            Self::Motion { present: false } => "motion_gone".to_string(),
            Self::Contact { open: true } => "opened".to_string(),
            Self::Contact { open: false } => "closed".to_string(),
            Self::SceneCreated { .. } => "scene_created".to_string(),
            Self::SceneDeleted { .. } => "scene_deleted".to_string(),
            Self::RoomSceneSelected { .. } => "room_scene_selected".to_string(),
            Self::OutletSwitched { on: true } => "switched_on".to_string(),
            Self::OutletSwitched { on: false } => "switched_off".to_string(),
        }
    }
}

/// A timestamped [`EventKind`], optionally attributed to a device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub timestamp: Timestamp,
    pub device: Option<DeviceId>,
    pub kind: EventKind,
}

impl Event {
    /// Create a new event stamped with the current time.
    #[must_use]
    pub fn new(device: Option<DeviceId>, kind: EventKind) -> Self {
        Self {
            id: EventId::new(),
            timestamp: now(),
            device,
            kind,
        }
    }

    /// Shorthand for an event emitted by `device`.
    #[must_use]
    pub fn from_device(device: &DeviceId, kind: EventKind) -> Self {
        Self::new(Some(device.clone()), kind)
    }

    #[must_use]
    pub fn name(&self) -> String {
        self.kind.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gesture::Control;

    #[test]
    fn should_name_gesture_event_after_the_gesture() {
        let kind = EventKind::Gesture {
            gesture: Gesture::Hold(Control::DimUp),
        };
        assert_eq!(kind.name(), "hold_dim_up");
    }

    #[test]
    fn should_name_sensor_transitions() {
        assert_eq!(EventKind::Motion { present: true }.name(), "motion");
        assert_eq!(EventKind::Motion { present: false }.name(), "motion_gone");
        assert_eq!(EventKind::Contact { open: true }.name(), "opened");
        assert_eq!(EventKind::Contact { open: false }.name(), "closed");
    }

    #[test]
    fn should_attach_device_and_fresh_id() {
        let device = DeviceId::from("remote-1");
        let a = Event::from_device(&device, EventKind::Motion { present: true });
        let b = Event::from_device(&device, EventKind::Motion { present: true });
        assert_eq!(a.device.as_ref(), Some(&device));
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn should_serialize_kind_with_type_tag() {
        let kind = EventKind::SceneDeleted {
            scene: "_motion".to_string(),
            expired: true,
        };
        let json = serde_json::to_value(&kind).unwrap();
        assert_eq!(json["type"], "scene_deleted");
        assert_eq!(json["expired"], true);
    }
}
