//! Trigger — the event pattern that activates an automation.

use serde::{Deserialize, Serialize};

use crate::event::{Event, EventKind};
use crate::gesture::Gesture;
use crate::id::DeviceId;

/// Describes what event pattern should activate an automation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Trigger {
    /// Fires when a remote emits a specific gesture.
    Gesture { device: DeviceId, gesture: Gesture },
    /// Fires when a motion sensor reports presence (or its end).
    Motion {
        device: DeviceId,
        #[serde(default = "default_true")]
        present: bool,
    },
    /// Fires when an open/close sensor changes.
    Contact { device: DeviceId, open: bool },
    /// Fires only when triggered explicitly.
    #[default]
    Manual,
}

fn default_true() -> bool {
    true
}

impl Trigger {
    /// Check whether this trigger matches a given event.
    ///
    /// `Manual` triggers never match broadcast events.
    #[must_use]
    pub fn matches_event(&self, event: &Event) -> bool {
        let from = |device: &DeviceId| event.device.as_ref() == Some(device);
        match (self, &event.kind) {
            (
                Self::Gesture { device, gesture },
                EventKind::Gesture { gesture: emitted },
            ) => from(device) && gesture == emitted,
            (Self::Motion { device, present }, EventKind::Motion { present: emitted }) => {
                from(device) && present == emitted
            }
            (Self::Contact { device, open }, EventKind::Contact { open: emitted }) => {
                from(device) && open == emitted
            }
            _ => false,
        }
    }
}

impl std::fmt::Display for Trigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Gesture { device, gesture } => write!(f, "gesture({device}, {gesture})"),
            Self::Motion { device, present } => write!(f, "motion({device}, {present})"),
            Self::Contact { device, open } => write!(f, "contact({device}, {open})"),
            Self::Manual => f.write_str("manual"),
        }
    }
}
