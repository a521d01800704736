//! Light state — the value type shared by authoritative device state, scene
//! targets, inbound deltas and outbound commands.
//!
//! Every field is optional: a full state and a partial delta have the same
//! shape, and merging is a field-wise "present overwrites absent".
//! Field names follow the gateway wire format (`bri`, `ct`, `colormode`, …).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Highest brightness a bulb accepts.
pub const MAX_BRIGHTNESS: i32 = 254;

/// Lowest brightness that still keeps a light on.
pub const MIN_ON_BRIGHTNESS: i32 = 1;

/// Which color description the bulb is currently honoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    Xy,
    Ct,
    Hs,
}

/// Identify-style blink requested from the bulb.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alert {
    #[default]
    None,
    /// Single breathe cycle.
    Select,
    /// Breathe cycles for roughly fifteen seconds.
    #[serde(rename = "lselect")]
    LongSelect,
}

/// Snapshot or delta of a light's state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LightState {
    /// Brightness, 0–254 once coerced. Inbound values are stored unchecked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bri: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xy: Option<[f64; 2]>,
    /// Color temperature in mired.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ct: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hue: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sat: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colormode: Option<ColorMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effect: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alert: Option<Alert>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reachable: Option<bool>,
    /// Transition duration in tenths of a second.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transitiontime: Option<u16>,
}

impl LightState {
    /// A state carrying only a brightness.
    #[must_use]
    pub fn with_brightness(bri: i32) -> Self {
        Self {
            bri: Some(bri),
            ..Self::default()
        }
    }

    /// Brightness with absent treated as 0.
    #[must_use]
    pub fn brightness(&self) -> i32 {
        self.bri.unwrap_or(0)
    }

    /// Normalise a state reported by the catalog at startup.
    ///
    /// A light reported as off is recorded with brightness 0 so that
    /// snapshots taken from it compose as "off".
    #[must_use]
    pub fn normalized_initial(mut self) -> Self {
        if self.on == Some(false) {
            self.bri = Some(0);
        }
        self
    }

    /// Parse a gateway state map one entry at a time.
    ///
    /// An entry whose value does not fit its field (an `alert` or
    /// `colormode` this hub has no variant for, a string brightness) is
    /// skipped and its key returned; the other entries still apply.
    /// Keys that are not light attributes are ignored.
    #[must_use]
    pub fn from_fields(fields: &Map<String, Value>) -> (Self, Vec<String>) {
        let mut state = Self::default();
        let mut rejected = Vec::new();
        for (key, value) in fields {
            let entry = Map::from_iter([(key.clone(), value.clone())]);
            match serde_json::from_value::<Self>(Value::Object(entry)) {
                Ok(field) => state.merge(&field),
                Err(_) => rejected.push(key.clone()),
            }
        }
        (state, rejected)
    }

    /// Shallow-merge `delta` into `self`: fields present in `delta`
    /// overwrite, absent fields are left untouched.
    pub fn merge(&mut self, delta: &LightState) {
        fn take<T: Clone>(slot: &mut Option<T>, incoming: Option<&T>) {
            if let Some(value) = incoming {
                *slot = Some(value.clone());
            }
        }

        take(&mut self.bri, delta.bri.as_ref());
        take(&mut self.on, delta.on.as_ref());
        take(&mut self.xy, delta.xy.as_ref());
        take(&mut self.ct, delta.ct.as_ref());
        take(&mut self.hue, delta.hue.as_ref());
        take(&mut self.sat, delta.sat.as_ref());
        take(&mut self.colormode, delta.colormode.as_ref());
        take(&mut self.effect, delta.effect.as_ref());
        take(&mut self.alert, delta.alert.as_ref());
        take(&mut self.reachable, delta.reachable.as_ref());
        take(&mut self.transitiontime, delta.transitiontime.as_ref());
    }

    /// Apply the on/off coercion: brightness is clamped to `0..=254` and
    /// `on` is derived from it (0 ⇔ off).
    #[must_use]
    pub fn coerced(mut self) -> Self {
        let bri = self.brightness().clamp(0, MAX_BRIGHTNESS);
        self.bri = Some(bri);
        self.on = Some(bri > 0);
        self
    }

    /// Build the payload sent downstream: coerced, with the transition
    /// attached and read-only attributes stripped.
    #[must_use]
    pub fn into_activation(self, transition: u16) -> Self {
        let mut state = self.coerced();
        state.transitiontime = Some(transition);
        state.reachable = None;
        state.colormode = None;
        state
    }
}
