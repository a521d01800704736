//! Virtual gateway configuration.

use serde::Deserialize;
use serde_json::json;

use lumenhub_domain::catalog::ModelKey;
use lumenhub_domain::device::{DeviceSnapshot, ResourceKind};
use lumenhub_domain::id::DeviceId;

/// Unique ids of the demo devices.
pub const DEMO_BULB: &str = "00:17:88:01:00:00:00:01-0b";
pub const DEMO_OUTLET: &str = "a4:c1:38:00:00:00:00:02-01";
pub const DEMO_DIMMER: &str = "00:17:88:01:00:00:00:03-02-fc00";
pub const DEMO_MOTION: &str = "00:17:88:01:00:00:00:04-02-0406";

/// Configuration for the virtual gateway.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VirtualConfig {
    /// Devices reported by the simulated catalog.
    pub devices: Vec<DeviceSnapshot>,
}

impl Default for VirtualConfig {
    fn default() -> Self {
        Self {
            devices: demo_devices(),
        }
    }
}

fn demo(
    resource: ResourceKind,
    gateway_id: &str,
    unique_id: &str,
    name: &str,
    model: ModelKey,
    state: serde_json::Value,
) -> DeviceSnapshot {
    DeviceSnapshot {
        resource,
        gateway_id: gateway_id.to_string(),
        unique_id: DeviceId::from(unique_id),
        name: name.to_string(),
        model,
        state,
    }
}

/// One colour bulb, one outlet, one four-button dimmer and one motion sensor.
#[must_use]
pub fn demo_devices() -> Vec<DeviceSnapshot> {
    vec![
        demo(
            ResourceKind::Light,
            "1",
            DEMO_BULB,
            "Demo bulb",
            ModelKey::new("Extended color light", "Philips", "LCT015"),
            json!({"on": true, "bri": 180, "ct": 366, "colormode": "ct", "reachable": true}),
        ),
        demo(
            ResourceKind::Light,
            "2",
            DEMO_OUTLET,
            "Demo outlet",
            ModelKey::new("On/Off plug-in unit", "Heiman", "TS011F"),
            json!({"on": false, "reachable": true}),
        ),
        demo(
            ResourceKind::Sensor,
            "3",
            DEMO_DIMMER,
            "Demo dimmer",
            ModelKey::new("ZHASwitch", "Philips", "RWL021"),
            json!({"buttonevent": null}),
        ),
        demo(
            ResourceKind::Sensor,
            "4",
            DEMO_MOTION,
            "Demo motion",
            ModelKey::new("ZHAPresence", "Philips", "SML001"),
            json!({"presence": false}),
        ),
    ]
}
