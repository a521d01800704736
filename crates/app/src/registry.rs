//! Device registry and event router.
//!
//! The registry maps each device's unique id to the one device instance
//! owning it. It is populated once from the gateway catalog and never
//! shrinks; duplicates are rejected. [`DeviceRegistry::dispatch`] is the
//! single entry point for inbound telemetry.

use indexmap::IndexMap;
use serde_json::{Map, Value};

use lumenhub_domain::catalog::{Catalog, DeviceClass};
use lumenhub_domain::device::DeviceSnapshot;
use lumenhub_domain::id::DeviceId;
use lumenhub_domain::light_state::LightState;
use lumenhub_domain::telemetry::Telemetry;

use crate::context::Context;
use crate::devices::{Device, Dimmer, Light, Outlet, Sensor, TelemetryHandler};

/// Append-only registry of devices, keyed by unique id.
#[derive(Debug, Default)]
pub struct DeviceRegistry {
    devices: IndexMap<DeviceId, Device>,
}

impl DeviceRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the registry from a gateway catalog. Unsupported models and
    /// invalid snapshots are logged and skipped.
    #[must_use]
    pub fn from_catalog(snapshots: Vec<DeviceSnapshot>, catalog: &Catalog) -> Self {
        let mut registry = Self::new();
        for snapshot in snapshots {
            if let Err(err) = snapshot.validate() {
                tracing::warn!(name = %snapshot.name, error = %err, "skipping invalid device");
                continue;
            }
            if let Some(device) = build_device(snapshot, catalog) {
                registry.register(device);
            }
        }
        tracing::info!(devices = registry.len(), "device registry built");
        registry
    }

    /// Register a device. Returns `false` (and logs) for a duplicate id.
    pub fn register(&mut self, device: Device) -> bool {
        let id = device.id().clone();
        if self.devices.contains_key(&id) {
            tracing::warn!(device = %id, "duplicate registration rejected");
            return false;
        }
        tracing::debug!(device = %id, kind = device.kind(), name = device.name(), "registered");
        self.devices.insert(id, device);
        true
    }

    /// Deliver telemetry to its device. Returns whether a device owned it.
    pub fn dispatch(&mut self, telemetry: &Telemetry, ctx: &mut Context) -> bool {
        match self.devices.get_mut(&telemetry.id) {
            Some(device) => {
                device.handle_telemetry(&telemetry.payload, ctx);
                true
            }
            None => {
                tracing::debug!(device = %telemetry.id, "telemetry for unknown device dropped");
                false
            }
        }
    }

    #[must_use]
    pub fn get(&self, id: &DeviceId) -> Option<&Device> {
        self.devices.get(id)
    }

    #[must_use]
    pub fn light(&self, id: &DeviceId) -> Option<&Light> {
        match self.devices.get(id) {
            Some(Device::Light(light)) => Some(light),
            _ => None,
        }
    }

    pub fn light_mut(&mut self, id: &DeviceId) -> Option<&mut Light> {
        match self.devices.get_mut(id) {
            Some(Device::Light(light)) => Some(light),
            _ => None,
        }
    }

    #[must_use]
    pub fn outlet(&self, id: &DeviceId) -> Option<&Outlet> {
        match self.devices.get(id) {
            Some(Device::Outlet(outlet)) => Some(outlet),
            _ => None,
        }
    }

    pub fn outlet_mut(&mut self, id: &DeviceId) -> Option<&mut Outlet> {
        match self.devices.get_mut(id) {
            Some(Device::Outlet(outlet)) => Some(outlet),
            _ => None,
        }
    }

    pub fn dimmer_mut(&mut self, id: &DeviceId) -> Option<&mut Dimmer> {
        match self.devices.get_mut(id) {
            Some(Device::Dimmer(dimmer)) => Some(dimmer),
            _ => None,
        }
    }

    pub fn sensor_mut(&mut self, id: &DeviceId) -> Option<&mut Sensor> {
        match self.devices.get_mut(id) {
            Some(Device::Sensor(sensor)) => Some(sensor),
            _ => None,
        }
    }

    /// Registered ids, in registration order.
    pub fn ids(&self) -> impl Iterator<Item = &DeviceId> {
        self.devices.keys()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}

fn build_device(snapshot: DeviceSnapshot, catalog: &Catalog) -> Option<Device> {
    let class = catalog.classify(&snapshot.model);
    let target = snapshot.target();
    let DeviceSnapshot {
        unique_id,
        name,
        model,
        state,
        ..
    } = snapshot;

    let device = match class {
        DeviceClass::Light => {
            let initial = initial_light_state(&unique_id, &state);
            Device::Light(Light::new(unique_id, target, name, initial))
        }
        DeviceClass::Outlet => {
            let initial = initial_light_state(&unique_id, &state);
            Device::Outlet(Outlet::new(unique_id, target, name, initial))
        }
        DeviceClass::Dimmer { layout } => Device::Dimmer(Dimmer::new(unique_id, name, layout)),
        DeviceClass::Sensor { sensor } => {
            let initial = match state {
                Value::Object(map) => map,
                _ => Map::new(),
            };
            Device::Sensor(Sensor::new(unique_id, name, sensor, initial))
        }
        DeviceClass::Unsupported => {
            tracing::info!(device = %unique_id, %model, "unsupported model, not registered");
            return None;
        }
    };
    Some(device)
}

fn initial_light_state(id: &DeviceId, state: &Value) -> LightState {
    let Value::Object(fields) = state else {
        if !state.is_null() {
            tracing::warn!(device = %id, "initial state is not an object, starting empty");
        }
        return LightState::default();
    };
    let (initial, rejected) = LightState::from_fields(fields);
    if !rejected.is_empty() {
        tracing::warn!(device = %id, fields = ?rejected, "dropping unparsable initial state fields");
    }
    initial
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::testing::Harness;
    use lumenhub_domain::catalog::ModelKey;
    use lumenhub_domain::device::ResourceKind;
    use lumenhub_domain::telemetry::Payload;

    fn snapshot(id: &str, model: ModelKey, state: Value) -> DeviceSnapshot {
        DeviceSnapshot::builder()
            .resource(ResourceKind::Light)
            .gateway_id("1")
            .unique_id(id)
            .name(id)
            .model(model)
            .state(state)
            .build()
            .unwrap()
    }

    fn bulb(id: &str) -> DeviceSnapshot {
        snapshot(
            id,
            ModelKey::new("Extended color light", "Philips", "LCT015"),
            serde_json::json!({"on": false, "bri": 200}),
        )
    }

    fn registry() -> DeviceRegistry {
        DeviceRegistry::from_catalog(
            vec![
                bulb("lamp"),
                snapshot(
                    "remote",
                    ModelKey::new("ZHASwitch", "Philips", "RWL021"),
                    Value::Null,
                ),
                snapshot(
                    "mystery",
                    ModelKey::new("Color light", "Acme", "X1"),
                    Value::Null,
                ),
            ],
            &Catalog::builtin(),
        )
    }

    #[test]
    fn should_register_supported_devices_only() {
        let registry = registry();
        assert_eq!(registry.len(), 2);
        assert!(registry.get(&DeviceId::from("mystery")).is_none());
    }

    #[test]
    fn should_normalize_initial_light_state() {
        let registry = registry();
        let light = registry.light(&DeviceId::from("lamp")).unwrap();
        assert_eq!(light.state().bri, Some(0));
    }

    #[test]
    fn should_start_lit_bulb_from_valid_fields_when_alert_is_unknown() {
        let registry = DeviceRegistry::from_catalog(
            vec![snapshot(
                "lamp",
                ModelKey::new("Extended color light", "Philips", "LCT015"),
                serde_json::json!({"on": true, "bri": 180, "alert": "blink"}),
            )],
            &Catalog::builtin(),
        );
        let light = registry.light(&DeviceId::from("lamp")).unwrap();
        assert_eq!(light.state().bri, Some(180));
        assert_eq!(light.state().on, Some(true));
    }

    #[test]
    fn should_reject_duplicate_registration() {
        let mut registry = registry();
        let again = build_device(bulb("lamp"), &Catalog::builtin()).unwrap();
        assert!(!registry.register(again));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn should_dispatch_to_owning_device() {
        let mut h = Harness::new();
        let mut registry = registry();
        let telemetry = Telemetry::button("remote", 1002);

        assert!(registry.dispatch(&telemetry, &mut h.ctx));
        assert_eq!(h.event_names(), vec!["released_on"]);
    }

    #[test]
    fn should_drop_telemetry_for_unknown_device() {
        let mut h = Harness::new();
        let mut registry = registry();
        let telemetry = Telemetry {
            id: DeviceId::from("ghost"),
            payload: Payload::Button { code: 1002 },
        };

        assert!(!registry.dispatch(&telemetry, &mut h.ctx));
        assert!(h.event_names().is_empty());
    }

    #[test]
    fn should_expose_typed_accessors() {
        let mut registry = registry();
        assert!(registry.light_mut(&DeviceId::from("remote")).is_none());
        assert!(registry.dimmer_mut(&DeviceId::from("remote")).is_some());
        assert_eq!(
            registry.ids().map(DeviceId::as_str).collect::<Vec<_>>(),
            vec!["lamp", "remote"]
        );
    }
}
