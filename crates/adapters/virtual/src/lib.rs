//! # lumenhub-adapter-virtual
//!
//! Virtual gateway that simulates a Zigbee bridge for demos and tests.
//!
//! ## Behaviour
//!
//! | Operation | Effect |
//! |-----------|--------|
//! | `fetch_catalog` | Returns the configured devices (a demo set by default) |
//! | `activate_state` | Merges the state into the simulated device, records it, and echoes it back as telemetry |
//! | [`VirtualGateway::press`] | Emits a raw button code for a remote |
//! | [`VirtualGateway::motion`] | Flips a motion sensor's `presence` and emits it |
//!
//! Every change is rendered as the gateway's websocket `changed` frame and
//! parsed with [`Telemetry::from_value`], so the simulated stream goes
//! through the same parser a network transport would. The resulting
//! telemetry goes to the receiver returned by [`VirtualGateway::new`]; the
//! daemon forwards it into the hub.
//!
//! ## Dependency rule
//!
//! Depends on `lumenhub-app` (port traits) and `lumenhub-domain` only.

pub mod config;
pub mod error;

use std::sync::{Mutex, MutexGuard, PoisonError};

use serde_json::{Map, Value};
use tokio::sync::mpsc;

use lumenhub_app::ports::Gateway;
use lumenhub_domain::device::{DeviceSnapshot, GatewayTarget, ResourceKind};
use lumenhub_domain::error::HubError;
use lumenhub_domain::id::DeviceId;
use lumenhub_domain::light_state::LightState;
use lumenhub_domain::telemetry::Telemetry;

pub use config::VirtualConfig;
pub use error::VirtualError;

/// Simulated gateway holding one copy of every device's state.
pub struct VirtualGateway {
    devices: Mutex<Vec<DeviceSnapshot>>,
    activations: Mutex<Vec<(GatewayTarget, LightState)>>,
    telemetry: mpsc::UnboundedSender<Telemetry>,
}

impl VirtualGateway {
    /// Create a gateway simulating `config.devices`, plus the receiver of
    /// the telemetry it emits.
    #[must_use]
    pub fn new(config: VirtualConfig) -> (Self, mpsc::UnboundedReceiver<Telemetry>) {
        let (telemetry, receiver) = mpsc::unbounded_channel();
        let gateway = Self {
            devices: Mutex::new(config.devices),
            activations: Mutex::new(Vec::new()),
            telemetry,
        };
        (gateway, receiver)
    }

    /// Every activation received so far, oldest first.
    #[must_use]
    pub fn activations(&self) -> Vec<(GatewayTarget, LightState)> {
        lock(&self.activations).clone()
    }

    /// Current simulated state of a device.
    #[must_use]
    pub fn device_state(&self, id: &DeviceId) -> Option<Value> {
        lock(&self.devices)
            .iter()
            .find(|device| &device.unique_id == id)
            .map(|device| device.state.clone())
    }

    /// Simulate a raw button event on a remote.
    ///
    /// # Errors
    ///
    /// Returns [`VirtualError::UnknownDevice`] if no device has that id.
    pub fn press(&self, id: &DeviceId, code: u32) -> Result<(), VirtualError> {
        let delta = Map::from_iter([("buttonevent".to_string(), Value::from(code))]);
        let frame = self
            .update(|device| &device.unique_id == id, delta)
            .ok_or_else(|| VirtualError::UnknownDevice(id.to_string()))?;
        self.emit(frame);
        Ok(())
    }

    /// Simulate a motion sensor changing presence.
    ///
    /// # Errors
    ///
    /// Returns [`VirtualError::UnknownDevice`] if no device has that id.
    pub fn motion(&self, id: &DeviceId, present: bool) -> Result<(), VirtualError> {
        let delta = Map::from_iter([("presence".to_string(), Value::from(present))]);
        let frame = self
            .update(|device| &device.unique_id == id, delta)
            .ok_or_else(|| VirtualError::UnknownDevice(id.to_string()))?;
        self.emit(frame);
        Ok(())
    }

    /// Merge `delta` into the first matching device and return the
    /// `changed` event frame a real gateway would push for it.
    fn update(
        &self,
        matches: impl Fn(&DeviceSnapshot) -> bool,
        delta: Map<String, Value>,
    ) -> Option<Value> {
        let mut devices = lock(&self.devices);
        let device = devices.iter_mut().find(|device| matches(device))?;
        merge(&mut device.state, delta.clone());
        Some(changed_frame(device, delta))
    }

    /// Push a frame through the same parser an external transport uses.
    fn emit(&self, frame: Value) {
        match Telemetry::from_value(frame) {
            Ok(telemetry) => {
                if self.telemetry.send(telemetry).is_err() {
                    tracing::debug!("telemetry receiver dropped");
                }
            }
            Err(err) => tracing::warn!(error = %err, "simulated frame rejected"),
        }
    }

    fn apply(&self, target: &GatewayTarget, state: &LightState) -> Result<(), VirtualError> {
        let mut delta = match serde_json::to_value(state).map_err(VirtualError::Encode)? {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        // Command-only field; a gateway never reports it back.
        delta.remove("transitiontime");

        let frame = self
            .update(|device| &device.target() == target, delta)
            .ok_or_else(|| VirtualError::UnknownTarget(target.to_string()))?;
        lock(&self.activations).push((target.clone(), state.clone()));
        tracing::debug!(path = %target, "simulated activation");
        self.emit(frame);
        Ok(())
    }
}

/// deCONZ-style websocket event announcing a state change.
fn changed_frame(device: &DeviceSnapshot, state: Map<String, Value>) -> Value {
    let resource = match device.resource {
        ResourceKind::Light => "lights",
        ResourceKind::Sensor => "sensors",
    };
    Value::Object(Map::from_iter([
        ("t".to_string(), Value::from("event")),
        ("e".to_string(), Value::from("changed")),
        ("r".to_string(), Value::from(resource)),
        ("id".to_string(), Value::from(device.gateway_id.clone())),
        ("uniqueid".to_string(), Value::from(device.unique_id.as_str())),
        ("state".to_string(), Value::Object(state)),
    ]))
}

impl Gateway for VirtualGateway {
    fn name(&self) -> &'static str {
        "virtual"
    }

    async fn fetch_catalog(&self) -> Result<Vec<DeviceSnapshot>, HubError> {
        Ok(lock(&self.devices).clone())
    }

    async fn activate_state(
        &self,
        target: &GatewayTarget,
        state: &LightState,
    ) -> Result<(), HubError> {
        self.apply(target, state).map_err(VirtualError::into_domain)
    }
}

fn merge(state: &mut Value, delta: Map<String, Value>) {
    match state {
        Value::Object(map) => map.extend(delta),
        other => *other = Value::Object(delta),
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
