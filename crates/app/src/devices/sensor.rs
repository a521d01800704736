//! Sensors — motion, open/close, and passive readings.

use serde_json::{Map, Value};

use lumenhub_domain::catalog::SensorClass;
use lumenhub_domain::event::EventKind;
use lumenhub_domain::id::DeviceId;
use lumenhub_domain::telemetry::Payload;

use super::TelemetryHandler;
use crate::context::Context;

/// A sensor. Disabled sensors keep merging state but emit no semantic events.
#[derive(Debug)]
pub struct Sensor {
    id: DeviceId,
    name: String,
    class: SensorClass,
    enabled: bool,
    state: Map<String, Value>,
}

impl Sensor {
    #[must_use]
    pub fn new(
        id: DeviceId,
        name: impl Into<String>,
        class: SensorClass,
        initial: Map<String, Value>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            class,
            enabled: true,
            state: initial,
        }
    }

    #[must_use]
    pub fn id(&self) -> &DeviceId {
        &self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn class(&self) -> SensorClass {
        self.class
    }

    #[must_use]
    pub fn state(&self) -> &Map<String, Value> {
        &self.state
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        tracing::info!(sensor = %self.id, enabled, "sensor toggled");
        self.enabled = enabled;
    }

    fn semantic_event(&self, delta: &Map<String, Value>) -> Option<EventKind> {
        match self.class {
            SensorClass::Motion => delta
                .get("presence")
                .and_then(Value::as_bool)
                .map(|present| EventKind::Motion { present }),
            SensorClass::OpenClose => delta
                .get("open")
                .and_then(Value::as_bool)
                .map(|open| EventKind::Contact { open }),
            SensorClass::LightLevel
            | SensorClass::Temperature
            | SensorClass::Daylight
            | SensorClass::GenericStatus => None,
        }
    }
}

impl TelemetryHandler for Sensor {
    fn id(&self) -> &DeviceId {
        &self.id
    }

    fn handle_telemetry(&mut self, payload: &Payload, ctx: &mut Context) {
        let Payload::State(delta) = payload else {
            tracing::debug!(sensor = %self.id, "ignoring button payload");
            return;
        };
        self.state
            .extend(delta.iter().map(|(k, v)| (k.clone(), v.clone())));
        ctx.emit(
            Some(&self.id),
            EventKind::StateMerged {
                delta: Value::Object(delta.clone()),
            },
        );

        if !self.enabled {
            return;
        }
        if let Some(kind) = self.semantic_event(delta) {
            ctx.emit(Some(&self.id), kind);
        }
    }
}
