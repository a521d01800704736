//! Device behaviours owned by the registry.
//!
//! Every device handles the telemetry addressed to its unique id; what it
//! does with it depends on its class.

mod dimmer;
mod light;
mod outlet;
mod sensor;

pub use dimmer::Dimmer;
pub use light::{Light, SceneRequest};
pub use outlet::Outlet;
pub use sensor::Sensor;

use lumenhub_domain::id::DeviceId;
use lumenhub_domain::telemetry::Payload;

use crate::context::Context;

/// Capability of receiving inbound telemetry.
pub trait TelemetryHandler {
    fn id(&self) -> &DeviceId;

    fn handle_telemetry(&mut self, payload: &Payload, ctx: &mut Context);
}

/// A registered device.
#[derive(Debug)]
pub enum Device {
    Light(Light),
    Outlet(Outlet),
    Dimmer(Dimmer),
    Sensor(Sensor),
}

impl Device {
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Light(d) => d.name(),
            Self::Outlet(d) => d.name(),
            Self::Dimmer(d) => d.name(),
            Self::Sensor(d) => d.name(),
        }
    }

    /// Short class label for logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Light(_) => "light",
            Self::Outlet(_) => "outlet",
            Self::Dimmer(_) => "dimmer",
            Self::Sensor(_) => "sensor",
        }
    }
}

impl TelemetryHandler for Device {
    fn id(&self) -> &DeviceId {
        match self {
            Self::Light(d) => d.id(),
            Self::Outlet(d) => d.id(),
            Self::Dimmer(d) => d.id(),
            Self::Sensor(d) => d.id(),
        }
    }

    fn handle_telemetry(&mut self, payload: &Payload, ctx: &mut Context) {
        match self {
            Self::Light(d) => d.handle_telemetry(payload, ctx),
            Self::Outlet(d) => d.handle_telemetry(payload, ctx),
            Self::Dimmer(d) => d.handle_telemetry(payload, ctx),
            Self::Sensor(d) => d.handle_telemetry(payload, ctx),
        }
    }
}
