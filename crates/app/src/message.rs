//! Messages consumed by the hub task.

use tokio::sync::oneshot;

use lumenhub_domain::error::HubError;
use lumenhub_domain::id::DeviceId;
use lumenhub_domain::light_state::LightState;
use lumenhub_domain::scene::Scene;
use lumenhub_domain::telemetry::Telemetry;

use crate::devices::SceneRequest;
use crate::timer::TimerFired;

/// One unit of work for the hub, processed strictly in arrival order.
#[derive(Debug)]
pub enum HubMessage {
    /// Inbound gateway telemetry.
    Telemetry(Telemetry),
    /// A scene expiry or hold-repeat timer elapsed.
    TimerFired(TimerFired),
    /// A control command from an external caller.
    Command {
        command: Command,
        reply: oneshot::Sender<Result<(), HubError>>,
    },
    /// Read a light's authoritative state and scenes.
    InspectLight {
        device: DeviceId,
        reply: oneshot::Sender<Option<LightView>>,
    },
    /// Stop the hub loop.
    Shutdown,
}

/// Control commands accepted through [`HubHandle`](crate::hub::HubHandle).
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    SetRoomScene { room: String, scene: String },
    CreateScene { room: String, request: SceneRequest },
    DeleteScene { room: String, scene: String },
    SwitchOutlet { device: DeviceId, on: bool },
    SetSensorEnabled { device: DeviceId, enabled: bool },
    TriggerAutomation { name: String },
}

/// Read-only copy of a light.
#[derive(Debug, Clone, PartialEq)]
pub struct LightView {
    pub state: LightState,
    /// Scenes in insertion order.
    pub scenes: Vec<Scene>,
}
