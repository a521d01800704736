//! Hub — the single task that owns every device and processes messages one
//! at a time.
//!
//! [`start`] fetches the gateway catalog, registers the supported devices,
//! creates the default scenes of every room and spawns the message loop.
//! Callers talk to the loop through a cloneable [`HubHandle`].
//!
//! After each message the hub drains the events it produced, feeds them to
//! the [`AutomationEngine`] and publishes them. Events produced by
//! automation actions go through the same path.

use std::sync::Arc;

use indexmap::IndexMap;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use lumenhub_domain::automation::Automation;
use lumenhub_domain::catalog::Catalog;
use lumenhub_domain::error::{HubError, NotFoundError};
use lumenhub_domain::id::DeviceId;
use lumenhub_domain::telemetry::Telemetry;

use crate::automation_engine::AutomationEngine;
use crate::context::{Context, HubSettings};
use crate::devices::SceneRequest;
use crate::message::{Command, HubMessage, LightView};
use crate::outbox::{self, Outbox};
use crate::ports::{EventPublisher, Gateway};
use crate::registry::DeviceRegistry;
use crate::room::{DEFAULT_ACTIVE_SCENE, Room};
use crate::timer::{Scheduler, TimerFired, TimerTarget};

/// Everything the hub needs besides its ports.
#[derive(Debug, Clone)]
pub struct HubConfig {
    pub settings: HubSettings,
    pub catalog: Catalog,
    pub rooms: Vec<Room>,
    pub automations: Vec<Automation>,
    /// Scene selected in every room at startup.
    pub startup_scene: String,
    /// Remotes mounted upside down.
    pub inverted_remotes: Vec<DeviceId>,
    /// Sensors that start muted.
    pub disabled_sensors: Vec<DeviceId>,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            settings: HubSettings::default(),
            catalog: Catalog::builtin(),
            rooms: Vec::new(),
            automations: Vec::new(),
            startup_scene: DEFAULT_ACTIVE_SCENE.to_string(),
            inverted_remotes: Vec::new(),
            disabled_sensors: Vec::new(),
        }
    }
}

/// Devices and rooms, borrowed apart by room operations.
#[derive(Debug, Default)]
pub struct HubState {
    pub registry: DeviceRegistry,
    pub rooms: IndexMap<String, Room>,
}

impl HubState {
    #[must_use]
    pub fn new(registry: DeviceRegistry) -> Self {
        Self {
            registry,
            rooms: IndexMap::new(),
        }
    }
}

pub(crate) fn unknown_room(name: &str) -> NotFoundError {
    NotFoundError {
        entity: "Room",
        id: name.to_string(),
    }
}

pub(crate) fn unknown_sensor(id: &DeviceId) -> NotFoundError {
    NotFoundError {
        entity: "Sensor",
        id: id.to_string(),
    }
}

/// Cloneable entry point into a running hub.
#[derive(Debug, Clone)]
pub struct HubHandle {
    sender: mpsc::UnboundedSender<HubMessage>,
}

impl HubHandle {
    fn post(&self, message: HubMessage) -> Result<(), HubError> {
        self.sender.send(message).map_err(|_| HubError::Stopped)
    }

    /// Enqueue inbound telemetry.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Stopped`] once the hub loop has exited.
    pub fn telemetry(&self, telemetry: Telemetry) -> Result<(), HubError> {
        self.post(HubMessage::Telemetry(telemetry))
    }

    async fn command(&self, command: Command) -> Result<(), HubError> {
        let (reply, response) = oneshot::channel();
        self.post(HubMessage::Command { command, reply })?;
        response.await.map_err(|_| HubError::Stopped)?
    }

    /// Select `scene` in `room`.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::NotFound`] for an unknown room, or
    /// [`HubError::Stopped`] once the hub loop has exited.
    pub async fn set_room_scene(
        &self,
        room: impl Into<String>,
        scene: impl Into<String>,
    ) -> Result<(), HubError> {
        self.command(Command::SetRoomScene {
            room: room.into(),
            scene: scene.into(),
        })
        .await
    }

    /// Create a scene on every light of `room`.
    ///
    /// # Errors
    ///
    /// Same as [`set_room_scene`](Self::set_room_scene).
    pub async fn create_scene(
        &self,
        room: impl Into<String>,
        request: SceneRequest,
    ) -> Result<(), HubError> {
        self.command(Command::CreateScene {
            room: room.into(),
            request,
        })
        .await
    }

    /// Delete a scene from every light of `room`.
    ///
    /// # Errors
    ///
    /// Same as [`set_room_scene`](Self::set_room_scene).
    pub async fn delete_scene(
        &self,
        room: impl Into<String>,
        scene: impl Into<String>,
    ) -> Result<(), HubError> {
        self.command(Command::DeleteScene {
            room: room.into(),
            scene: scene.into(),
        })
        .await
    }

    /// Switch an outlet on or off.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::NotFound`] when `device` is not a registered outlet.
    pub async fn switch_outlet(&self, device: DeviceId, on: bool) -> Result<(), HubError> {
        self.command(Command::SwitchOutlet { device, on }).await
    }

    /// Enable or disable a sensor's motion and contact events.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::NotFound`] when `device` is not a registered sensor.
    pub async fn set_sensor_enabled(&self, device: DeviceId, enabled: bool) -> Result<(), HubError> {
        self.command(Command::SetSensorEnabled { device, enabled })
            .await
    }

    /// Run an automation by name.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::NotFound`] when no enabled automation has that name.
    pub async fn trigger_automation(&self, name: impl Into<String>) -> Result<(), HubError> {
        self.command(Command::TriggerAutomation { name: name.into() })
            .await
    }

    /// Snapshot a light's state and scenes. `None` when no such light.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Stopped`] once the hub loop has exited.
    pub async fn inspect_light(&self, device: DeviceId) -> Result<Option<LightView>, HubError> {
        let (reply, response) = oneshot::channel();
        self.post(HubMessage::InspectLight { device, reply })?;
        response.await.map_err(|_| HubError::Stopped)
    }

    /// Ask the hub loop to stop after the messages already queued.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Stopped`] when the loop has already exited.
    pub fn shutdown(&self) -> Result<(), HubError> {
        self.post(HubMessage::Shutdown)
    }
}

/// A started hub: its handle plus the tasks to await on shutdown.
#[derive(Debug)]
pub struct RunningHub {
    pub handle: HubHandle,
    pub task: JoinHandle<()>,
    pub dispatcher: JoinHandle<()>,
}

/// Bootstrap the hub against `gateway` and spawn its message loop.
///
/// # Errors
///
/// Returns [`HubError::Gateway`] when the catalog cannot be fetched.
#[tracing::instrument(skip_all, fields(gateway = gateway.name()))]
pub async fn start<G, P>(
    gateway: Arc<G>,
    publisher: P,
    config: HubConfig,
) -> Result<RunningHub, HubError>
where
    G: Gateway + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    let snapshots = gateway.fetch_catalog().await?;
    tracing::info!(count = snapshots.len(), "fetched device catalog");

    let (sender, receiver) = mpsc::unbounded_channel();
    let (outbox, activations) = Outbox::channel();
    let dispatcher = outbox::spawn_dispatcher(gateway, activations);
    let mut ctx = Context::new(Scheduler::new(sender.clone()), outbox, config.settings);

    let mut registry = DeviceRegistry::from_catalog(snapshots, &config.catalog);
    for id in &config.inverted_remotes {
        match registry.dimmer_mut(id) {
            Some(dimmer) => dimmer.set_inverted(true),
            None => tracing::warn!(remote = %id, "inverted remote is not a registered dimmer"),
        }
    }
    for id in &config.disabled_sensors {
        match registry.sensor_mut(id) {
            Some(sensor) => sensor.set_enabled(false),
            None => tracing::warn!(sensor = %id, "disabled sensor is not a registered sensor"),
        }
    }

    let mut state = HubState::new(registry);
    for mut room in config.rooms {
        if state.rooms.contains_key(room.name()) {
            tracing::warn!(room = room.name(), "duplicate room ignored");
            continue;
        }
        room.create_default_scenes(&config.startup_scene, &mut state.registry, &mut ctx);
        state.rooms.insert(room.name().to_string(), room);
    }
    tracing::info!(
        devices = state.registry.len(),
        rooms = state.rooms.len(),
        "hub ready"
    );

    let mut hub = Hub {
        state,
        ctx,
        engine: AutomationEngine::new(config.automations),
        publisher,
    };
    hub.flush().await;
    let task = tokio::spawn(async move { hub.run(receiver).await });

    Ok(RunningHub {
        handle: HubHandle { sender },
        task,
        dispatcher,
    })
}

struct Hub<P> {
    state: HubState,
    ctx: Context,
    engine: AutomationEngine,
    publisher: P,
}

impl<P: EventPublisher + Send + Sync> Hub<P> {
    async fn run(&mut self, mut receiver: mpsc::UnboundedReceiver<HubMessage>) {
        while let Some(message) = receiver.recv().await {
            match message {
                HubMessage::Shutdown => break,
                HubMessage::Command { command, reply } => {
                    let result = self.execute(command);
                    if let Err(err) = &result {
                        tracing::warn!(error = %err, "command failed");
                    }
                    // Reply once the command's events are out.
                    self.flush().await;
                    let _ = reply.send(result);
                }
                other => {
                    self.handle(other);
                    self.flush().await;
                }
            }
        }
        tracing::info!("hub stopped");
    }

    fn handle(&mut self, message: HubMessage) {
        match message {
            HubMessage::Telemetry(telemetry) => {
                self.state.registry.dispatch(&telemetry, &mut self.ctx);
            }
            HubMessage::TimerFired(fired) => self.timer_fired(fired),
            HubMessage::InspectLight { device, reply } => {
                let view = self.state.registry.light(&device).map(|light| LightView {
                    state: light.state().clone(),
                    scenes: light.scenes().cloned().collect(),
                });
                let _ = reply.send(view);
            }
            HubMessage::Command { .. } | HubMessage::Shutdown => {}
        }
    }

    fn timer_fired(&mut self, TimerFired { token, target }: TimerFired) {
        match target {
            TimerTarget::SceneExpiry { device, scene } => {
                match self.state.registry.light_mut(&device) {
                    Some(light) => {
                        light.expire_scene(token, &scene, &mut self.ctx);
                    }
                    None => tracing::debug!(light = %device, "expiry for unknown light"),
                }
            }
            TimerTarget::HoldRepeat { device } => match self.state.registry.dimmer_mut(&device) {
                Some(dimmer) => dimmer.tick(token, &mut self.ctx),
                None => tracing::debug!(remote = %device, "tick for unknown remote"),
            },
        }
    }

    fn execute(&mut self, command: Command) -> Result<(), HubError> {
        tracing::debug!(?command, "executing command");
        match command {
            Command::SetRoomScene { room, scene } => {
                let HubState { registry, rooms } = &mut self.state;
                rooms
                    .get_mut(&room)
                    .ok_or_else(|| unknown_room(&room))?
                    .set_active_scene(&scene, registry, &mut self.ctx);
            }
            Command::CreateScene { room, request } => {
                let HubState { registry, rooms } = &mut self.state;
                rooms
                    .get(&room)
                    .ok_or_else(|| unknown_room(&room))?
                    .create_scene(&request, registry, &mut self.ctx);
            }
            Command::DeleteScene { room, scene } => {
                let HubState { registry, rooms } = &mut self.state;
                rooms
                    .get(&room)
                    .ok_or_else(|| unknown_room(&room))?
                    .delete_scene(&scene, registry, &mut self.ctx);
            }
            Command::SwitchOutlet { device, on } => {
                self.state
                    .registry
                    .outlet_mut(&device)
                    .ok_or_else(|| NotFoundError {
                        entity: "Outlet",
                        id: device.to_string(),
                    })?
                    .switch(on, &mut self.ctx);
            }
            Command::SetSensorEnabled { device, enabled } => {
                self.state
                    .registry
                    .sensor_mut(&device)
                    .ok_or_else(|| unknown_sensor(&device))?
                    .set_enabled(enabled);
            }
            Command::TriggerAutomation { name } => {
                self.engine
                    .trigger_manual(&name, &mut self.state, &mut self.ctx)?;
            }
        }
        Ok(())
    }

    /// Feed pending events to the automation engine and publish them,
    /// until no new events are produced.
    async fn flush(&mut self) {
        loop {
            let events = self.ctx.drain_events();
            if events.is_empty() {
                return;
            }
            for event in events {
                self.engine
                    .process_event(&event, &mut self.state, &mut self.ctx);
                let name = event.name();
                if let Err(err) = self.publisher.publish(event).await {
                    tracing::error!(event = %name, error = %err, "failed to publish event");
                }
            }
        }
    }
}
