//! Automation engine — reacts to hub events by evaluating and executing
//! automations.
//!
//! The hub feeds every event it publishes through
//! [`AutomationEngine::process_event`]. For each enabled automation whose
//! trigger matches, conditions are evaluated and, if all pass, the actions
//! run in order against the hub state. A failing action (unknown room or
//! outlet) is logged and the remaining actions still run.

use std::time::Duration;

use chrono::NaiveTime;

use lumenhub_domain::automation::{Action, Automation, Condition};
use lumenhub_domain::error::{HubError, NotFoundError};
use lumenhub_domain::event::Event;
use lumenhub_domain::id::AutomationId;
use lumenhub_domain::light_state::LightState;

use crate::context::Context;
use crate::devices::SceneRequest;
use crate::hub::{HubState, unknown_room, unknown_sensor};

/// Reactive automation engine owned by the hub.
#[derive(Debug, Default)]
pub struct AutomationEngine {
    automations: Vec<Automation>,
}

impl AutomationEngine {
    /// Create a new engine. Invalid automations are logged and dropped.
    #[must_use]
    pub fn new(automations: Vec<Automation>) -> Self {
        let automations = automations
            .into_iter()
            .filter(|automation| match automation.validate() {
                Ok(()) => true,
                Err(err) => {
                    tracing::warn!(name = %automation.name, error = %err, "dropping invalid automation");
                    false
                }
            })
            .collect();
        Self { automations }
    }

    #[must_use]
    pub fn automations(&self) -> &[Automation] {
        &self.automations
    }

    /// Process a single event at the current local time.
    pub fn process_event(
        &mut self,
        event: &Event,
        state: &mut HubState,
        ctx: &mut Context,
    ) -> Vec<AutomationId> {
        let at = lumenhub_domain::time::local_time_of_day();
        self.process_event_at(event, at, state, ctx)
    }

    /// Process a single event as if the local time were `at`.
    pub fn process_event_at(
        &mut self,
        event: &Event,
        at: NaiveTime,
        state: &mut HubState,
        ctx: &mut Context,
    ) -> Vec<AutomationId> {
        let mut triggered = Vec::new();

        for automation in &mut self.automations {
            if !automation.enabled || !automation.trigger.matches_event(event) {
                continue;
            }
            if !evaluate_conditions(&automation.conditions, at, state) {
                tracing::debug!(automation = %automation.name, "conditions not met");
                continue;
            }

            tracing::info!(automation = %automation.name, event = %event.name(), "automation triggered");
            execute_actions(&automation.actions, state, ctx);
            automation.last_triggered = Some(lumenhub_domain::time::now());
            triggered.push(automation.id);
        }

        triggered
    }

    /// Run an automation by name, ignoring its trigger but honouring its
    /// conditions.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::NotFound`] if no enabled automation has that name.
    pub fn trigger_manual(
        &mut self,
        name: &str,
        state: &mut HubState,
        ctx: &mut Context,
    ) -> Result<bool, HubError> {
        let at = lumenhub_domain::time::local_time_of_day();
        let automation = self
            .automations
            .iter_mut()
            .find(|a| a.enabled && a.name == name)
            .ok_or_else(|| NotFoundError {
                entity: "Automation",
                id: name.to_string(),
            })?;

        if !evaluate_conditions(&automation.conditions, at, state) {
            return Ok(false);
        }
        tracing::info!(automation = %automation.name, "automation triggered manually");
        execute_actions(&automation.actions, state, ctx);
        automation.last_triggered = Some(lumenhub_domain::time::now());
        Ok(true)
    }
}

/// Evaluate all conditions (logical AND). Returns `true` if empty.
fn evaluate_conditions(conditions: &[Condition], at: NaiveTime, state: &HubState) -> bool {
    conditions.iter().all(|condition| match condition {
        Condition::RoomSceneIs { room, scene } => state
            .rooms
            .get(room)
            .is_some_and(|r| r.active_scene() == scene),
        Condition::TimeRange { .. } => condition.time_range_contains(at).unwrap_or(false),
    })
}

/// Execute actions in order, logging failures.
fn execute_actions(actions: &[Action], state: &mut HubState, ctx: &mut Context) {
    for action in actions {
        if let Err(err) = execute_action(action, state, ctx) {
            tracing::warn!(%action, error = %err, "automation action failed");
        }
    }
}

/// Execute a single action.
fn execute_action(action: &Action, state: &mut HubState, ctx: &mut Context) -> Result<(), HubError> {
    let HubState { registry, rooms } = state;
    match action {
        Action::SetRoomScene { room, scene } => {
            rooms
                .get_mut(room)
                .ok_or_else(|| unknown_room(room))?
                .set_active_scene(scene, registry, ctx);
        }
        Action::CreateScene {
            room,
            scene,
            ttl_secs,
            brightness,
            priority,
            transparent,
        } => {
            let room = rooms.get(room).ok_or_else(|| unknown_room(room))?;
            let ttl = ttl_secs.map_or(ctx.settings().default_scene_ttl, Duration::from_secs);
            let mut request = SceneRequest::new(scene.clone())
                .ttl(ttl)
                .priority(*priority)
                .transparent(*transparent);
            if let Some(bri) = brightness {
                request = request.state(LightState::with_brightness(*bri));
            }
            room.create_scene(&request, registry, ctx);
        }
        Action::DeleteScene { room, scene } => {
            rooms
                .get(room)
                .ok_or_else(|| unknown_room(room))?
                .delete_scene(scene, registry, ctx);
        }
        Action::AdjustBrightness { room, scene, step } => {
            rooms
                .get(room)
                .ok_or_else(|| unknown_room(room))?
                .adjust_brightness(scene, *step, registry, ctx);
        }
        Action::SwitchOutlet { device, on } => {
            registry
                .outlet_mut(device)
                .ok_or_else(|| NotFoundError {
                    entity: "Outlet",
                    id: device.to_string(),
                })?
                .switch(*on, ctx);
        }
        Action::SwitchFirstOffOn { room } => {
            rooms
                .get(room)
                .ok_or_else(|| unknown_room(room))?
                .switch_first_off_on(registry, ctx);
        }
        Action::SwitchLastOnOff { room } => {
            rooms
                .get(room)
                .ok_or_else(|| unknown_room(room))?
                .switch_last_on_off(registry, ctx);
        }
        Action::SetSensorEnabled { device, enabled } => {
            registry
                .sensor_mut(device)
                .ok_or_else(|| unknown_sensor(device))?
                .set_enabled(*enabled);
        }
    }
    Ok(())
}
