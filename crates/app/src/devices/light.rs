//! Light — a dimmable bulb carrying scenes.
//!
//! The light's authoritative state is only ever updated by inbound deltas.
//! What gets sent downstream is the composition of its enabled scenes,
//! which is never written back.

use std::time::Duration;

use indexmap::IndexMap;

use lumenhub_domain::composition::compose;
use lumenhub_domain::device::GatewayTarget;
use lumenhub_domain::event::EventKind;
use lumenhub_domain::id::DeviceId;
use lumenhub_domain::light_state::LightState;
use lumenhub_domain::scene::Scene;
use lumenhub_domain::telemetry::Payload;

use super::TelemetryHandler;
use crate::context::Context;
use crate::outbox::Activation;
use crate::timer::{Timer, TimerTarget, TimerToken};

/// Parameters of a scene creation.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneRequest {
    pub name: String,
    /// Lifetime of the scene; zero never expires.
    pub ttl: Duration,
    pub priority: i32,
    /// Target state; `None` snapshots the light's authoritative state.
    pub state: Option<LightState>,
    pub transparent: bool,
}

impl SceneRequest {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ttl: Duration::ZERO,
            priority: 0,
            state: None,
            transparent: false,
        }
    }

    #[must_use]
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    #[must_use]
    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    #[must_use]
    pub fn state(mut self, state: LightState) -> Self {
        self.state = Some(state);
        self
    }

    #[must_use]
    pub fn transparent(mut self, transparent: bool) -> Self {
        self.transparent = transparent;
        self
    }
}

#[derive(Debug)]
struct SceneSlot {
    scene: Scene,
    expiry: Timer,
}

#[derive(Debug)]
pub struct Light {
    id: DeviceId,
    target: GatewayTarget,
    name: String,
    state: LightState,
    scenes: IndexMap<String, SceneSlot>,
}

impl Light {
    /// Create a light from its catalog state. A light reported as off is
    /// recorded with brightness 0.
    #[must_use]
    pub fn new(
        id: DeviceId,
        target: GatewayTarget,
        name: impl Into<String>,
        initial: LightState,
    ) -> Self {
        Self {
            id,
            target,
            name: name.into(),
            state: initial.normalized_initial(),
            scenes: IndexMap::new(),
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

    /// Authoritative state, as last reported by the device.
    #[must_use]
    pub fn state(&self) -> &LightState {
        &self.state
    }

    #[must_use]
    pub fn scene(&self, name: &str) -> Option<&Scene> {
        self.scenes.get(name).map(|slot| &slot.scene)
    }

    /// Scenes in insertion order.
    pub fn scenes(&self) -> impl Iterator<Item = &Scene> {
        self.scenes.values().map(|slot| &slot.scene)
    }

    #[must_use]
    pub fn scene_count(&self) -> usize {
        self.scenes.len()
    }

    /// Whether the scene `name` has a pending expiry.
    #[must_use]
    pub fn expiry_armed(&self, name: &str) -> bool {
        self.scenes
            .get(name)
            .is_some_and(|slot| slot.expiry.is_armed())
    }

    /// Shallow-merge an inbound delta into the authoritative state.
    pub fn merge_delta(&mut self, delta: &LightState) {
        self.state.merge(delta);
    }

    /// Register a scene. Returns `false` when the name already exists, in
    /// which case only its expiry is restarted (if `ttl` is non-zero).
    #[tracing::instrument(skip_all, fields(light = %self.id, scene = %request.name))]
    pub fn create_scene(&mut self, request: SceneRequest, ctx: &mut Context) -> bool {
        let target = TimerTarget::SceneExpiry {
            device: self.id.clone(),
            scene: request.name.clone(),
        };

        if let Some(slot) = self.scenes.get_mut(&request.name) {
            if request.ttl.is_zero() {
                tracing::debug!("scene already exists");
            } else {
                slot.expiry.arm_once(ctx.scheduler(), request.ttl, target);
                tracing::debug!(ttl = ?request.ttl, "scene already exists, expiry restarted");
            }
            return false;
        }

        let state = request.state.unwrap_or_else(|| self.state.clone());
        let scene = match Scene::builder()
            .name(request.name.clone())
            .priority(request.priority)
            .transparent(request.transparent)
            .state(state)
            .build()
        {
            Ok(scene) => scene,
            Err(err) => {
                tracing::warn!(error = %err, "rejected scene");
                return false;
            }
        };

        let mut expiry = Timer::idle();
        if !request.ttl.is_zero() {
            expiry.arm_once(ctx.scheduler(), request.ttl, target);
        }
        self.scenes
            .insert(request.name.clone(), SceneSlot { scene, expiry });
        ctx.emit(
            Some(&self.id),
            EventKind::SceneCreated {
                scene: request.name,
            },
        );
        true
    }

    /// Remove a scene and recompose. Returns whether it existed.
    #[tracing::instrument(skip(self, ctx), fields(light = %self.id))]
    pub fn delete_scene(&mut self, name: &str, ctx: &mut Context) -> bool {
        self.remove_scene(name, false, ctx)
    }

    /// Handle an expiry firing. Stale tokens (the scene was deleted,
    /// recreated, or its expiry restarted) are ignored.
    pub fn expire_scene(&mut self, token: TimerToken, name: &str, ctx: &mut Context) -> bool {
        let current = self
            .scenes
            .get(name)
            .is_some_and(|slot| slot.expiry.is_current(token));
        if !current {
            tracing::debug!(light = %self.id, scene = name, "discarding stale scene expiry");
            return false;
        }
        tracing::debug!(light = %self.id, scene = name, "scene expired");
        self.remove_scene(name, true, ctx)
    }

    fn remove_scene(&mut self, name: &str, expired: bool, ctx: &mut Context) -> bool {
        // Dropping the slot cancels its expiry.
        let Some(_slot) = self.scenes.shift_remove(name) else {
            tracing::warn!(light = %self.id, scene = name, "scene to delete does not exist");
            return false;
        };
        self.recompute(ctx);
        ctx.emit(
            Some(&self.id),
            EventKind::SceneDeleted {
                scene: name.to_string(),
                expired,
            },
        );
        true
    }

    /// Enable `name` and disable every other non-special scene, then
    /// recompose. Special scenes are left untouched; an unknown name simply
    /// disables all non-special scenes.
    #[tracing::instrument(skip(self, ctx), fields(light = %self.id))]
    pub fn set_active_scene(&mut self, name: &str, ctx: &mut Context) {
        if !self.scenes.contains_key(name) {
            tracing::warn!("active scene does not exist on this light");
        }
        for (scene_name, slot) in &mut self.scenes {
            if !slot.scene.is_special() {
                slot.scene.enabled = scene_name == name;
            }
        }
        self.recompute(ctx);
    }

    /// Step the brightness of a scene (saturating at 254, flooring at 1)
    /// and recompose. Returns whether the scene exists.
    pub fn adjust_scene_brightness(&mut self, name: &str, step: i32, ctx: &mut Context) -> bool {
        let Some(slot) = self.scenes.get_mut(name) else {
            tracing::debug!(light = %self.id, scene = name, "no scene to adjust");
            return false;
        };
        slot.scene.adjust_brightness(step);
        self.recompute(ctx);
        true
    }

    /// Recompose with the default transition.
    pub fn recompute(&mut self, ctx: &mut Context) {
        let transition = ctx.settings().default_transition;
        self.recompute_with(transition, ctx);
    }

    /// Compose enabled scenes and send exactly one activation.
    pub fn recompute_with(&mut self, transition: u16, ctx: &mut Context) {
        let composition = compose(self.scenes.values().map(|slot| &slot.scene));
        for (a, b) in &composition.ties {
            tracing::warn!(
                light = %self.id,
                first = a,
                second = b,
                "enabled scenes share a priority, insertion order decides"
            );
        }
        tracing::debug!(
            light = %self.id,
            winner = composition.winner.map(Scene::name),
            bri = composition.state.brightness(),
            "recomposed"
        );
        ctx.activate(Activation {
            device: self.id.clone(),
            target: self.target.clone(),
            state: composition.state.into_activation(transition),
        });
    }
}

impl TelemetryHandler for Light {
    fn id(&self) -> &DeviceId {
        &self.id
    }

    fn handle_telemetry(&mut self, payload: &Payload, ctx: &mut Context) {
        let Payload::State(map) = payload else {
            tracing::debug!(light = %self.id, "ignoring button payload");
            return;
        };
        let (state, rejected) = LightState::from_fields(map);
        if !rejected.is_empty() {
            tracing::warn!(light = %self.id, fields = ?rejected, "dropping unparsable state fields");
        }
        if !map.is_empty() && rejected.len() == map.len() {
            return;
        }
        self.merge_delta(&state);
        ctx.emit(
            Some(&self.id),
            EventKind::StateMerged {
                delta: serde_json::Value::Object(map.clone()),
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::testing::Harness;
    use crate::message::HubMessage;

    fn light(bri: i32) -> Light {
        Light::new(
            DeviceId::from("lamp"),
            GatewayTarget::light("3"),
            "Desk",
            LightState {
                bri: Some(bri),
                on: Some(bri > 0),
                ct: Some(366),
                ..LightState::default()
            },
        )
    }

    fn bri(bri: i32) -> LightState {
        LightState::with_brightness(bri)
    }

    // ── Construction and merging ───────────────────────────────────

    #[test]
    fn should_force_brightness_to_zero_when_initially_off() {
        let light = Light::new(
            DeviceId::from("lamp"),
            GatewayTarget::light("3"),
            "Desk",
            LightState {
                bri: Some(120),
                on: Some(false),
                ..LightState::default()
            },
        );
        assert_eq!(light.state().bri, Some(0));
    }

    #[tokio::test]
    async fn should_merge_state_telemetry_and_emit_event() {
        let mut h = Harness::new();
        let mut light = light(10);
        let payload = Payload::State(
            serde_json::json!({"bri": 300, "reachable": false})
                .as_object()
                .cloned()
                .unwrap(),
        );

        light.handle_telemetry(&payload, &mut h.ctx);

        assert_eq!(light.state().bri, Some(300));
        assert_eq!(light.state().reachable, Some(false));
        assert_eq!(light.state().ct, Some(366));
        assert_eq!(h.event_names(), vec!["state_changed"]);
        assert!(h.sent().is_empty());
    }

    #[tokio::test]
    async fn should_ignore_unparsable_state_payload() {
        let mut h = Harness::new();
        let mut light = light(10);
        let payload = Payload::State(
            serde_json::json!({"bri": "bright"})
                .as_object()
                .cloned()
                .unwrap(),
        );

        light.handle_telemetry(&payload, &mut h.ctx);

        assert_eq!(light.state().bri, Some(10));
        assert!(h.event_names().is_empty());
    }

    #[tokio::test]
    async fn should_apply_valid_fields_when_delta_carries_unknown_alert() {
        let mut h = Harness::new();
        let mut light = light(10);
        let payload = Payload::State(
            serde_json::json!({"bri": 120, "alert": "blink", "speed": 3})
                .as_object()
                .cloned()
                .unwrap(),
        );

        light.handle_telemetry(&payload, &mut h.ctx);

        assert_eq!(light.state().bri, Some(120));
        assert_eq!(light.state().alert, None);
        assert_eq!(h.event_names(), vec!["state_changed"]);
    }

    // ── Scene lifecycle ────────────────────────────────────────────

    #[tokio::test]
    async fn should_return_false_and_keep_count_when_creating_existing_scene() {
        let mut h = Harness::new();
        let mut light = light(10);

        assert!(light.create_scene(SceneRequest::new("evening"), &mut h.ctx));
        assert!(!light.create_scene(SceneRequest::new("evening"), &mut h.ctx));
        assert_eq!(light.scene_count(), 1);
    }

    #[tokio::test]
    async fn should_snapshot_authoritative_state_when_no_state_given() {
        let mut h = Harness::new();
        let mut light = light(77);
        light.create_scene(SceneRequest::new("day"), &mut h.ctx);
        assert_eq!(light.scene("day").unwrap().state, *light.state());
    }

    #[tokio::test]
    async fn should_not_recompute_when_creating_scene() {
        let mut h = Harness::new();
        let mut light = light(77);
        light.create_scene(SceneRequest::new("day"), &mut h.ctx);
        assert!(h.sent().is_empty());
        assert_eq!(h.event_names(), vec!["scene_created"]);
    }

    #[tokio::test]
    async fn should_return_false_and_leave_others_when_deleting_missing_scene() {
        let mut h = Harness::new();
        let mut light = light(10);
        light.create_scene(SceneRequest::new("day"), &mut h.ctx);

        assert!(!light.delete_scene("night", &mut h.ctx));
        assert_eq!(light.scene_count(), 1);
        assert!(h.sent().is_empty());
    }

    #[tokio::test]
    async fn should_recompute_once_when_deleting_scene() {
        let mut h = Harness::new();
        let mut light = light(10);
        light.create_scene(SceneRequest::new("day").state(bri(100)), &mut h.ctx);
        light.create_scene(
            SceneRequest::new("_alarm").priority(5).state(bri(254)),
            &mut h.ctx,
        );

        assert!(light.delete_scene("_alarm", &mut h.ctx));

        let sent = h.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].state.bri, Some(100));
    }

    #[tokio::test(start_paused = true)]
    async fn should_leave_other_timers_armed_when_deleting_untimed_scene() {
        let mut h = Harness::new();
        let mut light = light(10);
        light.create_scene(SceneRequest::new("day"), &mut h.ctx);
        light.create_scene(
            SceneRequest::new("_motion").ttl(Duration::from_secs(60)),
            &mut h.ctx,
        );

        assert!(light.delete_scene("day", &mut h.ctx));
        assert!(light.expiry_armed("_motion"));
    }

    #[tokio::test(start_paused = true)]
    async fn should_delete_scene_when_expiry_fires() {
        let mut h = Harness::new();
        let mut light = light(10);
        light.create_scene(
            SceneRequest::new("_motion").ttl(Duration::from_secs(30)),
            &mut h.ctx,
        );

        let Some(HubMessage::TimerFired(fired)) = h.messages.recv().await else {
            panic!("expected expiry");
        };
        let TimerTarget::SceneExpiry { scene, .. } = fired.target else {
            panic!("expected scene expiry");
        };

        assert!(light.expire_scene(fired.token, &scene, &mut h.ctx));
        assert_eq!(light.scene_count(), 0);
        assert!(h.event_names().contains(&"scene_deleted".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn should_discard_expiry_of_restarted_timer() {
        let mut h = Harness::new();
        let mut light = light(10);
        let request = SceneRequest::new("_motion").ttl(Duration::from_secs(30));
        light.create_scene(request.clone(), &mut h.ctx);

        tokio::time::sleep(Duration::from_secs(20)).await;
        assert!(!light.create_scene(request, &mut h.ctx));

        // The restarted timer fires 30s after the restart, not after creation.
        tokio::time::sleep(Duration::from_secs(15)).await;
        assert!(h.messages.try_recv().is_err());

        let Some(HubMessage::TimerFired(fired)) = h.messages.recv().await else {
            panic!("expected expiry");
        };
        assert!(light.expire_scene(fired.token, "_motion", &mut h.ctx));
    }

    #[tokio::test(start_paused = true)]
    async fn should_ignore_expiry_after_manual_delete() {
        let mut h = Harness::new();
        let mut light = light(10);
        light.create_scene(
            SceneRequest::new("_motion").ttl(Duration::from_secs(1)),
            &mut h.ctx,
        );
        tokio::time::sleep(Duration::from_secs(2)).await;
        let Ok(HubMessage::TimerFired(fired)) = h.messages.try_recv() else {
            panic!("expected queued expiry");
        };

        assert!(light.delete_scene("_motion", &mut h.ctx));
        assert!(!light.expire_scene(fired.token, "_motion", &mut h.ctx));
    }

    // ── Composition ────────────────────────────────────────────────

    #[tokio::test]
    async fn should_send_brighter_lower_scene_below_transparent_scene() {
        let mut h = Harness::new();
        let mut light = light(0);
        light.create_scene(
            SceneRequest::new("a").priority(10).transparent(true).state(bri(50)),
            &mut h.ctx,
        );
        light.create_scene(SceneRequest::new("b").priority(5).state(bri(200)), &mut h.ctx);

        light.recompute(&mut h.ctx);

        let sent = h.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].state.bri, Some(200));
        assert_eq!(sent[0].state.on, Some(true));
        assert_eq!(sent[0].state.transitiontime, Some(4));
    }

    #[tokio::test]
    async fn should_send_off_when_no_scene_enabled() {
        let mut h = Harness::new();
        let mut light = light(100);
        light.recompute_with(0, &mut h.ctx);

        let sent = h.sent();
        assert_eq!(sent[0].state.bri, Some(0));
        assert_eq!(sent[0].state.on, Some(false));
        assert_eq!(sent[0].state.transitiontime, Some(0));
    }

    #[tokio::test]
    async fn should_toggle_only_non_special_scenes_when_setting_active_scene() {
        let mut h = Harness::new();
        let mut light = light(10);
        for name in ["day", "night", "_motion"] {
            light.create_scene(SceneRequest::new(name), &mut h.ctx);
        }
        light.set_active_scene("night", &mut h.ctx);

        assert!(!light.scene("day").unwrap().enabled);
        assert!(light.scene("night").unwrap().enabled);
        assert!(light.scene("_motion").unwrap().enabled);
        assert_eq!(h.sent().len(), 1);
    }

    #[tokio::test]
    async fn should_disable_all_non_special_scenes_when_active_scene_is_unknown() {
        let mut h = Harness::new();
        let mut light = light(10);
        light.create_scene(SceneRequest::new("day"), &mut h.ctx);
        light.set_active_scene("party", &mut h.ctx);
        assert!(!light.scene("day").unwrap().enabled);
    }

    #[tokio::test]
    async fn should_floor_at_one_when_adjusting_brightness_down() {
        let mut h = Harness::new();
        let mut light = light(10);
        light.create_scene(SceneRequest::new("day").state(bri(30)), &mut h.ctx);

        assert!(light.adjust_scene_brightness("day", -100, &mut h.ctx));
        assert_eq!(light.scene("day").unwrap().brightness(), 1);
        assert_eq!(h.sent()[0].state.on, Some(true));
        assert!(!light.adjust_scene_brightness("night", 10, &mut h.ctx));
    }
}
