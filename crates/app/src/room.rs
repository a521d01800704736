//! Room — a named group of lights and outlets sharing an active scene.
//!
//! Rooms hold member ids, not devices: every operation looks members up in
//! the [`DeviceRegistry`] and applies sequentially, skipping (and logging)
//! ids that are missing or of the wrong kind. There is no atomicity across
//! members.

use lumenhub_domain::event::EventKind;
use lumenhub_domain::id::DeviceId;

use crate::context::Context;
use crate::devices::SceneRequest;
use crate::registry::DeviceRegistry;

/// Scenes a room guarantees on every member light unless configured otherwise.
pub const DEFAULT_SCENES: [&str; 4] = ["morning", "day", "evening", "night"];

/// Active scene of a freshly created room.
pub const DEFAULT_ACTIVE_SCENE: &str = "day";

#[derive(Debug, Clone)]
pub struct Room {
    name: String,
    lights: Vec<DeviceId>,
    outlets: Vec<DeviceId>,
    default_scenes: Vec<String>,
    active_scene: String,
}

impl Room {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lights: Vec::new(),
            outlets: Vec::new(),
            default_scenes: DEFAULT_SCENES.iter().map(ToString::to_string).collect(),
            active_scene: DEFAULT_ACTIVE_SCENE.to_string(),
        }
    }

    #[must_use]
    pub fn with_lights(mut self, lights: impl IntoIterator<Item = DeviceId>) -> Self {
        self.lights.extend(lights);
        self
    }

    #[must_use]
    pub fn with_outlets(mut self, outlets: impl IntoIterator<Item = DeviceId>) -> Self {
        self.outlets.extend(outlets);
        self
    }

    #[must_use]
    pub fn with_default_scenes(mut self, scenes: impl IntoIterator<Item = String>) -> Self {
        self.default_scenes = scenes.into_iter().collect();
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn active_scene(&self) -> &str {
        &self.active_scene
    }

    #[must_use]
    pub fn lights(&self) -> &[DeviceId] {
        &self.lights
    }

    #[must_use]
    pub fn outlets(&self) -> &[DeviceId] {
        &self.outlets
    }

    #[must_use]
    pub fn default_scenes(&self) -> &[String] {
        &self.default_scenes
    }

    /// Create every default scene on every member light (idempotent per
    /// light), then select `startup_scene` on each.
    #[tracing::instrument(skip(self, registry, ctx), fields(room = %self.name))]
    pub fn create_default_scenes(
        &mut self,
        startup_scene: &str,
        registry: &mut DeviceRegistry,
        ctx: &mut Context,
    ) {
        for id in &self.lights {
            let Some(light) = registry.light_mut(id) else {
                tracing::warn!(light = %id, "room member is not a registered light");
                continue;
            };
            for scene in &self.default_scenes {
                light.create_scene(SceneRequest::new(scene.clone()), ctx);
            }
            light.set_active_scene(startup_scene, ctx);
        }
        self.active_scene = startup_scene.to_string();
    }

    /// Select `scene` on every member light and record it as active.
    #[tracing::instrument(skip(self, registry, ctx), fields(room = %self.name))]
    pub fn set_active_scene(&mut self, scene: &str, registry: &mut DeviceRegistry, ctx: &mut Context) {
        for id in &self.lights {
            match registry.light_mut(id) {
                Some(light) => light.set_active_scene(scene, ctx),
                None => tracing::warn!(light = %id, "room member is not a registered light"),
            }
        }
        self.active_scene = scene.to_string();
        ctx.emit(
            None,
            EventKind::RoomSceneSelected {
                room: self.name.clone(),
                scene: scene.to_string(),
            },
        );
    }

    /// Create a scene on every member light. Lights that gained the scene
    /// are recomposed. Returns how many lights gained it.
    pub fn create_scene(
        &self,
        request: &SceneRequest,
        registry: &mut DeviceRegistry,
        ctx: &mut Context,
    ) -> usize {
        let mut created = 0;
        for id in &self.lights {
            let Some(light) = registry.light_mut(id) else {
                tracing::warn!(room = %self.name, light = %id, "room member is not a registered light");
                continue;
            };
            if light.create_scene(request.clone(), ctx) {
                light.recompute(ctx);
                created += 1;
            }
        }
        created
    }

    /// Delete a scene from every member light. Returns how many had it.
    pub fn delete_scene(&self, scene: &str, registry: &mut DeviceRegistry, ctx: &mut Context) -> usize {
        self.lights
            .iter()
            .filter_map(|id| registry.light_mut(id).map(|light| light.delete_scene(scene, ctx)))
            .filter(|deleted| *deleted)
            .count()
    }

    /// Step a scene's brightness on every member light. Returns how many
    /// lights had the scene.
    pub fn adjust_brightness(
        &self,
        scene: &str,
        step: i32,
        registry: &mut DeviceRegistry,
        ctx: &mut Context,
    ) -> usize {
        self.lights
            .iter()
            .filter_map(|id| {
                registry
                    .light_mut(id)
                    .map(|light| light.adjust_scene_brightness(scene, step, ctx))
            })
            .filter(|adjusted| *adjusted)
            .count()
    }

    /// Turn on the first member outlet that is off.
    pub fn switch_first_off_on(
        &self,
        registry: &mut DeviceRegistry,
        ctx: &mut Context,
    ) -> Option<DeviceId> {
        let id = self
            .outlets
            .iter()
            .find(|id| registry.outlet(id).is_some_and(|o| !o.is_on()))?
            .clone();
        registry.outlet_mut(&id)?.switch_on(ctx);
        Some(id)
    }

    /// Turn off the last member outlet that is on.
    pub fn switch_last_on_off(
        &self,
        registry: &mut DeviceRegistry,
        ctx: &mut Context,
    ) -> Option<DeviceId> {
        let id = self
            .outlets
            .iter()
            .rev()
            .find(|id| registry.outlet(id).is_some_and(|o| o.is_on()))?
            .clone();
        registry.outlet_mut(&id)?.switch_off(ctx);
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::testing::Harness;
    use crate::devices::{Device, Light, Outlet};
    use lumenhub_domain::device::GatewayTarget;
    use lumenhub_domain::light_state::LightState;

    fn registry() -> DeviceRegistry {
        let mut registry = DeviceRegistry::new();
        for (id, gw) in [("l1", "1"), ("l2", "2")] {
            registry.register(Device::Light(Light::new(
                DeviceId::from(id),
                GatewayTarget::light(gw),
                id,
                LightState::with_brightness(120),
            )));
        }
        for (id, gw, on) in [("o1", "5", true), ("o2", "6", false), ("o3", "7", true)] {
            registry.register(Device::Outlet(Outlet::new(
                DeviceId::from(id),
                GatewayTarget::light(gw),
                id,
                LightState {
                    on: Some(on),
                    ..LightState::default()
                },
            )));
        }
        registry
    }

    fn room() -> Room {
        Room::new("living")
            .with_lights(["l1", "l2", "ghost"].map(DeviceId::from))
            .with_outlets(["o1", "o2", "o3"].map(DeviceId::from))
    }

    #[test]
    fn should_start_with_default_scenes_and_day_active() {
        let room = Room::new("hall");
        assert_eq!(room.default_scenes(), ["morning", "day", "evening", "night"]);
        assert_eq!(room.active_scene(), "day");
    }

    #[test]
    fn should_create_default_scenes_on_every_light_and_select_startup() {
        let mut h = Harness::new();
        let mut registry = registry();
        let mut room = room();

        room.create_default_scenes("evening", &mut registry, &mut h.ctx);

        for id in ["l1", "l2"] {
            let light = registry.light(&DeviceId::from(id)).unwrap();
            assert_eq!(light.scene_count(), 4);
            assert!(light.scene("evening").unwrap().enabled);
            assert!(!light.scene("day").unwrap().enabled);
        }
        assert_eq!(room.active_scene(), "evening");
        assert_eq!(h.sent().len(), 2);
    }

    #[test]
    fn should_be_idempotent_when_creating_defaults_twice() {
        let mut h = Harness::new();
        let mut registry = registry();
        let mut room = room();
        room.create_default_scenes("day", &mut registry, &mut h.ctx);
        room.create_default_scenes("day", &mut registry, &mut h.ctx);
        let light = registry.light(&DeviceId::from("l1")).unwrap();
        assert_eq!(light.scene_count(), 4);
    }

    #[test]
    fn should_skip_missing_members_when_setting_active_scene() {
        let mut h = Harness::new();
        let mut registry = registry();
        let mut room = room();
        room.create_default_scenes("day", &mut registry, &mut h.ctx);
        h.sent();

        room.set_active_scene("night", &mut registry, &mut h.ctx);

        assert_eq!(room.active_scene(), "night");
        assert_eq!(h.sent().len(), 2);
        assert!(h.event_names().contains(&"room_scene_selected".to_string()));
    }

    #[test]
    fn should_fan_out_scene_creation_and_deletion() {
        let mut h = Harness::new();
        let mut registry = registry();
        let room = room();
        let request = SceneRequest::new("_alarm")
            .priority(100)
            .state(LightState::with_brightness(254));

        assert_eq!(room.create_scene(&request, &mut registry, &mut h.ctx), 2);
        assert_eq!(room.create_scene(&request, &mut registry, &mut h.ctx), 0);
        assert!(h.sent().iter().all(|a| a.state.bri == Some(254)));

        assert_eq!(room.delete_scene("_alarm", &mut registry, &mut h.ctx), 2);
        assert_eq!(room.delete_scene("_alarm", &mut registry, &mut h.ctx), 0);
    }

    #[test]
    fn should_adjust_brightness_on_lights_having_the_scene() {
        let mut h = Harness::new();
        let mut registry = registry();
        let mut room = room();
        room.create_default_scenes("day", &mut registry, &mut h.ctx);

        assert_eq!(room.adjust_brightness("day", 500, &mut registry, &mut h.ctx), 2);
        let light = registry.light(&DeviceId::from("l2")).unwrap();
        assert_eq!(light.scene("day").unwrap().brightness(), 254);
    }

    #[test]
    fn should_switch_first_off_outlet_on() {
        let mut h = Harness::new();
        let mut registry = registry();
        let room = room();

        let switched = room.switch_first_off_on(&mut registry, &mut h.ctx);
        assert_eq!(switched, Some(DeviceId::from("o2")));
        assert!(room.switch_first_off_on(&mut registry, &mut h.ctx).is_none());
    }

    #[test]
    fn should_switch_last_on_outlet_off() {
        let mut h = Harness::new();
        let mut registry = registry();
        let room = room();

        assert_eq!(
            room.switch_last_on_off(&mut registry, &mut h.ctx),
            Some(DeviceId::from("o3"))
        );
        assert_eq!(
            room.switch_last_on_off(&mut registry, &mut h.ctx),
            Some(DeviceId::from("o1"))
        );
        assert!(room.switch_last_on_off(&mut registry, &mut h.ctx).is_none());
    }
}
