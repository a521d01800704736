//! Scene — a named, prioritized lighting overlay owned by one light.
//!
//! A light can carry several enabled scenes at once; the compositor
//! ([`crate::composition`]) resolves them into one effective state.
//! Expiry timers are a runtime resource and live next to the scene in the
//! application layer, not here.

use serde::{Deserialize, Serialize};

use crate::error::{HubError, ValidationError};
use crate::light_state::{LightState, MAX_BRIGHTNESS, MIN_ON_BRIGHTNESS};

/// Prefix marking a scene as special: excluded from active-scene selection.
pub const SPECIAL_PREFIX: char = '_';

/// A lighting overlay with a priority and a target state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    name: String,
    pub priority: i32,
    pub enabled: bool,
    /// A transparent scene lets lower-priority scenes with a higher
    /// brightness still win the composition.
    pub transparent: bool,
    pub state: LightState,
}

impl Scene {
    /// Create a builder for constructing a [`Scene`].
    #[must_use]
    pub fn builder() -> SceneBuilder {
        SceneBuilder::default()
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the scene is exempt from active-scene selection.
    #[must_use]
    pub fn is_special(&self) -> bool {
        self.name.starts_with(SPECIAL_PREFIX)
    }

    #[must_use]
    pub fn brightness(&self) -> i32 {
        self.state.brightness()
    }

    /// Set the target brightness, clamped to `0..=254`.
    pub fn set_brightness(&mut self, bri: i32) {
        self.state.bri = Some(bri.clamp(0, MAX_BRIGHTNESS));
    }

    /// Raise the target brightness, saturating at 254.
    pub fn increase_brightness(&mut self, step: i32) {
        self.state.bri = Some(self.brightness().saturating_add(step).min(MAX_BRIGHTNESS));
    }

    /// Lower the target brightness without ever reaching 0, so dimming a
    /// scene never switches the light off.
    pub fn decrease_brightness(&mut self, step: i32) {
        self.state.bri = Some(
            self.brightness()
                .saturating_sub(step)
                .max(MIN_ON_BRIGHTNESS),
        );
    }

    /// Signed variant of [`increase_brightness`](Self::increase_brightness)
    /// and [`decrease_brightness`](Self::decrease_brightness).
    pub fn adjust_brightness(&mut self, step: i32) {
        if step >= 0 {
            self.increase_brightness(step);
        } else {
            self.decrease_brightness(step.saturating_neg());
        }
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Validation`] when `name` is empty.
    pub fn validate(&self) -> Result<(), HubError> {
        if self.name.is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        Ok(())
    }
}

/// Step-by-step builder for [`Scene`].
#[derive(Debug, Default)]
pub struct SceneBuilder {
    name: Option<String>,
    priority: i32,
    transparent: bool,
    state: Option<LightState>,
}

impl SceneBuilder {
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    #[must_use]
    pub fn transparent(mut self, transparent: bool) -> Self {
        self.transparent = transparent;
        self
    }

    #[must_use]
    pub fn state(mut self, state: LightState) -> Self {
        self.state = Some(state);
        self
    }

    /// Consume the builder, validate, and return an enabled [`Scene`].
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Validation`] if `name` is missing or empty.
    pub fn build(self) -> Result<Scene, HubError> {
        let scene = Scene {
            name: self.name.unwrap_or_default(),
            priority: self.priority,
            enabled: true,
            transparent: self.transparent,
            state: self.state.unwrap_or_default(),
        };
        scene.validate()?;
        Ok(scene)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scene(name: &str, bri: i32) -> Scene {
        Scene::builder()
            .name(name)
            .state(LightState::with_brightness(bri))
            .build()
            .unwrap()
    }

    #[test]
    fn should_build_enabled_opaque_scene_by_default() {
        let scene = Scene::builder().name("day").build().unwrap();
        assert_eq!(scene.name(), "day");
        assert!(scene.enabled);
        assert!(!scene.transparent);
        assert_eq!(scene.priority, 0);
    }

    #[test]
    fn should_return_validation_error_when_name_is_empty() {
        let result = Scene::builder().priority(3).build();
        assert!(matches!(
            result,
            Err(HubError::Validation(ValidationError::EmptyName))
        ));
    }

    #[test]
    fn should_detect_special_scene_by_underscore_prefix() {
        assert!(scene("_motion", 10).is_special());
        assert!(!scene("motion_", 10).is_special());
    }

    #[test]
    fn should_clamp_when_setting_brightness() {
        let mut s = scene("day", 0);
        s.set_brightness(300);
        assert_eq!(s.brightness(), 254);
        s.set_brightness(-1);
        assert_eq!(s.brightness(), 0);
    }

    #[test]
    fn should_saturate_when_increasing_brightness() {
        let mut s = scene("day", 250);
        s.increase_brightness(10);
        assert_eq!(s.brightness(), 254);
    }

    #[test]
    fn should_never_reach_zero_when_decreasing_brightness() {
        let mut s = scene("day", 5);
        s.decrease_brightness(10);
        assert_eq!(s.brightness(), 1);
    }

    #[test]
    fn should_dispatch_on_sign_when_adjusting_brightness() {
        let mut s = scene("day", 100);
        s.adjust_brightness(20);
        assert_eq!(s.brightness(), 120);
        s.adjust_brightness(-200);
        assert_eq!(s.brightness(), 1);
    }
}
