//! Daemon settings: `lumenhub.toml` in the working directory, then
//! `LUMENHUB_*` environment variables on top.
//!
//! A missing file means an empty one; each section falls back to its
//! defaults, including a demo set of virtual devices.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use lumenhub_adapter_virtual::VirtualConfig;
use lumenhub_app::context::{
    DEFAULT_HOLD_REPEAT, DEFAULT_SCENE_TTL, DEFAULT_TRANSITION, HubSettings,
};
use lumenhub_app::hub::HubConfig;
use lumenhub_app::room::{DEFAULT_ACTIVE_SCENE, DEFAULT_SCENES, Room};
use lumenhub_domain::automation::Automation;
use lumenhub_domain::catalog::Catalog;
use lumenhub_domain::id::DeviceId;

/// Parsed `lumenhub.toml`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub logging: LoggingConfig,
    /// Hub timing and startup settings.
    pub hub: HubSection,
    /// Rooms grouping lights and outlets.
    pub rooms: Vec<RoomConfig>,
    /// Trigger → condition → action rules.
    pub automations: Vec<Automation>,
    /// Simulated gateway.
    #[serde(rename = "virtual")]
    pub virtual_gateway: VirtualConfig,
}

/// `[logging]`
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive, e.g. `lumenhub_app=debug`.
    pub filter: String,
}

/// `[hub]`
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct HubSection {
    /// Interval between `tick_*` gestures while a button is held.
    pub hold_repeat_ms: u64,
    /// Transition applied to activations, in tenths of a second.
    pub transition: u16,
    /// Lifetime of scenes created by automations without an explicit ttl.
    pub scene_ttl_secs: u64,
    /// Scene selected in every room at startup.
    pub startup_scene: String,
    /// Remotes mounted upside down.
    pub inverted_remotes: Vec<DeviceId>,
    /// Sensors whose motion and contact events are muted at startup.
    pub disabled_sensors: Vec<DeviceId>,
}

/// One `[[rooms]]` entry.
#[derive(Debug, Deserialize)]
pub struct RoomConfig {
    pub name: String,
    #[serde(default)]
    pub lights: Vec<DeviceId>,
    #[serde(default)]
    pub outlets: Vec<DeviceId>,
    /// Scenes created on every light at startup.
    #[serde(default = "default_room_scenes")]
    pub scenes: Vec<String>,
}

fn default_room_scenes() -> Vec<String> {
    DEFAULT_SCENES.iter().map(ToString::to_string).collect()
}

impl Config {
    /// Read `lumenhub.toml`, apply the environment and check the result.
    ///
    /// # Errors
    ///
    /// Fails on an unreadable or malformed file and on settings the hub
    /// cannot run with.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::read(Path::new("lumenhub.toml"))?;
        config.override_from_env();
        config.validate()?;
        Ok(config)
    }

    fn read(path: &Path) -> Result<Self, ConfigError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(source) if source.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    fn override_from_env(&mut self) {
        // RUST_LOG wins over LUMENHUB_LOG.
        if let Some(filter) = ["RUST_LOG", "LUMENHUB_LOG"]
            .into_iter()
            .find_map(|key| std::env::var(key).ok())
        {
            self.logging.filter = filter;
        }
        if let Some(ms) = env_number("LUMENHUB_HOLD_REPEAT_MS") {
            self.hub.hold_repeat_ms = ms;
        }
        if let Some(transition) = env_number("LUMENHUB_TRANSITION") {
            self.hub.transition = transition;
        }
        if let Some(secs) = env_number("LUMENHUB_SCENE_TTL_SECS") {
            self.hub.scene_ttl_secs = secs;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.hub.hold_repeat_ms == 0 {
            return Err(ConfigError::Validation(
                "hold repeat interval must be non-zero".to_string(),
            ));
        }
        let mut names = HashSet::new();
        for room in &self.rooms {
            if room.name.is_empty() {
                return Err(ConfigError::Validation("room name must not be empty".to_string()));
            }
            if !names.insert(room.name.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "room {} is defined twice",
                    room.name
                )));
            }
        }
        for automation in &self.automations {
            automation.validate().map_err(|err| {
                ConfigError::Validation(format!("automation {:?}: {err}", automation.name))
            })?;
        }
        Ok(())
    }

    /// Timing settings for the hub.
    #[must_use]
    pub fn settings(&self) -> HubSettings {
        HubSettings {
            hold_repeat_interval: Duration::from_millis(self.hub.hold_repeat_ms),
            default_transition: self.hub.transition,
            default_scene_ttl: Duration::from_secs(self.hub.scene_ttl_secs),
        }
    }

    /// Everything the hub needs to start, besides its ports.
    #[must_use]
    pub fn hub_config(&self) -> HubConfig {
        HubConfig {
            settings: self.settings(),
            catalog: Catalog::builtin(),
            rooms: self.rooms.iter().map(RoomConfig::to_room).collect(),
            automations: self.automations.clone(),
            startup_scene: self.hub.startup_scene.clone(),
            inverted_remotes: self.hub.inverted_remotes.clone(),
            disabled_sensors: self.hub.disabled_sensors.clone(),
        }
    }
}

impl RoomConfig {
    fn to_room(&self) -> Room {
        Room::new(self.name.clone())
            .with_lights(self.lights.iter().cloned())
            .with_outlets(self.outlets.iter().cloned())
            .with_default_scenes(self.scenes.iter().cloned())
    }
}

fn env_number<T: std::str::FromStr>(key: &str) -> Option<T> {
    let val = std::env::var(key).ok()?;
    match val.parse() {
        Ok(number) => Some(number),
        Err(_) => {
            tracing::warn!(key, value = %val, "ignoring non-numeric override");
            None
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "lumenhubd=info,lumenhub_app=info,lumenhub_adapter_virtual=info".to_string(),
        }
    }
}

impl Default for HubSection {
    fn default() -> Self {
        Self {
            hold_repeat_ms: u64::try_from(DEFAULT_HOLD_REPEAT.as_millis()).unwrap_or(400),
            transition: DEFAULT_TRANSITION,
            scene_ttl_secs: DEFAULT_SCENE_TTL.as_secs(),
            startup_scene: DEFAULT_ACTIVE_SCENE.to_string(),
            inverted_remotes: Vec::new(),
            disabled_sensors: Vec::new(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read {}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("malformed {}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    /// Well-formed, but the hub cannot run with it.
    #[error("invalid configuration: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_default_every_section_when_nothing_configured() {
        let config = Config::default();
        assert_eq!(config.hub.hold_repeat_ms, 400);
        assert_eq!(config.hub.transition, 4);
        assert_eq!(config.hub.scene_ttl_secs, 120);
        assert_eq!(config.hub.startup_scene, "day");
        assert!(config.rooms.is_empty());
        assert_eq!(config.virtual_gateway.devices.len(), 4);
    }

    #[test]
    fn should_accept_empty_file() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.hub.hold_repeat_ms, 400);
    }

    #[test]
    fn should_read_every_section_from_toml() {
        let toml = r#"
            [logging]
            filter = "lumenhub_app=debug"

            [hub]
            hold_repeat_ms = 250
            transition = 0
            scene_ttl_secs = 60
            startup_scene = "evening"
            inverted_remotes = ["remote-1"]
            disabled_sensors = ["pir-1"]

            [[rooms]]
            name = "living"
            lights = ["lamp-1", "lamp-2"]
            outlets = ["plug-1"]

            [[rooms]]
            name = "hall"
            lights = ["lamp-3"]
            scenes = ["day", "night"]

            [[automations]]
            name = "hall motion"
            trigger = { type = "motion", device = "pir-1" }
            conditions = [{ type = "time_range", after = "22:00", before = "06:00" }]
            actions = [{ type = "create_scene", room = "hall", scene = "_motion", brightness = 60, priority = 50 }]

            [virtual]
            devices = []
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.logging.filter, "lumenhub_app=debug");
        assert_eq!(config.settings().hold_repeat_interval, Duration::from_millis(250));
        assert_eq!(config.settings().default_transition, 0);
        assert_eq!(config.hub_config().disabled_sensors, vec![DeviceId::from("pir-1")]);
        assert_eq!(config.rooms.len(), 2);
        assert_eq!(config.rooms[0].scenes.len(), 4);
        assert_eq!(config.rooms[1].scenes, vec!["day", "night"]);
        assert_eq!(config.automations.len(), 1);
        assert!(config.virtual_gateway.devices.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn should_build_hub_config_from_rooms() {
        let toml = r#"
            [[rooms]]
            name = "living"
            lights = ["lamp-1"]
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        let hub = config.hub_config();
        assert_eq!(hub.rooms.len(), 1);
        assert_eq!(hub.rooms[0].name(), "living");
        assert_eq!(hub.rooms[0].lights(), &[DeviceId::from("lamp-1")]);
        assert_eq!(hub.startup_scene, "day");
    }

    #[test]
    fn should_fall_back_to_defaults_when_file_missing() {
        let config = Config::read(Path::new("no-such-lumenhub.toml")).unwrap();
        assert_eq!(config.hub.transition, 4);
    }

    #[test]
    fn should_name_the_file_when_it_is_malformed() {
        let path = std::env::temp_dir().join(format!("lumenhub-{}.toml", std::process::id()));
        std::fs::write(&path, "[hub\nhold_repeat_ms = ").unwrap();

        let err = Config::read(&path).unwrap_err();
        std::fs::remove_file(&path).unwrap();

        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("lumenhub-"));
    }

    #[test]
    fn should_reject_zero_hold_repeat() {
        let mut config = Config::default();
        config.hub.hold_repeat_ms = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn should_reject_duplicate_room_names() {
        let toml = r#"
            [[rooms]]
            name = "living"

            [[rooms]]
            name = "living"
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn should_reject_invalid_automation() {
        let toml = r#"
            [[automations]]
            name = "nothing to do"
            actions = []
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn should_refuse_unknown_gesture_in_automation_trigger() {
        let toml = r#"
            [[automations]]
            name = "bad"
            trigger = { type = "gesture", device = "remote", gesture = "wiggle_on" }
            actions = [{ type = "switch_first_off_on", room = "living" }]
        "#;
        assert!(toml::from_str::<Config>(toml).is_err());
    }
}
